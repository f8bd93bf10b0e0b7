use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use super::anchors::{AnchorExtractor, IntentHint};
use super::attributes::{AttributeExtractor, AttributeSet};
use super::implicit::ImplicitResolver;
use super::normalizer::Normalizer;
use super::validators::{IdPolicy, PricePolicy};
use crate::ai::AiFallback;
use crate::session::Utterance;

/// What the operator's console should do about one utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Buy,
    Cancel,
    Shipping,
    Question,
    Ignore,
}

/// One structured action produced from an utterance. Immutable once built;
/// a multi-claim utterance expands into several actions sharing one owner.
#[derive(Debug, Clone, Serialize)]
pub struct Action {
    pub kind: ActionKind,
    pub item_id: Option<u32>,
    pub price: Option<u32>,
    pub size: Option<String>,
    pub attributes: AttributeSet,
    /// Which stage resolved this ("anchor", "implicit-pair", "ai", ...)
    pub method: String,
    pub owner_name: String,
    pub owner_uid: String,
}

impl Action {
    fn ignore(owner_name: &str, owner_uid: &str, method: &str) -> Self {
        Self {
            kind: ActionKind::Ignore,
            item_id: None,
            price: None,
            size: None,
            attributes: AttributeSet::default(),
            method: method.to_string(),
            owner_name: owner_name.to_string(),
            owner_uid: owner_uid.to_string(),
        }
    }
}

/// Routing result: the emitted actions plus the normalized text for
/// diagnostics and speech readback.
#[derive(Debug, Clone)]
pub struct Routed {
    pub actions: Vec<Action>,
    pub normalized: String,
}

// Multi-claim shape: several space-separated numbers, optionally followed
// by a buyer name ("12 45 90 คุณสมชาย").
static MULTI_CLAIM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\s+\d+)+)\s*(\D.*)?$").unwrap());

/// Orchestrates the extraction stages in priority order and emits actions.
///
/// Stage order is fixed: normalize → attributes → anchors → implicit →
/// AI fallback (only when no id was found). Nothing past this router ever
/// sees raw text.
pub struct IntentRouter {
    normalizer: Normalizer,
    attributes: AttributeExtractor,
    anchors: AnchorExtractor,
    implicit: ImplicitResolver,
    ai: Option<Arc<AiFallback>>,
    id_policy: IdPolicy,
}

impl IntentRouter {
    pub fn new(
        id_policy: IdPolicy,
        price_policy: PricePolicy,
        ai: Option<Arc<AiFallback>>,
    ) -> Self {
        Self {
            normalizer: Normalizer::new(),
            attributes: AttributeExtractor::new(),
            anchors: AnchorExtractor::new(id_policy.clone(), price_policy.clone()),
            implicit: ImplicitResolver::new(id_policy.clone(), price_policy),
            ai,
            id_policy,
        }
    }

    pub async fn route(&self, utterance: &Utterance, display_name: &str) -> Routed {
        let normalized = self.normalizer.normalize(&utterance.text);
        debug!(raw = %utterance.text, normalized = %normalized, "routing utterance");

        if normalized.is_empty() {
            return Routed {
                actions: vec![Action::ignore(display_name, &utterance.speaker_uid, "empty")],
                normalized,
            };
        }

        let extraction = self.attributes.extract(&normalized);
        let anchored = self.anchors.extract(&extraction.remaining);

        // Cancel and shipping outrank every other shape, including the
        // number list: "12 45 ยกเลิก" releases an item, it does not book two
        if anchored.intent == Some(IntentHint::Cancel) {
            return Routed {
                actions: vec![Action {
                    kind: ActionKind::Cancel,
                    item_id: anchored.item_id,
                    price: None,
                    size: None,
                    attributes: extraction.attributes,
                    method: "anchor".to_string(),
                    owner_name: display_name.to_string(),
                    owner_uid: utterance.speaker_uid.clone(),
                }],
                normalized,
            };
        }
        if anchored.intent == Some(IntentHint::Shipping) {
            return Routed {
                actions: vec![Action {
                    kind: ActionKind::Shipping,
                    item_id: None,
                    price: None,
                    size: None,
                    attributes: extraction.attributes,
                    method: "anchor".to_string(),
                    owner_name: display_name.to_string(),
                    owner_uid: utterance.speaker_uid.clone(),
                }],
                normalized,
            };
        }

        // Multi-claim: a list of bare numbers claims several items at
        // once. Checked ahead of the question heuristic, because question
        // words double as syllables in Thai nicknames and an explicit
        // number list is the stronger signal.
        if let Some(actions) = self.try_multi_claim(&normalized, utterance, display_name) {
            return Routed {
                actions,
                normalized,
            };
        }

        if anchored.intent == Some(IntentHint::Question) {
            return Routed {
                actions: vec![Action {
                    kind: ActionKind::Question,
                    item_id: None,
                    price: None,
                    size: None,
                    attributes: extraction.attributes,
                    method: "anchor".to_string(),
                    owner_name: display_name.to_string(),
                    owner_uid: utterance.speaker_uid.clone(),
                }],
                normalized,
            };
        }

        let implicit = self
            .implicit
            .resolve(&anchored.remaining, anchored.item_id, anchored.price);

        let mut item_id = implicit.item_id;
        let mut price = implicit.price;
        let mut size = extraction.attributes.size_letter.clone();
        let mut method = if anchored.item_id.is_some() {
            "anchor"
        } else {
            implicit.method.unwrap_or("none")
        }
        .to_string();

        // AI fallback only when the deterministic stages found no id and
        // the text is long enough to mean something
        if item_id.is_none() {
            match &self.ai {
                Some(ai) if ai.wants(&normalized) => {
                    if let Some(found) = ai.extract_debounced(&normalized).await {
                        item_id = found.item_id.filter(|&id| self.id_policy.is_valid(id));
                        price = price.or(found.price);
                        size = size.or(found.size);
                        if item_id.is_some() {
                            method = "ai".to_string();
                        }
                    }
                }
                Some(_) => debug!(text = %normalized, "AI fallback skipped, text too short"),
                None => debug!("AI fallback disabled"),
            }
        }

        let Some(id) = item_id else {
            info!(text = %normalized, "no item id resolved, ignoring");
            return Routed {
                actions: vec![Action::ignore(
                    display_name,
                    &utterance.speaker_uid,
                    &method,
                )],
                normalized,
            };
        };

        // Admin claims may carry a proxy buyer name in the leftover text
        let (owner_name, owner_uid) = self.resolve_owner(
            utterance,
            display_name,
            &anchored.remaining,
            id,
            price,
        );

        Routed {
            actions: vec![Action {
                kind: ActionKind::Buy,
                item_id: Some(id),
                price,
                size,
                attributes: extraction.attributes,
                method,
                owner_name,
                owner_uid,
            }],
            normalized,
        }
    }

    /// Two-or-more bare numbers in one message claim each listed item for
    /// one buyer. Requires at least three numbers, or a trailing buyer
    /// name, so that a plain "53 80" still resolves through the pair rule.
    fn try_multi_claim(
        &self,
        normalized: &str,
        utterance: &Utterance,
        display_name: &str,
    ) -> Option<Vec<Action>> {
        let caps = MULTI_CLAIM.captures(normalized)?;
        let numbers: Vec<u32> = caps
            .get(1)?
            .as_str()
            .split_whitespace()
            .filter_map(|t| t.parse().ok())
            .collect();
        let trailing_name = caps
            .get(2)
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty());

        if numbers.len() < 3 && trailing_name.is_none() {
            return None; // leave "53 80" to the pair rule
        }
        if !numbers.iter().all(|&n| self.id_policy.is_valid(n)) {
            return None;
        }

        let (owner_name, owner_uid) = match trailing_name {
            Some(name) if utterance.is_admin => proxy_owner(name),
            _ => (display_name.to_string(), utterance.speaker_uid.clone()),
        };

        info!(
            count = numbers.len(),
            owner = %owner_name,
            "multi-claim utterance"
        );

        Some(
            numbers
                .into_iter()
                .map(|id| Action {
                    kind: ActionKind::Buy,
                    item_id: Some(id),
                    price: None,
                    size: None,
                    attributes: AttributeSet::default(),
                    method: "multi-claim".to_string(),
                    owner_name: owner_name.clone(),
                    owner_uid: owner_uid.clone(),
                })
                .collect(),
        )
    }

    fn resolve_owner(
        &self,
        utterance: &Utterance,
        display_name: &str,
        leftover: &str,
        id: u32,
        price: Option<u32>,
    ) -> (String, String) {
        if !utterance.is_admin {
            return (display_name.to_string(), utterance.speaker_uid.clone());
        }

        // Strip the resolved numbers out of the leftover, what remains is
        // the proxy buyer name (if any)
        let mut name_part = leftover.to_string();
        name_part = name_part.replace(&id.to_string(), " ");
        if let Some(p) = price {
            name_part = name_part.replace(&p.to_string(), " ");
        }
        let name_part = name_part
            .trim_matches(|c: char| c.is_whitespace() || c == ':' || c == '-' || c == '=')
            .trim();

        if !name_part.is_empty() && !name_part.chars().all(|c| c.is_ascii_digit()) {
            proxy_owner(name_part)
        } else {
            (display_name.to_string(), utterance.speaker_uid.clone())
        }
    }
}

/// A synthetic uid keeps repeated proxy claims by the same admin from
/// colliding with the admin's own identity.
fn proxy_owner(name: &str) -> (String, String) {
    (
        name.to_string(),
        format!("proxy-{}", uuid::Uuid::new_v4()),
    )
}
