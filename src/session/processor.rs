use anyhow::Result;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::diagnostics::{ResolutionLog, ResolutionRecord, ResolutionStatus};
use super::nickname::NicknameCache;
use super::Utterance;
use crate::audio::{AudioSerializer, AudioTask, SfxKind};
use crate::ledger::{ClaimOutcome, ItemUpdate, ReservationLedger};
use crate::pipeline::{
    Action, ActionKind, AnchorExtractor, AttributeExtractor, IdPolicy, IntentHint, IntentRouter,
    Normalizer, PricePolicy,
};

static ADMIN_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)admin|แอดมิน").unwrap());
static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Outcome of one voice command, for the operator readout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum VoiceOutcome {
    /// Item metadata updated (price/size), no ownership change
    Updated {
        id: u32,
        price: u32,
        size: Option<String>,
    },
    Cancelled {
        id: u32,
        previous_owner: String,
        next_owner: Option<String>,
    },
    /// Manual booking of a free item for the operator
    Booked { id: u32 },
    /// Book attempt on an occupied item
    Unavailable { id: u32 },
    NoMatch,
}

/// The session core: consumes utterances, applies the resulting actions
/// to the ledger, and queues audible feedback.
///
/// Chat messages go through the full intent pipeline; voice commands take
/// the operator path (price updates, cancels, manual bookings).
pub struct SalesProcessor {
    router: IntentRouter,
    normalizer: Normalizer,
    attributes: AttributeExtractor,
    anchors: AnchorExtractor,
    ledger: Arc<ReservationLedger>,
    audio: Arc<AudioSerializer>,
    nicknames: Arc<NicknameCache>,
    log: Arc<ResolutionLog>,
    id_policy: IdPolicy,
}

impl SalesProcessor {
    pub fn new(
        router: IntentRouter,
        id_policy: IdPolicy,
        price_policy: PricePolicy,
        ledger: Arc<ReservationLedger>,
        audio: Arc<AudioSerializer>,
        nicknames: Arc<NicknameCache>,
        log: Arc<ResolutionLog>,
    ) -> Self {
        Self {
            router,
            normalizer: Normalizer::new(),
            attributes: AttributeExtractor::new(),
            anchors: AnchorExtractor::new(id_policy.clone(), price_policy),
            ledger,
            audio,
            nicknames,
            log,
            id_policy,
        }
    }

    /// Process one chat message end to end. Returns the actions that were
    /// applied, for the caller's UI log.
    pub async fn process_message(&self, utterance: Utterance) -> Result<Vec<Action>> {
        let display_name = self
            .nicknames
            .resolve(&utterance.speaker_uid, &utterance.speaker_name)
            .await;

        // Operators are flagged by the transport or recognizable by name
        let is_admin = utterance.is_admin
            || ADMIN_NAME.is_match(&display_name)
            || ADMIN_NAME.is_match(&utterance.speaker_name);
        let utterance = Utterance {
            is_admin,
            ..utterance
        };

        info!(speaker = %display_name, text = %utterance.text, "processing message");

        let routed = self.router.route(&utterance, &display_name).await;

        for action in &routed.actions {
            self.apply(action, &utterance, &display_name, &routed.normalized)
                .await?;
            self.record(&utterance.text, &routed.normalized, action).await;
        }

        Ok(routed.actions)
    }

    async fn apply(
        &self,
        action: &Action,
        utterance: &Utterance,
        display_name: &str,
        normalized: &str,
    ) -> Result<()> {
        match action.kind {
            ActionKind::Buy => {
                let Some(id) = action.item_id else {
                    return Ok(());
                };
                if !self.id_policy.is_valid(id) {
                    warn!(id, "item id out of range, not applied");
                    self.audio.enqueue(AudioTask::sfx(SfxKind::Error)).await;
                    return Ok(());
                }

                self.ledger.ensure_capacity(id).await?;

                let outcome = self
                    .ledger
                    .claim(
                        id,
                        &action.owner_name,
                        &action.owner_uid,
                        action.price,
                        &action.method,
                    )
                    .await?;

                // Just the ding; claim results are visible on the board
                if matches!(outcome, ClaimOutcome::Claimed | ClaimOutcome::Queued) {
                    self.audio.enqueue(AudioTask::sfx(SfxKind::Success)).await;
                }
            }
            ActionKind::Cancel => {
                let Some(id) = action.item_id else {
                    return Ok(());
                };

                // Only the owner or an operator may cancel
                let snapshot = self.ledger.store().snapshot().await;
                let may_cancel = utterance.is_admin
                    || snapshot
                        .items
                        .get(&id)
                        .map(|item| item.owner_uid == utterance.speaker_uid)
                        .unwrap_or(false);
                if !may_cancel {
                    info!(id, speaker = %display_name, "cancel refused, not the owner");
                    return Ok(());
                }

                if let Some(outcome) = self.ledger.cancel(id).await? {
                    let announce = match &outcome.next_owner {
                        Some(next) => format!(
                            "{} ยกเลิก... {} ได้สิทธิ์ต่อค่ะ",
                            outcome.previous_owner, next
                        ),
                        None => format!("{} ยกเลิกรายการที่ {} ค่ะ", display_name, id),
                    };
                    self.audio
                        .enqueue(AudioTask::with_announce(SfxKind::Cancel, announce))
                        .await;
                }
            }
            ActionKind::Shipping => {
                self.audio
                    .enqueue(AudioTask::announce(format!("{} แจ้งส่งของ", display_name)))
                    .await;
            }
            ActionKind::Question => {
                // Questions are for the operator to answer on stream
            }
            ActionKind::Ignore => {
                // Plain chatter: read short messages aloud so the operator
                // can keep eyes on the garments
                if !normalized.is_empty() && normalized.chars().count() < 100 {
                    self.audio
                        .enqueue(AudioTask::announce(format!(
                            "{} ... {}",
                            display_name, normalized
                        )))
                        .await;
                }
            }
        }

        Ok(())
    }

    /// Operator voice path: price/size updates, cancels and manual
    /// bookings against the currently presented items.
    pub async fn process_voice_command(&self, raw: &str) -> Result<VoiceOutcome> {
        let normalized = self.normalizer.normalize(raw);
        if normalized.is_empty() {
            return Ok(VoiceOutcome::NoMatch);
        }

        let extraction = self.attributes.extract(&normalized);
        let anchored = self.anchors.extract(&extraction.remaining);

        info!(
            raw,
            normalized = %normalized,
            id = ?anchored.item_id,
            price = ?anchored.price,
            "voice command"
        );

        if anchored.intent == Some(IntentHint::Cancel) {
            if let Some(id) = anchored.item_id {
                if let Some(outcome) = self.ledger.cancel(id).await? {
                    self.audio.enqueue(AudioTask::sfx(SfxKind::Cancel)).await;
                    return Ok(VoiceOutcome::Cancelled {
                        id,
                        previous_owner: outcome.previous_owner,
                        next_owner: outcome.next_owner,
                    });
                }
            }
            return Ok(VoiceOutcome::NoMatch);
        }

        let Some(id) = anchored.item_id else {
            return Ok(VoiceOutcome::NoMatch);
        };

        let snapshot = self.ledger.store().snapshot().await;
        if id == 0 || id > snapshot.stock_size {
            return Ok(VoiceOutcome::NoMatch);
        }

        // Spoken price may arrive without an anchor word; any leftover
        // number is taken as the price in this path
        let price = anchored.price.or_else(|| {
            FIRST_NUMBER
                .find(&anchored.remaining)
                .and_then(|m| m.as_str().parse().ok())
        });

        if let Some(price) = price {
            let size = describe_size(&extraction.attributes);
            self.ledger
                .update_fields(
                    id,
                    ItemUpdate {
                        price: Some(price),
                        size: size.clone(),
                    },
                )
                .await?;
            self.audio.enqueue(AudioTask::sfx(SfxKind::Success)).await;
            return Ok(VoiceOutcome::Updated { id, price, size });
        }

        // No price: treat as a manual booking for the operator. The
        // snapshot check is only a fast path; the claim outcome decides.
        if snapshot.items.contains_key(&id) {
            self.audio.enqueue(AudioTask::sfx(SfxKind::Error)).await;
            return Ok(VoiceOutcome::Unavailable { id });
        }

        let outcome = self
            .ledger
            .claim(id, "Admin Voice", "manual-voice", None, "manual-voice")
            .await?;
        if matches!(outcome, ClaimOutcome::Claimed | ClaimOutcome::AlreadyOwned) {
            self.audio.enqueue(AudioTask::sfx(SfxKind::Success)).await;
            Ok(VoiceOutcome::Booked { id })
        } else {
            // A buyer slipped in between the snapshot and the claim
            self.audio.enqueue(AudioTask::sfx(SfxKind::Error)).await;
            Ok(VoiceOutcome::Unavailable { id })
        }
    }

    async fn record(&self, raw: &str, normalized: &str, action: &Action) {
        let (status, output) = match action.kind {
            ActionKind::Buy => (
                ResolutionStatus::Resolved,
                format!(
                    "buy #{} @{} for {}",
                    action.item_id.unwrap_or(0),
                    action
                        .price
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    action.owner_name
                ),
            ),
            ActionKind::Cancel => (
                ResolutionStatus::Resolved,
                format!("cancel #{}", action.item_id.unwrap_or(0)),
            ),
            ActionKind::Shipping => (ResolutionStatus::Resolved, "shipping notice".to_string()),
            ActionKind::Question => (ResolutionStatus::Resolved, "question".to_string()),
            ActionKind::Ignore => {
                // A number that was present but failed its plausibility
                // check is "rejected"; numberless chatter is "ignored"
                if normalized.chars().any(|c| c.is_ascii_digit()) {
                    (ResolutionStatus::Rejected, "rejected".to_string())
                } else {
                    (ResolutionStatus::Ignored, "ignored".to_string())
                }
            }
        };

        self.log
            .push(ResolutionRecord {
                timestamp: Utc::now(),
                raw: raw.to_string(),
                normalized: normalized.to_string(),
                output,
                method: action.method.clone(),
                status,
            })
            .await;
    }
}

/// Human-readable size description from the extracted attributes, the way
/// the seller would say it.
fn describe_size(attributes: &crate::pipeline::AttributeSet) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(bust) = &attributes.bust {
        parts.push(format!("อก {}", bust));
    }
    if let Some(length) = &attributes.length {
        parts.push(format!("ยาว {}", length));
    }
    if let Some(letter) = &attributes.size_letter {
        parts.push(letter.clone());
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}
