use once_cell::sync::Lazy;
use regex::Regex;

use super::validators::{IdPolicy, PricePolicy};

static BARE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Resolution outcome of the implicit stage. `method` names which rule
/// fired, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImplicitResult {
    pub item_id: Option<u32>,
    pub price: Option<u32>,
    pub method: Option<&'static str>,
}

/// Infers id/price from leftover bare numbers once anchors came up short.
///
/// These are plausibility heuristics, not certainties: a glued "4350" is
/// read as item 43 at 50 baht only because both halves pass their
/// validators. Ambiguous leftovers resolve to nothing rather than to a
/// guess that fails validation.
pub struct ImplicitResolver {
    id_policy: IdPolicy,
    price_policy: PricePolicy,
}

impl ImplicitResolver {
    pub fn new(id_policy: IdPolicy, price_policy: PricePolicy) -> Self {
        Self {
            id_policy,
            price_policy,
        }
    }

    pub fn resolve(
        &self,
        remaining_text: &str,
        known_id: Option<u32>,
        known_price: Option<u32>,
    ) -> ImplicitResult {
        let mut result = ImplicitResult {
            item_id: known_id,
            price: known_price,
            method: None,
        };

        if result.item_id.is_some() && result.price.is_some() {
            return result;
        }

        let numbers: Vec<(u32, usize)> = BARE_NUMBER
            .find_iter(remaining_text)
            .filter_map(|m| m.as_str().parse().ok().map(|n| (n, m.as_str().len())))
            .collect();

        if numbers.is_empty() {
            return result;
        }

        match (result.item_id, result.price) {
            (None, None) => {
                if numbers.len() == 1 {
                    let (n, digits) = numbers[0];
                    // A lone 3-4 digit number may be a glued id+price
                    // ("4350" → 43 / 50); both halves must validate
                    if (3..=4).contains(&digits) {
                        let id_half = n / 100;
                        let price_half = n % 100;
                        if self.id_policy.is_valid(id_half)
                            && self.price_policy.is_valid(price_half)
                            && price_half != 0
                        {
                            result.item_id = Some(id_half);
                            result.price = Some(price_half);
                            result.method = Some("digit-split");
                            return result;
                        }
                    }
                    if self.id_policy.is_valid(n) {
                        result.item_id = Some(n);
                        result.method = Some("implicit-id");
                    }
                } else {
                    // Pair rule: first number is the id, second the price
                    let (first, _) = numbers[0];
                    let (second, _) = numbers[1];
                    if self.id_policy.is_valid(first) && self.price_policy.is_valid(second) {
                        result.item_id = Some(first);
                        result.price = Some(second);
                        result.method = Some("implicit-pair");
                    }
                }
            }
            (Some(_), None) if numbers.len() == 1 => {
                let (n, _) = numbers[0];
                if self.price_policy.is_valid(n) {
                    result.price = Some(n);
                    result.method = Some("implicit-price");
                }
            }
            (None, Some(_)) if numbers.len() == 1 => {
                let (n, _) = numbers[0];
                if self.id_policy.is_valid(n) {
                    result.item_id = Some(n);
                    result.method = Some("implicit-id");
                }
            }
            _ => {}
        }

        result
    }
}
