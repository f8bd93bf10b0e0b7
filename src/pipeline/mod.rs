//! Intent & field extraction pipeline
//!
//! Turns one noisy chat/voice utterance into structured actions. Stages
//! run in fixed priority order, each consuming the text spans it matched:
//! - Normalizer: numerals, spoken numbers, keyword fixes, noise stripping
//! - Attribute extractor: bust/length/size/fabric (quarantined first)
//! - Anchor extractor: keyword-anchored intent, item id and price
//! - Implicit resolver: bare-number heuristics (pair rule, digit split)
//! - AI fallback: debounced remote extraction, only when no id was found

mod anchors;
mod attributes;
mod implicit;
mod normalizer;
mod router;
mod validators;

pub use anchors::{AnchorExtractor, AnchorResult, IntentHint};
pub use attributes::{AttributeExtraction, AttributeExtractor, AttributeSet};
pub use implicit::{ImplicitResolver, ImplicitResult};
pub use normalizer::Normalizer;
pub use router::{Action, ActionKind, IntentRouter, Routed};
pub use validators::{is_plausible_bust, is_plausible_length, IdPolicy, PricePolicy};
