//! Live session processing
//!
//! This module ties the pipeline, ledger and audio serializer together:
//! - `SalesProcessor` consumes chat messages and voice commands
//! - `NicknameCache` maps buyer uids to operator-assigned nicknames
//! - `VoiceControl` is the Idle/Listening/Restarting recognition loop
//! - `ResolutionLog` records how each utterance resolved, for offline
//!   analysis

mod diagnostics;
mod nickname;
mod processor;
mod voice;

pub use diagnostics::{ResolutionLog, ResolutionRecord, ResolutionStatus};
pub use nickname::NicknameCache;
pub use processor::{SalesProcessor, VoiceOutcome};
pub use voice::{VoiceControl, VoiceError, VoiceEvent, VoiceState};

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One unit of input text attributed to one speaker, from chat or
/// transcribed speech. Transient: consumed by the pipeline and discarded.
#[derive(Debug, Clone, Deserialize)]
pub struct Utterance {
    pub id: String,
    pub speaker_name: String,
    pub speaker_uid: String,
    #[serde(default)]
    pub is_admin: bool,
    pub text: String,
    pub received_at: DateTime<Utc>,
}
