use std::sync::Arc;

use crate::audio::AudioSerializer;
use crate::ledger::ReservationLedger;
use crate::session::{NicknameCache, ResolutionLog, SalesProcessor};

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<SalesProcessor>,
    pub ledger: Arc<ReservationLedger>,
    pub audio: Arc<AudioSerializer>,
    pub nicknames: Arc<NicknameCache>,
    pub log: Arc<ResolutionLog>,
}
