pub mod ai;
pub mod audio;
pub mod config;
pub mod http;
pub mod ledger;
pub mod pipeline;
pub mod session;

pub use ai::{AiExtraction, AiExtractor, AiFallback, GeminiExtractor};
pub use audio::{AudioSerializer, AudioTask, SfxKind};
pub use config::Config;
pub use http::{create_router, AppState};
pub use ledger::{
    CancelOutcome, ClaimOutcome, ItemUpdate, MemoryStockStore, ReservationLedger, StockItem,
    StockSnapshot, StockStore,
};
pub use pipeline::{Action, ActionKind, IdPolicy, IntentRouter, PricePolicy, Routed};
pub use session::{
    NicknameCache, ResolutionLog, SalesProcessor, Utterance, VoiceControl, VoiceOutcome,
};
