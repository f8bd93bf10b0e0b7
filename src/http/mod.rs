//! HTTP API server for external control (operator dashboard)
//!
//! This module provides a REST API over the session core:
//! - POST /chat/message - Feed one chat utterance through the pipeline
//! - POST /voice/command - Feed one transcribed operator command
//! - GET /stock - Inventory snapshot
//! - GET /stock/:id - One claimed item
//! - PATCH /stock/:id - Correct price/size
//! - POST /stock/:id/cancel - Cancel a claim
//! - PUT /nicknames - Replace the buyer nickname snapshot
//! - GET /diagnostics - Recent utterance resolutions
//! - DELETE /diagnostics - Clear the resolution log
//! - POST /audio/reset - Flush the audio queue
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
