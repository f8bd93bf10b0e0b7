use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Input feeds
        .route("/chat/message", post(handlers::chat_message))
        .route("/voice/command", post(handlers::voice_command))
        // Inventory queries and operator corrections
        .route("/stock", get(handlers::get_stock))
        .route("/stock/:item_id", get(handlers::get_item))
        .route("/stock/:item_id", patch(handlers::update_item))
        .route("/stock/:item_id/cancel", post(handlers::cancel_item))
        // Buyer nicknames
        .route("/nicknames", put(handlers::put_nicknames))
        // Observability
        .route("/diagnostics", get(handlers::get_diagnostics))
        .route("/diagnostics", delete(handlers::clear_diagnostics))
        .route("/audio/reset", post(handlers::reset_audio))
        // Request logging + dashboard access
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
