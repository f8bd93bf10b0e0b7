use super::state::AppState;
use crate::ledger::ItemUpdate;
use crate::session::Utterance;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::error;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct VoiceCommandRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub price: Option<u32>,
    pub size: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /chat/message
/// Feed one chat message through the pipeline
pub async fn chat_message(
    State(state): State<AppState>,
    Json(utterance): Json<Utterance>,
) -> impl IntoResponse {
    match state.processor.process_message(utterance).await {
        Ok(actions) => (StatusCode::OK, Json(actions)).into_response(),
        Err(e) => {
            error!("Failed to process message: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to process message: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// POST /voice/command
/// Feed one transcribed operator command
pub async fn voice_command(
    State(state): State<AppState>,
    Json(req): Json<VoiceCommandRequest>,
) -> impl IntoResponse {
    match state.processor.process_voice_command(&req.text).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => {
            error!("Failed to process voice command: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to process voice command: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// GET /stock
/// Full inventory snapshot for the dashboard
pub async fn get_stock(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.ledger.store().snapshot().await;
    (StatusCode::OK, Json(snapshot))
}

/// GET /stock/:item_id
pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<u32>,
) -> impl IntoResponse {
    let snapshot = state.ledger.store().snapshot().await;
    match snapshot.items.get(&item_id) {
        Some(item) => (StatusCode::OK, Json(item.clone())).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Item {} is not claimed", item_id),
            }),
        )
            .into_response(),
    }
}

/// PATCH /stock/:item_id
/// Operator correction of price/size on a claimed item
pub async fn update_item(
    State(state): State<AppState>,
    Path(item_id): Path<u32>,
    Json(req): Json<UpdateItemRequest>,
) -> impl IntoResponse {
    let update = ItemUpdate {
        price: req.price,
        size: req.size,
    };
    match state.ledger.update_fields(item_id, update).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!("Failed to update item {}: {e:#}", item_id);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to update item: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// POST /stock/:item_id/cancel
/// Operator-side cancel; promotes the queue head if one is waiting
pub async fn cancel_item(
    State(state): State<AppState>,
    Path(item_id): Path<u32>,
) -> impl IntoResponse {
    match state.ledger.cancel(item_id).await {
        Ok(Some(outcome)) => (StatusCode::OK, Json(outcome)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Item {} is not claimed", item_id),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to cancel item {}: {e:#}", item_id);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to cancel item: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// PUT /nicknames
/// Replace the nickname cache with a fresh snapshot from the dashboard
pub async fn put_nicknames(
    State(state): State<AppState>,
    Json(snapshot): Json<std::collections::HashMap<String, String>>,
) -> impl IntoResponse {
    state.nicknames.apply_snapshot(snapshot).await;
    StatusCode::NO_CONTENT
}

/// GET /diagnostics
/// Recent utterance resolutions, oldest first
pub async fn get_diagnostics(State(state): State<AppState>) -> impl IntoResponse {
    let records = state.log.recent().await;
    (StatusCode::OK, Json(records))
}

/// DELETE /diagnostics
pub async fn clear_diagnostics(State(state): State<AppState>) -> impl IntoResponse {
    state.log.clear().await;
    StatusCode::NO_CONTENT
}

/// POST /audio/reset
/// Drop queued audio and cut off the clip in flight
pub async fn reset_audio(State(state): State<AppState>) -> impl IntoResponse {
    state.audio.reset().await;
    StatusCode::NO_CONTENT
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
