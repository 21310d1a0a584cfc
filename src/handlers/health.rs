use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::router::AppState;

/// GET /health -> row counts when the store answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    match state.store.counts().await {
        Ok(counts) => Json(json!({ "status": "ok", "counts": counts })).into_response(),
        Err(e) => {
            error!(error = %e, "store health probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
                .into_response()
        }
    }
}
