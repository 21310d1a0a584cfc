use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::Redirect,
};
use chrono::Duration;
use tracing::info;

use crate::error::PassError;
use crate::middleware::auth::CurrentUser;
use crate::router::AppState;
use crate::types::{CreateShortLinkRequest, CreateShortLinkResponse};

/// GET /short/{code} -> temporary redirect to the target, or 404.
pub async fn resolve(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Redirect, PassError> {
    match state.links.get_original_url(&code).await? {
        Some(target) => Ok(Redirect::temporary(&target)),
        None => Err(PassError::NotFound),
    }
}

/// POST /short -> allocates a code for a signed-in user.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(auth): CurrentUser,
    Json(req): Json<CreateShortLinkRequest>,
) -> Result<(StatusCode, Json<CreateShortLinkResponse>), PassError> {
    let ttl = req
        .ttl_secs
        .map(|secs| {
            i64::try_from(secs)
                .ok()
                .and_then(Duration::try_seconds)
                .ok_or(PassError::InvalidTtl)
        })
        .transpose()?;

    let link = state.links.create_short_link(&req.target_url, ttl).await?;
    info!(user_id = auth.user.id, code = %link.code, "short link shared");

    Ok((
        StatusCode::CREATED,
        Json(CreateShortLinkResponse {
            code: link.code,
            expires_at: link.expires_at,
        }),
    ))
}
