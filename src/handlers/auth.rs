use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use crate::error::PassError;
use crate::middleware::auth::{CurrentUser, raw_cookie_header};
use crate::router::AppState;
use crate::types::{PublicUser, VerifyEmailRequest};

/// POST /auth/logout -> revokes the session named by the cookie and expires
/// the cookie. Succeeds whether or not a session existed.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap, jar: CookieJar) -> Response {
    let jar = jar.add(clear_cookie(state.sessions.cookie_name(), state.secure_cookie));

    let raw = raw_cookie_header(&headers);
    if let Some(token) = state.sessions.token_from_cookie(raw.as_deref())
        && let Err(err) = state.sessions.delete_session(token).await
    {
        // The row may still be live; do not report a successful logout.
        return (jar, err).into_response();
    }

    (jar, StatusCode::NO_CONTENT).into_response()
}

/// GET /auth/users -> the user owning the session cookie, or 401.
pub async fn session_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PublicUser>, PassError> {
    let raw = raw_cookie_header(&headers);
    let auth = state
        .sessions
        .get_session_from_cookie(raw.as_deref())
        .await?
        .ok_or(PassError::Unauthorized)?;
    Ok(Json(auth.user))
}

/// GET /user -> same payload as `/auth/users`, via the extractor.
pub async fn current_user(CurrentUser(auth): CurrentUser) -> Json<PublicUser> {
    Json(auth.user)
}

/// POST /auth/verify-email -> redeems a single-use verification token.
pub async fn verify_email(
    State(state): State<AppState>,
    Json(req): Json<VerifyEmailRequest>,
) -> Result<StatusCode, PassError> {
    match state.verification.consume(req.token.trim()).await? {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(PassError::NotFound),
    }
}

fn clear_cookie(name: &str, secure: bool) -> Cookie<'static> {
    Cookie::build(Cookie::new(name.to_string(), ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::ZERO)
        .build()
}
