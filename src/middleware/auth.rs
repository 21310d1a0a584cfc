use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header::COOKIE, request::Parts};

use crate::error::PassError;
use crate::router::AppState;
use crate::service::AuthenticatedSession;

/// All `Cookie` headers of a request folded into one raw header string.
///
/// HTTP/2 clients may split cookies over several header lines. Values that
/// are not visible ASCII are skipped.
pub fn raw_cookie_header(headers: &HeaderMap) -> Option<String> {
    let parts: Vec<&str> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    (!parts.is_empty()).then(|| parts.join("; "))
}

/// Extractor for handlers that require a live session.
/// Rejects with `401` when the session cookie is missing, unknown or expired.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthenticatedSession);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = PassError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = raw_cookie_header(&parts.headers);
        state
            .sessions
            .get_session_from_cookie(raw.as_deref())
            .await?
            .map(CurrentUser)
            .ok_or(PassError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn folds_multiple_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=1"));
        headers.append(COOKIE, HeaderValue::from_static("eventpass_session=tok"));
        assert_eq!(
            raw_cookie_header(&headers).as_deref(),
            Some("a=1; eventpass_session=tok")
        );
    }

    #[test]
    fn no_cookie_header_is_none() {
        assert_eq!(raw_cookie_header(&HeaderMap::new()), None);
    }
}
