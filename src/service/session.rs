//! Server-side sessions: issue, validate, revoke.
//!
//! There is no session cache. Every validation is a fresh store read, so a
//! deleted row stops authenticating on the very next request.

use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::codec::{SESSION_TOKEN_BYTES, generate_token};
use crate::config::SessionConfig;
use crate::db::models::{Session, UserId, token_prefix};
use crate::db::store::Store;
use crate::error::PassError;
use crate::middleware::cookie::extract_cookie;
use crate::service::clock::Clock;
use crate::types::PublicUser;

/// A live session joined with its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSession {
    pub session: Session,
    pub user: PublicUser,
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    cookie_name: Arc<str>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        cookie_name: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            store,
            clock,
            ttl,
            cookie_name: cookie_name.into(),
        }
    }

    pub fn from_config(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        cfg: &SessionConfig,
    ) -> Result<Self, PassError> {
        let ttl = i64::try_from(cfg.ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| PassError::Config(format!("session ttl {} out of range", cfg.ttl_secs)))?;
        Ok(Self::new(store, clock, ttl, cfg.cookie_name.as_str()))
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Issue and persist a new session for `user_id`.
    pub async fn create_session(&self, user_id: UserId) -> Result<Session, PassError> {
        let token = generate_token(SESSION_TOKEN_BYTES)?;
        let created_at = self.clock.now();
        let expires_at = created_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| PassError::Config("session expiry overflows".into()))?;
        let session = Session {
            token,
            user_id,
            created_at,
            expires_at,
        };
        self.store.insert_session(&session).await?;
        info!(
            user_id,
            token = token_prefix(&session.token),
            expires_at = %session.expires_at,
            "session created"
        );
        Ok(session)
    }

    /// Pull the session token out of a raw `Cookie` header, if any.
    pub fn token_from_cookie<'a>(&self, raw_cookie_header: Option<&'a str>) -> Option<&'a str> {
        raw_cookie_header.and_then(|raw| extract_cookie(raw, &self.cookie_name))
    }

    /// Resolve the session named in a raw `Cookie` header.
    ///
    /// A missing header, missing cookie, unknown token or expired session all
    /// yield `Ok(None)`. Store failures are returned as errors.
    pub async fn get_session_from_cookie(
        &self,
        raw_cookie_header: Option<&str>,
    ) -> Result<Option<AuthenticatedSession>, PassError> {
        match self.token_from_cookie(raw_cookie_header) {
            Some(token) => self.get_session(token).await,
            None => Ok(None),
        }
    }

    pub async fn get_session(
        &self,
        token: &str,
    ) -> Result<Option<AuthenticatedSession>, PassError> {
        let Some(session) = self.store.find_session(token).await? else {
            debug!(token = token_prefix(token), "session not found");
            return Ok(None);
        };
        // Expired rows are left in place; purging is a separate job.
        if !session.is_valid_at(self.clock.now()) {
            debug!(token = token_prefix(token), "session expired");
            return Ok(None);
        }
        let Some(user) = self.store.find_user(session.user_id).await? else {
            warn!(
                user_id = session.user_id,
                token = token_prefix(token),
                "session references a missing user"
            );
            return Ok(None);
        };
        Ok(Some(AuthenticatedSession {
            session,
            user: user.into(),
        }))
    }

    /// Revoke a session. Deleting an unknown token is not an error.
    pub async fn delete_session(&self, token: &str) -> Result<(), PassError> {
        let removed = self.store.delete_session(token).await?;
        info!(token = token_prefix(token), removed, "session deleted");
        Ok(())
    }
}
