use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::models::{Session, ShortLink, User, UserId, VerificationToken};
use crate::error::PassError;

/// Row counts per table, used as a connectivity probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub users: i64,
    pub sessions: i64,
    pub short_links: i64,
    pub verification_tokens: i64,
}

/// Rows removed by [`Store::purge_expired`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub sessions: u64,
    pub short_links: u64,
    pub verification_tokens: u64,
}

/// Persistence contract for the session and short-link services.
///
/// Lookups return `Ok(None)` for missing keys. Inserts report a duplicate key
/// as [`PassError::Conflict`] and a dangling `user_id` as
/// [`PassError::UnknownUser`]; every other failure is surfaced as-is.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, PassError>;

    async fn insert_user(&self, user: &User) -> Result<(), PassError>;

    /// Returns `false` when no such user exists.
    async fn mark_email_verified(&self, id: UserId) -> Result<bool, PassError>;

    async fn find_session(&self, token: &str) -> Result<Option<Session>, PassError>;

    async fn insert_session(&self, session: &Session) -> Result<(), PassError>;

    /// Single-row delete. Returns whether a row was removed.
    async fn delete_session(&self, token: &str) -> Result<bool, PassError>;

    async fn find_short_link(&self, code: &str) -> Result<Option<ShortLink>, PassError>;

    async fn insert_short_link(&self, link: &ShortLink) -> Result<(), PassError>;

    async fn insert_verification_token(&self, token: &VerificationToken)
    -> Result<(), PassError>;

    /// Delete the token and hand back the removed row in one statement, so two
    /// concurrent callers can never both observe it.
    async fn consume_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<VerificationToken>, PassError>;

    async fn counts(&self) -> Result<StoreCounts, PassError>;

    /// Drop every row whose expiry is at or before `now`.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<PurgeReport, PassError>;
}
