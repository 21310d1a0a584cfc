use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info};

use crate::codec::{SESSION_TOKEN_BYTES, generate_token};
use crate::config::VerificationConfig;
use crate::db::models::{UserId, VerificationToken, token_prefix};
use crate::db::store::Store;
use crate::error::PassError;
use crate::service::clock::Clock;

/// Single-use email verification tokens.
#[derive(Clone)]
pub struct VerificationService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl VerificationService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { store, clock, ttl }
    }

    pub fn from_config(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        cfg: &VerificationConfig,
    ) -> Result<Self, PassError> {
        let ttl = i64::try_from(cfg.ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                PassError::Config(format!("verification ttl {} out of range", cfg.ttl_secs))
            })?;
        Ok(Self::new(store, clock, ttl))
    }

    /// Mint a token for `user_id`. The caller delivers it out of band.
    pub async fn issue(&self, user_id: UserId) -> Result<VerificationToken, PassError> {
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| PassError::Config("verification expiry overflows".into()))?;
        let token = VerificationToken {
            token: generate_token(SESSION_TOKEN_BYTES)?,
            user_id,
            expires_at,
        };
        self.store.insert_verification_token(&token).await?;
        info!(user_id, token = token_prefix(&token.token), "verification token issued");
        Ok(token)
    }

    /// Redeem `token` and mark its owner's email as verified.
    ///
    /// The row is deleted before anything else happens, so a token can be
    /// redeemed at most once. Unknown, already used and expired tokens all
    /// yield `Ok(None)`.
    pub async fn consume(&self, token: &str) -> Result<Option<UserId>, PassError> {
        let Some(row) = self.store.consume_verification_token(token).await? else {
            debug!(token = token_prefix(token), "verification token not found");
            return Ok(None);
        };
        if !row.is_valid_at(self.clock.now()) {
            debug!(token = token_prefix(token), "verification token expired");
            return Ok(None);
        }
        if !self.store.mark_email_verified(row.user_id).await? {
            return Ok(None);
        }
        info!(user_id = row.user_id, "email verified");
        Ok(Some(row.user_id))
    }
}
