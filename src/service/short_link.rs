use backon::{ConstantBuilder, Retryable};
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::codec::{Alphabet, generate_short_code};
use crate::config::ShortLinkConfig;
use crate::db::models::ShortLink;
use crate::db::store::Store;
use crate::error::PassError;
use crate::service::clock::Clock;

/// Maps short codes to target URLs.
///
/// Expired and never-issued codes both resolve to `None`; callers cannot tell
/// them apart.
#[derive(Clone)]
pub struct ShortLinkResolver {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    code_length: usize,
    alphabet: Alphabet,
    max_attempts: usize,
}

impl ShortLinkResolver {
    pub fn new(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        code_length: usize,
        alphabet: Alphabet,
        max_attempts: usize,
    ) -> Self {
        Self {
            store,
            clock,
            code_length,
            alphabet,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_config(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        cfg: &ShortLinkConfig,
    ) -> Result<Self, PassError> {
        let alphabet = Alphabet::new(&cfg.alphabet)?;
        Ok(Self::new(
            store,
            clock,
            cfg.code_length,
            alphabet,
            cfg.max_attempts,
        ))
    }

    /// Store `target_url` under a freshly generated code and return the code.
    pub async fn create_short_code(
        &self,
        target_url: &str,
        ttl: Option<Duration>,
    ) -> Result<String, PassError> {
        self.create_short_link(target_url, ttl)
            .await
            .map(|link| link.code)
    }

    /// Like [`Self::create_short_code`] but returns the stored row.
    ///
    /// A code that is already taken is regenerated, up to `max_attempts`
    /// inserts in total, after which [`PassError::Capacity`] is returned.
    pub async fn create_short_link(
        &self,
        target_url: &str,
        ttl: Option<Duration>,
    ) -> Result<ShortLink, PassError> {
        validate_target(target_url)?;
        if ttl.is_some_and(|ttl| ttl <= Duration::zero()) {
            return Err(PassError::InvalidTtl);
        }

        let policy = ConstantBuilder::default()
            .with_delay(std::time::Duration::ZERO)
            .with_max_times(self.max_attempts - 1);

        let this = self;
        let insert = move || async move {
            let created_at = this.clock.now();
            let expires_at = match ttl {
                Some(ttl) => Some(
                    created_at
                        .checked_add_signed(ttl)
                        .ok_or(PassError::InvalidTtl)?,
                ),
                None => None,
            };
            let link = ShortLink {
                code: generate_short_code(this.code_length, &this.alphabet)?,
                target_url: target_url.to_string(),
                created_at,
                expires_at,
            };
            this.store.insert_short_link(&link).await?;
            Ok::<_, PassError>(link)
        };

        let link = insert
            .retry(policy)
            .when(PassError::is_conflict)
            .notify(|_err, _dur| debug!("short code collision, regenerating"))
            .await
            .map_err(|e| match e {
                PassError::Conflict => {
                    warn!(attempts = self.max_attempts, "short code space exhausted");
                    PassError::Capacity {
                        attempts: self.max_attempts,
                    }
                }
                other => other,
            })?;

        info!(
            code = %link.code,
            expires_at = ?link.expires_at,
            "short link created"
        );
        Ok(link)
    }

    /// Resolve `code` to its target. Exact, case-sensitive match.
    pub async fn get_original_url(&self, code: &str) -> Result<Option<String>, PassError> {
        let Some(link) = self.store.find_short_link(code).await? else {
            return Ok(None);
        };
        if !link.is_live_at(self.clock.now()) {
            debug!(code, "short link expired");
            return Ok(None);
        }
        Ok(Some(link.target_url))
    }
}

/// Only absolute http(s) URLs are accepted as redirect targets.
///
/// The stored string is sent back verbatim as a `Location` header value.
/// `Url::parse` drops tabs and newlines instead of rejecting them.
fn validate_target(target_url: &str) -> Result<(), PassError> {
    if target_url
        .chars()
        .any(|c| c.is_ascii_control() || c.is_whitespace())
    {
        return Err(PassError::UnservableTarget);
    }
    let url = Url::parse(target_url)?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(PassError::UnsupportedScheme(other.to_string())),
    }
}
