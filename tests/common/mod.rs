#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use eventpass::PassError;
use eventpass::config::Config;
use eventpass::db::{
    PurgeReport, Session, ShortLink, SqliteStore, Store, StoreCounts, User, UserId,
    VerificationToken,
};
use eventpass::router::AppState;
use eventpass::service::{Clock, ManualClock};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub struct Harness {
    pub sqlite: SqliteStore,
    pub store: Arc<dyn Store>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub async fn new() -> Self {
        let sqlite = SqliteStore::connect_in_memory()
            .await
            .expect("in-memory sqlite");
        let store: Arc<dyn Store> = Arc::new(sqlite.clone());
        Self {
            sqlite,
            store,
            clock: Arc::new(ManualClock::new(t0())),
        }
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub fn state(&self, cfg: &Config) -> AppState {
        AppState::new(self.store.clone(), self.clock(), cfg).expect("app state")
    }

    pub async fn seed_user(&self, id: UserId, username: &str) -> User {
        let user = User {
            id,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            email_verified: false,
            password_hash: format!("$argon2id$v=19$hash-of-{username}"),
        };
        self.store.insert_user(&user).await.expect("insert user");
        user
    }
}

/// Wraps a real store but reports every short-link insert as a duplicate key.
pub struct CollidingStore {
    pub inner: Arc<dyn Store>,
    pub short_link_inserts: AtomicUsize,
}

impl CollidingStore {
    pub fn new(inner: Arc<dyn Store>) -> Self {
        Self {
            inner,
            short_link_inserts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.short_link_inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Store for CollidingStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, PassError> {
        self.inner.find_user(id).await
    }
    async fn insert_user(&self, user: &User) -> Result<(), PassError> {
        self.inner.insert_user(user).await
    }
    async fn mark_email_verified(&self, id: UserId) -> Result<bool, PassError> {
        self.inner.mark_email_verified(id).await
    }
    async fn find_session(&self, token: &str) -> Result<Option<Session>, PassError> {
        self.inner.find_session(token).await
    }
    async fn insert_session(&self, session: &Session) -> Result<(), PassError> {
        self.inner.insert_session(session).await
    }
    async fn delete_session(&self, token: &str) -> Result<bool, PassError> {
        self.inner.delete_session(token).await
    }
    async fn find_short_link(&self, code: &str) -> Result<Option<ShortLink>, PassError> {
        self.inner.find_short_link(code).await
    }
    async fn insert_short_link(&self, _link: &ShortLink) -> Result<(), PassError> {
        self.short_link_inserts.fetch_add(1, Ordering::SeqCst);
        Err(PassError::Conflict)
    }
    async fn insert_verification_token(
        &self,
        token: &VerificationToken,
    ) -> Result<(), PassError> {
        self.inner.insert_verification_token(token).await
    }
    async fn consume_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<VerificationToken>, PassError> {
        self.inner.consume_verification_token(token).await
    }
    async fn counts(&self) -> Result<StoreCounts, PassError> {
        self.inner.counts().await
    }
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<PurgeReport, PassError> {
        self.inner.purge_expired(now).await
    }
}

/// A store whose backend is gone: every call fails.
pub struct UnavailableStore;

fn unavailable() -> PassError {
    PassError::DatabaseError(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl Store for UnavailableStore {
    async fn find_user(&self, _id: UserId) -> Result<Option<User>, PassError> {
        Err(unavailable())
    }
    async fn insert_user(&self, _user: &User) -> Result<(), PassError> {
        Err(unavailable())
    }
    async fn mark_email_verified(&self, _id: UserId) -> Result<bool, PassError> {
        Err(unavailable())
    }
    async fn find_session(&self, _token: &str) -> Result<Option<Session>, PassError> {
        Err(unavailable())
    }
    async fn insert_session(&self, _session: &Session) -> Result<(), PassError> {
        Err(unavailable())
    }
    async fn delete_session(&self, _token: &str) -> Result<bool, PassError> {
        Err(unavailable())
    }
    async fn find_short_link(&self, _code: &str) -> Result<Option<ShortLink>, PassError> {
        Err(unavailable())
    }
    async fn insert_short_link(&self, _link: &ShortLink) -> Result<(), PassError> {
        Err(unavailable())
    }
    async fn insert_verification_token(
        &self,
        _token: &VerificationToken,
    ) -> Result<(), PassError> {
        Err(unavailable())
    }
    async fn consume_verification_token(
        &self,
        _token: &str,
    ) -> Result<Option<VerificationToken>, PassError> {
        Err(unavailable())
    }
    async fn counts(&self) -> Result<StoreCounts, PassError> {
        Err(unavailable())
    }
    async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<PurgeReport, PassError> {
        Err(unavailable())
    }
}
