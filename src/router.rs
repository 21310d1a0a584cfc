use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::config::Config;
use crate::db::store::Store;
use crate::error::PassError;
use crate::handlers::{auth, health, short_link};
use crate::service::{Clock, SessionManager, ShortLinkResolver, VerificationService};

/// Shared state handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sessions: SessionManager,
    pub links: ShortLinkResolver,
    pub verification: VerificationService,
    pub secure_cookie: bool,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, cfg: &Config) -> Result<Self, PassError> {
        Ok(Self {
            sessions: SessionManager::from_config(store.clone(), clock.clone(), &cfg.session)?,
            links: ShortLinkResolver::from_config(store.clone(), clock.clone(), &cfg.short_link)?,
            verification: VerificationService::from_config(
                store.clone(),
                clock,
                &cfg.verification,
            )?,
            secure_cookie: !cfg.server.insecure_cookie,
            store,
        })
    }
}

pub fn eventpass_router(state: AppState) -> Router {
    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/users", get(auth::session_user))
        .route("/auth/verify-email", post(auth::verify_email))
        .route("/user", get(auth::current_user))
        .route("/short", post(short_link::create))
        .route("/short/{code}", get(short_link::resolve))
        .route("/health", get(health::health))
        .with_state(state)
}
