use eventpass::config::Config;
use eventpass::db::{SqliteStore, Store};
use eventpass::router::{AppState, eventpass_router};
use eventpass::service::{Clock, SystemClock};
use mimalloc::MiMalloc;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.server.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.server.database_url,
        listen_addr = %cfg.server.listen_addr,
        loglevel = %cfg.server.loglevel,
        session_ttl_secs = cfg.session.ttl_secs,
        code_length = cfg.short_link.code_length,
    );
    if cfg.server.insecure_cookie {
        warn!("cookies are issued without the Secure attribute");
    }

    // One pool for the whole process, closed after the server drains.
    let sqlite = SqliteStore::connect(&cfg.server.database_url).await?;
    let store: Arc<dyn Store> = Arc::new(sqlite.clone());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    match store.purge_expired(clock.now()).await {
        Ok(report) => info!(
            sessions = report.sessions,
            short_links = report.short_links,
            verification_tokens = report.verification_tokens,
            "purged expired rows"
        ),
        Err(e) => warn!(error = %e, "failed to purge expired rows"),
    }

    let state = AppState::new(store, clock, &cfg)?;
    let app = eventpass_router(state);

    let listener = TcpListener::bind(&cfg.server.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.server.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sqlite.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
