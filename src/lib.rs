pub mod codec;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;
pub mod types;

pub use error::PassError;
pub use router::{AppState, eventpass_router};
pub use service::{SessionManager, ShortLinkResolver, VerificationService};
