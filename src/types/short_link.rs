use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateShortLinkRequest {
    pub target_url: String,
    /// Lifetime in seconds; absent means the link never expires.
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateShortLinkResponse {
    pub code: String,
    pub expires_at: Option<DateTime<Utc>>,
}
