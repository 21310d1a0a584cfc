use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};

use crate::codec::DEFAULT_ALPHABET;
use crate::error::PassError;

/// Environment prefix; nested keys use `__`, e.g. `EVENTPASS_SESSION__TTL_SECS`.
pub const ENV_PREFIX: &str = "EVENTPASS_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub short_link: ShortLinkConfig,
    pub verification: VerificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub loglevel: String,
    /// Drop the `Secure` attribute from cookies (plain-HTTP development only).
    pub insecure_cookie: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            database_url: "sqlite://data.db".to_string(),
            loglevel: "info".to_string(),
            insecure_cookie: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub ttl_secs: u64,
    pub cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 7 * 24 * 3600,
            cookie_name: "eventpass_session".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortLinkConfig {
    pub code_length: usize,
    pub alphabet: String,
    /// Total insert attempts before giving up with a capacity error.
    pub max_attempts: usize,
}

impl Default for ShortLinkConfig {
    fn default() -> Self {
        Self {
            code_length: 6,
            alphabet: DEFAULT_ALPHABET.to_string(),
            max_attempts: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub ttl_secs: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self { ttl_secs: 24 * 3600 }
    }
}

impl Config {
    /// Defaults overlaid with `EVENTPASS_*` environment variables.
    pub fn load() -> Result<Self, PassError> {
        let cfg: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), PassError> {
        if self.session.ttl_secs == 0 {
            return Err(PassError::Config("session.ttl_secs must be positive".into()));
        }
        if self.session.cookie_name.is_empty()
            || !self
                .session
                .cookie_name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            return Err(PassError::Config(format!(
                "invalid session.cookie_name `{}`",
                self.session.cookie_name
            )));
        }
        if self.short_link.code_length < 4 {
            return Err(PassError::Config(
                "short_link.code_length must be at least 4".into(),
            ));
        }
        if self.short_link.max_attempts == 0 {
            return Err(PassError::Config(
                "short_link.max_attempts must be positive".into(),
            ));
        }
        if self.verification.ttl_secs == 0 {
            return Err(PassError::Config(
                "verification.ttl_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.short_link.code_length, 6);
        assert_eq!(cfg.short_link.alphabet.len(), 62);
    }

    #[test]
    fn env_overrides_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("EVENTPASS_SESSION__TTL_SECS", "3600");
            jail.set_env("EVENTPASS_SHORT_LINK__CODE_LENGTH", "8");
            let cfg = Config::load().expect("config should load");
            assert_eq!(cfg.session.ttl_secs, 3600);
            assert_eq!(cfg.short_link.code_length, 8);
            assert_eq!(cfg.server.listen_addr, "0.0.0.0:8000");
            Ok(())
        });
    }

    #[test]
    fn rejects_zero_ttl_and_bad_cookie_name() {
        let mut cfg = Config::default();
        cfg.session.ttl_secs = 0;
        assert!(matches!(cfg.validate(), Err(PassError::Config(_))));

        let mut cfg = Config::default();
        cfg.session.cookie_name = "bad name;".to_string();
        assert!(matches!(cfg.validate(), Err(PassError::Config(_))));
    }
}
