//! API configuration
//!
//! Read from `API_*` environment variables (after `.env` is loaded by the
//! binary). Anything unset keeps its development default.

use serde::Deserialize;
use std::time::Duration;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// Access token lifetime in seconds
    pub access_token_secs: u64,
    /// Refresh token lifetime in seconds
    pub refresh_token_secs: u64,
    /// Lifetime of email verification and password reset links, in seconds
    pub link_token_secs: u64,
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Directory uploaded pictures are written under
    pub media_root: String,
    /// Base URL of the web client, used in mailed links
    pub frontend_url: String,
    /// Prediction service base URL; the in-process heuristic is used when unset
    pub scorer_url: Option<String>,
    pub scorer_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            access_token_secs: 15 * 60,
            refresh_token_secs: 7 * 24 * 3600,
            link_token_secs: 24 * 3600,
            database_url: "postgres://localhost/nestmate".to_string(),
            log_level: "info".to_string(),
            media_root: "media".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            scorer_url: None,
            scorer_timeout_secs: 5,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn scorer_timeout(&self) -> Duration {
        Duration::from_secs(self.scorer_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert!(config.refresh_token_secs > config.access_token_secs);
        assert!(config.scorer_url.is_none());
    }
}
