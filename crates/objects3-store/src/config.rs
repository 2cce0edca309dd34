//! Client configuration

use crate::{Result, StoreError};
use std::time::Duration;

/// Environment variable holding the endpoint URL
pub const ENV_ENDPOINT: &str = "OBJECTS3_ENDPOINT";
/// Environment variable holding the bearer token
pub const ENV_ACCESS_TOKEN: &str = "OBJECTS3_ACCESS_TOKEN";
/// Environment variable holding the request timeout in seconds
pub const ENV_TIMEOUT_SECS: &str = "OBJECTS3_TIMEOUT_SECS";

/// Client configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Service endpoint URL; buckets are addressed path-style below it
    pub endpoint: String,
    /// Access token (sent as a bearer token)
    pub access_token: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9000".to_string(),
            access_token: None,
            timeout: Duration::from_secs(30),
            user_agent: format!("objects3/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Create a new config with the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Load from the process environment, reading a `.env` file first if present.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Ok(endpoint) = std::env::var(ENV_ENDPOINT) {
            config.endpoint = endpoint;
        }
        if let Ok(token) = std::env::var(ENV_ACCESS_TOKEN) {
            config.access_token = Some(token);
        }
        if let Ok(secs) = std::env::var(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.parse().map_err(|_| {
                StoreError::Config(format!("{} must be a whole number of seconds", ENV_TIMEOUT_SECS))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Set the access token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL for API requests, without a trailing slash
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}
