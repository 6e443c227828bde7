//! Client configuration.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Connection settings of a WissKI instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WisskiConfig {
    /// Base URL of the API, e.g. `https://example.org/wisski/api/v0`.
    pub base_url: String,
    /// HTTP basic auth user.
    pub username: Option<String>,
    pub password: Option<String>,
    /// Headers sent with every request.
    pub headers: BTreeMap<String, String>,
    /// Timeout of ordinary requests.
    pub timeout_secs: u64,
    /// Timeout of entity batch saves, which the remote processes slowly.
    pub save_timeout_secs: u64,
    /// Separator between values inside one CSV cell.
    pub csv_delimiter: String,
}

impl Default for WisskiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost/wisski/api/v0".to_string(),
            username: None,
            password: None,
            headers: BTreeMap::new(),
            timeout_secs: 60,
            save_timeout_secs: 1200,
            csv_delimiter: "|".to_string(),
        }
    }
}

impl WisskiConfig {
    /// Config for `base_url` with every other setting at its default.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_basic_auth(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Loads a JSON config file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> ApiResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ApiResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(ApiError::Config("base_url must not be empty".into()));
        }
        if self.timeout_secs == 0 || self.save_timeout_secs == 0 {
            return Err(ApiError::Config("timeouts must be positive".into()));
        }
        if self.csv_delimiter.is_empty() {
            return Err(ApiError::Config("csv_delimiter must not be empty".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn save_timeout(&self) -> Duration {
        Duration::from_secs(self.save_timeout_secs)
    }

    /// Joins `path` onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
