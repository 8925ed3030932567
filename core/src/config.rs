//! Client configuration.
//!
//! # Design
//! The backend keys, endpoints and API versions are plain data handed to
//! `NcmbClient` at construction. Nothing is read from process-wide state
//! after that, so two clients with different endpoints can coexist.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{ApiError, ApiResult};

pub const DEFAULT_ENDPOINT: &str = "https://mbaas.api.nifcloud.com/";
pub const DEFAULT_API_VERSION: &str = "2013-09-01";
pub const DEFAULT_SCRIPT_ENDPOINT: &str = "https://script.mbaas.api.nifcloud.com/";
pub const DEFAULT_SCRIPT_API_VERSION: &str = "2015-09-01";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Keys and endpoints used to build every request.
///
/// Deserializable so it can be loaded from a JSON settings file; any field
/// left out takes its default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NcmbConfig {
    pub application_key: String,
    /// HMAC key for request signatures. Empty leaves requests unsigned.
    pub client_key: String,
    pub endpoint: String,
    pub api_version: String,
    pub script_endpoint: String,
    pub script_api_version: String,
    #[serde(with = "timeout_secs")]
    pub timeout: Duration,
}

impl Default for NcmbConfig {
    fn default() -> Self {
        Self {
            application_key: String::new(),
            client_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            script_endpoint: DEFAULT_SCRIPT_ENDPOINT.to_string(),
            script_api_version: DEFAULT_SCRIPT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl NcmbConfig {
    pub fn new(application_key: &str, client_key: &str) -> Self {
        Self {
            application_key: application_key.to_string(),
            client_key: client_key.to_string(),
            ..Self::default()
        }
    }

    /// Read keys from `NCMB_APPLICATION_KEY` / `NCMB_CLIENT_KEY` and optional
    /// overrides from `NCMB_ENDPOINT` / `NCMB_API_VERSION`.
    pub fn from_env() -> ApiResult<Self> {
        let application_key = std::env::var("NCMB_APPLICATION_KEY")
            .map_err(|_| ApiError::MissingConfig("NCMB_APPLICATION_KEY"))?;
        let client_key = std::env::var("NCMB_CLIENT_KEY")
            .map_err(|_| ApiError::MissingConfig("NCMB_CLIENT_KEY"))?;
        let mut config = Self::new(&application_key, &client_key);
        if let Ok(endpoint) = std::env::var("NCMB_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Ok(api_version) = std::env::var("NCMB_API_VERSION") {
            config.api_version = api_version;
        }
        Ok(config)
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_api_version(mut self, api_version: &str) -> Self {
        self.api_version = api_version.to_string();
        self
    }

    pub fn with_script_endpoint(mut self, endpoint: &str) -> Self {
        self.script_endpoint = endpoint.to_string();
        self
    }

    pub fn with_script_api_version(mut self, api_version: &str) -> Self {
        self.script_api_version = api_version.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Timeouts are written as fractional seconds in settings files.
mod timeout_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
