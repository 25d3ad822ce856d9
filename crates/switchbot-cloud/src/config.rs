//! Cloud API Configuration
//!
//! Endpoint, timeout and signing options for the dispatcher. Loaded as the
//! `cloud` section of the desktop config file or built programmatically.

use crate::error::CloudError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Vendor status code meaning "command accepted"
pub const SUCCESS_STATUS_CODE: i64 = 100;

/// How the base64 HMAC digest is rendered in the `sign` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureEncoding {
    /// Plain standard base64 (what the reference controller sends)
    #[default]
    Standard,
    /// Standard base64, then ASCII upper-cased
    Uppercase,
}

/// Cloud API Configuration
///
/// # Configuration in config.json
///
/// ```json
/// {
///   "cloud": {
///     "baseUrl": "https://api.switch-bot.com",
///     "timeoutMs": 10000,
///     "signatureEncoding": "standard"
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudConfig {
    /// Base URL of the SwitchBot Cloud API.
    ///
    /// Default: `https://api.switch-bot.com`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Ceiling for one command round trip, in milliseconds.
    ///
    /// Default: `10000`
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Rendering of the request signature.
    ///
    /// Default: `standard`
    #[serde(default)]
    pub signature_encoding: SignatureEncoding,

    /// Vendor `statusCode` value treated as success.
    ///
    /// Default: `100`
    #[serde(default = "default_success_code")]
    pub success_code: i64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "https://api.switch-bot.com".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_success_code() -> i64 {
    SUCCESS_STATUS_CODE
}

fn default_user_agent() -> String {
    format!("switchbot-desk/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            signature_encoding: SignatureEncoding::default(),
            success_code: default_success_code(),
            user_agent: default_user_agent(),
        }
    }
}

impl CloudConfig {
    /// Configuration pointing at a local endpoint, used by tests and dev setups.
    pub fn local(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Override the timeout ceiling
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Effective timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Reject settings the dispatcher cannot work with
    pub fn validate(&self) -> crate::Result<()> {
        if self.timeout_ms == 0 {
            return Err(CloudError::Config("timeoutMs must be greater than zero".into()));
        }
        let url = url::Url::parse(&self.base_url)?;
        if url.cannot_be_a_base() {
            return Err(CloudError::InvalidEndpoint(self.base_url.clone()));
        }
        Ok(())
    }
}
