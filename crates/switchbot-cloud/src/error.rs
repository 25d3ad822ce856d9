// ============================================================================
// SWITCHBOT-CLOUD - Error Types
// ============================================================================

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CloudError {
    // ==================== Configuration Defects ====================
    #[error("Invalid descriptor for device '{device_id}': missing {field}")]
    InvalidDescriptor { device_id: String, field: &'static str },

    #[error("Invalid API endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // ==================== Runtime Errors ====================
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CloudError {
    /// Stable code for logs and status lines
    pub fn code(&self) -> &'static str {
        match self {
            CloudError::InvalidDescriptor { .. } => "SB_INVALID_DESCRIPTOR",
            CloudError::InvalidEndpoint(_) => "SB_INVALID_ENDPOINT",
            CloudError::Config(_) => "SB_CONFIG",
            CloudError::HttpClient(_) => "SB_HTTP_CLIENT",
            CloudError::Serialization(_) => "SB_SERIALIZATION",
        }
    }

    /// Whether this error stems from bad configuration rather than the network
    pub fn is_config_defect(&self) -> bool {
        matches!(
            self,
            CloudError::InvalidDescriptor { .. }
                | CloudError::InvalidEndpoint(_)
                | CloudError::Config(_)
        )
    }
}

impl From<serde_json::Error> for CloudError {
    fn from(err: serde_json::Error) -> Self {
        CloudError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for CloudError {
    fn from(err: url::ParseError) -> Self {
        CloudError::InvalidEndpoint(err.to_string())
    }
}
