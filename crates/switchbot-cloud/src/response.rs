// ============================================================================
// SWITCHBOT-CLOUD - Result Classifier
// ============================================================================
// Maps every way a command call can end into exactly one CommandResult.
// Nothing here returns an error or panics: malformed bodies, unknown fields
// and odd status codes all land in a variant.
// ============================================================================

use crate::device::DeviceDescriptor;
use crate::error::CloudError;
use serde_json::Value;
use std::fmt;

/// Fallback message when the vendor body gives nothing usable
pub const UNEXPECTED_RESPONSE: &str = "unexpected response";

// ============================================================================
// DATA TYPES
// ============================================================================

/// Short category for a failure below the HTTP layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportCause {
    Timeout,
    Connect,
    Dns,
    Tls,
    Body,
    Other,
}

impl TransportCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportCause::Timeout => "timeout",
            TransportCause::Connect => "connection failed",
            TransportCause::Dns => "dns lookup failed",
            TransportCause::Tls => "tls failure",
            TransportCause::Body => "response read failed",
            TransportCause::Other => "request failed",
        }
    }

    /// Categorize a reqwest failure without leaking its full text
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return TransportCause::Timeout;
        }

        if has_tls_error(err) {
            return TransportCause::Tls;
        }
        let chain = source_chain(err);
        if chain.contains("dns") || chain.contains("failed to lookup") {
            return TransportCause::Dns;
        }
        if err.is_connect() {
            return TransportCause::Connect;
        }
        if err.is_body() || err.is_decode() {
            return TransportCause::Body;
        }
        TransportCause::Other
    }
}

impl fmt::Display for TransportCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when a rustls error sits anywhere in the chain, including inside the
/// `io::Error` that tokio-rustls wraps handshake failures in.
fn has_tls_error(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = std::error::Error::source(err);
    while let Some(inner) = source {
        if inner.is::<rustls::Error>() {
            return true;
        }
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            if io.get_ref().is_some_and(|e| e.is::<rustls::Error>()) {
                return true;
            }
        }
        source = inner.source();
    }
    false
}

fn source_chain(err: &reqwest::Error) -> String {
    let mut text = String::new();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        text.push_str(&inner.to_string().to_lowercase());
        text.push(' ');
        source = inner.source();
    }
    text
}

/// Outcome of one command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// HTTP 2xx and the vendor success code
    Success { device_id: String },

    /// The vendor answered but rejected or did not confirm the command
    ApiError {
        device_id: String,
        code: i64,
        message: String,
    },

    /// No usable answer: connectivity, TLS, timeout
    TransportError {
        device_id: String,
        cause: TransportCause,
    },

    /// Bad descriptor or settings, caught before any network call
    ConfigDefect { device_id: String, reason: String },
}

impl CommandResult {
    pub fn device_id(&self) -> &str {
        match self {
            CommandResult::Success { device_id }
            | CommandResult::ApiError { device_id, .. }
            | CommandResult::TransportError { device_id, .. }
            | CommandResult::ConfigDefect { device_id, .. } => device_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CommandResult::Success { .. })
    }

    /// Outcome category, for logs and tests
    pub fn kind(&self) -> &'static str {
        match self {
            CommandResult::Success { .. } => "success",
            CommandResult::ApiError { .. } => "api_error",
            CommandResult::TransportError { .. } => "transport_error",
            CommandResult::ConfigDefect { .. } => "config_defect",
        }
    }

    /// Convert a builder/config failure into a result
    pub fn from_config_error(device_id: impl Into<String>, err: &CloudError) -> Self {
        CommandResult::ConfigDefect {
            device_id: device_id.into(),
            reason: err.to_string(),
        }
    }

    /// The one status line shown to the user for this outcome
    pub fn status_line(&self, descriptor: &DeviceDescriptor) -> String {
        let name = descriptor.display_name();
        match self {
            CommandResult::Success { .. } => {
                format!("{}: {} command sent successfully", name, descriptor.command)
            }
            CommandResult::ApiError { code, message, .. } => {
                format!("{}: API returned statusCode {} - {}", name, code, message)
            }
            CommandResult::TransportError { cause, .. } => {
                format!("{}: network error ({}), try again", name, cause)
            }
            CommandResult::ConfigDefect { reason, .. } => {
                format!("{}: configuration problem - {}", name, reason)
            }
        }
    }
}

/// Vendor response envelope: `{ statusCode, message, body }`.
///
/// Decoded by hand from a JSON value so that extra fields, a string
/// `statusCode` or a missing `message` never turn into a decode failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiEnvelope {
    pub status_code: Option<i64>,
    pub message: Option<String>,
    pub body: Option<Value>,
}

impl ApiEnvelope {
    pub fn decode(bytes: &[u8]) -> Self {
        let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(bytes) else {
            return Self::default();
        };

        let status_code = map.get("statusCode").and_then(|v| match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });

        let message = map.get("message").and_then(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Null | Value::String(_) => None,
            other => Some(other.to_string()),
        });

        Self {
            status_code,
            message,
            body: map.get("body").cloned(),
        }
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// Classify a response that made it back over the wire
pub fn classify_response(device_id: &str, http_status: u16, body: &[u8], success_code: i64) -> CommandResult {
    let envelope = ApiEnvelope::decode(body);
    let device_id = device_id.to_string();

    if !(200..300).contains(&http_status) {
        return CommandResult::ApiError {
            device_id,
            code: envelope.status_code.unwrap_or(i64::from(http_status)),
            message: envelope
                .message
                .unwrap_or_else(|| http_fallback_message(http_status).to_string()),
        };
    }

    match envelope.status_code {
        Some(code) if code == success_code => CommandResult::Success { device_id },
        Some(code) => CommandResult::ApiError {
            device_id,
            code,
            message: envelope.message.unwrap_or_else(|| UNEXPECTED_RESPONSE.to_string()),
        },
        None => CommandResult::ApiError {
            device_id,
            code: i64::from(http_status),
            message: UNEXPECTED_RESPONSE.to_string(),
        },
    }
}

/// Classify a failure that produced no response
pub fn classify_error(device_id: &str, err: &reqwest::Error) -> CommandResult {
    CommandResult::TransportError {
        device_id: device_id.to_string(),
        cause: TransportCause::from_reqwest(err),
    }
}

fn http_fallback_message(status: u16) -> &'static str {
    match status {
        401 => "unauthorized",
        403 => "forbidden",
        429 => "rate limited",
        _ => UNEXPECTED_RESPONSE,
    }
}
