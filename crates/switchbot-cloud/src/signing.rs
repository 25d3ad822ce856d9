//! Request Signing
//!
//! Every SwitchBot Cloud API call carries a `(t, nonce, sign)` triple where
//! `sign = base64(HMAC-SHA256(secret, token + t + nonce))`. A triple is built
//! fresh per request and never stored.

use crate::config::SignatureEncoding;
use crate::error::CloudError;
use crate::Result;
use base64::{engine::general_purpose::STANDARD as B64, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use tracing::debug;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// API token + shared secret, provisioned out of band.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            secret: secret.into(),
        }
    }
}

// never print the secret, and only a prefix of the token
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown: String = self.token.chars().take(6).collect();
        f.debug_struct("Credentials")
            .field("token", &format!("{shown}..."))
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Per-request authentication triple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTriple {
    /// Epoch milliseconds
    pub timestamp: i64,
    pub nonce: String,
    pub signature: String,
}

/// Exact byte sequence the signature covers
pub fn string_to_sign(token: &str, timestamp: i64, nonce: &str) -> String {
    format!("{token}{timestamp}{nonce}")
}

/// Signature Generator
///
/// Keyed once at construction so a broken HMAC setup fails at startup
/// rather than on the first click.
#[derive(Clone)]
pub struct Signer {
    token: String,
    mac: HmacSha256,
    encoding: SignatureEncoding,
}

impl Signer {
    pub fn new(credentials: &Credentials, encoding: SignatureEncoding) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(credentials.secret.as_bytes())
            .map_err(|e| CloudError::Config(format!("Cannot key HMAC-SHA256: {}", e)))?;

        Ok(Self {
            token: credentials.token.clone(),
            mac,
            encoding,
        })
    }

    /// Token sent in the `Authorization` header
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Fresh triple from the wall clock and a random v4 UUID nonce
    pub fn sign(&self) -> AuthTriple {
        let timestamp = Utc::now().timestamp_millis();
        let nonce = Uuid::new_v4().to_string();
        self.sign_with(timestamp, nonce)
    }

    /// Deterministic signing step for a given timestamp and nonce
    pub fn sign_with(&self, timestamp: i64, nonce: impl Into<String>) -> AuthTriple {
        let nonce = nonce.into();
        let message = string_to_sign(&self.token, timestamp, &nonce);

        let mut mac = self.mac.clone();
        mac.update(message.as_bytes());
        let digest = mac.finalize().into_bytes();

        let encoded = B64.encode(digest);
        let signature = match self.encoding {
            SignatureEncoding::Standard => encoded,
            SignatureEncoding::Uppercase => encoded.to_ascii_uppercase(),
        };

        debug!(
            timestamp,
            nonce = %nonce,
            signed_len = message.len(),
            encoding = ?self.encoding,
            "Signed request"
        );

        AuthTriple {
            timestamp,
            nonce,
            signature,
        }
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}
