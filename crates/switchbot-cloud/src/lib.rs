// ============================================================================
// SWITCHBOT-CLOUD - Authenticated Command Dispatcher
// ============================================================================
// Builds signed, replay-resistant SwitchBot Cloud API requests for device
// commands, sends them off the caller's thread and classifies the outcome.
//
// Flow:
// - Signer        -> fresh (t, nonce, sign) triple per request
// - build_request -> POST {base}/v1.1/devices/{id}/commands
// - Dispatcher    -> one attempt, bounded by a timeout
// - classify_*    -> CommandResult (Success | ApiError | TransportError | ConfigDefect)
// ============================================================================

pub mod config;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod request;
pub mod response;
pub mod signing;

pub use config::{CloudConfig, SignatureEncoding};
pub use device::DeviceDescriptor;
pub use dispatcher::{Completion, Dispatcher};
pub use error::CloudError;
pub use request::{build_request, command_url, CommandBody};
pub use response::{classify_error, classify_response, ApiEnvelope, CommandResult, TransportCause};
pub use signing::{AuthTriple, Credentials, Signer};

/// Re-export for convenience
pub type Result<T> = std::result::Result<T, CloudError>;
