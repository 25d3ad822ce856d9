//! Command Dispatcher
//!
//! Runs one signed command call per invocation on the tokio runtime, bounded
//! by the configured timeout, and always hands back a [`CommandResult`].
//! Callers that must not block (a UI loop) use [`Dispatcher::invoke`] or
//! [`Dispatcher::invoke_into`]; both return immediately.

use crate::config::CloudConfig;
use crate::device::DeviceDescriptor;
use crate::error::CloudError;
use crate::request::build_request;
use crate::response::{classify_error, classify_response, CommandResult, TransportCause};
use crate::signing::{Credentials, Signer};
use crate::Result;
use reqwest::{Client, Request};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A finished invocation, as delivered to the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub descriptor: DeviceDescriptor,
    pub result: CommandResult,
}

impl Completion {
    pub fn status_line(&self) -> String {
        self.result.status_line(&self.descriptor)
    }
}

/// Signed command dispatcher.
///
/// Cheap to clone; clones share the HTTP client, signer and settings, all of
/// which are read-only after construction.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    signer: Signer,
    config: CloudConfig,
    runtime: Option<Handle>,
}

impl Dispatcher {
    /// Create a dispatcher. Fails fast on unusable settings or HTTP backend.
    pub fn new(credentials: &Credentials, config: CloudConfig) -> Result<Self> {
        config.validate()?;
        let signer = Signer::new(credentials, config.signature_encoding)?;

        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| CloudError::HttpClient(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                signer,
                config,
                runtime: None,
            }),
        })
    }

    /// Spawn invocations on `handle` instead of the caller's ambient runtime.
    ///
    /// Needed when `invoke` is called from a thread that is not inside tokio.
    pub fn with_runtime(self, handle: Handle) -> Self {
        let inner = match Arc::try_unwrap(self.inner) {
            Ok(mut inner) => {
                inner.runtime = Some(handle);
                inner
            }
            Err(shared) => Inner {
                http: shared.http.clone(),
                signer: shared.signer.clone(),
                config: shared.config.clone(),
                runtime: Some(handle),
            },
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &CloudConfig {
        &self.inner.config
    }

    /// Run one command attempt to completion. Never retries, never errors.
    pub async fn execute(&self, descriptor: &DeviceDescriptor) -> CommandResult {
        let config = &self.inner.config;
        let auth = self.inner.signer.sign();

        let request = match build_request(&config.base_url, descriptor, &auth, self.inner.signer.token()) {
            Ok(request) => request,
            Err(e) => {
                warn!(device_id = %descriptor.id, code = e.code(), "Command not sent: {}", e);
                return CommandResult::from_config_error(descriptor.id.clone(), &e);
            }
        };

        info!(
            device_id = %descriptor.id,
            command = %descriptor.command,
            command_type = %descriptor.command_type,
            "Dispatching command"
        );

        let started = Instant::now();
        let result = match tokio::time::timeout(config.timeout(), self.round_trip(request)).await {
            Err(_) => CommandResult::TransportError {
                device_id: descriptor.id.clone(),
                cause: TransportCause::Timeout,
            },
            Ok(Err(e)) => {
                debug!(device_id = %descriptor.id, error = %e, "Transport failure detail");
                classify_error(&descriptor.id, &e)
            }
            Ok(Ok((status, body))) => {
                debug!(
                    device_id = %descriptor.id,
                    status,
                    body = %String::from_utf8_lossy(&body),
                    "Raw API response"
                );
                classify_response(&descriptor.id, status, &body, config.success_code)
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            CommandResult::Success { .. } => {
                info!(device_id = %descriptor.id, elapsed_ms, "Command accepted");
            }
            CommandResult::ApiError { code, message, .. } => {
                warn!(device_id = %descriptor.id, code, elapsed_ms, "API rejected command: {}", message);
            }
            CommandResult::TransportError { cause, .. } => {
                warn!(device_id = %descriptor.id, elapsed_ms, "Transport error: {}", cause);
            }
            CommandResult::ConfigDefect { .. } => {}
        }

        result
    }

    async fn round_trip(&self, request: Request) -> reqwest::Result<(u16, Vec<u8>)> {
        let response = self.inner.http.execute(request).await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok((status, body.to_vec()))
    }

    /// Start a command in the background and return its handle at once.
    pub fn invoke(&self, descriptor: DeviceDescriptor) -> JoinHandle<CommandResult> {
        let dispatcher = self.clone();
        self.spawn(async move { dispatcher.execute(&descriptor).await })
    }

    /// Start a command in the background; the result arrives on `sink`.
    ///
    /// A closed receiver is not an error: the shell may already be gone.
    /// The handle only reports when delivery finished and may be dropped.
    pub fn invoke_into(&self, descriptor: DeviceDescriptor, sink: mpsc::UnboundedSender<Completion>) -> JoinHandle<()> {
        let dispatcher = self.clone();
        self.spawn(async move {
            let result = dispatcher.execute(&descriptor).await;
            if sink.send(Completion { descriptor, result }).is_err() {
                debug!("Completion dropped, receiver closed");
            }
        })
    }

    fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: std::future::Future + Send + 'static,
        F::Output: Send + 'static,
    {
        match &self.inner.runtime {
            Some(handle) => handle.spawn(future),
            None => tokio::spawn(future),
        }
    }
}
