//! SwitchBot Desk - Application Entry Point
//!
//! Loads the config once, builds the dispatcher from it and hands both to
//! the status-line shell. Logs go to stderr so stdout carries only status.

mod config;
mod shell;

use anyhow::Context;
use std::process::ExitCode;
use switchbot_cloud::Dispatcher;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::DesktopConfig;
use crate::shell::Shell;

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "switchbot_desk=info,switchbot_cloud=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let path = config::resolve_path(std::env::args().nth(1));
    let config = match DesktopConfig::load(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("SwitchBot Controller - Configuration Error");
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(path = %path.display(), devices = config.devices.len(), "Configuration loaded");

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = runtime.block_on(run(config));

    // in-flight commands are abandoned, not awaited
    runtime.shutdown_background();

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: DesktopConfig) -> anyhow::Result<()> {
    let dispatcher = Dispatcher::new(&config.credentials(), config.cloud.clone())
        .context("Failed to set up the SwitchBot client")?;

    let shell = Shell::new(config.panels(), dispatcher);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    shell.run(stdin, tokio::io::stdout()).await
}
