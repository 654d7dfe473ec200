//! Conventional `main` for adapter binaries.
//!
//! Parses the command line (configuration may also come from the
//! environment), sets up logging and signal-driven cancellation, then runs
//! an [`Adapter`] between the two configured transports.

use std::process::ExitCode;

use clap::Parser;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::adapter::Adapter;
use crate::config::{RECEIVER_ENV, SENDER_ENV, parse_factory};
use crate::error::Result;
use crate::tracing_init::{default_filter, init_tracing};
use crate::transport::Factory;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Transfers events from a receiver transport to a sender transport")]
pub struct AdapterArgs {
    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, env = "EVBRIDGE_LOG_JSON")]
    pub log_json: bool,

    /// JSON configuration for the receiver (incoming) transport.
    #[arg(long, env = RECEIVER_ENV, default_value = "", hide_default_value = true)]
    pub receiver: String,

    /// JSON configuration for the sender (outgoing) transport.
    #[arg(long, env = SENDER_ENV, default_value = "", hide_default_value = true)]
    pub sender: String,
}

/// Parse both factory configurations, build the adapter and run it.
pub async fn run_adapter<R, S>(args: &AdapterArgs, cancel: CancellationToken) -> Result<()>
where
    R: Factory + DeserializeOwned,
    S: Factory + DeserializeOwned,
{
    let receiver_factory: R = parse_factory(RECEIVER_ENV, &args.receiver)?;
    let sender_factory: S = parse_factory(SENDER_ENV, &args.sender)?;
    info!(receiver = %args.receiver, sender = %args.sender, "Creating transports");
    let mut adapter = Adapter::new(&receiver_factory, &sender_factory)?;
    adapter.run(cancel).await
}

/// Entry point shared by adapter binaries.
///
/// Exit code is 0 when the receiver reaches end of input or the process is
/// asked to stop, 1 on any startup or run failure.
pub async fn adapter_main<R, S>(bin_name: &str) -> ExitCode
where
    R: Factory + DeserializeOwned,
    S: Factory + DeserializeOwned,
{
    let args = AdapterArgs::parse();
    init_tracing(&default_filter(bin_name, args.debug), args.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        bin = bin_name,
        "Starting adapter"
    );

    let cancel = cancel_on_shutdown_signal();
    match run_adapter::<R, S>(&args, cancel).await {
        Ok(()) => {
            info!("Adapter stopped: end of input");
            ExitCode::SUCCESS
        }
        Err(e) if e.is_cancelled() => {
            info!("Adapter stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Adapter run error");
            ExitCode::FAILURE
        }
    }
}

/// Token cancelled on Ctrl+C or SIGTERM.
pub fn cancel_on_shutdown_signal() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = ctrl_c() => info!("Received Ctrl+C shutdown signal"),
            () = sigterm() => info!("Received SIGTERM shutdown signal"),
        }
        trigger.cancel();
    });
    cancel
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn sigterm() {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            warn!(error = %e, "Cannot listen for SIGTERM");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn sigterm() {
    std::future::pending::<()>().await;
}
