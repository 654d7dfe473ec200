//! evbridge-file
//!
//! Relays NDJSON events from a file (or stdin) to a file (or stdout).
//!
//! ```text
//! ADAPTER_RECEIVER='{"input":"stdin"}' ADAPTER_SENDER='{"output":"stdout"}' evbridge-file
//! ```

use std::process::ExitCode;

use evbridge_core::launcher::adapter_main;
use evbridge_file::{FileReceiverFactory, FileSenderFactory};

#[tokio::main]
async fn main() -> ExitCode {
    adapter_main::<FileReceiverFactory, FileSenderFactory>(env!("CARGO_BIN_NAME")).await
}
