//! evbridge-http
//!
//! Accepts events over HTTP and forwards them to an HTTP sink.
//!
//! ```text
//! ADAPTER_RECEIVER='{"listenAddr":":8080"}' \
//! ADAPTER_SENDER='{"sinkURI":"http://broker.local/"}' evbridge-http
//! ```

use std::process::ExitCode;

use evbridge_core::launcher::adapter_main;
use evbridge_http::{HttpReceiverFactory, HttpSenderFactory};

#[tokio::main]
async fn main() -> ExitCode {
    adapter_main::<HttpReceiverFactory, HttpSenderFactory>(env!("CARGO_BIN_NAME")).await
}
