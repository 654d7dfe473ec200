//! Factory configuration.
//!
//! Each side of an adapter is configured by a JSON document that is
//! deserialized into that side's factory struct. The launcher reads the
//! documents from `--receiver` / `--sender` or the environment variables
//! below; nothing here touches process-wide state.

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Environment variable holding the receiver (incoming) configuration.
pub const RECEIVER_ENV: &str = "ADAPTER_RECEIVER";

/// Environment variable holding the sender (outgoing) configuration.
pub const SENDER_ENV: &str = "ADAPTER_SENDER";

/// Deserialize a factory from its JSON configuration.
///
/// `name` identifies the configuration source in error messages.
pub fn parse_factory<F: DeserializeOwned>(name: &str, json: &str) -> Result<F> {
    if json.trim().is_empty() {
        return Err(Error::Config(format!("no value for {name}")));
    }
    serde_json::from_str(json)
        .map_err(|e| Error::Config(format!("invalid configuration: {name}: {e}")))
}
