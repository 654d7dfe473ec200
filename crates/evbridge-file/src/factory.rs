//! Factories for file and stdio transports.

use serde::Deserialize;
use tracing::info;

use evbridge_core::{Error, Factory, Result, Transport};

use crate::transport::FileTransport;

/// Name that selects the process's standard input.
pub const STDIN: &str = "stdin";

/// Name that selects the process's standard output.
pub const STDOUT: &str = "stdout";

/// Receiver configuration: `{"input": "stdin" | "<path>"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct FileReceiverFactory {
    pub input: String,
}

impl Factory for FileReceiverFactory {
    fn new_transport(&self) -> Result<Box<dyn Transport>> {
        if self.input.is_empty() {
            return Err(Error::Config("'input' must not be empty".into()));
        }
        if self.input == STDIN {
            info!("Reading events from stdin");
            return Ok(Box::new(FileTransport::reading(tokio::io::stdin())));
        }
        let file = std::fs::File::open(&self.input)
            .map_err(|e| Error::Construction(format!("cannot open {}: {e}", self.input)))?;
        info!(path = %self.input, "Reading events from file");
        Ok(Box::new(FileTransport::reading(tokio::fs::File::from_std(
            file,
        ))))
    }
}

/// Sender configuration: `{"output": "stdout" | "<path>"}`.
///
/// A path is created, or truncated if it exists.
#[derive(Debug, Clone, Deserialize)]
pub struct FileSenderFactory {
    pub output: String,
}

impl Factory for FileSenderFactory {
    fn new_transport(&self) -> Result<Box<dyn Transport>> {
        if self.output.is_empty() {
            return Err(Error::Config("'output' must not be empty".into()));
        }
        if self.output == STDOUT {
            info!("Writing events to stdout");
            return Ok(Box::new(FileTransport::writing(tokio::io::stdout())));
        }
        let file = std::fs::File::create(&self.output)
            .map_err(|e| Error::Construction(format!("cannot create {}: {e}", self.output)))?;
        info!(path = %self.output, "Writing events to file");
        Ok(Box::new(FileTransport::writing(tokio::fs::File::from_std(
            file,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use evbridge_core::config::parse_factory;

    use super::*;

    #[test]
    fn parses_documented_config_shape() {
        let f: FileReceiverFactory = parse_factory("receiver", r#"{"input":"stdin"}"#).unwrap();
        assert_eq!(f.input, STDIN);
        let f: FileSenderFactory = parse_factory("sender", r#"{"output":"/tmp/x"}"#).unwrap();
        assert_eq!(f.output, "/tmp/x");
    }

    #[test]
    fn empty_paths_are_config_errors() {
        let err = FileReceiverFactory { input: String::new() }
            .new_transport()
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));
        let err = FileSenderFactory { output: String::new() }
            .new_transport()
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_input_file_is_construction_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.ndjson");
        let err = FileReceiverFactory {
            input: path.display().to_string(),
        }
        .new_transport()
        .err()
        .unwrap();
        assert!(matches!(err, Error::Construction(ref m) if m.contains("absent.ndjson")));
    }
}
