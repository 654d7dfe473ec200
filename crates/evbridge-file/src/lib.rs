//! `evbridge` File Transport
//!
//! Reads and writes events as newline-delimited JSON envelopes:
//! - [`FileTransport`] over any async reader and/or writer
//! - [`FileReceiverFactory`] / [`FileSenderFactory`] for files and stdio

pub mod factory;
pub mod transport;

pub use factory::{FileReceiverFactory, FileSenderFactory};
pub use transport::FileTransport;
