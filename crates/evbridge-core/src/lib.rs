//! `evbridge` Core Library
//!
//! Building blocks for single-purpose event relay processes:
//! - Immutable [`Event`] envelope and its JSON codec
//! - [`Transport`], [`Receiver`] and [`Factory`] capabilities
//! - The [`Adapter`] that forwards events from one transport to another
//! - Configuration parsing, tracing setup and a conventional `main`
//! - Common error types

pub mod adapter;
pub mod codec;
pub mod config;
pub mod error;
pub mod event;
pub mod launcher;
pub mod response;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod tracing_init;
pub mod transport;

pub use adapter::Adapter;
pub use error::{Error, Result};
pub use event::{Event, EventBuilder};
pub use response::{EventResponse, ResponseOutcome};
pub use transport::{Factory, ReceiveFn, ReceiveFuture, Receiver, Transport};
