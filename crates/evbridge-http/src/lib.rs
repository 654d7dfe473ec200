//! `evbridge` HTTP Transport
//!
//! Events travel in binary content mode: attributes in `ce-*` headers,
//! payload as the request body.
//! - [`HttpSender`] posts events to a sink with `reqwest`
//! - [`HttpReceiver`] accepts events with an `axum` server
//! - [`HttpReceiverFactory`] / [`HttpSenderFactory`] build them from configuration

pub mod binary;
pub mod factory;
pub mod receiver;
pub mod sender;

pub use factory::{HttpReceiverFactory, HttpSenderFactory};
pub use receiver::HttpReceiver;
pub use sender::HttpSender;
