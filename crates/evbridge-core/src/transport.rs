//! Transport, receive-callback and factory capabilities.
//!
//! Any type implementing [`Transport`] can sit on either side of an
//! [`Adapter`](crate::adapter::Adapter). Concrete variants live in their own
//! crates; the in-memory one is in [`crate::testing`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::event::Event;
use crate::response::EventResponse;

/// Boxed future returned by functions wrapped in [`ReceiveFn`].
pub type ReceiveFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Callback invoked by a transport once per inbound event.
#[async_trait]
pub trait Receiver: Send + Sync {
    /// Process `event`, recording the outcome in `response`.
    ///
    /// The returned error goes back to the transport's receive loop, which
    /// alone decides whether to keep going.
    async fn receive(
        &self,
        cancel: &CancellationToken,
        event: Event,
        response: &mut EventResponse,
    ) -> Result<()>;
}

/// Wraps a plain function as a [`Receiver`].
pub struct ReceiveFn<F> {
    f: F,
}

impl<F> ReceiveFn<F>
where
    F: for<'a> Fn(&'a CancellationToken, Event, &'a mut EventResponse) -> ReceiveFuture<'a>
        + Send
        + Sync,
{
    pub const fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Receiver for ReceiveFn<F>
where
    F: for<'a> Fn(&'a CancellationToken, Event, &'a mut EventResponse) -> ReceiveFuture<'a>
        + Send
        + Sync,
{
    async fn receive(
        &self,
        cancel: &CancellationToken,
        event: Event,
        response: &mut EventResponse,
    ) -> Result<()> {
        (self.f)(cancel, event, response).await
    }
}

/// A pluggable endpoint that sends events and/or runs a receive loop.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one event, returning the peer's reply event if any.
    ///
    /// Returns only once the medium accepted or rejected the event, or with
    /// [`Error::Cancelled`](crate::Error::Cancelled) once `cancel` fires.
    async fn send(&self, cancel: &CancellationToken, event: Event) -> Result<Option<Event>>;

    /// Register the callback for inbound events, replacing any previous one.
    fn set_receiver(&mut self, receiver: Arc<dyn Receiver>);

    /// Deliver inbound events to the registered callback until end of input,
    /// an unrecoverable error, or cancellation.
    async fn start_receiver(&mut self, cancel: CancellationToken) -> Result<()>;
}

/// Configuration value able to build one [`Transport`].
pub trait Factory: Send + Sync {
    fn new_transport(&self) -> Result<Box<dyn Transport>>;
}
