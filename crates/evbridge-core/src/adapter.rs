//! Bridging adapter: forwards every event from one transport to another.

use std::sync::Arc;

use http::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::event::Event;
use crate::response::EventResponse;
use crate::transport::{Factory, ReceiveFn, Transport};

/// Transfers events received on one transport to another.
pub struct Adapter {
    receiver: Box<dyn Transport>,
    sender: Arc<dyn Transport>,
}

impl Adapter {
    /// Build both transports, receiver first.
    ///
    /// Fails with the first factory error; no adapter exists in that case.
    pub fn new(receiver_factory: &dyn Factory, sender_factory: &dyn Factory) -> Result<Self> {
        let receiver = receiver_factory.new_transport()?;
        let sender = sender_factory.new_transport()?;
        Ok(Self::from_transports(receiver, sender))
    }

    /// Pair two already-built transports.
    pub fn from_transports(receiver: Box<dyn Transport>, sender: Box<dyn Transport>) -> Self {
        Self {
            receiver,
            sender: Arc::from(sender),
        }
    }

    /// Register the forwarding callback and run the receiver until it stops.
    ///
    /// Returns whatever `start_receiver` returns, including
    /// [`Error::Cancelled`](crate::Error::Cancelled) after `cancel` fires.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        let sender = Arc::clone(&self.sender);
        let callback = ReceiveFn::new(move |cancel, event, response| {
            let sender = Arc::clone(&sender);
            Box::pin(async move { forward(sender.as_ref(), cancel, event, response).await })
        });
        self.receiver.set_receiver(Arc::new(callback));
        info!("Starting receiver");
        self.receiver.start_receiver(cancel).await
    }
}

/// Send one event and record the outcome in `response`.
///
/// A send error is both written to `response` and returned, so the receive
/// loop can decide whether to continue.
pub async fn forward(
    sender: &dyn Transport,
    cancel: &CancellationToken,
    event: Event,
    response: &mut EventResponse,
) -> Result<()> {
    debug!(event = %event, "Sending event");
    match sender.send(cancel, event).await {
        Ok(Some(reply)) => {
            debug!(event = %reply, "Sender got response");
            response.respond_with(StatusCode::ACCEPTED, reply);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => {
            if e.is_cancelled() {
                debug!("Send cancelled");
            } else {
                error!(error = %e, "Send error");
            }
            response.error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::Error;
    use crate::transport::Receiver;

    /// Sender stub returning a fixed outcome.
    enum Stub {
        Reply(Event),
        NoReply,
        Fail,
        Cancelled,
    }

    #[async_trait]
    impl Transport for Stub {
        async fn send(&self, _cancel: &CancellationToken, _event: Event) -> Result<Option<Event>> {
            match self {
                Self::Reply(e) => Ok(Some(e.clone())),
                Self::NoReply => Ok(None),
                Self::Fail => Err(Error::Send("sink unreachable".into())),
                Self::Cancelled => Err(Error::Cancelled),
            }
        }

        fn set_receiver(&mut self, _receiver: Arc<dyn Receiver>) {}

        async fn start_receiver(&mut self, _cancel: CancellationToken) -> Result<()> {
            Err(Error::Unsupported("stub has no receive side"))
        }
    }

    struct FailingFactory;

    impl Factory for FailingFactory {
        fn new_transport(&self) -> Result<Box<dyn Transport>> {
            Err(Error::Config("no sink configured".into()))
        }
    }

    struct StubFactory;

    impl Factory for StubFactory {
        fn new_transport(&self) -> Result<Box<dyn Transport>> {
            Ok(Box::new(Stub::NoReply))
        }
    }

    /// Collects formatted log output.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    /// Run `forward` against `stub` with a debug-level subscriber installed.
    async fn forward_logged(stub: &Stub, response: &mut EventResponse) -> (Result<()>, String) {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);
        let result = forward(stub, &CancellationToken::new(), event("1"), response).await;
        (result, logs.contents())
    }

    fn event(id: &str) -> Event {
        Event::builder(id, "t", "s").build().unwrap()
    }

    #[tokio::test]
    async fn forward_failure_marks_internal_error_and_returns_it() {
        let mut response = EventResponse::new();
        let err = forward(&Stub::Fail, &CancellationToken::new(), event("1"), &mut response)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Send(_)));
        assert_eq!(response.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(response.message(), Some(err.to_string().as_str()));
    }

    #[tokio::test]
    async fn cancelled_send_is_marked_but_not_logged_as_error() {
        let mut response = EventResponse::new();
        let (result, logs) = forward_logged(&Stub::Cancelled, &mut response).await;
        assert!(result.unwrap_err().is_cancelled());
        assert_eq!(response.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(logs.contains("Send cancelled"), "{logs}");
        assert!(!logs.contains("ERROR"), "{logs}");
    }

    #[tokio::test]
    async fn failed_send_is_logged_as_error() {
        let mut response = EventResponse::new();
        let (result, logs) = forward_logged(&Stub::Fail, &mut response).await;
        assert!(matches!(result, Err(Error::Send(_))));
        assert!(logs.contains("ERROR"), "{logs}");
        assert!(logs.contains("sink unreachable"), "{logs}");
    }

    #[tokio::test]
    async fn forward_reply_marks_accepted() {
        let reply = event("reply");
        let mut response = EventResponse::new();
        forward(
            &Stub::Reply(reply.clone()),
            &CancellationToken::new(),
            event("1"),
            &mut response,
        )
        .await
        .unwrap();
        assert_eq!(response.status(), Some(StatusCode::ACCEPTED));
        assert_eq!(response.event(), Some(&reply));
    }

    #[tokio::test]
    async fn forward_without_reply_leaves_response_unset() {
        let mut response = EventResponse::new();
        forward(&Stub::NoReply, &CancellationToken::new(), event("1"), &mut response)
            .await
            .unwrap();
        assert!(!response.is_set());
    }

    #[test]
    fn failing_receiver_factory_yields_no_adapter() {
        let err = Adapter::new(&FailingFactory, &StubFactory).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn failing_sender_factory_yields_no_adapter() {
        let err = Adapter::new(&StubFactory, &FailingFactory).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn run_returns_receiver_outcome_verbatim() {
        let mut adapter = Adapter::new(&StubFactory, &StubFactory).unwrap();
        let err = adapter.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }
}
