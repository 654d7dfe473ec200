//! In-memory transport and event helpers for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::event::Event;
use crate::response::EventResponse;
use crate::transport::{Factory, Receiver, Transport};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A valid event with a sequential id and `data` as its JSON payload.
#[allow(clippy::missing_panics_doc, clippy::expect_used)]
pub fn make_event(data: &str) -> Event {
    Event::builder(
        NEXT_ID.fetch_add(1, Ordering::Relaxed).to_string(),
        "test.event.type",
        "test/event/source",
    )
    .time(Utc::now())
    .json_data(data)
    .and_then(crate::event::EventBuilder::build)
    .expect("test event is valid")
}

/// Test-side ends of a [`MockTransport`]'s queues.
pub struct MockHandle {
    /// Feeds the receive loop. Dropping it ends the loop with `Ok(())`.
    pub received: mpsc::Sender<Event>,
    /// Every event passed to `send`, in order.
    pub sent: mpsc::Receiver<Event>,
}

/// Transport backed by two bounded in-memory queues.
///
/// Delivery is sequential, so event order is preserved end to end.
pub struct MockTransport {
    sent: mpsc::Sender<Event>,
    received: Option<mpsc::Receiver<Event>>,
    receiver: Option<Arc<dyn Receiver>>,
}

impl MockTransport {
    pub fn new(capacity: usize) -> (Self, MockHandle) {
        let (sent_tx, sent_rx) = mpsc::channel(capacity);
        let (received_tx, received_rx) = mpsc::channel(capacity);
        let transport = Self {
            sent: sent_tx,
            received: Some(received_rx),
            receiver: None,
        };
        let handle = MockHandle {
            received: received_tx,
            sent: sent_rx,
        };
        (transport, handle)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, cancel: &CancellationToken, event: Event) -> Result<Option<Event>> {
        tokio::select! {
            () = cancel.cancelled() => Err(Error::Cancelled),
            res = self.sent.send(event) => {
                res.map_err(|_| Error::Send("mock sent queue closed".into()))?;
                Ok(None)
            }
        }
    }

    fn set_receiver(&mut self, receiver: Arc<dyn Receiver>) {
        self.receiver = Some(receiver);
    }

    async fn start_receiver(&mut self, cancel: CancellationToken) -> Result<()> {
        // Without a callback there is nothing to deliver to; only wait to be stopped.
        let Some(receiver) = self.receiver.clone() else {
            cancel.cancelled().await;
            return Err(Error::Cancelled);
        };
        let mut inbound = self
            .received
            .take()
            .ok_or_else(|| Error::Construction("mock receiver already started".into()))?;
        loop {
            tokio::select! {
                () = cancel.cancelled() => return Err(Error::Cancelled),
                next = inbound.recv() => {
                    let Some(event) = next else { return Ok(()) };
                    let mut response = EventResponse::new();
                    receiver.receive(&cancel, event, &mut response).await?;
                }
            }
        }
    }
}

/// Factory for [`MockTransport`]s; keeps the handle of every transport it builds.
#[derive(Default, Deserialize)]
pub struct MockTransportFactory {
    pub capacity: usize,
    #[serde(skip)]
    handles: Mutex<VecDeque<MockHandle>>,
}

impl MockTransportFactory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            handles: Mutex::new(VecDeque::new()),
        }
    }

    /// Handle of the oldest transport not yet claimed.
    pub fn take_handle(&self) -> Option<MockHandle> {
        self.handles.lock().ok()?.pop_front()
    }
}

impl Factory for MockTransportFactory {
    fn new_transport(&self) -> Result<Box<dyn Transport>> {
        if self.capacity == 0 {
            return Err(Error::Config("capacity must be positive".into()));
        }
        let (transport, handle) = MockTransport::new(self.capacity);
        self.handles
            .lock()
            .map_err(|_| Error::Construction("mock handle registry poisoned".into()))?
            .push_back(handle);
        Ok(Box::new(transport))
    }
}

/// Receiver that copies every event onto a channel and reports success.
pub struct ChannelReceiver {
    tx: mpsc::Sender<Event>,
}

impl ChannelReceiver {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Receiver for ChannelReceiver {
    async fn receive(
        &self,
        _cancel: &CancellationToken,
        event: Event,
        _response: &mut EventResponse,
    ) -> Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| Error::Send("channel receiver closed".into()))
    }
}
