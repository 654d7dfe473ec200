//! NDJSON transport over async byte streams.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use evbridge_core::codec::{decode_json, encode_json};
use evbridge_core::{Error, Event, EventResponse, Receiver, Result, Transport};

type BoxReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Transport that reads events from one stream and writes them to another.
///
/// Each event is one JSON envelope per line. Inbound events are delivered
/// strictly one after another, so input order is preserved.
pub struct FileTransport {
    reader: Mutex<Option<BoxReader>>,
    writer: Option<Mutex<BoxWriter>>,
    receiver: Option<Arc<dyn Receiver>>,
}

impl FileTransport {
    pub fn new(reader: Option<BoxReader>, writer: Option<BoxWriter>) -> Self {
        Self {
            reader: Mutex::new(reader),
            writer: writer.map(Mutex::new),
            receiver: None,
        }
    }

    /// Receive-only transport reading from `reader`.
    pub fn reading(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self::new(Some(Box::new(reader)), None)
    }

    /// Send-only transport writing to `writer`.
    pub fn writing(writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self::new(None, Some(Box::new(writer)))
    }
}

#[async_trait]
impl Transport for FileTransport {
    async fn send(&self, cancel: &CancellationToken, event: Event) -> Result<Option<Event>> {
        let writer = self
            .writer
            .as_ref()
            .ok_or(Error::Unsupported("file transport has no output"))?;
        let mut line = encode_json(&event)?;
        line.push(b'\n');

        tokio::select! {
            () = cancel.cancelled() => Err(Error::Cancelled),
            res = async {
                let mut out = writer.lock().await;
                out.write_all(&line).await?;
                out.flush().await
            } => {
                res?;
                Ok(None)
            }
        }
    }

    fn set_receiver(&mut self, receiver: Arc<dyn Receiver>) {
        self.receiver = Some(receiver);
    }

    async fn start_receiver(&mut self, cancel: CancellationToken) -> Result<()> {
        let receiver = self.receiver.clone().ok_or_else(|| {
            Error::Construction("start_receiver called before set_receiver".into())
        })?;
        let reader = self
            .reader
            .get_mut()
            .take()
            .ok_or(Error::Unsupported("file transport has no input"))?;
        let mut lines = BufReader::new(reader);
        let mut buf = Vec::new();
        let mut line_no: u64 = 0;

        loop {
            buf.clear();
            let n = tokio::select! {
                () = cancel.cancelled() => return Err(Error::Cancelled),
                res = lines.read_until(b'\n', &mut buf) => res?,
            };
            // EOF with no partial data is the normal end of input.
            if n == 0 {
                debug!(lines = line_no, "End of input");
                return Ok(());
            }
            line_no += 1;
            if buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let event = decode_json(&buf).inspect_err(|e| {
                warn!(line = line_no, error = %e, "Cannot decode event");
            })?;
            let mut response = EventResponse::new();
            receiver.receive(&cancel, event, &mut response).await?;
        }
    }
}
