//! HTTP server transport: every POST carries one inbound event.
//!
//! Requests are served concurrently, one callback invocation per request.
//! A callback error only fails its own request; the server keeps running
//! until the cancellation token fires.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use evbridge_core::{
    Error, Event, EventResponse, Receiver, ResponseOutcome, Result, Transport,
};

use crate::binary;

#[derive(Clone)]
struct ServerState {
    receiver: Arc<dyn Receiver>,
    cancel: CancellationToken,
}

/// Receive-only transport backed by an `axum` server.
pub struct HttpReceiver {
    listener: Option<std::net::TcpListener>,
    local_addr: SocketAddr,
    receiver: Option<Arc<dyn Receiver>>,
}

impl HttpReceiver {
    /// Bind the listening socket. Port 0 picks a free port.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = std::net::TcpListener::bind(addr)
            .map_err(|e| Error::Construction(format!("cannot listen on {addr}: {e}")))?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener: Some(listener),
            local_addr,
            receiver: None,
        })
    }

    /// Address actually bound.
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[async_trait]
impl Transport for HttpReceiver {
    async fn send(&self, _cancel: &CancellationToken, _event: Event) -> Result<Option<Event>> {
        Err(Error::Unsupported("HTTP receiver cannot send"))
    }

    fn set_receiver(&mut self, receiver: Arc<dyn Receiver>) {
        self.receiver = Some(receiver);
    }

    async fn start_receiver(&mut self, cancel: CancellationToken) -> Result<()> {
        let receiver = self.receiver.clone().ok_or_else(|| {
            Error::Construction("start_receiver called before set_receiver".into())
        })?;
        let listener = self
            .listener
            .take()
            .ok_or_else(|| Error::Construction("HTTP receiver already started".into()))?;
        let listener = tokio::net::TcpListener::from_std(listener)?;

        let state = ServerState {
            receiver,
            cancel: cancel.clone(),
        };
        let app = axum::Router::new().fallback(handle).with_state(state);

        info!(addr = %self.local_addr, "HTTP receiver listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(cancel.clone().cancelled_owned())
            .await?;

        // serve only returns cleanly after the shutdown signal.
        Err(Error::Cancelled)
    }
}

async fn handle(
    State(state): State<ServerState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    let event = match binary::read_event(&headers, body.to_vec()) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Rejecting malformed event");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let mut response = EventResponse::new();
    let result = state
        .receiver
        .receive(&state.cancel, event, &mut response)
        .await;

    match (response.into_outcome(), result) {
        (Some(ResponseOutcome::Accepted { status, event }), _) => reply_with_event(status, &event),
        (Some(ResponseOutcome::Failed { status, message }), _) => {
            (status, message).into_response()
        }
        (None, Err(e)) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
        (None, Ok(())) => StatusCode::ACCEPTED.into_response(),
    }
}

fn reply_with_event(status: StatusCode, event: &Event) -> Response {
    let mut headers = HeaderMap::new();
    if let Err(e) = binary::write_headers(event, &mut headers) {
        warn!(error = %e, "Cannot encode response event");
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }
    (status, headers, event.data().to_vec()).into_response()
}
