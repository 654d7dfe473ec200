//! HTTP client transport: posts each event to a sink.

use std::sync::Arc;

use async_trait::async_trait;
use http::HeaderMap;
use reqwest::Url;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use evbridge_core::{Error, Event, Receiver, Result, Transport};

use crate::binary;

/// Send-only transport that POSTs events in binary content mode.
#[derive(Debug)]
pub struct HttpSender {
    http: reqwest::Client,
    target: Url,
}

impl HttpSender {
    pub fn new(target: Url) -> Result<Self> {
        // reqwest is built with `rustls-no-provider`; `Err` means a provider
        // is already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Construction(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { http, target })
    }

    pub const fn target(&self) -> &Url {
        &self.target
    }

    async fn post(&self, event: Event) -> Result<Option<Event>> {
        let mut headers = HeaderMap::new();
        binary::write_headers(&event, &mut headers)?;
        let resp = self
            .http
            .post(self.target.clone())
            .headers(headers)
            .body(event.data().to_vec())
            .send()
            .await
            .map_err(|e| Error::Send(format!("POST {}: {e}", self.target)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Send(format!("{} returned {status}: {body}", self.target)));
        }
        debug!(status = %status, target = %self.target, "Event delivered");
        if !binary::has_event(resp.headers()) {
            return Ok(None);
        }
        let headers = resp.headers().clone();
        let body = resp
            .bytes()
            .await
            .map_err(|e| Error::Send(format!("reading response from {}: {e}", self.target)))?;
        binary::read_event(&headers, body.to_vec()).map(Some)
    }
}

#[async_trait]
impl Transport for HttpSender {
    async fn send(&self, cancel: &CancellationToken, event: Event) -> Result<Option<Event>> {
        tokio::select! {
            () = cancel.cancelled() => Err(Error::Cancelled),
            res = self.post(event) => res,
        }
    }

    fn set_receiver(&mut self, _receiver: Arc<dyn Receiver>) {}

    async fn start_receiver(&mut self, _cancel: CancellationToken) -> Result<()> {
        Err(Error::Unsupported("HTTP sender cannot receive"))
    }
}
