//! Per-event response object written by a receive callback.

use http::StatusCode;

use crate::event::Event;

/// Outcome recorded for one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Processing succeeded and produced a reply event.
    Accepted { status: StatusCode, event: Event },
    /// Processing failed.
    Failed { status: StatusCode, message: String },
}

/// Out-parameter handed to [`Receiver::receive`](crate::transport::Receiver::receive).
///
/// Left unset, it means the event was handled with nothing to report back.
/// Transports that answer a peer (HTTP) translate it into their reply; the
/// others drop it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventResponse {
    outcome: Option<ResponseOutcome>,
}

impl EventResponse {
    pub const fn new() -> Self {
        Self { outcome: None }
    }

    /// Record a reply event with `status`.
    pub fn respond_with(&mut self, status: StatusCode, event: Event) {
        self.outcome = Some(ResponseOutcome::Accepted { status, event });
    }

    /// Record a failure with `status` and a human-readable message.
    pub fn error(&mut self, status: StatusCode, message: impl Into<String>) {
        self.outcome = Some(ResponseOutcome::Failed {
            status,
            message: message.into(),
        });
    }

    pub const fn is_set(&self) -> bool {
        self.outcome.is_some()
    }

    pub const fn status(&self) -> Option<StatusCode> {
        match &self.outcome {
            Some(ResponseOutcome::Accepted { status, .. } | ResponseOutcome::Failed { status, .. }) => {
                Some(*status)
            }
            None => None,
        }
    }

    pub const fn event(&self) -> Option<&Event> {
        match &self.outcome {
            Some(ResponseOutcome::Accepted { event, .. }) => Some(event),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match &self.outcome {
            Some(ResponseOutcome::Failed { message, .. }) => Some(message),
            _ => None,
        }
    }

    pub fn into_outcome(self) -> Option<ResponseOutcome> {
        self.outcome
    }
}
