//! Immutable event envelope passed between transports.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};

/// Envelope schema version written when none is given.
pub const DEFAULT_SPEC_VERSION: &str = "1.0";

/// Content type used for JSON payloads.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A structured event with opaque payload bytes.
///
/// Events are built once through [`EventBuilder`] and never mutated
/// afterwards. Equality compares every attribute and the payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    id: String,
    event_type: String,
    source: String,
    time: Option<DateTime<Utc>>,
    data_content_type: Option<String>,
    data: Vec<u8>,
    spec_version: String,
}

impl Event {
    /// Start building an event with its three required attributes.
    pub fn builder(
        id: impl Into<String>,
        event_type: impl Into<String>,
        source: impl Into<String>,
    ) -> EventBuilder {
        EventBuilder {
            id: id.into(),
            event_type: event_type.into(),
            source: source.into(),
            time: None,
            data_content_type: None,
            data: Vec::new(),
            spec_version: DEFAULT_SPEC_VERSION.to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub const fn time(&self) -> Option<&DateTime<Utc>> {
        self.time.as_ref()
    }

    pub fn data_content_type(&self) -> Option<&str> {
        self.data_content_type.as_deref()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn spec_version(&self) -> &str {
        &self.spec_version
    }

    /// Whether the payload is declared as JSON (`application/json` or `+json`).
    pub fn has_json_data(&self) -> bool {
        self.data_content_type.as_deref().is_some_and(is_json_content_type)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Event{{id={}, type={}, source={}, specversion={}",
            self.id, self.event_type, self.source, self.spec_version
        )?;
        if let Some(time) = &self.time {
            write!(f, ", time={}", time.to_rfc3339())?;
        }
        if let Some(ct) = &self.data_content_type {
            write!(f, ", datacontenttype={ct}")?;
        }
        write!(f, ", data={}B}}", self.data.len())
    }
}

/// Returns true for `application/json` and any `+json` media type.
pub fn is_json_content_type(content_type: &str) -> bool {
    let media = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    media == JSON_CONTENT_TYPE || media.ends_with("+json")
}

/// Builder for [`Event`].
#[derive(Debug, Clone)]
pub struct EventBuilder {
    id: String,
    event_type: String,
    source: String,
    time: Option<DateTime<Utc>>,
    data_content_type: Option<String>,
    data: Vec<u8>,
    spec_version: String,
}

impl EventBuilder {
    #[must_use]
    pub const fn time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    #[must_use]
    pub fn spec_version(mut self, version: impl Into<String>) -> Self {
        self.spec_version = version.into();
        self
    }

    /// Set the raw payload and its content type.
    #[must_use]
    pub fn data(mut self, content_type: Option<String>, data: Vec<u8>) -> Self {
        self.data_content_type = content_type;
        self.data = data;
        self
    }

    /// Serialize `value` as the JSON payload.
    pub fn json_data<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        self.data = serde_json::to_vec(value)?;
        self.data_content_type = Some(JSON_CONTENT_TYPE.to_string());
        Ok(self)
    }

    pub fn build(self) -> Result<Event> {
        for (name, value) in [
            ("id", &self.id),
            ("type", &self.event_type),
            ("source", &self.source),
            ("specversion", &self.spec_version),
        ] {
            if value.is_empty() {
                return Err(Error::InvalidEvent(format!("'{name}' must not be empty")));
            }
        }
        Ok(Event {
            id: self.id,
            event_type: self.event_type,
            source: self.source,
            time: self.time,
            data_content_type: self.data_content_type,
            data: self.data,
            spec_version: self.spec_version,
        })
    }
}
