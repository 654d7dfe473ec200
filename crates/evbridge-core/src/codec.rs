//! Structured JSON envelope for events.
//!
//! One event per JSON object, suitable for NDJSON streams. JSON payloads are
//! inlined under `data` byte-for-byte; anything else travels as
//! `data_base64`. Both forms decode back to the exact payload bytes.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{Error, Result};
use crate::event::Event;

#[derive(Serialize)]
struct EnvelopeOut<'a> {
    specversion: &'a str,
    id: &'a str,
    #[serde(rename = "type")]
    event_type: &'a str,
    source: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    datacontenttype: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Box<RawValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_base64: Option<String>,
}

#[derive(Deserialize)]
struct EnvelopeIn {
    specversion: String,
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    source: String,
    #[serde(default)]
    time: Option<String>,
    #[serde(default, alias = "contenttype")]
    datacontenttype: Option<String>,
    #[serde(default)]
    data: Option<Box<RawValue>>,
    #[serde(default)]
    data_base64: Option<String>,
}

/// Format a timestamp the way every `evbridge` wire format carries it.
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Codec(format!("invalid time '{value}': {e}")))
}

/// Payload as an inline JSON value, if it can be carried without loss.
fn inline_json(event: &Event) -> Option<Box<RawValue>> {
    if !event.has_json_data() || event.data().is_empty() {
        return None;
    }
    let text = std::str::from_utf8(event.data()).ok()?;
    // The envelope must stay on one line and the raw slice must round-trip.
    if text.contains(['\n', '\r']) || text.trim() != text || text == "null" {
        return None;
    }
    RawValue::from_string(text.to_string()).ok()
}

/// Encode an event as a single-line JSON object.
pub fn encode_json(event: &Event) -> Result<Vec<u8>> {
    let data = inline_json(event);
    let data_base64 = if data.is_none() && !event.data().is_empty() {
        Some(base64_encode(event.data()))
    } else {
        None
    };
    let envelope = EnvelopeOut {
        specversion: event.spec_version(),
        id: event.id(),
        event_type: event.event_type(),
        source: event.source(),
        time: event.time().map(format_time),
        datacontenttype: event.data_content_type(),
        data,
        data_base64,
    };
    Ok(serde_json::to_vec(&envelope)?)
}

/// Decode one JSON object (surrounding whitespace allowed) into an event.
pub fn decode_json(bytes: &[u8]) -> Result<Event> {
    let envelope: EnvelopeIn = serde_json::from_slice(bytes)?;
    let data = match (envelope.data, envelope.data_base64) {
        (Some(_), Some(_)) => {
            return Err(Error::Codec(
                "both 'data' and 'data_base64' are present".into(),
            ));
        }
        (Some(raw), None) => raw.get().as_bytes().to_vec(),
        (None, Some(encoded)) => base64_decode(&encoded)?,
        (None, None) => Vec::new(),
    };
    let mut builder = Event::builder(envelope.id, envelope.event_type, envelope.source)
        .spec_version(envelope.specversion)
        .data(envelope.datacontenttype, data);
    if let Some(time) = envelope.time {
        builder = builder.time(parse_time(&time)?);
    }
    builder.build()
}

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Encode `data_base64`: standard alphabet, always `=` padded.
pub fn base64_encode(data: &[u8]) -> String {
    let digit = |n: u32, shift: u32| char::from(BASE64_ALPHABET[((n >> shift) & 0x3F) as usize]);
    let mut out = String::with_capacity(data.len().div_ceil(3) * 4);

    for chunk in data.chunks(3) {
        let n = chunk
            .iter()
            .enumerate()
            .fold(0u32, |n, (i, &b)| n | (u32::from(b) << (16 - 8 * i)));
        out.push(digit(n, 18));
        out.push(digit(n, 12));
        out.push(if chunk.len() > 1 { digit(n, 6) } else { '=' });
        out.push(if chunk.len() > 2 { digit(n, 0) } else { '=' });
    }
    out
}

fn base64_value(b: u8) -> Option<u32> {
    let v = match b {
        b'A'..=b'Z' => b - b'A',
        b'a'..=b'z' => b - b'a' + 26,
        b'0'..=b'9' => b - b'0' + 52,
        b'+' => 62,
        b'/' => 63,
        _ => return None,
    };
    Some(u32::from(v))
}

/// Decode `data_base64`.
///
/// Trailing `=` padding is optional: `"QQ=="` and `"QQ"` both decode to
/// `b"A"`. Whitespace and the URL-safe alphabet are rejected.
pub fn base64_decode(input: &str) -> Result<Vec<u8>> {
    let digits = input.trim_end_matches('=').as_bytes();
    if digits.len() % 4 == 1 {
        return Err(Error::Codec(format!(
            "invalid base64 length {} in data_base64",
            input.len()
        )));
    }
    let mut out = Vec::with_capacity(digits.len() * 3 / 4);

    for chunk in digits.chunks(4) {
        let mut n = 0u32;
        for (i, &b) in chunk.iter().enumerate() {
            let v = base64_value(b).ok_or_else(|| {
                Error::Codec(format!("invalid base64 character {:?}", char::from(b)))
            })?;
            n |= v << (18 - 6 * i);
        }
        // Big-endian bytes are [0, b0, b1, b2]; a chunk of k digits carries k - 1 bytes.
        out.extend_from_slice(&n.to_be_bytes()[1..chunk.len()]);
    }
    Ok(out)
}
