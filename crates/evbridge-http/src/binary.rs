//! Binary content mode: event attributes as `ce-*` headers.

use http::{HeaderMap, HeaderValue};

use evbridge_core::codec::{format_time, parse_time};
use evbridge_core::{Error, Event, Result};

pub const CE_SPECVERSION: &str = "ce-specversion";
pub const CE_ID: &str = "ce-id";
pub const CE_TYPE: &str = "ce-type";
pub const CE_SOURCE: &str = "ce-source";
pub const CE_TIME: &str = "ce-time";
pub const CONTENT_TYPE: &str = "content-type";

/// Whether the headers carry a binary-mode event.
pub fn has_event(headers: &HeaderMap) -> bool {
    headers.contains_key(CE_ID)
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Percent-encode an attribute for a `ce-*` header.
///
/// Space, `"`, `%` and every byte outside printable ASCII are written as
/// `%XX` over the value's UTF-8 bytes, so any attribute fits in a header.
pub fn encode_attribute(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for &b in value.as_bytes() {
        if b.is_ascii_graphic() && b != b'"' && b != b'%' {
            encoded.push(char::from(b));
        } else {
            encoded.push('%');
            encoded.push(char::from(HEX_DIGITS[usize::from(b >> 4)]));
            encoded.push(char::from(HEX_DIGITS[usize::from(b & 0x0F)]));
        }
    }
    encoded
}

fn hex_value(b: u8) -> Option<u8> {
    char::from(b)
        .to_digit(16)
        .and_then(|d| u8::try_from(d).ok())
}

/// Reverse [`encode_attribute`]. Unescaped UTF-8 is taken as is.
pub fn decode_attribute(name: &str, raw: &[u8]) -> Result<String> {
    let mut bytes = Vec::with_capacity(raw.len());
    let mut rest = raw;
    while let Some((&b, tail)) = rest.split_first() {
        match (b, tail) {
            (b'%', [hi, lo, after @ ..]) => {
                let byte = hex_value(*hi)
                    .zip(hex_value(*lo))
                    .map(|(hi, lo)| (hi << 4) | lo)
                    .ok_or_else(|| Error::Codec(format!("invalid percent escape in {name}")))?;
                bytes.push(byte);
                rest = after;
            }
            (b'%', _) => {
                return Err(Error::Codec(format!("truncated percent escape in {name}")));
            }
            _ => {
                bytes.push(b);
                rest = tail;
            }
        }
    }
    String::from_utf8(bytes).map_err(|e| Error::Codec(format!("{name} is not UTF-8: {e}")))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::Codec(format!("cannot encode {name} header: {e}")))
}

fn attribute_value(name: &str, value: &str) -> Result<HeaderValue> {
    header_value(name, &encode_attribute(value))
}

/// Write the event's attributes into `headers`. The body is `event.data()`.
pub fn write_headers(event: &Event, headers: &mut HeaderMap) -> Result<()> {
    headers.insert(CE_SPECVERSION, attribute_value(CE_SPECVERSION, event.spec_version())?);
    headers.insert(CE_ID, attribute_value(CE_ID, event.id())?);
    headers.insert(CE_TYPE, attribute_value(CE_TYPE, event.event_type())?);
    headers.insert(CE_SOURCE, attribute_value(CE_SOURCE, event.source())?);
    if let Some(time) = event.time() {
        headers.insert(CE_TIME, attribute_value(CE_TIME, &format_time(time))?);
    }
    if let Some(ct) = event.data_content_type() {
        headers.insert(CONTENT_TYPE, header_value(CONTENT_TYPE, ct)?);
    }
    Ok(())
}

fn read_attribute(headers: &HeaderMap, name: &str) -> Result<Option<String>> {
    headers
        .get(name)
        .map(|v| decode_attribute(name, v.as_bytes()))
        .transpose()
}

fn required_attribute(headers: &HeaderMap, name: &str) -> Result<String> {
    read_attribute(headers, name)?.ok_or_else(|| Error::Codec(format!("missing {name} header")))
}

fn read_content_type(headers: &HeaderMap) -> Result<Option<String>> {
    headers
        .get(CONTENT_TYPE)
        .map(|v| {
            String::from_utf8(v.as_bytes().to_vec())
                .map_err(|e| Error::Codec(format!("invalid {CONTENT_TYPE} header: {e}")))
        })
        .transpose()
}

/// Rebuild an event from binary-mode headers and body.
pub fn read_event(headers: &HeaderMap, body: Vec<u8>) -> Result<Event> {
    let mut builder = Event::builder(
        required_attribute(headers, CE_ID)?,
        required_attribute(headers, CE_TYPE)?,
        required_attribute(headers, CE_SOURCE)?,
    )
    .spec_version(required_attribute(headers, CE_SPECVERSION)?)
    .data(read_content_type(headers)?, body);
    if let Some(time) = read_attribute(headers, CE_TIME)? {
        builder = builder.time(parse_time(&time)?);
    }
    builder.build()
}
