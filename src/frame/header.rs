//! Fixed-width message header.

use super::{CLIENT_VERSION, HEADER_LEN, LENGTH_LEN, MAX_BODY_LEN, TYPE_LEN};
use crate::error::BaoError;

/// A decoded message header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    /// Two-digit message type (see [`crate::message::msg_type`]).
    pub msg_type: u8,
    /// Length of the body that follows, in bytes.
    pub body_len: u64,
    /// Version tag carried in the reserved bytes, separators stripped.
    pub version: String,
}

/// Encodes a header for a body of `body_len` bytes.
pub fn encode_header(msg_type: u8, body_len: u64) -> Result<[u8; HEADER_LEN], BaoError> {
    if msg_type > 99 {
        return Err(BaoError::Protocol(format!(
            "message type {msg_type} does not fit in {TYPE_LEN} digits"
        )));
    }
    if body_len > MAX_BODY_LEN {
        return Err(BaoError::FrameTooLarge(body_len));
    }

    let text = format!("{msg_type:02}{body_len:010}\x01{CLIENT_VERSION}\x01");
    let mut header = [0u8; HEADER_LEN];
    header.copy_from_slice(text.as_bytes());
    Ok(header)
}

/// Decodes the first [`HEADER_LEN`] bytes of `data`.
pub fn decode_header(data: &[u8]) -> Result<FrameHeader, BaoError> {
    if data.len() < HEADER_LEN {
        return Err(BaoError::MalformedHeader(format!(
            "expected {HEADER_LEN} bytes, got {}",
            data.len()
        )));
    }

    let msg_type = parse_digits(&data[..TYPE_LEN], "message type")?;
    let body_len = parse_digits(&data[TYPE_LEN..TYPE_LEN + LENGTH_LEN], "body length")?;
    let version = String::from_utf8_lossy(&data[TYPE_LEN + LENGTH_LEN..HEADER_LEN])
        .trim_matches('\x01')
        .to_string();

    Ok(FrameHeader {
        // Two digits always fit.
        msg_type: msg_type as u8,
        body_len,
        version,
    })
}

fn parse_digits(field: &[u8], what: &str) -> Result<u64, BaoError> {
    if !field.iter().all(u8::is_ascii_digit) {
        return Err(BaoError::MalformedHeader(format!(
            "{what} field is not numeric: {:?}",
            String::from_utf8_lossy(field)
        )));
    }
    Ok(field
        .iter()
        .fold(0u64, |acc, d| acc * 10 + u64::from(d - b'0')))
}
