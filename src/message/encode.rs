//! Encode BaoStock messages into framed envelopes.

use std::io::Write;

use bytes::BytesMut;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::{msg_type, Request};
use crate::body::encode_fields;
use crate::error::BaoError;
use crate::frame::{append_checksum, encode_header, HEADER_LEN};

/// Encodes a client request into an envelope ready for the transport.
pub fn encode_request(req: &Request) -> Result<BytesMut, BaoError> {
    encode_message(req.msg_type(), &req.fields()?)
}

/// Encodes positional `fields` as a message of type `msg_type`.
///
/// Bodies of compressed message types are deflated before framing, so the
/// header length and checksum cover the compressed bytes.
pub fn encode_message<S: AsRef<str>>(msg_type: u8, fields: &[S]) -> Result<BytesMut, BaoError> {
    let body = encode_fields(fields)?;
    if msg_type::is_compressed(msg_type) {
        encode_frame(msg_type, &compress(body.as_bytes())?)
    } else {
        encode_frame(msg_type, body.as_bytes())
    }
}

/// Wraps an already-encoded body with header and checksum trailer.
pub fn encode_frame(msg_type: u8, body: &[u8]) -> Result<BytesMut, BaoError> {
    let header = encode_header(msg_type, body.len() as u64)?;
    let mut payload = Vec::with_capacity(HEADER_LEN + body.len());
    payload.extend_from_slice(&header);
    payload.extend_from_slice(body);
    Ok(BytesMut::from(&append_checksum(&payload)[..]))
}

fn compress(data: &[u8]) -> Result<Vec<u8>, BaoError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
