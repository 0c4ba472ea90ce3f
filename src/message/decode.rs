//! Decode framed envelopes into BaoStock messages.

use std::io::Read;

use flate2::read::ZlibDecoder;
use serde::Deserialize;
use serde_json::Value;

use super::{msg_type, AuthReply, QueryPage, Response};
use crate::body::{decode_attributes, Fields};
use crate::error::{BaoError, ErrorCode};
use crate::frame::reader::DEFAULT_MAX_BODY_LEN;
use crate::frame::{decode_header, verify_and_strip_checksum, HEADER_LEN};

/// Field positions of a query response body.
struct PageLayout {
    data: usize,
    fields: usize,
    params: &'static [usize],
}

const DIVIDEND_LAYOUT: PageLayout = PageLayout {
    data: 6,
    fields: 7,
    params: &[8, 9, 10],
};

const K_DATA_LAYOUT: PageLayout = PageLayout {
    data: 6,
    fields: 8,
    params: &[7, 9, 10, 11, 12],
};

/// Row payload carried in the `data` field.
#[derive(Debug, Deserialize)]
struct RecordSet {
    #[serde(default)]
    record: Vec<Vec<Value>>,
}

/// Verifies, unframes and decodes a server envelope.
pub fn decode_response(envelope: &[u8]) -> Result<Response, BaoError> {
    decode_response_limited(envelope, DEFAULT_MAX_BODY_LEN)
}

/// Like [`decode_response`], but fails with [`BaoError::FrameTooLarge`] when
/// a compressed body inflates past `max_body_len` bytes.
pub fn decode_response_limited(envelope: &[u8], max_body_len: u64) -> Result<Response, BaoError> {
    let payload = verify_and_strip_checksum(envelope)
        .inspect_err(|e| tracing::warn!(error = %e, "dropping response"))?;
    let header = decode_header(payload)?;

    let body = &payload[HEADER_LEN..];
    if body.len() as u64 != header.body_len {
        return Err(BaoError::Protocol(format!(
            "header declares {} body bytes, envelope carries {}",
            header.body_len,
            body.len()
        )));
    }

    let text = decode_body(header.msg_type, body, max_body_len)?;
    let fields = Fields::parse(&text);

    match header.msg_type {
        msg_type::LOGIN_RESPONSE => Ok(Response::Login(decode_auth(&fields)?)),
        msg_type::LOGOUT_RESPONSE => Ok(Response::Logout(decode_auth(&fields)?)),
        msg_type::ERROR => Ok(Response::Error {
            code: ErrorCode::from_wire(fields.require(0, "error_code")?),
            message: fields.get(1).to_string(),
        }),
        msg_type::DIVIDEND_RESPONSE => {
            Ok(Response::Dividend(decode_page(&fields, &DIVIDEND_LAYOUT)?))
        }
        msg_type::K_DATA_RESPONSE => Ok(Response::KData(decode_page(&fields, &K_DATA_LAYOUT)?)),
        other => Err(BaoError::UnknownMessageType(other)),
    }
}

fn decode_body(msg_type: u8, body: &[u8], max_len: u64) -> Result<String, BaoError> {
    let raw = if msg_type::is_compressed(msg_type) {
        let mut raw = Vec::new();
        ZlibDecoder::new(body)
            .take(max_len.saturating_add(1))
            .read_to_end(&mut raw)
            .map_err(BaoError::Decompress)?;
        if raw.len() as u64 > max_len {
            tracing::warn!(max_len, "compressed body inflates past the limit");
            return Err(BaoError::FrameTooLarge(raw.len() as u64));
        }
        raw
    } else {
        body.to_vec()
    };
    String::from_utf8(raw).map_err(|e| BaoError::Protocol(format!("body is not valid UTF-8: {e}")))
}

fn decode_auth(fields: &Fields<'_>) -> Result<AuthReply, BaoError> {
    let code = ErrorCode::from_wire(fields.require(0, "error_code")?);
    let message = fields.get(1).to_string();
    if !code.is_success() {
        return Ok(AuthReply {
            code,
            message,
            method: fields.get(2).to_string(),
            user_id: fields.get(3).to_string(),
        });
    }
    Ok(AuthReply {
        code,
        message,
        method: fields.require(2, "method")?.to_string(),
        user_id: fields.require(3, "user_id")?.to_string(),
    })
}

fn decode_page(fields: &Fields<'_>, layout: &PageLayout) -> Result<QueryPage, BaoError> {
    let code = ErrorCode::from_wire(fields.require(0, "error_code")?);
    let message = fields.get(1).to_string();
    if !code.is_success() {
        return Ok(QueryPage {
            code,
            message,
            method: fields.get(2).to_string(),
            user_id: fields.get(3).to_string(),
            ..QueryPage::default()
        });
    }

    Ok(QueryPage {
        code,
        message,
        method: fields.require(2, "method")?.to_string(),
        user_id: fields.require(3, "user_id")?.to_string(),
        cur_page_num: fields.require_u32(4, "cur_page_num")?,
        per_page_count: fields.require_u32(5, "per_page_count")?,
        rows: decode_records(fields.require(layout.data, "data")?)?,
        fields: decode_attributes(fields.require(layout.fields, "fields")?)
            .into_iter()
            .map(String::from)
            .collect(),
        params: layout
            .params
            .iter()
            .map(|&i| fields.get(i).to_string())
            .collect(),
    })
}

fn decode_records(data: &str) -> Result<Vec<Vec<String>>, BaoError> {
    if data.trim().is_empty() {
        return Ok(Vec::new());
    }
    let set: RecordSet = serde_json::from_str(data)?;
    Ok(set
        .record
        .into_iter()
        .map(|row| row.into_iter().map(value_to_string).collect())
        .collect())
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
