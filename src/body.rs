//! Positional body encoding: `\x01`-separated fields, `,`-separated attributes.
//!
//! There is no escaping. A value that contains the separator it is being
//! joined with is rejected at encode time instead of silently shifting every
//! following field.

use crate::error::{BaoError, ErrorCode};

/// Separates top-level body fields.
pub const MESSAGE_SPLIT: char = '\x01';

/// Separates sub-values packed into one field.
pub const ATTRIBUTE_SPLIT: char = ',';

/// A value that contains the separator it was about to be joined with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("value {value:?} contains separator {separator:?}")]
pub struct SeparatorInValue {
    pub value: String,
    pub separator: char,
}

impl SeparatorInValue {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::InvalidParameter
    }
}

/// Joins body fields with [`MESSAGE_SPLIT`].
pub fn encode_fields<S: AsRef<str>>(values: &[S]) -> Result<String, SeparatorInValue> {
    join(values, MESSAGE_SPLIT)
}

/// Splits a body on [`MESSAGE_SPLIT`].
pub fn decode_fields(raw: &str) -> Vec<&str> {
    raw.split(MESSAGE_SPLIT).collect()
}

/// Joins sub-values with [`ATTRIBUTE_SPLIT`].
pub fn encode_attributes<S: AsRef<str>>(values: &[S]) -> Result<String, SeparatorInValue> {
    join(values, ATTRIBUTE_SPLIT)
}

/// Splits a field on [`ATTRIBUTE_SPLIT`]. An empty field has no attributes.
pub fn decode_attributes(raw: &str) -> Vec<&str> {
    if raw.is_empty() {
        Vec::new()
    } else {
        raw.split(ATTRIBUTE_SPLIT).collect()
    }
}

/// Fails if `value` contains either separator.
pub fn check_value(value: &str) -> Result<(), SeparatorInValue> {
    for separator in [MESSAGE_SPLIT, ATTRIBUTE_SPLIT] {
        if value.contains(separator) {
            return Err(SeparatorInValue {
                value: value.to_string(),
                separator,
            });
        }
    }
    Ok(())
}

fn join<S: AsRef<str>>(values: &[S], separator: char) -> Result<String, SeparatorInValue> {
    let mut out = String::new();
    for (i, value) in values.iter().enumerate() {
        let value = value.as_ref();
        if value.contains(separator) {
            return Err(SeparatorInValue {
                value: value.to_string(),
                separator,
            });
        }
        if i > 0 {
            out.push(separator);
        }
        out.push_str(value);
    }
    Ok(out)
}

/// Decoded body fields with bounds-checked positional access.
///
/// Servers may send fewer fields than a message type calls for, so every
/// lookup goes through [`Fields::get`] or [`Fields::require`].
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    parts: Vec<&'a str>,
}

impl<'a> Fields<'a> {
    pub fn parse(raw: &'a str) -> Self {
        Self {
            parts: decode_fields(raw),
        }
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Field at `index`, or `""` when the body is shorter.
    pub fn get(&self, index: usize) -> &'a str {
        self.parts.get(index).copied().unwrap_or("")
    }

    /// Field at `index`, failing when the body is shorter.
    pub fn require(&self, index: usize, name: &'static str) -> Result<&'a str, BaoError> {
        self.parts
            .get(index)
            .copied()
            .ok_or(BaoError::MissingField { index, name })
    }

    /// Numeric field at `index`.
    pub fn require_u32(&self, index: usize, name: &'static str) -> Result<u32, BaoError> {
        let raw = self.require(index, name)?;
        raw.trim()
            .parse()
            .map_err(|_| BaoError::Protocol(format!("{name} is not a number: {raw:?}")))
    }
}
