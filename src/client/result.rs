//! Results handed back to callers.

use super::validate::Rejection;
use crate::error::ErrorCode;
use crate::message::{AuthReply, Query, QueryPage};

/// Outcome of a login or logout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultData {
    pub error_code: ErrorCode,
    pub error_msg: String,
    pub method: String,
    pub user_id: String,
}

impl ResultData {
    /// A result produced without asking the server.
    pub(crate) fn local(code: ErrorCode, message: impl Into<String>, method: &str) -> Self {
        Self {
            error_code: code,
            error_msg: message.into(),
            method: method.to_string(),
            user_id: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_code.is_success()
    }
}

impl From<AuthReply> for ResultData {
    fn from(reply: AuthReply) -> Self {
        Self {
            error_code: reply.code,
            error_msg: reply.message,
            method: reply.method,
            user_id: reply.user_id,
        }
    }
}

/// One page of a query result.
///
/// A failed query still produces a `ResultSet`; check [`ResultSet::is_success`]
/// before reading rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultSet {
    pub error_code: ErrorCode,
    pub error_msg: String,
    pub method: String,
    pub user_id: String,
    pub cur_page_num: u32,
    pub per_page_count: u32,
    pub fields: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// The query that produced this page, kept for fetching the next one.
    pub query: Option<Query>,
}

impl ResultSet {
    pub(crate) fn failure(code: ErrorCode, message: impl Into<String>, method: &str) -> Self {
        Self {
            error_code: code,
            error_msg: message.into(),
            method: method.to_string(),
            ..Self::default()
        }
    }

    pub(crate) fn rejected(rejection: Rejection, method: &str) -> Self {
        Self::failure(rejection.code, rejection.message, method)
    }

    pub(crate) fn from_page(page: QueryPage, query: Query) -> Self {
        Self {
            error_code: page.code,
            error_msg: page.message,
            method: page.method,
            user_id: page.user_id,
            cur_page_num: page.cur_page_num,
            per_page_count: page.per_page_count,
            fields: page.fields,
            rows: page.rows,
            query: Some(query),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_code.is_success()
    }

    /// A full page means the server may hold more rows.
    pub fn has_more(&self) -> bool {
        self.is_success()
            && self.per_page_count > 0
            && self.rows.len() == self.per_page_count as usize
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    /// Cell of `row` under column `name`.
    pub fn value(&self, row: usize, name: &str) -> Option<&str> {
        let col = self.column_index(name)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}
