//! Server-to-client BaoStock messages.

use crate::error::ErrorCode;

/// A message sent from the server to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Login(AuthReply),
    Logout(AuthReply),
    Dividend(QueryPage),
    KData(QueryPage),
    /// Generic failure, sent when the server could not route the request.
    Error { code: ErrorCode, message: String },
}

impl Response {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login(_) => "login",
            Self::Logout(_) => "logout",
            Self::Dividend(_) => "dividend",
            Self::KData(_) => "k-data",
            Self::Error { .. } => "error",
        }
    }
}

/// Reply to a login or logout request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthReply {
    pub code: ErrorCode,
    pub message: String,
    pub method: String,
    pub user_id: String,
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryPage {
    pub code: ErrorCode,
    pub message: String,
    pub method: String,
    pub user_id: String,
    pub cur_page_num: u32,
    pub per_page_count: u32,
    /// Column names of `rows`.
    pub fields: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Query parameters echoed back by the server, in wire order.
    pub params: Vec<String>,
}
