//! BaoStock protocol messages.

pub mod decode;
pub mod encode;
pub mod request;
pub mod response;

pub use request::{AdjustFlag, DividendQuery, Frequency, KDataQuery, Query, Request, YearType};
pub use response::{AuthReply, QueryPage, Response};

/// Two-digit message type codes.
pub mod msg_type {
    // Client → Server
    pub const LOGIN_REQUEST: u8 = 0;
    pub const LOGOUT_REQUEST: u8 = 2;
    pub const K_DATA_REQUEST: u8 = 11;
    pub const DIVIDEND_REQUEST: u8 = 13;

    // Server → Client
    pub const LOGIN_RESPONSE: u8 = 1;
    pub const LOGOUT_RESPONSE: u8 = 3;
    pub const ERROR: u8 = 4;
    pub const K_DATA_RESPONSE: u8 = 12;
    pub const DIVIDEND_RESPONSE: u8 = 14;

    /// Whether bodies of this type travel zlib-compressed.
    pub fn is_compressed(msg_type: u8) -> bool {
        msg_type == K_DATA_RESPONSE
    }
}
