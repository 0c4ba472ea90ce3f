//! Error types for the BaoStock protocol.

use std::fmt;

use crate::body::SeparatorInValue;

/// Result codes shared with the server.
///
/// On the wire every code is a decimal string (`"0"` on success). The enum is
/// the typed view used at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorCode {
    #[default]
    Success,

    // Authentication
    NotLoggedIn,
    BadCredentials,
    UserInfoUnavailable,
    ClientVersionExpired,
    LoginLimitReached,
    AccessInsufficient,
    ActivationRequired,
    EmptyUsername,
    EmptyPassword,
    LogoutFailed,
    AccountLocked,

    // Network
    SocketError,
    ConnectFailed,
    ConnectTimeout,
    ConnectionClosedDuringRecv,
    SendFailed,
    SendTimeout,
    RecvFailed,
    RecvTimeout,

    // Parsing
    MalformedHeader,
    GzipDecodeFailed,
    UnknownError,
    IndexOutOfBounds,
    ChecksumMismatch,

    // Client-side validation
    EmptyRequiredParameter,
    InvalidParameter,
    StartAfterEnd,
    BadDateFormat,
    InvalidDateRange,
    InvalidSecurityCode,
    InvalidIndicator,
    BeyondSupportedDateRange,
    UnsupportedMixedCodes,
    UnsupportedCodeMarket,
    TooManyOrders,
    UnsupportedOrderInfo,
    DuplicateIndicator,
    MalformedMessage,
    UnknownMessageCode,
}

impl ErrorCode {
    /// Every code, in wire order.
    pub const ALL: [ErrorCode; 40] = [
        Self::Success,
        Self::NotLoggedIn,
        Self::BadCredentials,
        Self::UserInfoUnavailable,
        Self::ClientVersionExpired,
        Self::LoginLimitReached,
        Self::AccessInsufficient,
        Self::ActivationRequired,
        Self::EmptyUsername,
        Self::EmptyPassword,
        Self::LogoutFailed,
        Self::AccountLocked,
        Self::SocketError,
        Self::ConnectFailed,
        Self::ConnectTimeout,
        Self::ConnectionClosedDuringRecv,
        Self::SendFailed,
        Self::SendTimeout,
        Self::RecvFailed,
        Self::RecvTimeout,
        Self::MalformedHeader,
        Self::GzipDecodeFailed,
        Self::UnknownError,
        Self::IndexOutOfBounds,
        Self::EmptyRequiredParameter,
        Self::InvalidParameter,
        Self::StartAfterEnd,
        Self::BadDateFormat,
        Self::InvalidDateRange,
        Self::InvalidSecurityCode,
        Self::InvalidIndicator,
        Self::BeyondSupportedDateRange,
        Self::UnsupportedMixedCodes,
        Self::UnsupportedCodeMarket,
        Self::TooManyOrders,
        Self::UnsupportedOrderInfo,
        Self::DuplicateIndicator,
        Self::MalformedMessage,
        Self::UnknownMessageCode,
        Self::ChecksumMismatch,
    ];

    /// The decimal string sent on the wire for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "0",

            Self::NotLoggedIn => "10001001",
            Self::BadCredentials => "10001002",
            Self::UserInfoUnavailable => "10001003",
            Self::ClientVersionExpired => "10001004",
            Self::LoginLimitReached => "10001005",
            Self::AccessInsufficient => "10001006",
            Self::ActivationRequired => "10001007",
            Self::EmptyUsername => "10001008",
            Self::EmptyPassword => "10001009",
            Self::LogoutFailed => "10001010",
            Self::AccountLocked => "10001011",

            Self::SocketError => "10002001",
            Self::ConnectFailed => "10002002",
            Self::ConnectTimeout => "10002003",
            Self::ConnectionClosedDuringRecv => "10002004",
            Self::SendFailed => "10002005",
            Self::SendTimeout => "10002006",
            Self::RecvFailed => "10002007",
            Self::RecvTimeout => "10002008",

            Self::MalformedHeader => "10004001",
            Self::GzipDecodeFailed => "10004002",
            Self::UnknownError => "10004003",
            Self::IndexOutOfBounds => "10004004",
            Self::EmptyRequiredParameter => "10004005",
            Self::InvalidParameter => "10004006",
            Self::StartAfterEnd => "10004007",
            Self::BadDateFormat => "10004008",
            Self::InvalidDateRange => "10004009",
            Self::InvalidSecurityCode => "10004010",
            Self::InvalidIndicator => "10004011",
            Self::BeyondSupportedDateRange => "10004012",
            Self::UnsupportedMixedCodes => "10004013",
            Self::UnsupportedCodeMarket => "10004014",
            Self::TooManyOrders => "10004015",
            Self::UnsupportedOrderInfo => "10004016",
            Self::DuplicateIndicator => "10004017",
            Self::MalformedMessage => "10004018",
            Self::UnknownMessageCode => "10004019",
            Self::ChecksumMismatch => "10004020",
        }
    }

    /// Maps a wire code back to its variant. Codes this client does not know
    /// about become [`ErrorCode::UnknownError`].
    pub fn from_wire(code: &str) -> Self {
        let code = code.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == code)
            .unwrap_or(Self::UnknownError)
    }

    pub fn is_success(&self) -> bool {
        *self == Self::Success
    }

    /// Default human-readable message for the code.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotLoggedIn => "not logged in",
            Self::BadCredentials => "username or password error",
            Self::UserInfoUnavailable => "failed to fetch user info",
            Self::ClientVersionExpired => "client version expired, please upgrade",
            Self::LoginLimitReached => "login count limit reached",
            Self::AccessInsufficient => "user access insufficient",
            Self::ActivationRequired => "account needs activation",
            Self::EmptyUsername => "username is empty",
            Self::EmptyPassword => "password is empty",
            Self::LogoutFailed => "logout failed",
            Self::AccountLocked => "account is locked",
            Self::SocketError => "socket error",
            Self::ConnectFailed => "failed to connect to server",
            Self::ConnectTimeout => "connect timed out",
            Self::ConnectionClosedDuringRecv => "connection closed while receiving",
            Self::SendFailed => "failed to send request",
            Self::SendTimeout => "send timed out",
            Self::RecvFailed => "failed to receive response",
            Self::RecvTimeout => "receive timed out",
            Self::MalformedHeader => "malformed message header",
            Self::GzipDecodeFailed => "failed to decompress message body",
            Self::UnknownError => "unknown error",
            Self::IndexOutOfBounds => "field index out of bounds",
            Self::ChecksumMismatch => "checksum mismatch",
            Self::EmptyRequiredParameter => "required parameter is empty",
            Self::InvalidParameter => "invalid parameter",
            Self::StartAfterEnd => "start date is after end date",
            Self::BadDateFormat => "date format error, expected YYYY-MM-DD",
            Self::InvalidDateRange => "invalid date range",
            Self::InvalidSecurityCode => "invalid security code",
            Self::InvalidIndicator => "invalid indicator",
            Self::BeyondSupportedDateRange => "date beyond supported range",
            Self::UnsupportedMixedCodes => "mixed security codes not supported",
            Self::UnsupportedCodeMarket => "security market not supported",
            Self::TooManyOrders => "too many orders",
            Self::UnsupportedOrderInfo => "order info not supported",
            Self::DuplicateIndicator => "duplicate indicator",
            Self::MalformedMessage => "malformed message",
            Self::UnknownMessageCode => "unknown message code",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure while opening the TCP connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("could not resolve {0}")]
    Resolve(String),

    #[error("connection refused or failed: {0}")]
    Refused(#[source] std::io::Error),

    #[error("connect timed out")]
    Timeout,
}

/// Failure while writing a request envelope.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("send failed: {0}")]
    Failed(#[source] std::io::Error),

    #[error("send timed out")]
    Timeout,
}

/// Failure while reading a response envelope.
#[derive(Debug, thiserror::Error)]
pub enum RecvError {
    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("receive timed out")]
    Timeout,

    #[error("response truncated: expected {expected} bytes, received {received}")]
    Truncated { expected: u64, received: u64 },

    #[error("receive failed: {0}")]
    Io(#[source] std::io::Error),
}

/// Errors that can occur during BaoStock protocol operations.
#[derive(Debug, thiserror::Error)]
pub enum BaoError {
    #[error("connect error: {0}")]
    Connect(#[from] ConnectError),

    #[error("send error: {0}")]
    Send(#[from] SendError),

    #[error("receive error: {0}")]
    Recv(#[from] RecvError),

    #[error("malformed header: {0}")]
    MalformedHeader(String),

    #[error("checksum mismatch: trailer {trailer:?}, computed {computed}")]
    ChecksumMismatch { trailer: String, computed: u32 },

    #[error("failed to decompress body: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("frame too large: {0} bytes")]
    FrameTooLarge(u64),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("response field {index} ({name}) is missing")]
    MissingField { index: usize, name: &'static str },

    #[error("invalid field: {0}")]
    InvalidField(#[from] SeparatorInValue),

    #[error("malformed record payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("unknown message type: {0:02}")]
    UnknownMessageType(u8),

    #[error("client is not connected")]
    NotConnected,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BaoError {
    /// Maps this error onto the shared result-code taxonomy.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Connect(ConnectError::Timeout) => ErrorCode::ConnectTimeout,
            Self::Connect(_) => ErrorCode::ConnectFailed,
            Self::Send(SendError::Timeout) => ErrorCode::SendTimeout,
            Self::Send(SendError::Failed(_)) => ErrorCode::SendFailed,
            Self::Recv(RecvError::Timeout) => ErrorCode::RecvTimeout,
            Self::Recv(RecvError::ConnectionClosed | RecvError::Truncated { .. }) => {
                ErrorCode::ConnectionClosedDuringRecv
            }
            Self::Recv(RecvError::Io(_)) => ErrorCode::RecvFailed,
            Self::MalformedHeader(_) => ErrorCode::MalformedHeader,
            Self::ChecksumMismatch { .. } => ErrorCode::ChecksumMismatch,
            Self::Decompress(_) => ErrorCode::GzipDecodeFailed,
            Self::FrameTooLarge(_) | Self::Protocol(_) | Self::Payload(_) => {
                ErrorCode::MalformedMessage
            }
            Self::MissingField { .. } => ErrorCode::IndexOutOfBounds,
            Self::InvalidField(e) => e.code(),
            Self::UnknownMessageType(_) => ErrorCode::UnknownMessageCode,
            Self::NotConnected | Self::Io(_) => ErrorCode::SocketError,
        }
    }
}

/// A login rejected by the server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("login failed ({code}): {message}")]
pub struct AuthError {
    pub code: ErrorCode,
    pub message: String,
}

/// Returned by session checks made before an authenticated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("not logged in")]
pub struct NotLoggedIn;

impl From<NotLoggedIn> for ErrorCode {
    fn from(_: NotLoggedIn) -> Self {
        ErrorCode::NotLoggedIn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn wire_codes_are_unique() {
        let codes: HashSet<_> = ErrorCode::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(codes.len(), ErrorCode::ALL.len());
    }

    #[test]
    fn from_wire_maps_back() {
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::from_wire(code.as_str()), code);
        }
        assert_eq!(ErrorCode::from_wire("0"), ErrorCode::Success);
        assert_eq!(ErrorCode::from_wire(" 10001001 "), ErrorCode::NotLoggedIn);
    }

    #[test]
    fn unknown_wire_code() {
        assert_eq!(ErrorCode::from_wire("99999999"), ErrorCode::UnknownError);
        assert_eq!(ErrorCode::from_wire(""), ErrorCode::UnknownError);
    }

    #[test]
    fn recv_errors_map_to_codes() {
        assert_eq!(
            BaoError::from(RecvError::Timeout).code(),
            ErrorCode::RecvTimeout
        );
        assert_eq!(
            BaoError::from(RecvError::Truncated { expected: 50, received: 5 }).code(),
            ErrorCode::ConnectionClosedDuringRecv
        );
        assert_eq!(
            BaoError::ChecksumMismatch { trailer: "1".into(), computed: 2 }.code(),
            ErrorCode::ChecksumMismatch
        );
    }
}
