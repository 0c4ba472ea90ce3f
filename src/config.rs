//! Client configuration.

use std::time::Duration;

use crate::frame::reader::DEFAULT_MAX_BODY_LEN;

/// Public BaoStock endpoint.
pub const DEFAULT_HOST: &str = "public-api.baostock.com";
pub const DEFAULT_PORT: u16 = 10030;

/// Rows the server returns per page unless told otherwise.
pub const DEFAULT_PER_PAGE_COUNT: u32 = 10_000;

/// Connection and paging settings for a [`crate::client::BaoClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
    /// Deadline for one complete response, header to terminator.
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub per_page_count: u32,
    /// Responses declaring a larger body are rejected before it is read.
    pub max_body_len: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(10),
            per_page_count: DEFAULT_PER_PAGE_COUNT,
            max_body_len: DEFAULT_MAX_BODY_LEN,
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Page size requested from the server. Zero is bumped to one.
    pub fn per_page_count(mut self, count: u32) -> Self {
        self.per_page_count = count.max(1);
        self
    }

    pub fn max_body_len(mut self, max: u64) -> Self {
        self.max_body_len = max;
        self
    }
}

/// Login credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user_id: String,
    pub password: String,
    /// Opaque login options, `"0"` by default.
    pub options: String,
}

impl Credentials {
    pub fn new(user_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            password: password.into(),
            options: "0".to_string(),
        }
    }

    /// The shared guest account the public server accepts.
    pub fn anonymous() -> Self {
        Self::new("anonymous", "123456")
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("password", &"***")
            .field("options", &self.options)
            .finish()
    }
}
