//! Baowire: an async client for the BaoStock market-data wire protocol.
//!
//! Requests and responses are `\x01`-separated text bodies behind a fixed
//! 21-byte header, followed by a CRC32 trailer. K-data responses arrive
//! zlib-compressed.
//!
//! # Architecture
//!
//! - **`frame`**: header layout, checksum trailer, envelope reader/writer
//! - **`body`**: positional field and attribute encoding
//! - **`message`**: typed requests and responses, encode/decode
//! - **`transport`**: the `Transport` trait and its TCP implementation
//! - **`client`**: session state, validation and the `BaoClient` façade
//!
//! ```no_run
//! use baowire::{BaoClient, ClientConfig, Credentials};
//!
//! # async fn run() -> Result<(), baowire::BaoError> {
//! let mut client = BaoClient::connect(ClientConfig::default()).await?;
//! client.login(&Credentials::anonymous()).await?;
//! let first = client
//!     .query_history_k_data_plus("sh.600000", "date,close", "2024-01-01", "", "d", "3")
//!     .await?;
//! let all = client.fetch_all(first).await?;
//! println!("{} rows", all.rows.len());
//! client.logout().await?;
//! client.disconnect().await?;
//! # Ok(())
//! # }
//! ```

pub mod body;
pub mod client;
pub mod config;
pub mod error;
pub mod frame;
pub mod message;
pub mod transport;

pub use client::{BaoClient, ResultData, ResultSet};
pub use config::{ClientConfig, Credentials};
pub use error::{BaoError, ErrorCode};
