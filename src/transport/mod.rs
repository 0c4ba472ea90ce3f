//! Byte transport underneath the client: send one envelope, read one back.
//!
//! There is no retry or reconnect at this layer; a failed exchange leaves the
//! caller to drop the client and connect again.

mod stream;

pub use stream::{StreamTransport, TcpTransport};

use bytes::BytesMut;

use crate::error::BaoError;

/// Carries framed envelopes to and from the server.
#[async_trait::async_trait]
pub trait Transport: Send {
    /// Writes one envelope in full.
    async fn send_request(&mut self, envelope: &[u8]) -> Result<(), BaoError>;

    /// Reads one envelope: header, declared body, checksum trailer.
    async fn receive_response(&mut self) -> Result<BytesMut, BaoError>;

    /// Closes the outgoing side. Further calls fail.
    async fn shutdown(&mut self) -> Result<(), BaoError>;
}
