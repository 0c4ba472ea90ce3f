//! Writes framed envelopes to an async byte stream.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::MESSAGE_END;
use crate::error::SendError;

/// Writes envelopes to an `AsyncWrite` stream, each followed by the
/// [`MESSAGE_END`] terminator.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes a complete envelope and its terminator, then flushes.
    pub async fn write_envelope(&mut self, envelope: &[u8]) -> Result<(), SendError> {
        // write_all keeps going on partial writes.
        self.writer
            .write_all(envelope)
            .await
            .map_err(SendError::Failed)?;
        self.writer
            .write_all(MESSAGE_END)
            .await
            .map_err(SendError::Failed)?;
        self.writer.flush().await.map_err(SendError::Failed)
    }

    /// Shuts down the write side of the stream.
    pub async fn shutdown(&mut self) -> Result<(), SendError> {
        self.writer.shutdown().await.map_err(SendError::Failed)
    }
}
