//! Transport over any async byte stream, and its TCP flavour.

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;

use super::Transport;
use crate::config::ClientConfig;
use crate::error::{BaoError, ConnectError, RecvError, SendError};
use crate::frame::{FrameReader, FrameWriter};

/// A [`Transport`] over a split byte stream.
pub struct StreamTransport<R, W> {
    reader: FrameReader<BufReader<R>>,
    writer: FrameWriter<W>,
    read_timeout: Duration,
    write_timeout: Duration,
}

/// Plain TCP transport, no TLS.
pub type TcpTransport = StreamTransport<OwnedReadHalf, OwnedWriteHalf>;

impl<R, W> StreamTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Wraps the two halves of a stream using default timeouts and limits.
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_config(reader, writer, &ClientConfig::default())
    }

    /// Wraps the two halves of a stream using the timeouts and body limit
    /// from `config`.
    pub fn with_config(reader: R, writer: W, config: &ClientConfig) -> Self {
        Self {
            reader: FrameReader::new(BufReader::new(reader)).with_max_body_len(config.max_body_len),
            writer: FrameWriter::new(writer),
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
        }
    }
}

impl TcpTransport {
    /// Opens a TCP connection to `host:port` within `connect_timeout`.
    pub async fn connect(
        host: &str,
        port: u16,
        connect_timeout: Duration,
    ) -> Result<Self, BaoError> {
        let config = ClientConfig::new(host, port).connect_timeout(connect_timeout);
        Self::connect_with(&config).await
    }

    /// Opens a TCP connection using every setting in `config`.
    pub async fn connect_with(config: &ClientConfig) -> Result<Self, BaoError> {
        let stream = match timeout(config.connect_timeout, open(&config.host, config.port)).await {
            Ok(result) => result?,
            Err(_) => return Err(ConnectError::Timeout.into()),
        };
        stream.set_nodelay(true)?;

        let peer = stream.peer_addr()?;
        tracing::info!(%peer, "connected");

        let (rh, wh) = stream.into_split();
        Ok(Self::with_config(rh, wh, config))
    }
}

async fn open(host: &str, port: u16) -> Result<TcpStream, ConnectError> {
    let addrs = lookup_host((host, port))
        .await
        .map_err(|_| ConnectError::Resolve(format!("{host}:{port}")))?;

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                tracing::debug!(%addr, error = %e, "connect attempt failed");
                last_err = Some(e);
            }
        }
    }
    Err(match last_err {
        Some(e) => ConnectError::Refused(e),
        None => ConnectError::Resolve(format!("{host}:{port}")),
    })
}

#[async_trait::async_trait]
impl<R, W> Transport for StreamTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send_request(&mut self, envelope: &[u8]) -> Result<(), BaoError> {
        match timeout(self.write_timeout, self.writer.write_envelope(envelope)).await {
            Ok(result) => {
                result?;
                tracing::trace!(bytes = envelope.len(), "envelope sent");
                Ok(())
            }
            Err(_) => Err(SendError::Timeout.into()),
        }
    }

    async fn receive_response(&mut self) -> Result<BytesMut, BaoError> {
        match timeout(self.read_timeout, self.reader.read_envelope()).await {
            Ok(result) => {
                let envelope = result?;
                tracing::trace!(bytes = envelope.len(), "envelope received");
                Ok(envelope)
            }
            Err(_) => Err(RecvError::Timeout.into()),
        }
    }

    async fn shutdown(&mut self) -> Result<(), BaoError> {
        Ok(self.writer.shutdown().await?)
    }
}
