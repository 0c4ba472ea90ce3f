//! Reads framed envelopes from an async byte stream.

use bytes::BytesMut;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt};

use super::{decode_header, HEADER_LEN, MAX_TAIL_LEN, MESSAGE_END};
use crate::error::{BaoError, RecvError};

/// Default cap on a single response body (64 MiB).
pub const DEFAULT_MAX_BODY_LEN: u64 = 64 * 1024 * 1024;

/// Reads envelopes from an `AsyncBufRead` stream.
///
/// Each envelope is read in three steps: exactly [`HEADER_LEN`] header bytes,
/// exactly the body length the header declares, then the checksum trailer up
/// to the [`MESSAGE_END`] terminator. The returned buffer holds header, body,
/// separator and checksum; the terminator is dropped.
pub struct FrameReader<R> {
    reader: R,
    max_body_len: u64,
}

impl<R: AsyncBufRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            max_body_len: DEFAULT_MAX_BODY_LEN,
        }
    }

    /// Rejects bodies declared larger than `max` bytes.
    pub fn with_max_body_len(mut self, max: u64) -> Self {
        self.max_body_len = max;
        self
    }

    /// Reads one complete envelope.
    pub async fn read_envelope(&mut self) -> Result<BytesMut, BaoError> {
        let mut envelope = BytesMut::zeroed(HEADER_LEN);
        let got = read_full(&mut self.reader, &mut envelope[..]).await?;
        if got == 0 {
            return Err(RecvError::ConnectionClosed.into());
        }
        if got < HEADER_LEN {
            return Err(RecvError::Truncated {
                expected: HEADER_LEN as u64,
                received: got as u64,
            }
            .into());
        }

        let header = decode_header(&envelope)?;
        if header.body_len > self.max_body_len {
            return Err(BaoError::FrameTooLarge(header.body_len));
        }

        let body_len = header.body_len as usize;
        envelope.resize(HEADER_LEN + body_len, 0);
        let got = read_full(&mut self.reader, &mut envelope[HEADER_LEN..]).await?;
        if got < body_len {
            return Err(RecvError::Truncated {
                expected: body_len as u64,
                received: got as u64,
            }
            .into());
        }

        let tail = self.read_tail().await?;
        envelope.extend_from_slice(&tail[..tail.len() - MESSAGE_END.len()]);
        Ok(envelope)
    }

    async fn read_tail(&mut self) -> Result<Vec<u8>, BaoError> {
        let mut tail = Vec::with_capacity(MAX_TAIL_LEN);
        while !tail.ends_with(MESSAGE_END) {
            let room = (MAX_TAIL_LEN - tail.len()) as u64;
            if room == 0 {
                return Err(BaoError::Protocol(format!(
                    "checksum trailer exceeds {MAX_TAIL_LEN} bytes"
                )));
            }
            let n = (&mut self.reader)
                .take(room)
                .read_until(b'\n', &mut tail)
                .await
                .map_err(RecvError::Io)?;
            if n == 0 {
                // Shortest valid trailer: separator, one digit, terminator.
                return Err(RecvError::Truncated {
                    expected: (MESSAGE_END.len() + 2) as u64,
                    received: tail.len() as u64,
                }
                .into());
            }
        }
        Ok(tail)
    }
}

/// Fills `buf` from `reader`, looping on short reads.
/// Returns fewer bytes than requested only when the stream hits EOF.
async fn read_full<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<usize, RecvError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(RecvError::Io(e)),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{append_checksum, encode_header};
    use std::io::Cursor;
    use tokio::io::{AsyncWriteExt, BufReader};

    fn wire(msg_type: u8, body: &[u8]) -> Vec<u8> {
        let mut payload = encode_header(msg_type, body.len() as u64).unwrap().to_vec();
        payload.extend_from_slice(body);
        let mut out = append_checksum(&payload);
        out.extend_from_slice(MESSAGE_END);
        out
    }

    #[tokio::test]
    async fn read_single_envelope() {
        let data = wire(1, b"0\x01success\x01login\x01anonymous");
        let expected = &data[..data.len() - MESSAGE_END.len()];
        let mut reader = FrameReader::new(BufReader::new(Cursor::new(data.clone())));
        let envelope = reader.read_envelope().await.unwrap();
        assert_eq!(&envelope[..], expected);
    }

    #[tokio::test]
    async fn read_back_to_back_envelopes() {
        let mut data = wire(1, b"first");
        data.extend(wire(3, b"second\nwith newline"));
        let mut reader = FrameReader::new(BufReader::new(Cursor::new(data)));

        let first = reader.read_envelope().await.unwrap();
        assert_eq!(&first[HEADER_LEN..HEADER_LEN + 5], b"first");
        let second = reader.read_envelope().await.unwrap();
        assert_eq!(&second[HEADER_LEN..HEADER_LEN + 19], b"second\nwith newline");
    }

    #[tokio::test]
    async fn closed_before_any_byte() {
        let mut reader = FrameReader::new(BufReader::new(Cursor::new(Vec::new())));
        let err = reader.read_envelope().await.unwrap_err();
        assert!(matches!(err, BaoError::Recv(RecvError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn truncated_header() {
        let data = b"1400000".to_vec();
        let mut reader = FrameReader::new(BufReader::new(Cursor::new(data)));
        let err = reader.read_envelope().await.unwrap_err();
        assert!(matches!(
            err,
            BaoError::Recv(RecvError::Truncated { expected: 21, received: 7 })
        ));
    }

    #[tokio::test]
    async fn truncated_body() {
        // Header declares 50 body bytes, only 5 arrive before close.
        let mut data = encode_header(14, 50).unwrap().to_vec();
        data.extend_from_slice(b"0\x01ok\x01");
        let mut reader = FrameReader::new(BufReader::new(Cursor::new(data)));
        let err = reader.read_envelope().await.unwrap_err();
        assert!(matches!(
            err,
            BaoError::Recv(RecvError::Truncated { expected: 50, received: 5 })
        ));
    }

    #[tokio::test]
    async fn truncated_trailer() {
        let mut data = wire(1, b"body");
        data.truncate(data.len() - 4);
        let mut reader = FrameReader::new(BufReader::new(Cursor::new(data)));
        let err = reader.read_envelope().await.unwrap_err();
        assert!(matches!(err, BaoError::Recv(RecvError::Truncated { .. })));
    }

    #[tokio::test]
    async fn oversized_trailer() {
        let mut data = encode_header(1, 2).unwrap().to_vec();
        data.extend_from_slice(b"ok\n123456789012345678901234567890<![CDATA[]]>\n");
        let mut reader = FrameReader::new(BufReader::new(Cursor::new(data)));
        let err = reader.read_envelope().await.unwrap_err();
        assert!(matches!(err, BaoError::Protocol(_)));
    }

    #[tokio::test]
    async fn body_over_limit() {
        let data = wire(12, &[b'x'; 100]);
        let mut reader =
            FrameReader::new(BufReader::new(Cursor::new(data))).with_max_body_len(99);
        let err = reader.read_envelope().await.unwrap_err();
        assert!(matches!(err, BaoError::FrameTooLarge(100)));
    }

    #[tokio::test]
    async fn reassembles_short_reads() {
        let data = wire(14, b"0\x01success\x01query_dividend_data");
        let expected = data[..data.len() - MESSAGE_END.len()].to_vec();
        let (client, mut server) = tokio::io::duplex(4);

        let writer = tokio::spawn(async move {
            for chunk in data.chunks(3) {
                server.write_all(chunk).await.unwrap();
            }
        });

        let mut reader = FrameReader::new(BufReader::new(client));
        let envelope = reader.read_envelope().await.unwrap();
        writer.await.unwrap();
        assert_eq!(&envelope[..], &expected[..]);
    }
}
