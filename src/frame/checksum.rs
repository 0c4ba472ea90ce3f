//! CRC32 trailer appended to every envelope.

use super::CHECKSUM_SPLIT;
use crate::error::BaoError;

/// Calculates the CRC32 checksum of `data`.
pub fn checksum(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Returns `payload` followed by `\n` and its decimal checksum.
pub fn append_checksum(payload: &[u8]) -> Vec<u8> {
    let crc = checksum(payload).to_string();
    let mut out = Vec::with_capacity(payload.len() + 1 + crc.len());
    out.extend_from_slice(payload);
    out.push(CHECKSUM_SPLIT);
    out.extend_from_slice(crc.as_bytes());
    out
}

/// Checks the trailer of `framed` and returns the payload in front of it.
///
/// A missing separator or a trailer that is not the canonical decimal form of
/// the checksum both count as a mismatch.
pub fn verify_and_strip_checksum(framed: &[u8]) -> Result<&[u8], BaoError> {
    let Some(split) = framed.iter().rposition(|&b| b == CHECKSUM_SPLIT) else {
        return Err(BaoError::ChecksumMismatch {
            trailer: String::new(),
            computed: checksum(framed),
        });
    };

    let (payload, trailer) = (&framed[..split], &framed[split + 1..]);
    let computed = checksum(payload);
    if trailer != computed.to_string().as_bytes() {
        return Err(BaoError::ChecksumMismatch {
            trailer: String::from_utf8_lossy(trailer).into_owned(),
            computed,
        });
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_crc() {
        // Standard CRC-32 check value.
        assert_eq!(checksum(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn append_then_verify() {
        let payload = "000000000005\x0100.9.10\x01login".as_bytes();
        let framed = append_checksum(payload);
        assert_eq!(verify_and_strip_checksum(&framed).unwrap(), payload);
    }

    #[test]
    fn empty_payload() {
        let framed = append_checksum(b"");
        assert_eq!(framed[0], b'\n');
        assert_eq!(verify_and_strip_checksum(&framed).unwrap(), b"");
    }

    #[test]
    fn payload_with_newlines() {
        let payload = b"line one\nline two\n";
        let framed = append_checksum(payload);
        assert_eq!(verify_and_strip_checksum(&framed).unwrap(), payload);
    }

    #[test]
    fn every_single_byte_flip_is_detected() {
        let payload = "140000000011\x0100.9.10\x01query\x01\u{6b63}".as_bytes();
        let framed = append_checksum(payload);
        for i in 0..framed.len() {
            for mask in [0x01u8, 0x20, 0x80] {
                let mut corrupted = framed.clone();
                corrupted[i] ^= mask;
                let result = verify_and_strip_checksum(&corrupted);
                assert!(
                    matches!(result, Err(BaoError::ChecksumMismatch { .. })),
                    "flip of byte {i} with mask {mask:#04x} went unnoticed"
                );
            }
        }
    }

    #[test]
    fn missing_separator() {
        let err = verify_and_strip_checksum(b"no trailer here").unwrap_err();
        assert!(matches!(err, BaoError::ChecksumMismatch { .. }));
    }

    #[test]
    fn leading_zero_trailer_rejected() {
        let payload = b"abc";
        let mut framed = payload.to_vec();
        framed.push(b'\n');
        framed.extend_from_slice(format!("0{}", checksum(payload)).as_bytes());
        assert!(verify_and_strip_checksum(&framed).is_err());
    }
}
