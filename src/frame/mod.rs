//! Message framing: fixed-width text header, body, CRC32 trailer.
//!
//! ```text
//! ┌────────┬─────────────┬──────────────────┬──────┬────┬──────────┬────────────────┐
//! │ Type   │ Body length │ Reserved/version │ Body │ \n │ CRC32    │ <![CDATA[]]>\n │
//! │ 2 dig. │ 10 digits   │ \x01 00.9.10 \x01│      │    │ decimal  │ terminator     │
//! └────────┴─────────────┴──────────────────┴──────┴────┴──────────┴────────────────┘
//! ```
//!
//! The checksum covers header and body. The terminator is not part of the
//! envelope; it only delimits the variable-length checksum on the wire.

pub mod checksum;
pub mod header;
pub mod reader;
pub mod writer;

pub use checksum::{append_checksum, checksum, verify_and_strip_checksum};
pub use header::{decode_header, encode_header, FrameHeader};
pub use reader::FrameReader;
pub use writer::FrameWriter;

/// Total header width in bytes.
pub const HEADER_LEN: usize = 21;

/// Width of the message type field.
pub const TYPE_LEN: usize = 2;

/// Width of the zero-padded body length field.
pub const LENGTH_LEN: usize = 10;

/// Width of the trailing reserved field.
pub const RESERVED_LEN: usize = HEADER_LEN - TYPE_LEN - LENGTH_LEN;

/// Largest body length the 10-digit field can carry.
pub const MAX_BODY_LEN: u64 = 9_999_999_999;

/// Version tag written into the reserved header bytes.
pub const CLIENT_VERSION: &str = "00.9.10";

/// Separates the body from the checksum trailer.
pub const CHECKSUM_SPLIT: u8 = b'\n';

/// Terminates every envelope on the wire.
pub const MESSAGE_END: &[u8] = b"<![CDATA[]]>\n";

/// Longest possible trailer: separator, 10 checksum digits, terminator.
pub const MAX_TAIL_LEN: usize = 1 + 10 + MESSAGE_END.len();

const _: () = assert!(CLIENT_VERSION.len() + 2 == RESERVED_LEN);
