//! TLV record format
//!
//! A record is a 4-byte header followed by the payload, padded with
//! [`PADDING_BYTE`] so the next header starts on a 4-byte boundary.
//!
//! ```text
//! +---------+---------+---------+-------------+------------------------+
//! | type_hi | type_lo | padding | payload_len | payload .. 0xFF fill   |
//! +---------+---------+---------+-------------+------------------------+
//! ```

mod header;

pub use header::{padding_for, TlvHeader, DATA_ALIGN, MAX_PAYLOAD_LEN, PADDING_BYTE, TYPE_EMPTY};
