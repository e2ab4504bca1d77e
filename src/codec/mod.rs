//! Record Codec
//!
//! LZW-family codec for compressed line records.
//!
//! ## Stream Format
//!
//! One compressed record is a byte stream of variable-width codes, packed
//! LSB-first:
//!
//! ```text
//! ┌───────────────┬──────────────────────────────────────────────┐
//! │ CodeSize (1)  │ Codes (variable width, LSB-first packing)    │
//! └───────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! The alphabet is `1 << CodeSize` literal byte values; CLEAR = alphabet and
//! END-OF-PACKET = alphabet + 1 sit immediately above it, and the first
//! dynamic table slot is alphabet + 2. Codes start at `CodeSize + 1` bits
//! and grow one bit whenever the next free table slot reaches the current
//! width's ceiling, up to [`MAX_CODE_WIDTH`] bits. A CLEAR code resets the
//! table and the width.
//!
//! Decoded bytes fill consecutive fixed 270-byte line buffers; each full
//! buffer is reinterpreted as one [`LineRecord`] (see [`line`]).

mod bits;
mod decoder;
mod encoder;
mod line;

pub use decoder::{decode_record, RecordDecoder};
pub use encoder::RecordEncoder;
pub use line::{ByteOrder, LineRecord, TERM_BLOB_LEN};

/// Uncompressed size of a single transition line
pub const LINE_LENGTH: usize = 270;

/// Maximum number of lines in one record
pub const LINES_PER_RECORD: usize = 1024;

/// Maximum code width in bits; the table is bounded by this code space
pub const MAX_CODE_WIDTH: u32 = 16;

/// Code table capacity (16-bit code space)
pub const TABLE_SIZE: usize = 1 << MAX_CODE_WIDTH;

/// Code size written by the reference encoder (byte-oriented alphabet)
pub const DEFAULT_CODE_SIZE: u8 = 8;
