//! Record Encoder
//!
//! Reference compressor producing the stream the decoder reads. Used by the
//! store builder and by round-trip tests.
//!
//! The width schedule mirrors the decoder exactly: the decoder adds its
//! table entry one code behind the encoder, so the encoder widens only once
//! its table is one entry past the ceiling, and it re-checks once more
//! before emitting the end-of-packet code (the decoder inserts an entry for
//! the final data code before reading it).

use std::collections::HashMap;

use super::bits::CodeWriter;
use super::{DEFAULT_CODE_SIZE, MAX_CODE_WIDTH, TABLE_SIZE};

/// LZW compressor for one record's worth of line bytes
pub struct RecordEncoder {
    code_size: u8,
}

impl RecordEncoder {
    pub fn new() -> Self {
        RecordEncoder {
            code_size: DEFAULT_CODE_SIZE,
        }
    }

    /// Compress `data` into one record stream (code-size byte + codes)
    pub fn compress(&self, data: &[u8]) -> Vec<u8> {
        let alphabet = 1u16 << self.code_size;
        let clear_code = alphabet;
        let eop_code = alphabet + 1;
        let first_free = alphabet as usize + 2;
        let init_width = self.code_size as u32 + 1;

        let mut writer = CodeWriter::new();
        let mut table: HashMap<(u16, u8), u16> = HashMap::new();
        let mut next_code = first_free;
        let mut width = init_width;
        let mut max_code: usize = 1 << init_width;

        let mut seq: Option<u16> = None;

        for &byte in data {
            let cur = match seq {
                Some(c) => c,
                None => {
                    seq = Some(u16::from(byte));
                    continue;
                }
            };
            if let Some(&code) = table.get(&(cur, byte)) {
                seq = Some(code);
                continue;
            }

            writer.write(cur, width);
            if next_code < TABLE_SIZE {
                table.insert((cur, byte), next_code as u16);
                next_code += 1;
                // Decoder trails by one entry; widen one entry late
                if next_code > max_code && width < MAX_CODE_WIDTH {
                    width += 1;
                    max_code <<= 1;
                }
            } else {
                writer.write(clear_code, width);
                table.clear();
                next_code = first_free;
                width = init_width;
                max_code = 1 << init_width;
            }
            seq = Some(u16::from(byte));
        }

        if let Some(cur) = seq {
            writer.write(cur, width);
            // The decoder inserts an entry for this code before reading EOP
            next_code += 1;
            if next_code > max_code && width < MAX_CODE_WIDTH {
                width += 1;
            }
        }
        writer.write(eop_code, width);

        let mut out = Vec::with_capacity(2 + data.len() / 2);
        out.push(self.code_size);
        out.extend_from_slice(&writer.finish());
        out
    }
}

impl Default for RecordEncoder {
    fn default() -> Self {
        Self::new()
    }
}
