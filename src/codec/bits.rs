//! Variable-width code packing
//!
//! Codes are packed LSB-first: the first code occupies the low bits of the
//! first byte, and each subsequent code continues from the next free bit.

use crate::error::CodecError;

/// Reads variable-width codes from a byte slice, LSB-first
pub struct CodeReader<'a> {
    data: &'a [u8],
    pos: usize,
    /// Bit accumulator, low bits are the oldest unread bits
    acc: u32,
    /// Number of valid bits in the accumulator
    bits: u32,
}

impl<'a> CodeReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        CodeReader {
            data,
            pos: 0,
            acc: 0,
            bits: 0,
        }
    }

    /// Read the next `width`-bit code.
    ///
    /// Fails with [`CodecError::Truncated`] when the input ends mid-code.
    pub fn read(&mut self, width: u32) -> Result<u16, CodecError> {
        debug_assert!(width <= 16);
        while self.bits < width {
            let byte = *self.data.get(self.pos).ok_or(CodecError::Truncated)?;
            self.acc |= (byte as u32) << self.bits;
            self.bits += 8;
            self.pos += 1;
        }
        let code = (self.acc & ((1u32 << width) - 1)) as u16;
        self.acc >>= width;
        self.bits -= width;
        Ok(code)
    }
}

/// Writes variable-width codes to a growing byte buffer, LSB-first
pub struct CodeWriter {
    out: Vec<u8>,
    acc: u32,
    bits: u32,
}

impl CodeWriter {
    pub fn new() -> Self {
        CodeWriter {
            out: Vec::new(),
            acc: 0,
            bits: 0,
        }
    }

    /// Append one `width`-bit code
    pub fn write(&mut self, code: u16, width: u32) {
        debug_assert!(width <= 16 && (code as u32) < (1u32 << width));
        self.acc |= (code as u32) << self.bits;
        self.bits += width;
        while self.bits >= 8 {
            self.out.push((self.acc & 0xFF) as u8);
            self.acc >>= 8;
            self.bits -= 8;
        }
    }

    /// Flush the final partial byte and return the packed stream
    pub fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.out.push((self.acc & 0xFF) as u8);
        }
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_mixed_widths() {
        let mut w = CodeWriter::new();
        w.write(0x1FF, 9);
        w.write(0x005, 9);
        w.write(0x3AB, 10);
        w.write(0x001, 12);
        let packed = w.finish();

        let mut r = CodeReader::new(&packed);
        assert_eq!(r.read(9).unwrap(), 0x1FF);
        assert_eq!(r.read(9).unwrap(), 0x005);
        assert_eq!(r.read(10).unwrap(), 0x3AB);
        assert_eq!(r.read(12).unwrap(), 0x001);
    }

    #[test]
    fn truncated_input() {
        let mut r = CodeReader::new(&[0xFF]);
        assert_eq!(r.read(8).unwrap(), 0xFF);
        assert!(matches!(r.read(8), Err(CodecError::Truncated)));
    }
}
