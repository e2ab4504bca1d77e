//! Record Decoder
//!
//! Decodes one compressed record into typed line records, incrementally.
//!
//! The code stream carries no stored table; the prefix/suffix table is
//! rebuilt on the fly, one entry per data code. Chains are expanded through
//! the prefix links onto an explicit stack and emitted in reverse (the chain
//! walks tail-first). A CLEAR code resets the table to the base alphabet and
//! the code width to its initial value; the code immediately after a CLEAR
//! is raw data.

use std::collections::VecDeque;

use crate::error::CodecError;

use super::bits::CodeReader;
use super::line::{ByteOrder, LineRecord};
use super::{LINES_PER_RECORD, LINE_LENGTH, MAX_CODE_WIDTH, TABLE_SIZE};

/// Iterator over the line records of one compressed record
pub struct RecordDecoder<'a> {
    reader: CodeReader<'a>,
    order: ByteOrder,

    // Alphabet-derived constants
    clear_code: u16,
    eop_code: u16,
    first_free: usize,
    byte_mask: u16,
    init_width: u32,

    // Decoder state
    width: u32,
    max_code: usize,
    free_code: usize,
    prefix: Vec<u16>,
    suffix: Vec<u8>,
    old_code: u16,
    fin_char: u8,
    just_cleared: bool,

    // Chain expansion stack (LIFO)
    stack: Vec<u8>,

    // Line accumulation
    line_buf: [u8; LINE_LENGTH],
    fill: usize,
    lines_done: usize,
    ready: VecDeque<LineRecord>,

    finished: bool,
    failed: bool,
}

impl<'a> RecordDecoder<'a> {
    /// Start decoding one compressed record.
    ///
    /// The first byte of `data` is the code size; the rest is the packed
    /// code stream. `order` is the byte order the store was written in.
    pub fn new(data: &'a [u8], order: ByteOrder) -> Result<Self, CodecError> {
        let (&code_size, codes) = data.split_first().ok_or(CodecError::Truncated)?;
        if code_size == 0 || code_size as u32 >= MAX_CODE_WIDTH {
            return Err(CodecError::BadCodeSize(code_size));
        }

        let alphabet = 1u16 << code_size;
        let init_width = code_size as u32 + 1;

        Ok(RecordDecoder {
            reader: CodeReader::new(codes),
            order,
            clear_code: alphabet,
            eop_code: alphabet + 1,
            first_free: alphabet as usize + 2,
            byte_mask: alphabet - 1,
            init_width,
            width: init_width,
            max_code: 1 << init_width,
            free_code: alphabet as usize + 2,
            prefix: vec![0u16; TABLE_SIZE],
            suffix: vec![0u8; TABLE_SIZE],
            old_code: 0,
            fin_char: 0,
            just_cleared: true,
            stack: Vec::new(),
            line_buf: [0u8; LINE_LENGTH],
            fill: 0,
            lines_done: 0,
            ready: VecDeque::new(),
            finished: false,
            failed: false,
        })
    }

    /// Append one decoded byte; completes a line record every 270 bytes
    fn push_byte(&mut self, byte: u8) -> Result<(), CodecError> {
        self.line_buf[self.fill] = byte;
        self.fill += 1;
        if self.fill == LINE_LENGTH {
            if self.lines_done == LINES_PER_RECORD {
                return Err(CodecError::TooManyLines(LINES_PER_RECORD));
            }
            self.ready
                .push_back(LineRecord::decode(&self.line_buf, self.order));
            self.lines_done += 1;
            self.fill = 0;
        }
        Ok(())
    }

    /// Reset width and table to the just-cleared state
    fn reset_table(&mut self) {
        self.width = self.init_width;
        self.max_code = 1 << self.init_width;
        self.free_code = self.first_free;
        self.just_cleared = true;
    }

    /// Consume one code from the stream, appending any decoded bytes
    fn advance(&mut self) -> Result<(), CodecError> {
        let code = self.reader.read(self.width)?;

        if code == self.eop_code {
            self.finished = true;
            return Ok(());
        }
        if code == self.clear_code {
            self.reset_table();
            return Ok(());
        }

        if self.just_cleared {
            // The code right after a clear is raw data, no table entry
            self.old_code = code;
            self.fin_char = (code & self.byte_mask) as u8;
            self.just_cleared = false;
            return self.push_byte(self.fin_char);
        }

        // At table capacity the only acceptable code was CLEAR
        if self.free_code >= TABLE_SIZE {
            return Err(CodecError::TableOverflow);
        }

        let in_code = code;
        let mut cur = code as usize;
        self.stack.clear();

        // Not in the table yet: the KwKwK case, repeat the last character
        if cur >= self.free_code {
            cur = self.old_code as usize;
            self.stack.push(self.fin_char);
        }

        // Walk the prefix chain to its root, stacking suffixes
        while cur > self.byte_mask as usize {
            if self.stack.len() > TABLE_SIZE {
                return Err(CodecError::TableOverflow);
            }
            self.stack.push(self.suffix[cur]);
            cur = self.prefix[cur] as usize;
        }
        self.fin_char = (cur as u16 & self.byte_mask) as u8;
        self.stack.push(self.fin_char);

        // Stacked LIFO, emit in reverse
        for i in (0..self.stack.len()).rev() {
            let b = self.stack[i];
            self.push_byte(b)?;
        }

        // Grow the table by one entry linking old code to new first char
        self.prefix[self.free_code] = self.old_code;
        self.suffix[self.free_code] = self.fin_char;
        self.old_code = in_code;
        self.free_code += 1;
        if self.free_code >= self.max_code && self.width < MAX_CODE_WIDTH {
            self.width += 1;
            self.max_code <<= 1;
        }
        Ok(())
    }
}

impl Iterator for RecordDecoder<'_> {
    type Item = Result<LineRecord, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(rec) = self.ready.pop_front() {
                return Some(Ok(rec));
            }
            if self.failed {
                return None;
            }
            if self.finished {
                if self.fill > 0 {
                    self.failed = true;
                    return Some(Err(CodecError::PartialLine(self.fill)));
                }
                return None;
            }
            if let Err(e) = self.advance() {
                self.failed = true;
                return Some(Err(e));
            }
        }
    }
}

/// Decode a whole compressed record into owned line records
pub fn decode_record(data: &[u8], order: ByteOrder) -> Result<Vec<LineRecord>, CodecError> {
    RecordDecoder::new(data, order)?.collect()
}
