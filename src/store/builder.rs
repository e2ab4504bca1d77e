//! Store Builder
//!
//! Writes a data/descriptor pair from wavelength-sorted lines. Lines are
//! buffered until a record fills, then compressed and appended to the data
//! file; the descriptor is written whole on [`StoreBuilder::finish`].

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::codec::{LineRecord, RecordEncoder, LINES_PER_RECORD, LINE_LENGTH};
use crate::error::StoreError;

use super::index::RecordIndexEntry;
use super::DESCRIPTOR_HEADER_SIZE;

pub struct StoreBuilder {
    data: BufWriter<File>,
    descriptor_path: PathBuf,
    entries: Vec<RecordIndexEntry>,
    pending: Vec<LineRecord>,
    lines_per_record: usize,
    last_wl: Option<f64>,
    offset: u32,
}

impl StoreBuilder {
    pub fn new(data_path: &Path, descriptor_path: &Path) -> Result<Self, StoreError> {
        let data = File::create(data_path).map_err(|e| {
            StoreError::Open(format!("data file {}: {}", data_path.display(), e))
        })?;
        Ok(StoreBuilder {
            data: BufWriter::new(data),
            descriptor_path: descriptor_path.to_path_buf(),
            entries: Vec::new(),
            pending: Vec::new(),
            lines_per_record: LINES_PER_RECORD,
            last_wl: None,
            offset: 0,
        })
    }

    /// Cap the number of lines per compressed record (at most
    /// [`LINES_PER_RECORD`]). Smaller records shorten the decode unit at the
    /// cost of index size.
    pub fn lines_per_record(mut self, n: usize) -> Self {
        self.lines_per_record = n.clamp(1, LINES_PER_RECORD);
        self
    }

    /// Append one line. Wavelengths must be non-decreasing across the whole
    /// build; out-of-order input fails with [`StoreError::Unsorted`].
    pub fn add(&mut self, line: LineRecord) -> Result<(), StoreError> {
        if let Some(last) = self.last_wl {
            if line.wavelength < last {
                return Err(StoreError::Unsorted {
                    got: line.wavelength,
                    last,
                });
            }
        }
        self.last_wl = Some(line.wavelength);
        self.pending.push(line);
        if self.pending.len() >= self.lines_per_record {
            self.flush_record()?;
        }
        Ok(())
    }

    /// Flush any partial record and write the descriptor file.
    pub fn finish(mut self) -> Result<(), StoreError> {
        if !self.pending.is_empty() {
            self.flush_record()?;
        }
        self.data.flush()?;

        let mut desc = Vec::with_capacity(
            DESCRIPTOR_HEADER_SIZE + self.entries.len() * super::INDEX_ENTRY_SIZE,
        );
        desc.extend_from_slice(&(self.entries.len() as u32).to_le_bytes());
        for entry in &self.entries {
            desc.extend_from_slice(&entry.wl_start.to_le_bytes());
            desc.extend_from_slice(&entry.wl_end.to_le_bytes());
            desc.extend_from_slice(&entry.offset.to_le_bytes());
            desc.extend_from_slice(&entry.length.to_le_bytes());
        }
        std::fs::write(&self.descriptor_path, &desc)?;

        tracing::debug!(
            descriptor = %self.descriptor_path.display(),
            records = self.entries.len(),
            "store built"
        );
        Ok(())
    }

    fn flush_record(&mut self) -> Result<(), StoreError> {
        let wl_start = self.pending[0].wavelength;
        let wl_end = self.pending[self.pending.len() - 1].wavelength;

        let mut plain = Vec::with_capacity(self.pending.len() * LINE_LENGTH);
        for line in self.pending.drain(..) {
            plain.extend_from_slice(&line.encode());
        }
        let compressed = RecordEncoder::new().compress(&plain);
        self.data.write_all(&compressed)?;

        self.entries.push(RecordIndexEntry {
            wl_start,
            wl_end,
            offset: self.offset,
            length: compressed.len() as i32,
        });
        self.offset += compressed.len() as u32;
        Ok(())
    }
}
