//! Store Reader
//!
//! Opens one data/descriptor pair and answers range and sequential queries.
//!
//! The descriptor index lives in memory for the store's lifetime; record
//! reads seek directly to the indexed byte range. The sequential cursor
//! belongs to this instance alone.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::codec::{decode_record, ByteOrder, LineRecord};
use crate::error::StoreError;

use super::index::{DescriptorIndex, RecordIndexEntry};

/// Open store state, dropped on close
struct OpenState {
    file: File,
    index: DescriptorIndex,
    /// Next record the sequential cursor will read; None until positioned
    cursor: Option<usize>,
}

/// One spectral-line store: compressed data file + descriptor index
pub struct Store {
    data_path: PathBuf,
    order: ByteOrder,
    state: Option<OpenState>,
}

impl Store {
    /// Open a store from its data and descriptor files.
    ///
    /// The descriptor is read fully into memory; the data file is opened
    /// for random access. Fails with [`StoreError::Open`] when either file
    /// is missing or the descriptor is malformed.
    pub fn open(data_path: &Path, descriptor_path: &Path) -> Result<Self, StoreError> {
        let order = ByteOrder::STORED;
        let index = DescriptorIndex::load(descriptor_path, order)?;
        let file = File::open(data_path).map_err(|e| {
            StoreError::Open(format!("data file {}: {}", data_path.display(), e))
        })?;

        tracing::debug!(
            data = %data_path.display(),
            records = index.len(),
            span = ?index.span(),
            "store opened"
        );

        Ok(Store {
            data_path: data_path.to_path_buf(),
            order,
            state: Some(OpenState {
                file,
                index,
                cursor: None,
            }),
        })
    }

    /// Query all lines with wavelength in `[wl_min, wl_max]`, up to
    /// `max_lines`.
    ///
    /// Positions the sequential cursor; [`Store::next`] continues from the
    /// record after the last one consumed here. Record bounds in the index
    /// may overlap the window without containing any matching line, so
    /// every decoded line is re-checked against the window.
    pub fn query_range(
        &mut self,
        wl_min: f64,
        wl_max: f64,
        max_lines: usize,
    ) -> Result<Vec<LineRecord>, StoreError> {
        let order = self.order;
        let state = self.state.as_mut().ok_or(StoreError::Closed)?;
        let start = state.index.locate(wl_min, wl_max)?;
        state.cursor = Some(start);

        let mut lines = Vec::new();
        let mut record_no = start;
        'records: while let Some(entry) = state.index.get(record_no).copied() {
            let raw = read_record(&mut state.file, &entry)?;
            let decoded = decode_record(&raw, order)?;
            record_no += 1;
            state.cursor = Some(record_no);

            // Data is wavelength-sorted: a record opening past the window
            // proves exhaustion.
            if decoded.first().is_some_and(|r| r.wavelength > wl_max) {
                break;
            }
            for rec in decoded {
                if rec.wavelength > wl_max {
                    break 'records;
                }
                if rec.wavelength >= wl_min {
                    lines.push(rec);
                    if lines.len() >= max_lines {
                        break 'records;
                    }
                }
            }
        }
        Ok(lines)
    }

    /// Position the sequential cursor on the first record intersecting
    /// `[wl_min, wl_max]` without decoding anything.
    ///
    /// Unlike [`Store::query_range`] this consumes no lines, so a caller
    /// draining the window with [`Store::next`] sees every record whole.
    pub fn seek_range(&mut self, wl_min: f64, wl_max: f64) -> Result<(), StoreError> {
        let state = self.state.as_mut().ok_or(StoreError::Closed)?;
        let start = state.index.locate(wl_min, wl_max)?;
        state.cursor = Some(start);
        Ok(())
    }

    /// Decode the next sequential record whole (no window filter).
    ///
    /// Returns `Ok(None)` once the store is exhausted. Fails with
    /// [`StoreError::NotPositioned`] unless a prior [`Store::query_range`]
    /// or [`Store::seek_range`] positioned the cursor.
    pub fn next(&mut self) -> Result<Option<Vec<LineRecord>>, StoreError> {
        let order = self.order;
        let state = self.state.as_mut().ok_or(StoreError::Closed)?;
        let record_no = state.cursor.ok_or(StoreError::NotPositioned)?;
        let entry = match state.index.get(record_no).copied() {
            Some(e) => e,
            None => return Ok(None),
        };
        let raw = read_record(&mut state.file, &entry)?;
        let decoded = decode_record(&raw, order)?;
        state.cursor = Some(record_no + 1);
        Ok(Some(decoded))
    }

    /// Release the file handle and index; later operations fail with
    /// [`StoreError::Closed`]
    pub fn close(&mut self) {
        if self.state.take().is_some() {
            tracing::debug!(data = %self.data_path.display(), "store closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    /// Number of compressed records in the store
    pub fn record_count(&self) -> Result<usize, StoreError> {
        Ok(self.state.as_ref().ok_or(StoreError::Closed)?.index.len())
    }

    /// Wavelength span covered by the index, if the store is non-empty
    pub fn span(&self) -> Result<Option<(f64, f64)>, StoreError> {
        Ok(self.state.as_ref().ok_or(StoreError::Closed)?.index.span())
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }
}

/// Seek to a record's byte range and read it whole
fn read_record(file: &mut File, entry: &RecordIndexEntry) -> Result<Bytes, StoreError> {
    file.seek(SeekFrom::Start(entry.offset as u64))?;
    let mut buf = vec![0u8; entry.length as usize];
    file.read_exact(&mut buf)?;
    Ok(Bytes::from(buf))
}
