//! Descriptor Index
//!
//! Loads the descriptor file fully into memory and answers the binary
//! search that positions range queries.

use std::fs;
use std::path::Path;

use crate::codec::ByteOrder;
use crate::error::StoreError;

use super::{DESCRIPTOR_HEADER_SIZE, INDEX_ENTRY_SIZE};

/// Byte location and wavelength bounds of one compressed record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordIndexEntry {
    /// Wavelength of the record's first line
    pub wl_start: f64,
    /// Wavelength of the record's last line
    pub wl_end: f64,
    /// Byte offset of the record in the data file
    pub offset: u32,
    /// Byte length of the record in the data file
    pub length: i32,
}

/// In-memory descriptor index, ascending by `wl_start`
#[derive(Debug)]
pub struct DescriptorIndex {
    entries: Vec<RecordIndexEntry>,
}

impl DescriptorIndex {
    /// Load a descriptor file.
    ///
    /// Fails with [`StoreError::Open`] when the file is missing, shorter
    /// than its own record count promises, or violates the wavelength
    /// ordering invariant.
    pub fn load(path: &Path, order: ByteOrder) -> Result<Self, StoreError> {
        let raw = fs::read(path).map_err(|e| {
            StoreError::Open(format!("descriptor {}: {}", path.display(), e))
        })?;

        if raw.len() < DESCRIPTOR_HEADER_SIZE {
            return Err(StoreError::Open(format!(
                "descriptor {}: too short for a record count",
                path.display()
            )));
        }

        let count_raw: [u8; 4] = raw[..4].try_into().unwrap_or([0; 4]);
        let count = match order {
            ByteOrder::Little => u32::from_le_bytes(count_raw),
            ByteOrder::Big => u32::from_be_bytes(count_raw),
        } as usize;

        let need = DESCRIPTOR_HEADER_SIZE + count * INDEX_ENTRY_SIZE;
        if raw.len() < need {
            return Err(StoreError::Open(format!(
                "descriptor {}: {} records promised, file holds {} bytes (need {})",
                path.display(),
                count,
                raw.len(),
                need
            )));
        }

        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let at = DESCRIPTOR_HEADER_SIZE + i * INDEX_ENTRY_SIZE;
            let e = &raw[at..at + INDEX_ENTRY_SIZE];
            let (wl_start, wl_end, offset, length) = match order {
                ByteOrder::Little => (
                    f64::from_le_bytes(e[0..8].try_into().unwrap_or([0; 8])),
                    f64::from_le_bytes(e[8..16].try_into().unwrap_or([0; 8])),
                    u32::from_le_bytes(e[16..20].try_into().unwrap_or([0; 4])),
                    i32::from_le_bytes(e[20..24].try_into().unwrap_or([0; 4])),
                ),
                ByteOrder::Big => (
                    f64::from_be_bytes(e[0..8].try_into().unwrap_or([0; 8])),
                    f64::from_be_bytes(e[8..16].try_into().unwrap_or([0; 8])),
                    u32::from_be_bytes(e[16..20].try_into().unwrap_or([0; 4])),
                    i32::from_be_bytes(e[20..24].try_into().unwrap_or([0; 4])),
                ),
            };
            if length < 0 {
                return Err(StoreError::Open(format!(
                    "descriptor {}: record {} has negative length",
                    path.display(),
                    i
                )));
            }
            entries.push(RecordIndexEntry {
                wl_start,
                wl_end,
                offset,
                length,
            });
        }

        // Index invariant: ascending record start wavelengths
        for w in entries.windows(2) {
            if w[1].wl_start < w[0].wl_start {
                return Err(StoreError::Open(format!(
                    "descriptor {}: index not sorted by wl_start ({} after {})",
                    path.display(),
                    w[1].wl_start,
                    w[0].wl_start
                )));
            }
        }

        Ok(DescriptorIndex { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RecordIndexEntry] {
        &self.entries
    }

    pub fn get(&self, i: usize) -> Option<&RecordIndexEntry> {
        self.entries.get(i)
    }

    /// Wavelength span covered by the whole store, if non-empty
    pub fn span(&self) -> Option<(f64, f64)> {
        match (self.entries.first(), self.entries.last()) {
            (Some(first), Some(last)) => Some((first.wl_start, last.wl_end)),
            _ => None,
        }
    }

    /// Binary-search for the first record intersecting `[wl_min, wl_max]`.
    ///
    /// Ties at an index edge resolve to the earliest entry. Fails with
    /// [`StoreError::OutOfRange`] when the window lies entirely outside the
    /// indexed span.
    pub fn locate(&self, wl_min: f64, wl_max: f64) -> Result<usize, StoreError> {
        let (first, last) = match (self.entries.first(), self.entries.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => {
                return Err(StoreError::OutOfRange { wl_min, wl_max });
            }
        };
        if wl_min > last.wl_end || wl_max < first.wl_start {
            return Err(StoreError::OutOfRange { wl_min, wl_max });
        }
        if wl_min < first.wl_start {
            return Ok(0);
        }

        // Bisect on record start wavelengths
        let mut lo = 0usize;
        let mut hi = self.entries.len() - 1;
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if wl_min < self.entries[mid].wl_start {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        // The window may start in the gap between two records
        if wl_min > self.entries[lo].wl_end {
            Ok(hi)
        } else {
            Ok(lo)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(bounds: &[(f64, f64)]) -> DescriptorIndex {
        DescriptorIndex {
            entries: bounds
                .iter()
                .enumerate()
                .map(|(i, &(wl_start, wl_end))| RecordIndexEntry {
                    wl_start,
                    wl_end,
                    offset: i as u32 * 100,
                    length: 100,
                })
                .collect(),
        }
    }

    #[test]
    fn locate_inside_record() {
        let idx = index(&[(4000.0, 4500.0), (4500.0, 5000.0), (5000.0, 5500.0)]);
        assert_eq!(idx.locate(4600.0, 4700.0).unwrap(), 1);
    }

    #[test]
    fn locate_before_first_record() {
        let idx = index(&[(4000.0, 4500.0), (4500.0, 5000.0)]);
        assert_eq!(idx.locate(3000.0, 4200.0).unwrap(), 0);
    }

    #[test]
    fn locate_boundary_prefers_earliest() {
        let idx = index(&[(4000.0, 4500.0), (4500.0, 5000.0)]);
        // 4500.0 sits on the shared edge; the earlier record wins
        assert_eq!(idx.locate(4500.0, 4600.0).unwrap(), 0);
    }

    #[test]
    fn locate_in_gap_between_records() {
        let idx = index(&[(4000.0, 4400.0), (4600.0, 5000.0)]);
        assert_eq!(idx.locate(4500.0, 4800.0).unwrap(), 1);
    }

    #[test]
    fn locate_out_of_range() {
        let idx = index(&[(4000.0, 4500.0)]);
        assert!(matches!(
            idx.locate(5000.0, 6000.0),
            Err(StoreError::OutOfRange { .. })
        ));
        assert!(matches!(
            idx.locate(1000.0, 2000.0),
            Err(StoreError::OutOfRange { .. })
        ));
    }
}
