//! Multi-Source Merge
//!
//! K-way merge of wavelength-sorted line stores into one ordered stream.
//! Each enabled source gets a cursor; the engine repeatedly takes the
//! globally smallest pending wavelength and folds together lines that
//! describe the same physical transition seen by different sources.
//!
//! Two lines are the same transition when they share a species code, agree
//! on both J quantum numbers and on upper-level energy, lie within a
//! wavelength tolerance that scales with wavelength, and carry compatible
//! forbidden-transition flags. The higher-ranked source wins; unknown
//! broadening parameters on the winner are filled from the loser.
//! Incompatible flags keep both lines, marked as intentional duplicates.

mod cursor;
mod engine;
mod isotope;

pub use cursor::SourceCursor;
pub use engine::MergeEngine;
pub use isotope::IsotopeTable;

use crate::codec::LineRecord;

/// One line of merge output
#[derive(Debug, Clone)]
pub struct MergedLine {
    pub record: LineRecord,

    /// Index of the winning source in the request's source list
    pub source_index: usize,

    /// Number of source lines folded into this one; 1 means no merge
    pub merged_from: u32,

    /// Set when an otherwise-equivalent line with an incompatible
    /// forbidden-transition flag was kept alongside this one
    pub kept_duplicate: bool,
}

impl MergedLine {
    pub fn new(record: LineRecord, source_index: usize) -> Self {
        MergedLine {
            record,
            source_index,
            merged_from: 1,
            kept_duplicate: false,
        }
    }
}

/// Counters accumulated over one merge run
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeStats {
    /// Lines pulled from all cursors
    pub lines_in: u64,

    /// Pairs folded into one surviving line
    pub merged: u64,

    /// Equivalent pairs kept separate over forbidden-flag conflicts
    pub kept_duplicates: u64,

    /// Lines dropped by the species filter
    pub dropped_by_filter: u64,

    /// Lines dropped because a replacement source owns their species
    pub dropped_replaced: u64,

    /// Lines whose log gf was rescaled by isotopic abundance
    pub scaled: u64,

    /// Lines emitted
    pub emitted: u64,
}
