//! Line Store
//!
//! One store is a pair of files: a data file of compressed records and a
//! wavelength-sorted descriptor (index) file.
//!
//! ## Descriptor File Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ RecordCount: u32 (4 bytes)                              │
//! ├─────────────────────────────────────────────────────────┤
//! │ Entries (24 bytes each, RecordCount of them)            │
//! │   wl_start: f64 | wl_end: f64 | offset: u32 | len: i32  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Data File Format
//!
//! Back-to-back compressed records (see [`crate::codec`]); each descriptor
//! entry gives one record's byte location. Records hold up to 1024 lines in
//! non-decreasing wavelength order; consecutive records' wavelength ranges
//! may overlap slightly at the boundary, so query results are always
//! re-filtered against the window after decoding.
//!
//! Every `Store` instance owns its file handle, in-memory index, and
//! sequential-read cursor exclusively; independent extractions on separate
//! threads never share store state.

mod builder;
mod index;
mod reader;

pub use builder::StoreBuilder;
pub use index::{DescriptorIndex, RecordIndexEntry};
pub use reader::Store;

/// On-disk size of one descriptor index entry
pub(crate) const INDEX_ENTRY_SIZE: usize = 24;

/// Descriptor header size (the record count)
pub(crate) const DESCRIPTOR_HEADER_SIZE: usize = 4;
