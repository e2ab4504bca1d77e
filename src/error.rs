//! Error types for linevault
//!
//! Each component defines its own error enum; `VaultError` unifies them at
//! the extraction boundary. The split matters for the propagation policy:
//! codec and store errors abort the whole extraction, conversion errors on
//! individual lines are demoted to warnings by the formatter.

use thiserror::Error;

/// Result type alias using VaultError
pub type Result<T, E = VaultError> = std::result::Result<T, E>;

// =============================================================================
// Codec Errors
// =============================================================================

/// Errors from decoding one compressed record
#[derive(Debug, Error)]
pub enum CodecError {
    /// The code table filled the 16-bit code space without a clear code.
    #[error("code table overflow without a clear code")]
    TableOverflow,

    /// Input ran out before the end-of-packet code was seen.
    #[error("compressed stream truncated before end-of-packet")]
    Truncated,

    /// One record decoded to more lines than the format permits.
    #[error("record decoded to more than {0} lines")]
    TooManyLines(usize),

    /// Decoded byte count was not a whole number of 270-byte lines.
    #[error("record ended mid-line ({0} trailing bytes)")]
    PartialLine(usize),

    /// The leading code-size byte is outside the supported range.
    #[error("unsupported code size {0}")]
    BadCodeSize(u8),
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors from opening or querying one line store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open store: {0}")]
    Open(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The query window lies entirely outside the store's index.
    #[error("window [{wl_min}, {wl_max}] does not intersect the store index")]
    OutOfRange { wl_min: f64, wl_max: f64 },

    /// `next()` was called before `query_range` positioned the cursor.
    #[error("sequential read attempted before the cursor was positioned")]
    NotPositioned,

    #[error("store is closed")]
    Closed,

    /// Builder input violated the wavelength-sorted invariant.
    #[error("line at {got} breaks non-decreasing wavelength order (last {last})")]
    Unsorted { got: f64, last: f64 },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

// =============================================================================
// Merge Errors
// =============================================================================

/// Errors from inconsistent merge configuration
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("invalid wavelength window [{start}, {end}]")]
    InvalidWindow { start: f64, end: f64 },

    /// A replacement-list source declares an empty or inverted species range.
    #[error("replacement list '{name}' has an invalid species range {lo}..={hi}")]
    InvalidReplacementRange { name: String, lo: i32, hi: i32 },

    #[error("extraction requested with max_lines = 0")]
    ZeroLineCap,
}

// =============================================================================
// Conversion Errors
// =============================================================================

/// Errors from unit conversion; per-line occurrences are non-fatal
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Wavenumber output is only defined in vacuum.
    #[error("wavenumber output requires vacuum medium")]
    WavenumberInAir,

    #[error("non-physical wavelength {0} \u{212b} for unit conversion")]
    NonPhysicalWavelength(f64),
}

// =============================================================================
// Unified Error
// =============================================================================

/// Unified error type surfaced by the extraction engine
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("merge error: {0}")]
    Merge(#[from] MergeError),

    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The extraction exceeded its wall-clock deadline.
    #[error("extraction timed out after {elapsed_secs} s")]
    Timeout { elapsed_secs: u64 },

    /// The worker pool cannot accept more requests.
    #[error("job queue is full ({capacity} waiting requests)")]
    QueueFull { capacity: usize },

    #[error("pool is shut down")]
    PoolShutdown,
}
