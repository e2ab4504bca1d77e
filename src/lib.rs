//! # LineVault
//!
//! A spectral-line record store and extraction engine:
//! - Compressed binary line stores with a wavelength-indexed descriptor
//! - Range queries with a per-instance sequential cursor
//! - K-way multi-source merge with duplicate-transition resolution
//! - Unit conversion and fixed-width rendering of the merged output
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Extraction Pool                            │
//! │             (One Worker per Request)                         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Merge Engine                              │
//! │          (K-Way Merge + Duplicate Folding)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │    Store    │          │  Formatter  │
//!   │  (Cursors)  │          │   (Units)   │
//!   └──────┬──────┘          └─────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │    Codec    │
//!   │ (Records)   │
//!   └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod store;
pub mod species;
pub mod merge;
pub mod format;
pub mod extract;
pub mod pool;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{ExtractionRequest, LinelistSource};
pub use error::{Result, VaultError};
pub use extract::{ExtractionResult, Extractor};
pub use pool::ExtractionPool;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of LineVault
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
