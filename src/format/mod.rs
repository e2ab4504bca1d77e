//! Output Formatting
//!
//! Converts merged lines into the requested medium, wavelength unit and
//! energy unit, then renders short or long fixed-width text plus a
//! bibliography blob.

mod render;
pub mod units;

pub use render::{FormattedOutput, Formatter};
