//! Extraction Configuration
//!
//! Request and source descriptions with sensible defaults. Everything here
//! is plain data; validation happens once in [`ExtractionRequest::validate`]
//! before any store is opened.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::MergeError;

/// Ceiling on one extraction's wall-clock time
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

/// Energy unit, on disk or in output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyUnit {
    ElectronVolt,
    InverseCm,
}

/// Output wavelength unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WavelengthUnit {
    Angstrom,
    Nanometer,
    /// Wavenumber; only valid together with [`Medium::Vacuum`]
    InverseCm,
}

/// Medium the output wavelengths refer to. Stores always hold vacuum
/// wavelengths; air output applies a refractive-index correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Medium {
    Air,
    Vacuum,
}

/// Rendered line shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// One line per transition: wavelength, species, loggf, energies, damping
    Short,
    /// Adds term designations and bibliography pointers
    Long,
}

/// How a source participates in the merge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SourceRole {
    /// Merged with every other standard source
    Standard,
    /// Contributes lines but never merges with other sources
    Standalone,
    /// Exclusive provider for a species-code range; lines for those
    /// species from other sources are dropped
    Replacement { species_lo: i32, species_hi: i32 },
}

/// One linelist store and its merge standing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinelistSource {
    /// Short label used in logs and merge statistics
    pub name: String,

    /// Compressed data file
    pub data_path: PathBuf,

    /// Descriptor index file
    pub descriptor_path: PathBuf,

    /// Tie-break order among equally ranked sources; lower wins
    pub priority: u32,

    /// Quality rank; the higher-ranked line survives a merge
    pub rank_weight: i32,

    pub enabled: bool,

    pub role: SourceRole,

    /// Unit the store's energy levels are written in. Cursors normalize
    /// everything to cm⁻¹ on read.
    pub energy_unit: EnergyUnit,
}

impl LinelistSource {
    pub fn new(
        name: impl Into<String>,
        data_path: impl Into<PathBuf>,
        descriptor_path: impl Into<PathBuf>,
    ) -> Self {
        LinelistSource {
            name: name.into(),
            data_path: data_path.into(),
            descriptor_path: descriptor_path.into(),
            priority: 0,
            rank_weight: 0,
            enabled: true,
            role: SourceRole::Standard,
            energy_unit: EnergyUnit::InverseCm,
        }
    }

    pub fn priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn rank_weight(mut self, weight: i32) -> Self {
        self.rank_weight = weight;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn role(mut self, role: SourceRole) -> Self {
        self.role = role;
        self
    }

    pub fn energy_unit(mut self, unit: EnergyUnit) -> Self {
        self.energy_unit = unit;
        self
    }
}

/// Duplicate-detection tuning
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MergeSettings {
    /// Wavelength tolerance at `wl_ref`, in Å
    pub window_ref: f64,

    /// Reference wavelength the tolerance scales from, in Å
    pub wl_ref: f64,

    /// Relative tolerance on upper-level energy agreement
    pub energy_rel_tol: f64,
}

impl Default for MergeSettings {
    fn default() -> Self {
        MergeSettings {
            window_ref: 0.05,
            wl_ref: 5000.0,
            energy_rel_tol: 1e-3,
        }
    }
}

impl MergeSettings {
    /// Tolerance at wavelength `wl`, clamped to `[0.01, 100] * window_ref`
    pub fn tolerance_at(&self, wl: f64) -> f64 {
        let raw = self.window_ref * wl / self.wl_ref;
        raw.clamp(0.01 * self.window_ref, 100.0 * self.window_ref)
    }
}

/// One extraction job: window, sources and output flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRequest {
    // -------------------------------------------------------------------------
    // Window
    // -------------------------------------------------------------------------
    /// Window start in vacuum Å; must be positive and below `wl_end`
    pub wl_start: f64,

    /// Window end in vacuum Å
    pub wl_end: f64,

    /// Hard cap on emitted lines
    pub max_lines: usize,

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------
    /// Species codes to keep; empty = no filter
    pub species_filter: Vec<i32>,

    /// Sources in configuration order; disabled entries are skipped
    pub sources: Vec<LinelistSource>,

    // -------------------------------------------------------------------------
    // Output flags
    // -------------------------------------------------------------------------
    pub energy_unit: EnergyUnit,
    pub wavelength_unit: WavelengthUnit,
    pub medium: Medium,
    pub format: OutputFormat,

    /// Scale `log gf` by isotopic abundance for isotope-variant species
    pub isotopic_scaling: bool,

    /// Carried for downstream hyperfine-splitting stages; unused here
    pub hfs_splitting: bool,

    // -------------------------------------------------------------------------
    // Tuning
    // -------------------------------------------------------------------------
    pub merge: MergeSettings,

    /// Wall-clock ceiling for the whole extraction
    pub timeout: Duration,
}

impl ExtractionRequest {
    /// Create a request builder for the given window
    pub fn builder(wl_start: f64, wl_end: f64) -> RequestBuilder {
        RequestBuilder {
            request: ExtractionRequest {
                wl_start,
                wl_end,
                ..ExtractionRequest::default()
            },
        }
    }

    /// Check window, cap and replacement ranges before any store is opened
    pub fn validate(&self) -> Result<(), MergeError> {
        if !(self.wl_start > 0.0 && self.wl_start < self.wl_end) {
            return Err(MergeError::InvalidWindow {
                start: self.wl_start,
                end: self.wl_end,
            });
        }
        if self.max_lines == 0 {
            return Err(MergeError::ZeroLineCap);
        }
        for source in self.sources.iter().filter(|s| s.enabled) {
            if let SourceRole::Replacement {
                species_lo,
                species_hi,
            } = source.role
            {
                if species_lo > species_hi || species_lo < 0 {
                    return Err(MergeError::InvalidReplacementRange {
                        name: source.name.clone(),
                        lo: species_lo,
                        hi: species_hi,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for ExtractionRequest {
    fn default() -> Self {
        ExtractionRequest {
            wl_start: 0.0,
            wl_end: 0.0,
            max_lines: 100_000,
            species_filter: Vec::new(),
            sources: Vec::new(),
            energy_unit: EnergyUnit::InverseCm,
            wavelength_unit: WavelengthUnit::Angstrom,
            medium: Medium::Vacuum,
            format: OutputFormat::Short,
            isotopic_scaling: false,
            hfs_splitting: false,
            merge: MergeSettings::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Builder for ExtractionRequest
pub struct RequestBuilder {
    request: ExtractionRequest,
}

impl RequestBuilder {
    pub fn max_lines(mut self, cap: usize) -> Self {
        self.request.max_lines = cap;
        self
    }

    /// Append one source in merge order
    pub fn source(mut self, source: LinelistSource) -> Self {
        self.request.sources.push(source);
        self
    }

    pub fn species_filter(mut self, codes: impl IntoIterator<Item = i32>) -> Self {
        self.request.species_filter = codes.into_iter().collect();
        self
    }

    pub fn energy_unit(mut self, unit: EnergyUnit) -> Self {
        self.request.energy_unit = unit;
        self
    }

    pub fn wavelength_unit(mut self, unit: WavelengthUnit) -> Self {
        self.request.wavelength_unit = unit;
        self
    }

    pub fn medium(mut self, medium: Medium) -> Self {
        self.request.medium = medium;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.request.format = format;
        self
    }

    pub fn isotopic_scaling(mut self, on: bool) -> Self {
        self.request.isotopic_scaling = on;
        self
    }

    pub fn hfs_splitting(mut self, on: bool) -> Self {
        self.request.hfs_splitting = on;
        self
    }

    pub fn merge_settings(mut self, settings: MergeSettings) -> Self {
        self.request.merge = settings;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = timeout;
        self
    }

    /// Validate and produce the request
    pub fn build(self) -> Result<ExtractionRequest, MergeError> {
        self.request.validate()?;
        Ok(self.request)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let req = ExtractionRequest::builder(4000.0, 5000.0)
            .source(LinelistSource::new("main", "a.dat", "a.dsc"))
            .build()
            .unwrap();
        assert_eq!(req.max_lines, 100_000);
        assert_eq!(req.medium, Medium::Vacuum);
        assert_eq!(req.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_invalid_window_rejected() {
        assert!(matches!(
            ExtractionRequest::builder(5000.0, 4000.0).build(),
            Err(MergeError::InvalidWindow { .. })
        ));
        assert!(matches!(
            ExtractionRequest::builder(-1.0, 4000.0).build(),
            Err(MergeError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn test_zero_cap_rejected() {
        assert!(matches!(
            ExtractionRequest::builder(4000.0, 5000.0).max_lines(0).build(),
            Err(MergeError::ZeroLineCap)
        ));
    }

    #[test]
    fn test_bad_replacement_range_rejected() {
        let src = LinelistSource::new("rep", "r.dat", "r.dsc").role(SourceRole::Replacement {
            species_lo: 300,
            species_hi: 200,
        });
        assert!(matches!(
            ExtractionRequest::builder(4000.0, 5000.0).source(src).build(),
            Err(MergeError::InvalidReplacementRange { .. })
        ));
    }

    #[test]
    fn test_tolerance_scaling_and_clamp() {
        let s = MergeSettings::default();
        assert!((s.tolerance_at(5000.0) - 0.05).abs() < 1e-12);
        assert!((s.tolerance_at(10000.0) - 0.10).abs() < 1e-12);
        // Clamp floor at 0.01 * window_ref
        assert!((s.tolerance_at(0.001) - 0.0005).abs() < 1e-12);
    }
}
