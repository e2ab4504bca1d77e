//! Line Rendering
//!
//! Turns merged lines into fixed-width text in the requested units, plus a
//! bibliography blob listing every cited reference id with its citation
//! count. Unsupported unit combinations are rejected when the formatter is
//! built; a conversion failure on an individual line skips that line with
//! a warning instead of aborting the run.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::config::{EnergyUnit, ExtractionRequest, Medium, OutputFormat, WavelengthUnit};
use crate::error::ConversionError;
use crate::merge::MergedLine;
use crate::species::SpeciesTable;

use super::units;

/// Rendered extraction body and bibliography
#[derive(Debug)]
pub struct FormattedOutput {
    pub body: Vec<String>,
    pub bibliography: String,
    /// Lines dropped over per-line conversion failures
    pub skipped: u64,
}

pub struct Formatter<'a> {
    request: &'a ExtractionRequest,
    species: &'a SpeciesTable,
}

impl<'a> Formatter<'a> {
    /// Validate the request's output unit combination.
    ///
    /// Wavenumber output is only defined in vacuum; asking for it in air
    /// fails here, before any line is rendered.
    pub fn new(
        request: &'a ExtractionRequest,
        species: &'a SpeciesTable,
    ) -> Result<Self, ConversionError> {
        if request.wavelength_unit == WavelengthUnit::InverseCm && request.medium == Medium::Air {
            return Err(ConversionError::WavenumberInAir);
        }
        Ok(Formatter { request, species })
    }

    /// Render every line, honoring the request's cap, and collect the
    /// bibliography of cited reference ids
    pub fn render(&self, lines: &[MergedLine]) -> FormattedOutput {
        let mut body = Vec::with_capacity(lines.len().min(self.request.max_lines));
        let mut citations: BTreeMap<u16, u64> = BTreeMap::new();
        let mut skipped = 0u64;

        for line in lines.iter().take(self.request.max_lines) {
            match self.render_line(line) {
                Ok(text) => {
                    for id in line.record.bib_refs() {
                        *citations.entry(id).or_default() += 1;
                    }
                    body.push(text);
                }
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(
                        wavelength = line.record.wavelength,
                        error = %e,
                        "line skipped"
                    );
                }
            }
        }

        let mut bibliography = String::new();
        for (id, count) in &citations {
            let _ = writeln!(bibliography, "{id:>6} {count:>8}");
        }

        FormattedOutput {
            body,
            bibliography,
            skipped,
        }
    }

    fn render_line(&self, line: &MergedLine) -> Result<String, ConversionError> {
        let rec = &line.record;

        let wl = match self.request.medium {
            Medium::Vacuum => rec.wavelength,
            Medium::Air => units::vacuum_to_air(rec.wavelength),
        };
        let wl = match self.request.wavelength_unit {
            WavelengthUnit::Angstrom => wl,
            WavelengthUnit::Nanometer => units::angstrom_to_nanometer(wl),
            WavelengthUnit::InverseCm => units::angstrom_to_wavenumber(wl)?,
        };
        let (e_lower, e_upper) = match self.request.energy_unit {
            EnergyUnit::InverseCm => (rec.e_lower, rec.e_upper),
            EnergyUnit::ElectronVolt => {
                (units::inv_cm_to_ev(rec.e_lower), units::inv_cm_to_ev(rec.e_upper))
            }
        };

        let name = self.species.name_of(rec.species_code);
        let mut text = format!(
            "'{name:<8}',{wl:>13.4},{log_gf:>8.3},{e_lower:>12.4},{j_lower:>6.1},{e_upper:>12.4},{j_upper:>6.1},{rad:>8.3},{stark:>8.3},{vdw:>8.3}",
            log_gf = rec.log_gf,
            j_lower = rec.j_lower,
            j_upper = rec.j_upper,
            rad = rec.gamma_radiative,
            stark = rec.gamma_stark,
            vdw = rec.gamma_vdw,
        );
        if self.request.format == OutputFormat::Long {
            let refs = rec
                .bib_refs()
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            let _ = write!(
                text,
                ",{lande_lower:>8.3},{lande_upper:>8.3},{flag},'{lower}','{upper}','{refs}'",
                lande_lower = rec.lande_lower,
                lande_upper = rec.lande_upper,
                flag = rec.forbid_flag() as char,
                lower = rec.lower_term(),
                upper = rec.upper_term(),
            );
        }
        Ok(text)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::LineRecord;
    use crate::config::LinelistSource;

    fn request() -> ExtractionRequest {
        ExtractionRequest::builder(4000.0, 7000.0)
            .source(LinelistSource::new("main", "a.dat", "a.dsc"))
            .build()
            .unwrap()
    }

    fn line(wl: f64) -> MergedLine {
        MergedLine::new(
            LineRecord {
                wavelength: wl,
                species_code: 2600,
                log_gf: -1.5,
                e_lower: 10000.0,
                e_upper: 30000.0,
                j_lower: 2.0,
                j_upper: 3.0,
                ..LineRecord::default()
            },
            0,
        )
    }

    #[test]
    fn test_wavenumber_in_air_rejected() {
        let mut req = request();
        req.wavelength_unit = WavelengthUnit::InverseCm;
        req.medium = Medium::Air;
        let species = SpeciesTable::default();
        assert!(matches!(
            Formatter::new(&req, &species),
            Err(ConversionError::WavenumberInAir)
        ));
    }

    #[test]
    fn test_short_form_fields() {
        let req = request();
        let species = SpeciesTable::default();
        let fmt = Formatter::new(&req, &species).unwrap();
        let out = fmt.render(&[line(5000.0)]);
        assert_eq!(out.body.len(), 1);
        assert!(out.body[0].contains("5000.0000"));
        assert!(out.body[0].contains("-1.500"));
        assert_eq!(out.skipped, 0);
    }

    #[test]
    fn test_long_form_adds_terms() {
        let mut req = request();
        req.format = OutputFormat::Long;
        let species = SpeciesTable::default();
        let fmt = Formatter::new(&req, &species).unwrap();
        let out = fmt.render(&[line(5000.0)]);
        // Long form carries the forbid flag between quoted term fields
        assert!(out.body[0].len() > 120);
    }

    #[test]
    fn test_cap_never_reexpanded() {
        let mut req = request();
        req.max_lines = 2;
        let species = SpeciesTable::default();
        let fmt = Formatter::new(&req, &species).unwrap();
        let out = fmt.render(&[line(5000.0), line(5001.0), line(5002.0)]);
        assert_eq!(out.body.len(), 2);
    }

    #[test]
    fn test_bad_line_skipped_not_fatal() {
        let mut req = request();
        req.wavelength_unit = WavelengthUnit::InverseCm;
        let species = SpeciesTable::default();
        let fmt = Formatter::new(&req, &species).unwrap();
        let out = fmt.render(&[line(0.0), line(5000.0)]);
        assert_eq!(out.body.len(), 1);
        assert_eq!(out.skipped, 1);
    }
}
