//! Extraction Pipeline
//!
//! Ties the pieces together for one request: validate, open a cursor per
//! enabled source, run the merge, render the output. Each extraction owns
//! its stores exclusively; nothing here is shared across requests, so
//! independent extractions can run on separate threads without locking.

use std::time::Instant;

use crate::config::ExtractionRequest;
use crate::error::Result;
use crate::format::Formatter;
use crate::merge::{IsotopeTable, MergeEngine, MergeStats, SourceCursor};
use crate::species::SpeciesTable;

/// Everything one extraction produces
#[derive(Debug)]
pub struct ExtractionResult {
    /// Rendered lines, in strictly non-decreasing wavelength order
    pub body: Vec<String>,

    /// Reference ids cited by the body, with citation counts
    pub bibliography: String,

    pub stats: MergeStats,

    /// Lines dropped over per-line conversion failures
    pub skipped: u64,
}

/// Reusable extraction front end holding the reference tables
#[derive(Debug, Default)]
pub struct Extractor {
    species: SpeciesTable,
    isotopes: IsotopeTable,
}

impl Extractor {
    pub fn new(species: SpeciesTable, isotopes: IsotopeTable) -> Self {
        Extractor { species, isotopes }
    }

    pub fn species(&self) -> &SpeciesTable {
        &self.species
    }

    /// Run one extraction bounded by the request's timeout
    pub fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult> {
        self.extract_with_deadline(request, Some(Instant::now() + request.timeout))
    }

    /// Run one extraction with an explicit deadline (or none).
    ///
    /// Unit validation and the formatter's unit-combination check run
    /// before any store is opened; store errors abort the whole run with
    /// no partial output. Cursors close their stores on drop, so a
    /// timeout or mid-run failure leaks no handles.
    pub fn extract_with_deadline(
        &self,
        request: &ExtractionRequest,
        deadline: Option<Instant>,
    ) -> Result<ExtractionResult> {
        request.validate()?;
        let formatter = Formatter::new(request, &self.species)?;

        let mut cursors = Vec::new();
        for (index, source) in request.sources.iter().enumerate() {
            if !source.enabled {
                continue;
            }
            cursors.push(SourceCursor::open(source.clone(), index, request)?);
        }
        tracing::info!(
            wl_start = request.wl_start,
            wl_end = request.wl_end,
            sources = cursors.len(),
            max_lines = request.max_lines,
            "extraction started"
        );

        let engine = MergeEngine::new(request, cursors, &self.isotopes, deadline);
        let (lines, stats) = engine.run()?;
        let output = formatter.render(&lines);

        tracing::info!(
            lines = output.body.len(),
            merged = stats.merged,
            skipped = output.skipped,
            "extraction complete"
        );
        Ok(ExtractionResult {
            body: output.body,
            bibliography: output.bibliography,
            stats,
            skipped: output.skipped,
        })
    }
}
