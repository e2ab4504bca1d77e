//! Merge Engine
//!
//! Drives the k-way merge over source cursors. Candidates arrive in
//! globally non-decreasing wavelength order; a small pending window holds
//! lines that may still merge with upcoming candidates and is flushed, in
//! order, once candidates have moved past the merge tolerance.

use std::time::Instant;

use crate::codec::LineRecord;
use crate::config::{ExtractionRequest, SourceRole};
use crate::error::{StoreError, VaultError};
use crate::species::{is_isotope_variant, is_molecule_code};

use super::{IsotopeTable, MergeStats, MergedLine, SourceCursor};

/// Sentinel for an unmeasured Lande factor
const LANDE_UNKNOWN: f32 = 99.0;

/// A line waiting to see whether upcoming candidates match it
struct Pending {
    line: MergedLine,
    mergeable: bool,
    rank_weight: i32,
    priority: u32,
}

pub struct MergeEngine<'a> {
    request: &'a ExtractionRequest,
    cursors: Vec<SourceCursor>,
    isotopes: &'a IsotopeTable,
    deadline: Option<Instant>,
    /// `(source index, species_lo, species_hi)` per enabled replacement source
    replacements: Vec<(usize, i32, i32)>,
    pending: Vec<Pending>,
    out: Vec<MergedLine>,
    stats: MergeStats,
}

impl<'a> MergeEngine<'a> {
    pub fn new(
        request: &'a ExtractionRequest,
        cursors: Vec<SourceCursor>,
        isotopes: &'a IsotopeTable,
        deadline: Option<Instant>,
    ) -> Self {
        let replacements = request
            .sources
            .iter()
            .enumerate()
            .filter(|(_, s)| s.enabled)
            .filter_map(|(i, s)| match s.role {
                SourceRole::Replacement {
                    species_lo,
                    species_hi,
                } => Some((i, species_lo, species_hi)),
                _ => None,
            })
            .collect();
        MergeEngine {
            request,
            cursors,
            isotopes,
            deadline,
            replacements,
            pending: Vec::new(),
            out: Vec::new(),
            stats: MergeStats::default(),
        }
    }

    /// Run the merge to completion, the line cap, or the deadline.
    ///
    /// Any store error aborts the whole run; partial results are never
    /// returned.
    pub fn run(mut self) -> Result<(Vec<MergedLine>, MergeStats), VaultError> {
        let started = Instant::now();
        loop {
            if self.out.len() >= self.request.max_lines {
                break;
            }
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    return Err(VaultError::Timeout {
                        elapsed_secs: started.elapsed().as_secs(),
                    });
                }
            }
            let ci = match self.select_cursor()? {
                Some(ci) => ci,
                None => break,
            };
            let line = match self.cursors[ci].pop()? {
                Some(line) => line,
                None => continue,
            };
            self.stats.lines_in += 1;

            let species = line.species_code;
            if !self.request.species_filter.is_empty()
                && !self.request.species_filter.contains(&species)
            {
                self.stats.dropped_by_filter += 1;
                continue;
            }
            let src_index = self.cursors[ci].index();
            if let Some(owner) = self.replacement_owner(species) {
                if owner != src_index {
                    self.stats.dropped_replaced += 1;
                    continue;
                }
            }

            // Pending lines below the candidate's tolerance window can no
            // longer merge with anything; emit them in order.
            let tolerance = self.request.merge.tolerance_at(line.wavelength);
            self.flush_below(line.wavelength - tolerance);
            if self.out.len() >= self.request.max_lines {
                break;
            }

            let source = self.cursors[ci].source();
            let candidate = Pending {
                mergeable: !matches!(source.role, SourceRole::Standalone),
                rank_weight: source.rank_weight,
                priority: source.priority,
                line: MergedLine::new(line, src_index),
            };
            self.absorb_candidate(candidate, tolerance);
        }
        self.flush_below(f64::INFINITY);

        tracing::debug!(
            emitted = self.stats.emitted,
            merged = self.stats.merged,
            kept_duplicates = self.stats.kept_duplicates,
            "merge complete"
        );
        Ok((self.out, self.stats))
    }

    /// Cursor holding the globally smallest pending wavelength; ties go to
    /// the lower source priority, then configuration order
    fn select_cursor(&mut self) -> Result<Option<usize>, StoreError> {
        let mut best: Option<(f64, u32, usize)> = None;
        for ci in 0..self.cursors.len() {
            let wl = match self.cursors[ci].peek()? {
                Some(line) => line.wavelength,
                None => continue,
            };
            let priority = self.cursors[ci].source().priority;
            let better = match best {
                None => true,
                Some((bw, bp, _)) => wl < bw || (wl == bw && priority < bp),
            };
            if better {
                best = Some((wl, priority, ci));
            }
        }
        Ok(best.map(|(_, _, ci)| ci))
    }

    fn replacement_owner(&self, species: i32) -> Option<usize> {
        self.replacements
            .iter()
            .find(|&&(_, lo, hi)| (lo..=hi).contains(&species))
            .map(|&(i, _, _)| i)
    }

    /// Match the candidate against the pending window, folding compatible
    /// equivalents and marking incompatible ones; insert it (sorted) if it
    /// survives
    fn absorb_candidate(&mut self, mut cand: Pending, tolerance: f64) {
        let wl = cand.line.record.wavelength;
        let mut i = 0;
        while i < self.pending.len() {
            let equivalent = {
                let p = &self.pending[i];
                (p.line.record.wavelength - wl).abs() <= tolerance
                    && p.mergeable
                    && cand.mergeable
                    && p.line.source_index != cand.line.source_index
                    && p.line.record.species_code == cand.line.record.species_code
                    && p.line.record.j_lower == cand.line.record.j_lower
                    && p.line.record.j_upper == cand.line.record.j_upper
                    && energies_agree(
                        p.line.record.e_upper,
                        cand.line.record.e_upper,
                        self.request.merge.energy_rel_tol,
                    )
            };
            if !equivalent {
                i += 1;
                continue;
            }

            let compatible = is_molecule_code(cand.line.record.species_code)
                || flags_compatible(
                    self.pending[i].line.record.forbid_flag(),
                    cand.line.record.forbid_flag(),
                );
            if !compatible {
                self.pending[i].line.kept_duplicate = true;
                cand.line.kept_duplicate = true;
                self.stats.kept_duplicates += 1;
                i += 1;
                continue;
            }

            self.stats.merged += 1;
            let cand_wins = cand.rank_weight > self.pending[i].rank_weight
                || (cand.rank_weight == self.pending[i].rank_weight
                    && cand.priority < self.pending[i].priority);
            if cand_wins {
                let loser = self.pending.remove(i);
                backfill(&mut cand.line.record, &loser.line.record);
                cand.line.merged_from += loser.line.merged_from;
                cand.line.kept_duplicate |= loser.line.kept_duplicate;
                // Keep scanning from the same index; the candidate may
                // absorb further pending equivalents.
            } else {
                let p = &mut self.pending[i];
                backfill(&mut p.line.record, &cand.line.record);
                p.line.merged_from += cand.line.merged_from;
                p.line.kept_duplicate |= cand.line.kept_duplicate;
                return;
            }
        }
        let at = self
            .pending
            .partition_point(|p| p.line.record.wavelength <= wl);
        self.pending.insert(at, cand);
    }

    /// Emit pending lines below `threshold`, in order, up to the line cap
    fn flush_below(&mut self, threshold: f64) {
        while self.out.len() < self.request.max_lines {
            match self.pending.first() {
                Some(p) if p.line.record.wavelength < threshold => {
                    let p = self.pending.remove(0);
                    self.emit(p.line);
                }
                _ => break,
            }
        }
    }

    fn emit(&mut self, mut line: MergedLine) {
        let species = line.record.species_code;
        if self.request.isotopic_scaling && is_isotope_variant(species) {
            if let Some(fraction) = self.isotopes.fraction(species) {
                if fraction > 0.0 {
                    line.record.log_gf += fraction.log10() as f32;
                    self.stats.scaled += 1;
                }
            }
        }
        self.stats.emitted += 1;
        self.out.push(line);
    }
}

/// Same flag, or the blank/autoionizing pair
fn flags_compatible(a: u8, b: u8) -> bool {
    a == b || (a == b' ' && b == b'A') || (a == b'A' && b == b' ')
}

/// Upper-level energies agree within a relative tolerance
fn energies_agree(a: f64, b: f64, rel_tol: f64) -> bool {
    let scale = a.abs().max(b.abs());
    scale == 0.0 || (a - b).abs() <= rel_tol * scale
}

/// Copy broadening parameters the winner lacks from the losing line
fn backfill(winner: &mut LineRecord, loser: &LineRecord) {
    if winner.lande_lower == LANDE_UNKNOWN && loser.lande_lower != LANDE_UNKNOWN {
        winner.lande_lower = loser.lande_lower;
    }
    if winner.lande_upper == LANDE_UNKNOWN && loser.lande_upper != LANDE_UNKNOWN {
        winner.lande_upper = loser.lande_upper;
    }
    if winner.gamma_radiative == 0.0 && loser.gamma_radiative != 0.0 {
        winner.gamma_radiative = loser.gamma_radiative;
    }
    if winner.gamma_stark == 0.0 && loser.gamma_stark != 0.0 {
        winner.gamma_stark = loser.gamma_stark;
    }
    if winner.gamma_vdw == 0.0 && loser.gamma_vdw != 0.0 {
        winner.gamma_vdw = loser.gamma_vdw;
    }
}

// ============================================================================
// Tests
// ============================================================================
