//! End-to-end extraction tests

mod common;

use std::time::Duration;

use common::{build_store_chunked, line, line_with_flag, source};
use linevault::config::{ExtractionRequest, Medium, OutputFormat};
use linevault::error::{StoreError, VaultError};
use linevault::merge::IsotopeTable;
use linevault::species::SpeciesTable;
use linevault::{ExtractionPool, Extractor};
use tempfile::TempDir;

fn rendered_wavelength(text: &str) -> f64 {
    text.split(',').nth(1).unwrap().trim().parse().unwrap()
}

// =============================================================================
// Pipeline Tests
// =============================================================================

#[test]
fn test_two_source_extraction_end_to_end() {
    let dir = TempDir::new().unwrap();
    let a_lines: Vec<_> = (0..40).map(|i| line(5000.0 + i as f64 * 0.5, 2600, -1.0)).collect();
    let mut b_lines = vec![line_with_flag(5000.0, 2600, -2.0, b' ')];
    b_lines.extend((1..40).map(|i| line(5000.25 + i as f64 * 0.5, 2601, -1.0)));
    let a = build_store_chunked(dir.path(), "a", &a_lines, 8);
    let b = build_store_chunked(dir.path(), "b", &b_lines, 8);

    let request = ExtractionRequest::builder(5000.0, 5015.0)
        .source(source("a", &a).priority(0).rank_weight(5))
        .source(source("b", &b).priority(1).rank_weight(2))
        .build()
        .unwrap();
    let result = Extractor::default().extract(&request).unwrap();

    // The two 5000.0 Å lines merge (same transition, higher rank wins);
    // everything else is distinct
    let expected = a_lines
        .iter()
        .chain(&b_lines)
        .filter(|l| l.wavelength <= 5015.0)
        .count()
        - 1;
    assert_eq!(result.body.len(), expected);
    assert_eq!(result.stats.merged, 1);

    let wls: Vec<f64> = result.body.iter().map(|l| rendered_wavelength(l)).collect();
    assert!(wls.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_bibliography_reaches_output() {
    let dir = TempDir::new().unwrap();
    let mut with_ref = line(5000.0, 2600, -1.0);
    with_ref.term_blob[176] = 1;
    with_ref.term_blob[177..179].copy_from_slice(&9u16.to_le_bytes());
    let paths = build_store_chunked(dir.path(), "a", &[with_ref], 8);

    let request = ExtractionRequest::builder(4999.0, 5001.0)
        .source(source("a", &paths))
        .format(OutputFormat::Long)
        .build()
        .unwrap();
    let result = Extractor::default().extract(&request).unwrap();
    assert_eq!(result.body.len(), 1);
    assert!(result.bibliography.contains("     9"));
}

#[test]
fn test_air_medium_end_to_end() {
    let dir = TempDir::new().unwrap();
    let paths = build_store_chunked(dir.path(), "a", &[line(6564.6, 100, -0.2)], 8);
    let request = ExtractionRequest::builder(6560.0, 6570.0)
        .source(source("a", &paths))
        .medium(Medium::Air)
        .build()
        .unwrap();
    let result = Extractor::default().extract(&request).unwrap();
    let wl = rendered_wavelength(&result.body[0]);
    assert!(wl < 6564.6 && wl > 6562.0);
}

#[test]
fn test_missing_store_aborts_whole_request() {
    let dir = TempDir::new().unwrap();
    let good = build_store_chunked(dir.path(), "a", &[line(5000.0, 2600, -1.0)], 8);
    let request = ExtractionRequest::builder(4999.0, 5001.0)
        .source(source("a", &good))
        .source(source(
            "b",
            &(dir.path().join("nope.dat"), dir.path().join("nope.dsc")),
        ))
        .build()
        .unwrap();
    assert!(matches!(
        Extractor::default().extract(&request),
        Err(VaultError::Store(StoreError::Open(_)))
    ));
}

#[test]
fn test_zero_timeout_reports_timeout() {
    let dir = TempDir::new().unwrap();
    let paths = build_store_chunked(dir.path(), "a", &[line(5000.0, 2600, -1.0)], 8);
    let request = ExtractionRequest::builder(4999.0, 5001.0)
        .source(source("a", &paths))
        .timeout(Duration::ZERO)
        .build()
        .unwrap();
    assert!(matches!(
        Extractor::default().extract(&request),
        Err(VaultError::Timeout { .. })
    ));
}

#[test]
fn test_species_names_in_output() {
    let dir = TempDir::new().unwrap();
    let paths = build_store_chunked(dir.path(), "a", &[line(5000.0, 2600, -1.0)], 8);

    let csv = dir.path().join("species.csv");
    std::fs::write(&csv, "Index,Name,Charge,Mass,Ion. en.\n2600,Fe,0,55.845,7.902\n").unwrap();
    let species = SpeciesTable::load(&csv).unwrap();

    let request = ExtractionRequest::builder(4999.0, 5001.0)
        .source(source("a", &paths))
        .build()
        .unwrap();
    let result = Extractor::new(species, IsotopeTable::new())
        .extract(&request)
        .unwrap();
    assert!(result.body[0].starts_with("'Fe I"));
}

// =============================================================================
// Pool Tests
// =============================================================================

#[test]
fn test_parallel_extractions_share_nothing() {
    let dir = TempDir::new().unwrap();
    let lines: Vec<_> = (0..200).map(|i| line(5000.0 + i as f64 * 0.1, 2600, -1.0)).collect();
    let paths = build_store_chunked(dir.path(), "a", &lines, 16);

    let pool = ExtractionPool::new(4, 16, Extractor::default());
    let receivers: Vec<_> = (0..8)
        .map(|i| {
            let lo = 5000.0 + i as f64;
            let request = ExtractionRequest::builder(lo, lo + 2.0)
                .source(source("a", &paths))
                .build()
                .unwrap();
            pool.submit(request).unwrap()
        })
        .collect();

    for (i, rx) in receivers.into_iter().enumerate() {
        let result = rx.recv().unwrap().unwrap();
        let lo = 5000.0 + i as f64;
        assert!(!result.body.is_empty());
        for text in &result.body {
            let wl = rendered_wavelength(text);
            assert!(wl >= lo - 1e-9 && wl <= lo + 2.0 + 1e-9);
        }
    }
    let stats = pool.stats();
    assert_eq!(stats.submitted, 8);
    assert_eq!(stats.completed, 8);
    pool.shutdown();
}
