//! Shared helpers for integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use linevault::codec::LineRecord;
use linevault::config::LinelistSource;
use linevault::store::StoreBuilder;

/// A plausible line with fixed level structure
pub fn line(wl: f64, species: i32, log_gf: f32) -> LineRecord {
    LineRecord {
        wavelength: wl,
        species_code: species,
        log_gf,
        e_lower: 10000.0,
        e_upper: 30000.0,
        j_lower: 2.0,
        j_upper: 3.0,
        ..LineRecord::default()
    }
}

pub fn line_with_flag(wl: f64, species: i32, log_gf: f32, flag: u8) -> LineRecord {
    let mut l = line(wl, species, log_gf);
    l.set_forbid_flag(flag);
    l
}

/// Build a store under `dir` and return its (data, descriptor) paths
pub fn build_store(dir: &Path, name: &str, lines: &[LineRecord]) -> (PathBuf, PathBuf) {
    build_store_chunked(dir, name, lines, linevault::codec::LINES_PER_RECORD)
}

/// Build a store with a small record size so multi-record paths get hit
pub fn build_store_chunked(
    dir: &Path,
    name: &str,
    lines: &[LineRecord],
    per_record: usize,
) -> (PathBuf, PathBuf) {
    let data = dir.join(format!("{name}.dat"));
    let descriptor = dir.join(format!("{name}.dsc"));
    let mut builder = StoreBuilder::new(&data, &descriptor)
        .unwrap()
        .lines_per_record(per_record);
    for l in lines {
        builder.add(l.clone()).unwrap();
    }
    builder.finish().unwrap();
    (data, descriptor)
}

pub fn source(name: &str, paths: &(PathBuf, PathBuf)) -> LinelistSource {
    LinelistSource::new(name, &paths.0, &paths.1)
}
