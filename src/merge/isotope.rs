//! Isotopic abundance table.
//!
//! Maps isotope-variant species codes to fractional abundances. When
//! isotopic scaling is enabled, an isotope's `log gf` is shifted by
//! `log10(fraction)` so the line strength reflects the isotope's share of
//! the element.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::StoreError;

#[derive(Debug, Default, Clone)]
pub struct IsotopeTable {
    fractions: HashMap<i32, f64>,
}

#[derive(Debug, Deserialize)]
struct IsotopeRow {
    #[serde(rename = "Index")]
    index: i32,
    #[serde(rename = "Fraction")]
    fraction: f64,
}

impl IsotopeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load abundances from a CSV with `Index,Fraction` columns. A leading
    /// `#` comment line is tolerated; malformed rows are skipped.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| StoreError::Open(format!("isotope file {}: {}", path.display(), e)))?;

        let mut fractions = HashMap::new();
        for row in reader.deserialize::<IsotopeRow>() {
            if let Ok(row) = row {
                fractions.insert(row.index, row.fraction);
            }
        }
        tracing::debug!(path = %path.display(), isotopes = fractions.len(), "isotope table loaded");
        Ok(IsotopeTable { fractions })
    }

    pub fn insert(&mut self, code: i32, fraction: f64) {
        self.fractions.insert(code, fraction);
    }

    /// Fractional abundance for a species code, if known
    pub fn fraction(&self, code: i32) -> Option<f64> {
        self.fractions.get(&code).copied()
    }

    pub fn len(&self) -> usize {
        self.fractions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fractions.is_empty()
    }
}

impl FromIterator<(i32, f64)> for IsotopeTable {
    fn from_iter<T: IntoIterator<Item = (i32, f64)>>(iter: T) -> Self {
        IsotopeTable {
            fractions: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut table = IsotopeTable::new();
        table.insert(5626, 0.9175);
        assert_eq!(table.fraction(5626), Some(0.9175));
        assert_eq!(table.fraction(5700), None);
    }

    #[test]
    fn test_from_iter() {
        let table: IsotopeTable = [(5626, 0.9175), (5754, 0.0212)].into_iter().collect();
        assert_eq!(table.len(), 2);
    }
}
