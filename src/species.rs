//! Species Lookup
//!
//! Species codes in line records are indices into a reference CSV of
//! atoms, ions and molecules. The table is loaded once and queried by
//! code or by name.
//!
//! Two code ranges carry meaning independent of the table:
//! codes at or above [`ISOTOPE_CODE_BASE`] are isotopic variants,
//! codes at or above [`MOLECULE_CODE_BASE`] are molecules.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::StoreError;

/// First species code reserved for isotopic variants
pub const ISOTOPE_CODE_BASE: i32 = 5000;
/// First species code reserved for molecules
pub const MOLECULE_CODE_BASE: i32 = 10000;

/// Codes in the isotopic-variant range are eligible for abundance scaling
pub fn is_isotope_variant(code: i32) -> bool {
    (ISOTOPE_CODE_BASE..MOLECULE_CODE_BASE).contains(&code)
}

/// Molecular species skip the forbidden-transition compatibility check
pub fn is_molecule_code(code: i32) -> bool {
    code >= MOLECULE_CODE_BASE
}

#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub code: i32,
    pub name: String,
    /// Ionization stage, 0 = neutral
    pub charge: i32,
    /// Atomic or molecular mass in amu
    pub mass: f64,
    /// Ionization energy in eV
    pub ionization_energy: f64,
}

const ROMAN: [&str; 10] = ["I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X"];

impl Species {
    /// Human-readable name like `Fe I` or `Ca II`
    pub fn display_name(&self) -> String {
        let stage = self.charge as usize;
        match ROMAN.get(stage) {
            Some(r) => format!("{} {}", self.name, r),
            None => format!("{} {}", self.name, self.charge + 1),
        }
    }
}

/// Raw CSV row; malformed rows are skipped on load
#[derive(Debug, Deserialize)]
struct SpeciesRow {
    #[serde(rename = "Index")]
    index: i32,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Charge")]
    charge: i32,
    #[serde(rename = "Mass")]
    mass: f64,
    #[serde(rename = "Ion. en.")]
    ionization_energy: f64,
}

#[derive(Debug, Default)]
pub struct SpeciesTable {
    by_code: HashMap<i32, Species>,
}

impl SpeciesTable {
    /// Load the reference CSV. A leading `#` version line is tolerated;
    /// rows that fail to parse are skipped.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| StoreError::Open(format!("species file {}: {}", path.display(), e)))?;

        let mut by_code = HashMap::new();
        for row in reader.deserialize::<SpeciesRow>() {
            let row = match row {
                Ok(r) => r,
                Err(_) => continue,
            };
            by_code.insert(
                row.index,
                Species {
                    code: row.index,
                    name: row.name,
                    charge: row.charge,
                    mass: row.mass,
                    ionization_energy: row.ionization_energy,
                },
            );
        }
        tracing::debug!(path = %path.display(), species = by_code.len(), "species table loaded");
        Ok(SpeciesTable { by_code })
    }

    pub fn get(&self, code: i32) -> Option<&Species> {
        self.by_code.get(&code)
    }

    /// Display name for a code, `Unknown(code)` when the table lacks it
    pub fn name_of(&self, code: i32) -> String {
        match self.by_code.get(&code) {
            Some(s) => s.display_name(),
            None => format!("Unknown({code})"),
        }
    }

    /// All codes matching a name, optionally narrowed to one charge.
    /// Name comparison is case-insensitive.
    pub fn find_by_name(&self, name: &str, charge: Option<i32>) -> Vec<i32> {
        let mut codes: Vec<i32> = self
            .by_code
            .values()
            .filter(|s| s.name.eq_ignore_ascii_case(name))
            .filter(|s| charge.map_or(true, |c| s.charge == c))
            .map(|s| s.code)
            .collect();
        codes.sort_unstable();
        codes
    }

    /// Resolve one element-filter term to species codes. Accepts a bare
    /// numeric code, `Name` (all stages), or `Name <stage>` with a
    /// 1-based stage as in `Fe 1` for neutral iron.
    pub fn resolve_filter_term(&self, term: &str) -> Vec<i32> {
        let term = term.trim();
        if let Ok(code) = term.parse::<i32>() {
            return vec![code];
        }
        match term.rsplit_once(' ') {
            Some((name, stage)) => match stage.trim().parse::<i32>() {
                Ok(stage) if stage >= 1 => self.find_by_name(name.trim(), Some(stage - 1)),
                _ => self.find_by_name(term, None),
            },
            None => self.find_by_name(term, None),
        }
    }

    /// Resolve a comma-separated filter like `Fe 1, Ca 2, 5626` to a
    /// deduplicated, sorted list of species codes.
    pub fn parse_element_filter(&self, filter: &str) -> Vec<i32> {
        let mut codes: Vec<i32> = filter
            .split(',')
            .filter(|t| !t.trim().is_empty())
            .flat_map(|t| self.resolve_filter_term(t))
            .collect();
        codes.sort_unstable();
        codes.dedup();
        codes
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::TempDir;

    fn write_table(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("species.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "# species list v1").unwrap();
        writeln!(f, "Index,Name,Charge,Mass,Ion. en.").unwrap();
        writeln!(f, "2600,Fe,0,55.845,7.902").unwrap();
        writeln!(f, "2601,Fe,1,55.845,16.199").unwrap();
        writeln!(f, "2602,Fe,2,55.845,30.651").unwrap();
        writeln!(f, "10042,TiO,0,63.866,6.819").unwrap();
        writeln!(f, "bogus,row,x,y,z").unwrap();
        path
    }

    #[test]
    fn test_load_skips_comment_and_bad_rows() {
        let dir = TempDir::new().unwrap();
        let table = SpeciesTable::load(&write_table(&dir)).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.get(2600).unwrap().name, "Fe");
    }

    #[test]
    fn test_display_name_roman() {
        let dir = TempDir::new().unwrap();
        let table = SpeciesTable::load(&write_table(&dir)).unwrap();
        assert_eq!(table.name_of(2600), "Fe I");
        assert_eq!(table.name_of(2602), "Fe III");
        assert_eq!(table.name_of(10042), "TiO I");
        assert_eq!(table.name_of(9999), "Unknown(9999)");
    }

    #[test]
    fn test_find_by_name() {
        let dir = TempDir::new().unwrap();
        let table = SpeciesTable::load(&write_table(&dir)).unwrap();
        assert_eq!(table.find_by_name("fe", None), vec![2600, 2601, 2602]);
        assert_eq!(table.find_by_name("Fe", Some(1)), vec![2601]);
        assert!(table.find_by_name("Xx", None).is_empty());
    }

    #[test]
    fn test_resolve_filter_term() {
        let dir = TempDir::new().unwrap();
        let table = SpeciesTable::load(&write_table(&dir)).unwrap();
        assert_eq!(table.resolve_filter_term("2602"), vec![2602]);
        assert_eq!(table.resolve_filter_term("Fe 1"), vec![2600]);
        assert_eq!(table.resolve_filter_term("Fe"), vec![2600, 2601, 2602]);
    }

    #[test]
    fn test_parse_element_filter_list() {
        let dir = TempDir::new().unwrap();
        let table = SpeciesTable::load(&write_table(&dir)).unwrap();
        assert_eq!(
            table.parse_element_filter("Fe 1, 2602, Fe 3"),
            vec![2600, 2602]
        );
        assert_eq!(table.parse_element_filter(""), Vec::<i32>::new());
    }

    #[test]
    fn test_code_ranges() {
        assert!(!is_isotope_variant(2600));
        assert!(is_isotope_variant(5000));
        assert!(!is_isotope_variant(10042));
        assert!(is_molecule_code(10042));
    }
}
