//! Target catalog lookup
//!
//! The catalog is a flat CSV file, one object per row:
//! `name, RA h, RA m, RA s, Dec d, Dec m, Dec s`. Lines starting with `#` are
//! comments. Keys match exactly (case-sensitive), the first matching row wins
//! and rows with fewer than seven fields are ignored.

use crate::coordinates::Coordinates;
use crate::error::LookupMiss;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::{Path, PathBuf};

/// Fields in a complete catalog row
pub const CATALOG_ROW_FIELDS: usize = 7;

/// Name → coordinates lookup
pub trait Catalog {
    fn lookup(&self, key: &str) -> Result<Coordinates, LookupMiss>;

    /// Names offered to the operator before lookup
    fn names(&self) -> Result<Vec<String>, LookupMiss>;
}

/// Catalog backed by a CSV file, read on each lookup
#[derive(Debug, Clone)]
pub struct CsvCatalog {
    path: PathBuf,
    listing_path: Option<PathBuf>,
}

impl CsvCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            listing_path: None,
        }
    }

    /// Show names from a separate listing file instead of the catalog keys
    pub fn with_listing(mut self, listing_path: Option<PathBuf>) -> Self {
        self.listing_path = listing_path;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(path: &Path, reason: impl ToString) -> LookupMiss {
        LookupMiss::Unavailable {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Complete rows of the catalog; malformed rows are dropped
    fn rows(&self) -> Result<Vec<StringRecord>, LookupMiss> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .comment(Some(b'#'))
            .from_path(&self.path)
            .map_err(|e| Self::unavailable(&self.path, e))?;

        let mut rows = Vec::new();
        for record in reader.records() {
            match record {
                Ok(record) if record.len() >= CATALOG_ROW_FIELDS => rows.push(record),
                Ok(_) => {}
                Err(e) => tracing::debug!("Skipping unreadable catalog row in {}: {}", self.path.display(), e),
            }
        }
        Ok(rows)
    }
}

fn row_coordinates(record: &StringRecord) -> Result<Coordinates, String> {
    Coordinates::from_components([
        &record[1], &record[2], &record[3], &record[4], &record[5], &record[6],
    ])
}

impl Catalog for CsvCatalog {
    fn lookup(&self, key: &str) -> Result<Coordinates, LookupMiss> {
        for record in self.rows()? {
            if &record[0] != key {
                continue;
            }
            match row_coordinates(&record) {
                Ok(coords) => {
                    tracing::info!("Catalog hit for '{}': {}", key, coords);
                    return Ok(coords);
                }
                Err(reason) => {
                    tracing::warn!("Ignoring catalog row for '{}': {}", key, reason);
                }
            }
        }
        tracing::info!("'{}' not found in {}", key, self.path.display());
        Err(LookupMiss::NotFound(key.to_string()))
    }

    fn names(&self) -> Result<Vec<String>, LookupMiss> {
        if let Some(listing) = &self.listing_path {
            let text = std::fs::read_to_string(listing).map_err(|e| Self::unavailable(listing, e))?;
            return Ok(text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect());
        }
        Ok(self.rows()?.iter().map(|r| r[0].to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn catalog_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const CATALOG: &str = "\
# name, ra h, ra m, ra s, dec d, dec m, dec s
M81, 9, 55, 33.2, 69, 3, 55
M82, 9, 55
M82, 9, 55, 52.4, 69, 40, 47
M82, 1, 1, 1, 1, 1, 1
m31, 0, 42, 44.3, 41, 16, 9
";

    #[test]
    fn test_lookup_hit() {
        let file = catalog_file(CATALOG);
        let catalog = CsvCatalog::new(file.path());
        let coords = catalog.lookup("M81").unwrap();
        assert_eq!(coords.to_string(), "9 55 33.2, 69 3 55");
    }

    #[test]
    fn test_short_rows_skipped_and_first_match_wins() {
        let file = catalog_file(CATALOG);
        let catalog = CsvCatalog::new(file.path());
        assert_eq!(catalog.lookup("M82").unwrap().to_string(), "9 55 52.4, 69 40 47");
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let file = catalog_file(CATALOG);
        let catalog = CsvCatalog::new(file.path());
        assert_eq!(catalog.lookup("M31"), Err(LookupMiss::NotFound("M31".to_string())));
        assert!(catalog.lookup("m31").is_ok());
    }

    #[test]
    fn test_missing_catalog_is_unavailable() {
        let catalog = CsvCatalog::new("/nonexistent/catalog.csv");
        assert!(matches!(catalog.lookup("M81"), Err(LookupMiss::Unavailable { .. })));
    }

    #[test]
    fn test_names_from_catalog_and_listing() {
        let file = catalog_file(CATALOG);
        let catalog = CsvCatalog::new(file.path());
        assert_eq!(catalog.names().unwrap(), vec!["M81", "M82", "M82", "m31"]);

        let listing = catalog_file("Bode's Galaxy (M81)\n\nCigar Galaxy (M82)\n");
        let catalog = catalog.with_listing(Some(listing.path().to_path_buf()));
        assert_eq!(catalog.names().unwrap(), vec!["Bode's Galaxy (M81)", "Cigar Galaxy (M82)"]);
    }
}
