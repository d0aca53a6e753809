//! Loads the fixed instrument universe from a CSV file with `ticker` and
//! `name` columns.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

const REQUIRED_COLUMNS: &[&str] = &["ticker", "name"];

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    #[serde(rename = "ticker")]
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: String,
}

impl Instrument {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<Instrument>> {
    let path = path.as_ref();
    let reader = csv::Reader::from_path(path)
        .map_err(|e| Error::CatalogUnavailable(format!("{}: {}", path.display(), e)))?;
    let instruments = read_catalog(reader)?;

    tracing::info!(count = instruments.len(), path = %path.display(), "Instrument catalog loaded");
    Ok(instruments)
}

/// Reads instruments in file order. Extra columns are ignored; tickers stay
/// strings so leading zeros survive.
pub fn read_catalog<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<Instrument>> {
    let headers = reader
        .headers()
        .map_err(|e| Error::CatalogUnavailable(e.to_string()))?
        .clone();

    for &column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(Error::CatalogUnavailable(format!(
                "missing required column '{}'",
                column
            )));
        }
    }

    reader
        .deserialize::<Instrument>()
        .map(|row| row.map_err(|e| Error::CatalogUnavailable(e.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn from_str(data: &str) -> Result<Vec<Instrument>> {
        read_catalog(csv::Reader::from_reader(data.as_bytes()))
    }

    #[test]
    fn reads_rows_in_order_and_keeps_leading_zeros() {
        let catalog = from_str("ticker,name,market\n005930,Samsung,KOSPI\n000660,SK hynix,KOSPI\n").unwrap();
        assert_eq!(
            catalog,
            vec![
                Instrument::new("005930", "Samsung"),
                Instrument::new("000660", "SK hynix"),
            ]
        );
    }

    #[test]
    fn missing_name_column_is_catalog_unavailable() {
        let err = from_str("ticker,market\n005930,KOSPI\n").unwrap_err();
        assert!(matches!(err, Error::CatalogUnavailable(msg) if msg.contains("name")));
    }

    #[test]
    fn missing_file_is_catalog_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_catalog(dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, Error::CatalogUnavailable(_)));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ticker,name").unwrap();
        writeln!(file, "035420,NAVER").unwrap();
        let catalog = load_catalog(file.path()).unwrap();
        assert_eq!(catalog, vec![Instrument::new("035420", "NAVER")]);
    }

    #[test]
    fn header_only_file_is_an_empty_catalog() {
        assert!(from_str("ticker,name\n").unwrap().is_empty());
    }
}
