//! Raw WALS rows, read from a CLDF `languages.csv`.

use crate::error::{BuildError, ValidationError};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// One row of `languages.csv` as written in the dataset.
///
/// Columns not listed here (Glottocode, Samples_100, ...) are ignored. Every
/// field is optional at this stage; the normalizer decides what is required.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LanguageRecord {
    #[serde(rename = "ID", default)]
    pub wals_code: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Macroarea", default)]
    pub macroarea: Option<String>,
    #[serde(rename = "Latitude", default)]
    pub latitude: Option<String>,
    #[serde(rename = "Longitude", default)]
    pub longitude: Option<String>,
    #[serde(rename = "ISO639P3code", default)]
    pub iso_code: Option<String>,
    #[serde(rename = "Family", default)]
    pub family: Option<String>,
    #[serde(rename = "Subfamily", default)]
    pub subfamily: Option<String>,
    #[serde(rename = "Genus", default)]
    pub genus: Option<String>,
    #[serde(rename = "Country_ID", default)]
    pub country_ids: Option<String>,
}

/// A row that parsed, or the reason it did not.
pub type RawRow = Result<LanguageRecord, ValidationError>;

/// Read every row of the dataset at `path`.
///
/// Failing to open the file or read its header is fatal; a row that does not
/// fit the header becomes a `MalformedRow` entry and reading continues.
pub fn read_records(path: &Path) -> Result<Vec<RawRow>, BuildError> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| BuildError::DatasetUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
    collect_rows(reader).map_err(|source| BuildError::DatasetUnreadable {
        path: path.to_path_buf(),
        source,
    })
}

/// Same as [`read_records`], from any reader.
pub fn read_records_from<R: Read>(input: R) -> Result<Vec<RawRow>, csv::Error> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);
    collect_rows(reader)
}

fn collect_rows<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<RawRow>, csv::Error> {
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let fallback_line = idx as u64 + 2;
        let row = match result {
            Ok(record) => {
                let line = record.position().map_or(fallback_line, |p| p.line());
                record
                    .deserialize::<LanguageRecord>(Some(&headers))
                    .map_err(|e| ValidationError::MalformedRow {
                        line,
                        message: e.to_string(),
                    })
            }
            Err(e) if is_io(&e) => return Err(e),
            Err(e) => Err(ValidationError::MalformedRow {
                line: e.position().map_or(fallback_line, |p| p.line()),
                message: e.to_string(),
            }),
        };
        rows.push(row);
    }
    Ok(rows)
}

fn is_io(err: &csv::Error) -> bool {
    matches!(err.kind(), csv::ErrorKind::Io(_))
}
