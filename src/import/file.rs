use super::ImportRow;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

#[derive(Debug)]
pub enum ImportFileError {
    Io(io::Error),
    Csv(csv::Error),
}

impl fmt::Display for ImportFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportFileError::Io(err) => write!(f, "io error: {err}"),
            ImportFileError::Csv(err) => write!(f, "csv error: {err}"),
        }
    }
}

impl std::error::Error for ImportFileError {}

impl From<io::Error> for ImportFileError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for ImportFileError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

/// Read the ten-column positional spreadsheet export: list code, row id,
/// name, parent id, status, the two alternate duration columns, start date,
/// end date, responsible. Short rows pad with empty fields.
pub fn load_import_rows_from_csv<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<ImportRow>, ImportFileError> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();
        rows.push(ImportRow {
            external_code: field(0),
            external_id: field(1),
            name: field(2),
            external_parent_id: field(3),
            status: field(4),
            duration: field(5),
            duration_alt: field(6),
            start: field(7),
            end: field(8),
            responsible: field(9),
        });
    }
    Ok(rows)
}
