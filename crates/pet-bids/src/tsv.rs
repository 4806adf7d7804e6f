//! Simple tab-separated persistence for curves and segmentation label maps.

use std::path::Path;

use crate::errors::BidsError;

fn tsv_err(path: &Path, source: csv::Error) -> BidsError {
    BidsError::Tsv { path: path.to_string_lossy().into_owned(), source }
}

/// Writes rows as a TSV file, one record per row.
pub fn save_tsv_simple(path: &Path, rows: &[Vec<String>]) -> Result<(), BidsError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_path(path)
        .map_err(|e| tsv_err(path, e))?;
    for row in rows {
        writer.write_record(row).map_err(|e| tsv_err(path, e))?;
    }
    writer.flush().map_err(|source| BidsError::Io {
        path: path.to_string_lossy().into_owned(),
        source,
    })
}

/// Loads a TSV file as rows of string cells. No header handling; callers
/// decide what the first row means.
pub fn load_tsv_simple(path: &Path) -> Result<Vec<Vec<String>>, BidsError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| tsv_err(path, e))?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| tsv_err(path, e))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}
