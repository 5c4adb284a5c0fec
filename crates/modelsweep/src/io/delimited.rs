//! Delimited text table reader.
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{anyhow, Context, Result};

use crate::data_handling::{Column, Table};

/// Tokens read as a missing cell.
const MISSING_TOKENS: [&str; 6] = ["", "NA", "N/A", "NaN", "nan", "null"];

fn is_missing(value: &str) -> bool {
    MISSING_TOKENS.contains(&value)
}

/// Pick the field delimiter for `path`.
///
/// `.csv` files are comma separated and `.tsv`/`.tab` files tab separated.
/// For anything else the header line decides: commas win only when the
/// header has no tab in it.
pub fn sniff_delimiter<P: AsRef<Path>>(path: P) -> Result<u8> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    match ext.as_deref() {
        Some("csv") => return Ok(b','),
        Some("tsv") | Some("tab") => return Ok(b'\t'),
        _ => {}
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    let mut header = String::new();
    BufReader::new(file)
        .read_line(&mut header)
        .with_context(|| format!("Failed to read header of {}", path.display()))?;

    if !header.contains('\t') && header.contains(',') {
        Ok(b',')
    } else {
        Ok(b'\t')
    }
}

/// Read a delimited text file with a header row into a `Table`.
///
/// A column is numeric when every non-missing cell parses as a float,
/// otherwise it is kept as categorical text.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let delimiter = sniff_delimiter(path)?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header row of {}", path.display()))?
        .clone();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(anyhow!("No columns found in {}", path.display()));
    }

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        for (col_idx, cells) in raw.iter_mut().enumerate() {
            let value = record
                .get(col_idx)
                .ok_or_else(|| anyhow!("Missing value in column {} at row {}", col_idx + 1, row_idx + 1))?;
            cells.push(value.trim().to_string());
        }
    }

    let columns = headers
        .iter()
        .zip(raw)
        .map(|(name, cells)| build_column(name.trim(), cells))
        .collect();

    let table = Table::new(columns)?;
    log::debug!(
        "Read {} rows x {} columns from {}",
        table.nrows(),
        table.ncols(),
        path.display()
    );
    Ok(table)
}

fn build_column(name: &str, cells: Vec<String>) -> Column {
    let parsed: Option<Vec<f64>> = cells
        .iter()
        .map(|cell| {
            if is_missing(cell) {
                Some(f64::NAN)
            } else {
                cell.parse::<f64>().ok()
            }
        })
        .collect();

    match parsed {
        Some(values) => Column::numeric(name, values),
        None => Column::categorical(
            name,
            cells
                .into_iter()
                .map(|cell| if is_missing(&cell) { None } else { Some(cell) })
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_column_is_categorical() {
        let column = build_column("c", vec!["1".into(), "two".into(), "".into()]);
        assert!(column.is_categorical());
    }

    #[test]
    fn missing_numeric_cells_are_nan() {
        let column = build_column("n", vec!["1.5".into(), "NA".into()]);
        let values = column.as_numeric().unwrap();
        assert_eq!(values[0], 1.5);
        assert!(values[1].is_nan());
    }
}
