//! CSV reading and writing.
//!
//! List columns have no CSV representation, so they are written as
//! `", "`-joined text; [`crate::any_to_tokens`] reads either form back.

use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::polars_utils::any_to_string;

/// Reads a CSV file with a single header row into a DataFrame.
pub fn read_csv_table(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "Read CSV table"
    );
    Ok(df)
}

/// Writes `df` to `path`, creating or truncating the file.
pub fn write_csv_table(df: &DataFrame, path: &Path) -> Result<()> {
    let mut out = stringify_list_columns(df)?;
    let mut file = File::create(path).map_err(|source| IngestError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut out)
        .map_err(|e| IngestError::CsvWrite {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    debug!(
        path = %path.display(),
        rows = out.height(),
        columns = out.width(),
        "Wrote CSV table"
    );
    Ok(())
}

/// Replace every list column with its `", "`-joined text form.
pub fn stringify_list_columns(df: &DataFrame) -> Result<DataFrame> {
    let mut out = df.clone();
    for column in df.get_columns() {
        if !matches!(column.dtype(), DataType::List(_)) {
            continue;
        }
        let values: Vec<Option<String>> = (0..column.len())
            .map(|idx| match column.get(idx) {
                Ok(AnyValue::Null) | Err(_) => None,
                Ok(value) => Some(any_to_string(value)),
            })
            .collect();
        out.with_column(Series::new(column.name().clone(), values))?;
    }
    Ok(out)
}
