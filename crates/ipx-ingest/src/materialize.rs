//! Flattened table built from the per-subject payloads.

use polars::prelude::*;
use serde_json::Value;
use tracing::debug;

use ipx_model::SUBJECT_COLUMN;

use crate::error::{IngestError, Result};
use crate::flatten::{FlatRow, element_text};
use crate::payload::{RowIssue, SubjectPayload};

/// The flattened table plus the source rows it was built from.
#[derive(Debug)]
pub struct Materialized {
    /// One row per accepted payload, `id` first.
    pub frame: DataFrame,
    /// Source row index of every output row, in output order.
    pub accepted: Vec<usize>,
    /// Source rows that produced no output row.
    pub skipped: Vec<RowIssue>,
}

/// Flatten every payload in `results_column` into one row per subject.
///
/// A row is `id` (the payload's `subject`) followed by the flattened form
/// of every object element of `results`, merged in order. Null, non-text,
/// undecodable, and non-object cells are skipped.
pub fn materialize_results(df: &DataFrame, results_column: &str) -> Result<Materialized> {
    let results = df
        .column(results_column)
        .map_err(|_| IngestError::ColumnNotFound {
            column: results_column.to_string(),
        })?;

    let mut rows = Vec::new();
    let mut accepted = Vec::new();
    let mut skipped = Vec::new();

    for row in 0..df.height() {
        let cell = results.get(row).unwrap_or(AnyValue::Null);
        match SubjectPayload::from_cell(cell) {
            Ok(payload) => {
                rows.push(flatten_payload(&payload));
                accepted.push(row);
            }
            Err(error) => skipped.push(RowIssue { row, error }),
        }
    }

    debug!(
        accepted = accepted.len(),
        skipped = skipped.len(),
        "Materialized payload rows"
    );

    Ok(Materialized {
        frame: rows_to_frame(&rows)?,
        accepted,
        skipped,
    })
}

/// `id` followed by every flattened `results` element.
pub fn flatten_payload(payload: &SubjectPayload) -> FlatRow {
    let mut row = FlatRow::new();
    row.insert(SUBJECT_COLUMN, payload.subject().clone());
    for entry in payload.results() {
        if let Value::Object(object) = entry {
            row.merge(FlatRow::flatten(object));
        }
    }
    row
}

/// Assemble rows into a table; columns appear in order of first appearance.
pub fn rows_to_frame(rows: &[FlatRow]) -> Result<DataFrame> {
    if rows.is_empty() {
        return Ok(DataFrame::empty());
    }

    let mut names: Vec<&str> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for row in rows {
        for key in row.keys() {
            if seen.insert(key) {
                names.push(key);
            }
        }
    }

    let columns = names
        .into_iter()
        .map(|name| {
            let values: Vec<Option<&Value>> = rows
                .iter()
                .map(|row| row.get(name).filter(|value| !value.is_null()))
                .collect();
            typed_column(name, &values).into_column()
        })
        .collect();

    Ok(DataFrame::new(columns)?)
}

fn typed_column(name: &str, values: &[Option<&Value>]) -> Series {
    let present = || values.iter().flatten();
    let any_present = present().next().is_some();

    if any_present && present().all(|value| value.as_i64().is_some()) {
        let ints: Vec<Option<i64>> = values.iter().map(|v| v.and_then(Value::as_i64)).collect();
        return Series::new(name.into(), ints);
    }
    if any_present && present().all(|value| value.is_number()) {
        let floats: Vec<Option<f64>> = values.iter().map(|v| v.and_then(Value::as_f64)).collect();
        return Series::new(name.into(), floats);
    }
    if any_present && present().all(|value| value.is_boolean()) {
        let flags: Vec<Option<bool>> = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
        return Series::new(name.into(), flags);
    }
    let text: Vec<Option<String>> = values.iter().map(|v| v.map(element_text)).collect();
    Series::new(name.into(), text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_numbers_widen_to_float() {
        let a = Value::from(1);
        let b = Value::from(2.5);
        let series = typed_column("x", &[Some(&a), None, Some(&b)]);
        assert_eq!(series.dtype(), &DataType::Float64);
        assert_eq!(series.null_count(), 1);
    }

    #[test]
    fn mixed_kinds_become_text() {
        let a = Value::from(1);
        let b = Value::from("dos");
        let c = Value::from(true);
        let series = typed_column("x", &[Some(&a), Some(&b), Some(&c)]);
        assert_eq!(series.dtype(), &DataType::String);
        assert_eq!(series.get(0).unwrap(), AnyValue::String("1"));
        assert_eq!(series.get(2).unwrap(), AnyValue::String("true"));
    }

    #[test]
    fn all_null_column_is_text() {
        let series = typed_column("x", &[None, None]);
        assert_eq!(series.dtype(), &DataType::String);
        assert_eq!(series.null_count(), 2);
    }
}
