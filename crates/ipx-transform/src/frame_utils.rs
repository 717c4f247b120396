//! Column access helpers shared by the table stages.

use anyhow::Result;
use polars::prelude::{AnyValue, BooleanChunked, DataFrame, NamedFrom, NewChunkedArray, Series};

use ipx_ingest::{any_to_f64, any_to_string_non_empty, any_to_tokens};
use ipx_model::ItemColumn;

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

/// Every item column of the table with its parsed key, in table order.
pub fn item_columns(df: &DataFrame) -> Vec<ItemColumn> {
    df.get_column_names()
        .into_iter()
        .filter_map(|name| ItemColumn::parse(name))
        .collect()
}

/// Text values with null and blank cells as `None`.
pub fn optional_string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df.column(name)?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let value = any_to_string_non_empty(series.get(idx).unwrap_or(AnyValue::Null));
        values.push(value.map(|v| v.trim().to_string()));
    }
    Ok(values)
}

pub fn numeric_column_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = df.column(name)?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let value = series.get(idx).unwrap_or(AnyValue::Null);
        values.push(any_to_f64(value));
    }
    Ok(values)
}

/// List cells (or their `", "`-joined text form) as tokens; `None` otherwise.
pub fn token_column(df: &DataFrame, name: &str) -> Result<Vec<Option<Vec<String>>>> {
    let series = df.column(name)?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let value = series.get(idx).unwrap_or(AnyValue::Null);
        values.push(any_to_tokens(value));
    }
    Ok(values)
}

pub fn set_f64_column(df: &mut DataFrame, name: &str, values: Vec<Option<f64>>) -> Result<()> {
    let series = Series::new(name.into(), values);
    df.with_column(series)?;
    Ok(())
}

pub fn filter_rows(df: &mut DataFrame, keep: &[bool]) -> Result<()> {
    let mask = BooleanChunked::from_slice("keep".into(), keep);
    *df = df.filter(&mask)?;
    Ok(())
}

/// Identifier of every row for diagnostics, `None` when the table has no id column.
pub fn row_ids(df: &DataFrame, id_column: &str) -> Result<Vec<Option<String>>> {
    if !has_column(df, id_column) {
        return Ok(vec![None; df.height()]);
    }
    optional_string_column(df, id_column)
}
