//! Warm-up erasure of candidate-associated items.
//!
//! The first distinct items a subject saw next to a candidate are treated as
//! warm-up trials: their sided cells are nulled while the columns stay.

use std::collections::BTreeMap;

use anyhow::Result;
use polars::prelude::*;
use tracing::debug;

use ipx_model::{ASSOCIATED_ORDER_COLUMN, Field, ItemColumn, Side};

use crate::events::{EventSink, PipelineEvent};
use crate::frame_utils::{has_column, row_ids, token_column};

/// Leading item numbers of the first `count` distinct associated items.
///
/// Tokens look like `"5_Izq"`; tokens without `_` are ignored. Item numbers
/// that are not integers still count towards `count` but name no column.
pub fn warmup_items(tokens: &[String], count: usize) -> Vec<u32> {
    let mut distinct: Vec<&str> = Vec::new();
    for token in tokens {
        if distinct.len() >= count {
            break;
        }
        let Some((number, _)) = token.split_once('_') else {
            continue;
        };
        if !distinct.contains(&number) {
            distinct.push(number);
        }
    }
    distinct
        .into_iter()
        .filter_map(|number| number.parse::<u32>().ok())
        .collect()
}

/// Copy of `df` with the warm-up items of every row nulled.
///
/// For each warm-up item the six cells `IP_Item_<n>_{Izq,Der}_{Respuesta,
/// Candidato,Tiempo}` are nulled where the column exists.
pub fn erase_warmup_items(
    df: &DataFrame,
    count: usize,
    id_column: &str,
    sink: &mut dyn EventSink,
) -> Result<DataFrame> {
    let mut out = df.clone();
    if !has_column(df, ASSOCIATED_ORDER_COLUMN) {
        sink.emit(PipelineEvent::MissingColumn {
            step: "erase_warmup",
            column: ASSOCIATED_ORDER_COLUMN.to_string(),
        });
        return Ok(out);
    }

    let orders = token_column(df, ASSOCIATED_ORDER_COLUMN)?;
    let ids = row_ids(df, id_column)?;

    // column name -> per-row erase flags
    let mut erase: BTreeMap<String, Vec<bool>> = BTreeMap::new();
    let mut total_cells = 0usize;

    for (row, tokens) in orders.iter().enumerate() {
        let Some(tokens) = tokens else { continue };
        let items = warmup_items(tokens, count);
        if items.is_empty() {
            continue;
        }
        let mut cells = 0usize;
        for &item in &items {
            for side in Side::ALL {
                for field in Field::ALL {
                    let name = ItemColumn::sided(item, side, field).to_string();
                    if !has_column(df, &name) {
                        continue;
                    }
                    erase.entry(name).or_insert_with(|| vec![false; df.height()])[row] = true;
                    cells += 1;
                }
            }
        }
        total_cells += cells;
        sink.emit(PipelineEvent::CellsErased {
            row,
            subject: ids[row].clone(),
            items,
            cells,
        });
    }

    for (name, flags) in &erase {
        let column = df.column(name)?.as_materialized_series().clone();
        let keep: Vec<bool> = flags.iter().map(|flag| !flag).collect();
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        let nulls = Series::full_null(column.name().clone(), column.len(), column.dtype());
        out.with_column(column.zip_with(&mask, &nulls)?)?;
    }

    debug!(
        columns = erase.len(),
        cells = total_cells,
        "Erased warm-up items"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| (*item).to_string()).collect()
    }

    #[test]
    fn stops_after_distinct_count() {
        let order = tokens(&["5_Izq", "5_Der", "9_Izq", "3_Der", "8_Izq"]);
        assert_eq!(warmup_items(&order, 3), vec![5, 9, 3]);
    }

    #[test]
    fn ignores_tokens_without_separator() {
        let order = tokens(&["7", "4_Izq", "x_Der", "6_Izq"]);
        assert_eq!(warmup_items(&order, 2), vec![4]);
        assert!(warmup_items(&[], 3).is_empty());
    }
}
