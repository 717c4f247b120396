//! Paired-column imputation by category median.
//!
//! For an item measured under both candidates, a row that has exactly one
//! side present gets the missing side filled with the median of the missing
//! column within the row's category. The present side only licenses the
//! fill; its value is not used.

use std::collections::{BTreeSet, HashMap};

use anyhow::Result;
use polars::prelude::*;
use tracing::debug;

use ipx_model::{Field, ItemColumn, Side};

use crate::events::{EventSink, PipelineEvent};
use crate::frame_utils::{
    has_column, item_columns, numeric_column_f64, optional_string_column, set_f64_column,
};

/// Fills applied to one item/field/side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairFill {
    pub item: u32,
    pub field: Field,
    pub side: Side,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImputationReport {
    /// Every imputed pair, including those with zero fills.
    pub fills: Vec<PairFill>,
    pub total: usize,
}

impl ImputationReport {
    pub fn count_for(&self, item: u32, field: Field, side: Side) -> usize {
        self.fills
            .iter()
            .filter(|fill| fill.item == item && fill.field == field && fill.side == side)
            .map(|fill| fill.count)
            .sum()
    }
}

/// Median of the present values; `None` when there are none.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Per-category medians of `values`; rows without a category are ignored.
pub fn category_medians(
    categories: &[Option<String>],
    values: &[Option<f64>],
) -> HashMap<String, f64> {
    let mut groups: HashMap<&str, Vec<f64>> = HashMap::new();
    for (category, value) in categories.iter().zip(values) {
        let Some(category) = category else { continue };
        let bucket = groups.entry(category.as_str()).or_default();
        if let Some(value) = value {
            bucket.push(*value);
        }
    }
    groups
        .into_iter()
        .filter_map(|(category, bucket)| median(&bucket).map(|m| (category.to_string(), m)))
        .collect()
}

/// Items that have at least one sided column.
fn paired_items(df: &DataFrame) -> BTreeSet<u32> {
    item_columns(df)
        .into_iter()
        .filter(|column| column.side.is_some())
        .map(|column| column.item)
        .collect()
}

/// Fill single missing sides of every `Izq`/`Der` pair with category medians.
///
/// Both columns of every processed pair are rewritten as Float64 with
/// non-numeric and NaN cells as null. Medians are computed before any fill.
pub fn impute_paired_columns(
    mut df: DataFrame,
    category_column: &str,
    sink: &mut dyn EventSink,
) -> Result<(DataFrame, ImputationReport)> {
    let mut report = ImputationReport::default();
    if !has_column(&df, category_column) {
        sink.emit(PipelineEvent::MissingColumn {
            step: "impute",
            column: category_column.to_string(),
        });
        return Ok((df, report));
    }
    let categories = optional_string_column(&df, category_column)?;

    for item in paired_items(&df) {
        for field in Field::NUMERIC {
            let izq_column = ItemColumn::sided(item, Side::Izq, field);
            let Some(der_column) = izq_column.sibling() else {
                continue;
            };
            let (izq_name, der_name) = (izq_column.to_string(), der_column.to_string());
            if !has_column(&df, &izq_name) || !has_column(&df, &der_name) {
                continue;
            }

            let mut izq = numeric_column_f64(&df, &izq_name)?;
            let mut der = numeric_column_f64(&df, &der_name)?;
            let izq_medians = category_medians(&categories, &izq);
            let der_medians = category_medians(&categories, &der);

            let mut filled_izq = 0usize;
            let mut filled_der = 0usize;
            for row in 0..df.height() {
                let Some(category) = categories[row].as_deref() else {
                    continue;
                };
                match (izq[row], der[row]) {
                    (Some(_), None) => {
                        if let Some(&value) = der_medians.get(category) {
                            der[row] = Some(value);
                            filled_der += 1;
                        }
                    }
                    (None, Some(_)) => {
                        if let Some(&value) = izq_medians.get(category) {
                            izq[row] = Some(value);
                            filled_izq += 1;
                        }
                    }
                    _ => {}
                }
            }

            set_f64_column(&mut df, &izq_name, izq)?;
            set_f64_column(&mut df, &der_name, der)?;

            for (side, count) in [(Side::Der, filled_der), (Side::Izq, filled_izq)] {
                report.fills.push(PairFill {
                    item,
                    field,
                    side,
                    count,
                });
                report.total += count;
                if count > 0 {
                    sink.emit(PipelineEvent::PairImputed {
                        item,
                        field,
                        side,
                        fills: count,
                    });
                }
            }
        }
    }

    debug!(
        pairs = report.fills.len() / 2,
        fills = report.total,
        "Imputed paired columns"
    );
    Ok((df, report))
}
