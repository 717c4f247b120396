//! Per-category statistics and chart column selection.
//!
//! These feed the report and chart collaborators, which only need plain
//! numbers per ideological category.

use anyhow::Result;
use polars::prelude::*;

use ipx_model::{ChartSelector, ItemCatalog, PasoCategory};

use crate::frame_utils::{has_column, numeric_column_f64, optional_string_column};
use crate::impute::median;

/// Statistics of one column within one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub category: PasoCategory,
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

/// Count, mean, and median of `column` for each display category, in
/// display order. Sentinel and unknown categories are not reported.
pub fn category_summary(
    df: &DataFrame,
    column: &str,
    category_column: &str,
) -> Result<Vec<CategorySummary>> {
    let values = numeric_column_f64(df, column)?;
    let categories: Vec<Option<PasoCategory>> = optional_string_column(df, category_column)?
        .into_iter()
        .map(|text| {
            text.and_then(|text| text.parse::<PasoCategory>().ok())
                .filter(|category| !category.is_sentinel())
        })
        .collect();

    Ok(PasoCategory::DISPLAY_ORDER
        .into_iter()
        .map(|category| {
            let present: Vec<f64> = categories
                .iter()
                .zip(&values)
                .filter(|(row_category, _)| **row_category == Some(category))
                .filter_map(|(_, value)| *value)
                .collect();
            let mean = (!present.is_empty())
                .then(|| present.iter().sum::<f64>() / present.len() as f64);
            CategorySummary {
                category,
                count: present.len(),
                mean,
                median: median(&present),
            }
        })
        .collect())
}

/// Columns charted for `selector`: one per catalog item whose column exists.
pub fn chart_columns(
    df: &DataFrame,
    catalog: &ItemCatalog,
    selector: ChartSelector,
) -> Vec<(u32, String)> {
    catalog
        .numbers()
        .into_iter()
        .map(|item| (item, selector.column_name(item)))
        .filter(|(_, column)| has_column(df, column))
        .collect()
}
