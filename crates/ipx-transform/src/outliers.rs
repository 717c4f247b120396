//! Global outlier pruning on response times.
//!
//! All numeric values of the candidate time columns are pooled into one
//! population. Rows holding any value strictly above `mean + k·σ`
//! (population σ) are removed.

use anyhow::Result;
use polars::prelude::*;
use tracing::debug;

use ipx_model::Field;

use crate::events::{EventSink, PipelineEvent};
use crate::frame_utils::{filter_rows, has_column, item_columns, numeric_column_f64, row_ids};

/// Pooled statistics of one filter run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PooledStats {
    pub values: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub threshold: f64,
}

impl PooledStats {
    /// Population mean and σ of `values`; `None` when empty.
    pub fn compute(values: &[f64], sigma: f64) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();
        Some(Self {
            values: values.len(),
            mean,
            std_dev,
            threshold: mean + sigma * std_dev,
        })
    }
}

/// A row removed by the filter and the first value that exceeded the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedRow {
    pub row: usize,
    pub id: Option<String>,
    pub column: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutlierReport {
    /// Candidate columns present in the table.
    pub columns: Vec<String>,
    /// `None` when the filter had nothing to work on.
    pub stats: Option<PooledStats>,
    pub dropped: Vec<DroppedRow>,
}

/// Every item column measuring time, in table order.
pub fn default_time_columns(df: &DataFrame) -> Vec<String> {
    item_columns(df)
        .into_iter()
        .filter(|column| column.field == Field::Tiempo)
        .map(|column| column.to_string())
        .collect()
}

/// Drop rows with any candidate time value above `mean + sigma·σ`.
///
/// Only the listed `candidates` are considered; callers wanting every time
/// item column pass [`default_time_columns`]. Without any present candidate
/// column or any numeric value the table is returned unchanged.
///
/// Surviving rows keep their original order but not their original index.
/// `ID` carries row identity, and each [`DroppedRow`] records the index it
/// had before filtering.
pub fn filter_outliers(
    mut df: DataFrame,
    candidates: &[String],
    sigma: f64,
    id_column: &str,
    sink: &mut dyn EventSink,
) -> Result<(DataFrame, OutlierReport)> {
    let columns: Vec<String> = candidates
        .iter()
        .filter(|name| has_column(&df, name))
        .cloned()
        .collect();
    let mut report = OutlierReport {
        columns: columns.clone(),
        ..OutlierReport::default()
    };
    if columns.is_empty() {
        sink.emit(PipelineEvent::NoTimeColumns {
            candidates: candidates.len(),
        });
        return Ok((df, report));
    }

    let values: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|name| numeric_column_f64(&df, name))
        .collect::<Result<_>>()?;
    let pooled: Vec<f64> = values.iter().flatten().flatten().copied().collect();
    let Some(stats) = PooledStats::compute(&pooled, sigma) else {
        sink.emit(PipelineEvent::NoNumericTimeValues {
            columns: columns.len(),
        });
        return Ok((df, report));
    };
    report.stats = Some(stats);
    sink.emit(PipelineEvent::OutlierThreshold {
        values: stats.values,
        mean: stats.mean,
        std_dev: stats.std_dev,
        threshold: stats.threshold,
    });

    let ids = row_ids(&df, id_column)?;
    let mut keep = vec![true; df.height()];
    for (row, keep_row) in keep.iter_mut().enumerate() {
        let offending = columns
            .iter()
            .zip(&values)
            .find_map(|(name, column)| match column[row] {
                Some(value) if value > stats.threshold => Some((name, value)),
                _ => None,
            });
        if let Some((name, value)) = offending {
            *keep_row = false;
            sink.emit(PipelineEvent::RowDropped {
                row,
                subject: ids[row].clone(),
                column: name.clone(),
                value,
                threshold: stats.threshold,
            });
            report.dropped.push(DroppedRow {
                row,
                id: ids[row].clone(),
                column: name.clone(),
                value,
            });
        }
    }

    if !report.dropped.is_empty() {
        filter_rows(&mut df, &keep)?;
    }
    debug!(
        columns = columns.len(),
        dropped = report.dropped.len(),
        threshold = stats.threshold,
        "Filtered outlier rows"
    );
    Ok((df, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooled_stats_use_population_sigma() {
        let stats = PooledStats::compute(&[1.0, 2.0, 3.0, 100.0], 3.0).unwrap();
        assert!((stats.mean - 26.5).abs() < 1e-9);
        assert!((stats.std_dev - 1801.25f64.sqrt()).abs() < 1e-9);
        assert!((stats.threshold - 154.0).abs() < 0.5);
        assert!(PooledStats::compute(&[], 3.0).is_none());
    }
}
