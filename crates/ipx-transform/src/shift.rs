//! Change-of-Opinion and Change-of-Time metrics.
//!
//! `CO_Item_<n>_<Side>` is the sided response minus the baseline response,
//! `CT_Item_<n>_<Side>` the same for response times. Missing inputs yield
//! null cells.

use std::collections::BTreeMap;

use anyhow::Result;
use polars::prelude::*;
use tracing::debug;

use ipx_model::{ItemCatalog, ShiftColumn, ShiftKind, Side};

use crate::events::{EventSink, PipelineEvent};
use crate::frame_utils::{has_column, numeric_column_f64, set_f64_column};

/// `side - baseline`, null when either is null.
pub fn shift_values(side: &[Option<f64>], baseline: &[Option<f64>]) -> Vec<Option<f64>> {
    side.iter()
        .zip(baseline)
        .map(|(side, base)| match (side, base) {
            (Some(side), Some(base)) => Some(side - base),
            _ => None,
        })
        .collect()
}

/// Add the shift columns of one kind for every catalog item to one table.
///
/// An item is skipped unless its baseline and both sided columns exist.
/// Returns the number of columns written.
pub fn add_shift_columns(
    df: &mut DataFrame,
    table: &str,
    kind: ShiftKind,
    catalog: &ItemCatalog,
    sink: &mut dyn EventSink,
) -> Result<usize> {
    let mut written = 0usize;
    for item in catalog.numbers() {
        let targets = Side::ALL.map(|side| ShiftColumn::new(kind, item, side));
        let baseline = targets[0].baseline_column().to_string();
        let mut required = vec![baseline.clone()];
        required.extend(targets.iter().map(|target| target.side_column().to_string()));

        let missing: Vec<String> = required
            .iter()
            .filter(|name| !has_column(df, name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            sink.emit(PipelineEvent::ShiftSkipped {
                table: table.to_string(),
                item,
                kind,
                missing,
            });
            continue;
        }

        let base = numeric_column_f64(df, &baseline)?;
        for target in targets {
            let side = numeric_column_f64(df, &target.side_column().to_string())?;
            set_f64_column(df, &target.to_string(), shift_values(&side, &base))?;
            written += 1;
        }
    }
    Ok(written)
}

/// Add CO and CT columns to every named table.
pub fn derive_shift_metrics(
    mut tables: BTreeMap<String, DataFrame>,
    catalog: &ItemCatalog,
    sink: &mut dyn EventSink,
) -> Result<BTreeMap<String, DataFrame>> {
    for (name, df) in &mut tables {
        let mut written = 0usize;
        for kind in ShiftKind::ALL {
            written += add_shift_columns(df, name, kind, catalog, sink)?;
        }
        debug!(table = %name, columns = written, "Derived shift metrics");
    }
    Ok(tables)
}
