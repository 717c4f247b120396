//! Base measurement table assembly.
//!
//! The flattened payload rows carry their item responses under payload
//! paths (`fase_3.IP_modificada.IP_item_5_Izq_modified.respuesta`). This
//! module renames those paths to item columns (`IP_Item_5_Izq_Respuesta`)
//! and joins the passthrough columns of the raw export back onto the rows.

use std::collections::HashSet;

use anyhow::Result;
use polars::prelude::*;
use tracing::debug;

use ipx_model::{ItemColumn, SUBJECT_COLUMN};

use crate::events::{EventSink, PipelineEvent};
use crate::frame_utils::{column_names, has_column};

/// Rename recognized payload paths to item column names.
///
/// Other columns keep their names. A path whose item column already exists
/// keeps its original name and is reported.
pub fn normalize_item_columns(mut df: DataFrame, sink: &mut dyn EventSink) -> Result<DataFrame> {
    let mut taken: HashSet<String> = column_names(&df).into_iter().collect();
    let mut renamed = 0usize;

    for name in column_names(&df) {
        let Some(key) = ItemColumn::from_flat_path(&name) else {
            continue;
        };
        let target = key.to_string();
        if target == name {
            continue;
        }
        if taken.contains(&target) {
            sink.emit(PipelineEvent::ColumnRenameConflict {
                source: name,
                target,
            });
            continue;
        }
        df.rename(&name, target.as_str().into())?;
        taken.remove(&name);
        taken.insert(target);
        renamed += 1;
    }

    debug!(renamed, "Normalized item columns");
    Ok(df)
}

/// Prepend the raw columns of the accepted rows to the flattened table.
///
/// `accepted[i]` is the raw row of flattened row `i`. The results column
/// and raw columns that collide with flattened ones are left out.
pub fn carry_passthrough_columns(
    flat: DataFrame,
    raw: &DataFrame,
    accepted: &[usize],
    results_column: &str,
) -> Result<DataFrame> {
    let indices: Vec<IdxSize> = accepted.iter().map(|&row| row as IdxSize).collect();
    let taken = raw.take(&IdxCa::from_vec("rows".into(), indices))?;

    let flat_names: HashSet<String> = column_names(&flat).into_iter().collect();
    let mut columns: Vec<Column> = taken
        .get_columns()
        .iter()
        .filter(|column| {
            let name = column.name().as_str();
            name != results_column && !flat_names.contains(name)
        })
        .cloned()
        .collect();
    if flat.width() == 0 {
        return Ok(DataFrame::new(columns)?);
    }
    columns.extend(flat.get_columns().iter().cloned());
    Ok(DataFrame::new(columns)?)
}

/// Copy the payload `id` column to `id_column` when the export had none.
pub fn ensure_id_column(mut df: DataFrame, id_column: &str) -> Result<DataFrame> {
    if has_column(&df, id_column) || !has_column(&df, SUBJECT_COLUMN) {
        return Ok(df);
    }
    let ids = df
        .column(SUBJECT_COLUMN)?
        .clone()
        .with_name(id_column.into());
    df.with_column(ids)?;
    Ok(df)
}
