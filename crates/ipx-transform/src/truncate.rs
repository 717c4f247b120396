//! First-N prefix of the associated presentation order.

use anyhow::Result;
use polars::prelude::*;

use ipx_model::{ASSOCIATED_ORDER_COLUMN, FIRST_ASSOCIATED_COLUMN};

use crate::events::{EventSink, PipelineEvent};
use crate::frame_utils::has_column;

/// First `n` elements when the list has at least `n`, otherwise the list as is.
pub fn truncate<T: Clone>(list: &[T], n: usize) -> Vec<T> {
    if list.len() >= n {
        list[..n].to_vec()
    } else {
        list.to_vec()
    }
}

/// Add `Primeros_IP_Items_Asociados` holding the first `n` associated items.
///
/// List cells are truncated; any other cell is copied unchanged.
pub fn add_first_associated_column(
    mut df: DataFrame,
    n: usize,
    sink: &mut dyn EventSink,
) -> Result<DataFrame> {
    if !has_column(&df, ASSOCIATED_ORDER_COLUMN) {
        sink.emit(PipelineEvent::MissingColumn {
            step: "first_associated",
            column: ASSOCIATED_ORDER_COLUMN.to_string(),
        });
        return Ok(df);
    }
    let source = df
        .column(ASSOCIATED_ORDER_COLUMN)?
        .as_materialized_series()
        .clone();

    let prefix = if matches!(source.dtype(), DataType::List(_)) {
        let lists = source.list()?;
        let mut truncated: ListChunked = lists
            .into_iter()
            .map(|cell| {
                cell.map(|items| {
                    if items.len() >= n {
                        items.slice(0, n)
                    } else {
                        items
                    }
                })
            })
            .collect();
        truncated.rename(FIRST_ASSOCIATED_COLUMN.into());
        truncated.into_series().cast(source.dtype())?
    } else {
        source.with_name(FIRST_ASSOCIATED_COLUMN.into())
    };

    df.with_column(prefix)?;
    Ok(df)
}
