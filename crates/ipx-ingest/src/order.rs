//! Stimulus presentation order.
//!
//! The survey platform writes the stimulus entries of a block in the order
//! they were shown, so the key order of the decoded object is the order of
//! presentation. Two variants exist:
//!
//! - plain (`IP`): `IP_item_9` → item `9`
//! - associated (`IP_modificada`): `IP_item_5_Izq_modified` → token `"5_Izq"`

use polars::prelude::*;
use tracing::debug;

use ipx_model::{
    ASSOCIATED_ORDER_COLUMN, ITEM_KEY_PREFIX, LAST_ASSOCIATED_COLUMN, LAST_ITEM_COLUMN,
    ORDER_COLUMN,
};

use crate::error::{IngestError, Result};
use crate::payload::{PayloadError, RowIssue, StimulusBlock, SubjectPayload};

/// Ordered items of one subject plus the last one shown.
///
/// An empty list with no last item means the order could not be recovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOrder<T> {
    pub items: Vec<T>,
    pub last: Option<T>,
}

impl<T: Clone> ItemOrder<T> {
    pub fn new(items: Vec<T>) -> Self {
        let last = items.last().cloned();
        Self { items, last }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            last: None,
        }
    }
}

/// Plain presentation order from `results[1].fase_3.IP`.
///
/// Keys whose trailing `_` segment is not an integer are skipped.
pub fn plain_order(payload: &SubjectPayload) -> std::result::Result<ItemOrder<i64>, PayloadError> {
    let block = payload.stimulus_block(StimulusBlock::Plain)?;
    let items = block
        .keys()
        .filter(|key| key.starts_with(ITEM_KEY_PREFIX))
        .filter_map(|key| key.rsplit('_').next()?.parse::<i64>().ok())
        .collect();
    Ok(ItemOrder::new(items))
}

/// Associated presentation order from `results[1].fase_3.IP_modificada`.
///
/// Only keys with more than three `_` segments count; the token joins the
/// third and fourth segments.
pub fn associated_order(
    payload: &SubjectPayload,
) -> std::result::Result<ItemOrder<String>, PayloadError> {
    let block = payload.stimulus_block(StimulusBlock::Associated)?;
    let items = block
        .keys()
        .filter(|key| key.starts_with(ITEM_KEY_PREFIX))
        .filter_map(|key| {
            let segments: Vec<&str> = key.split('_').collect();
            (segments.len() > 3).then(|| format!("{}_{}", segments[2], segments[3]))
        })
        .collect();
    Ok(ItemOrder::new(items))
}

/// Plain order of a raw payload string; any failure yields the empty order.
pub fn extract_item_order(raw: &str) -> ItemOrder<i64> {
    SubjectPayload::parse(raw)
        .and_then(|payload| plain_order(&payload))
        .unwrap_or_else(|_| ItemOrder::empty())
}

/// Associated order of a raw payload string; any failure yields the empty order.
pub fn extract_associated_order(raw: &str) -> ItemOrder<String> {
    SubjectPayload::parse(raw)
        .and_then(|payload| associated_order(&payload))
        .unwrap_or_else(|_| ItemOrder::empty())
}

/// Result of attaching the order columns to a raw table.
#[derive(Debug)]
pub struct OrderColumns {
    pub frame: DataFrame,
    /// Rows whose plain order could not be recovered.
    pub plain_issues: Vec<RowIssue>,
    /// Rows whose associated order could not be recovered.
    pub associated_issues: Vec<RowIssue>,
}

/// Add `Orden_IP_Items`, `Ultimo_IP_Item`, `Orden_IP_Items_Asociados`, and
/// `Ultimo_IP_Item_Asociado` computed from `results_column`.
pub fn attach_order_columns(mut df: DataFrame, results_column: &str) -> Result<OrderColumns> {
    let results = df
        .column(results_column)
        .map_err(|_| IngestError::ColumnNotFound {
            column: results_column.to_string(),
        })?
        .clone();

    let height = df.height();
    let mut plain_lists = Vec::with_capacity(height);
    let mut plain_last = Vec::with_capacity(height);
    let mut associated_lists = Vec::with_capacity(height);
    let mut associated_last = Vec::with_capacity(height);
    let mut plain_issues = Vec::new();
    let mut associated_issues = Vec::new();

    for row in 0..height {
        let cell = results.get(row).unwrap_or(AnyValue::Null);
        let payload = SubjectPayload::from_cell(cell);

        let plain = payload.as_ref().map_err(PayloadError::clone).and_then(plain_order);
        let plain = plain.unwrap_or_else(|error| {
            plain_issues.push(RowIssue { row, error });
            ItemOrder::empty()
        });
        let associated = payload
            .as_ref()
            .map_err(PayloadError::clone)
            .and_then(associated_order);
        let associated = associated.unwrap_or_else(|error| {
            associated_issues.push(RowIssue { row, error });
            ItemOrder::empty()
        });

        plain_lists.push(Series::new(PlSmallStr::EMPTY, plain.items));
        plain_last.push(plain.last);
        associated_lists.push(Series::new(PlSmallStr::EMPTY, associated.items));
        associated_last.push(associated.last);
    }

    df.with_column(list_series(ORDER_COLUMN, plain_lists, DataType::Int64)?)?;
    df.with_column(Series::new(LAST_ITEM_COLUMN.into(), plain_last))?;
    df.with_column(list_series(
        ASSOCIATED_ORDER_COLUMN,
        associated_lists,
        DataType::String,
    )?)?;
    df.with_column(Series::new(LAST_ASSOCIATED_COLUMN.into(), associated_last))?;

    debug!(
        rows = height,
        plain_unavailable = plain_issues.len(),
        associated_unavailable = associated_issues.len(),
        "Attached item order columns"
    );

    Ok(OrderColumns {
        frame: df,
        plain_issues,
        associated_issues,
    })
}

/// Build a list column from per-row series with a fixed inner type.
pub fn list_series(name: &str, rows: Vec<Series>, inner: DataType) -> Result<Series> {
    let mut lists: ListChunked = rows.into_iter().map(Some).collect();
    lists.rename(name.into());
    Ok(lists
        .into_series()
        .cast(&DataType::List(Box::new(inner)))?)
}
