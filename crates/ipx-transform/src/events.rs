//! Diagnostic events reported by the table stages.
//!
//! Stages never print. They describe what they did as [`PipelineEvent`]s
//! and hand them to the caller's [`EventSink`].

use std::fmt;

use tracing::{debug, info, trace, warn};

use ipx_model::{Field, ShiftKind, Side};

/// Placeholder used for subject ids when row-level logging is disabled.
pub const REDACTED_VALUE: &str = "[REDACTED]";

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// A raw row produced no flattened row.
    RowSkipped { row: usize, reason: String },
    /// The presentation order of a row could not be recovered.
    OrderUnavailable {
        row: usize,
        block: &'static str,
        reason: String,
    },
    /// A stage precondition column is absent; the stage left the table unchanged.
    MissingColumn { step: &'static str, column: String },
    /// A flattened payload path maps onto an item column that already exists.
    ColumnRenameConflict { source: String, target: String },
    /// Warm-up item cells nulled in one row.
    CellsErased {
        row: usize,
        subject: Option<String>,
        items: Vec<u32>,
        cells: usize,
    },
    /// Missing sides filled for one item/field/side.
    PairImputed {
        item: u32,
        field: Field,
        side: Side,
        fills: usize,
    },
    /// None of the candidate time columns exist.
    NoTimeColumns { candidates: usize },
    /// The candidate time columns hold no numeric value.
    NoNumericTimeValues { columns: usize },
    /// Pooled statistics of the outlier filter.
    OutlierThreshold {
        values: usize,
        mean: f64,
        std_dev: f64,
        threshold: f64,
    },
    /// A row removed by the outlier filter.
    RowDropped {
        row: usize,
        subject: Option<String>,
        column: String,
        value: f64,
        threshold: f64,
    },
    /// A shift metric could not be derived for one table and item.
    ShiftSkipped {
        table: String,
        item: u32,
        kind: ShiftKind,
        missing: Vec<String>,
    },
    /// A pipeline step completed.
    StepFinished {
        step: &'static str,
        table: String,
        rows: usize,
        duration_ms: u128,
    },
}

impl PipelineEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineEvent::RowSkipped { .. } => "row_skipped",
            PipelineEvent::OrderUnavailable { .. } => "order_unavailable",
            PipelineEvent::MissingColumn { .. } => "missing_column",
            PipelineEvent::ColumnRenameConflict { .. } => "column_rename_conflict",
            PipelineEvent::CellsErased { .. } => "cells_erased",
            PipelineEvent::PairImputed { .. } => "pair_imputed",
            PipelineEvent::NoTimeColumns { .. } => "no_time_columns",
            PipelineEvent::NoNumericTimeValues { .. } => "no_numeric_time_values",
            PipelineEvent::OutlierThreshold { .. } => "outlier_threshold",
            PipelineEvent::RowDropped { .. } => "row_dropped",
            PipelineEvent::ShiftSkipped { .. } => "shift_skipped",
            PipelineEvent::StepFinished { .. } => "step_finished",
        }
    }
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineEvent::RowSkipped { row, reason } => {
                write!(f, "row {row} skipped: {reason}")
            }
            PipelineEvent::OrderUnavailable { row, block, reason } => {
                write!(f, "row {row}: no {block} order ({reason})")
            }
            PipelineEvent::MissingColumn { step, column } => {
                write!(f, "{step} skipped: column '{column}' not found")
            }
            PipelineEvent::ColumnRenameConflict { source, target } => {
                write!(f, "'{source}' not renamed: '{target}' already exists")
            }
            PipelineEvent::CellsErased { row, items, cells, .. } => {
                write!(f, "row {row}: erased {cells} cells of items {items:?}")
            }
            PipelineEvent::PairImputed {
                item,
                field,
                side,
                fills,
            } => write!(f, "item {item} {field} {side}: {fills} fills"),
            PipelineEvent::NoTimeColumns { candidates } => {
                write!(f, "none of {candidates} time columns found")
            }
            PipelineEvent::NoNumericTimeValues { columns } => {
                write!(f, "no numeric values in {columns} time columns")
            }
            PipelineEvent::OutlierThreshold {
                mean,
                std_dev,
                threshold,
                ..
            } => write!(
                f,
                "mean {mean:.2}, std dev {std_dev:.2}, threshold {threshold:.2}"
            ),
            PipelineEvent::RowDropped {
                row,
                column,
                value,
                threshold,
                ..
            } => write!(f, "row {row} dropped: {column}={value:.2} exceeds {threshold:.2}"),
            PipelineEvent::ShiftSkipped {
                table,
                item,
                kind,
                missing,
            } => write!(
                f,
                "{table}: {} item {item} skipped, missing {}",
                kind.prefix(),
                missing.join(", ")
            ),
            PipelineEvent::StepFinished {
                step,
                table,
                rows,
                duration_ms,
            } => write!(f, "{table}: {step} finished with {rows} rows in {duration_ms} ms"),
        }
    }
}

/// Receiver of diagnostic events.
pub trait EventSink {
    fn emit(&mut self, event: PipelineEvent);
}

impl EventSink for Vec<PipelineEvent> {
    fn emit(&mut self, event: PipelineEvent) {
        self.push(event);
    }
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink {
    reveal_ids: bool,
}

impl TracingSink {
    /// `reveal_ids` allows subject identifiers in log output.
    pub fn new(reveal_ids: bool) -> Self {
        Self { reveal_ids }
    }

    fn subject<'a>(&self, subject: Option<&'a str>) -> &'a str {
        match subject {
            Some(value) if self.reveal_ids => value,
            Some(_) => REDACTED_VALUE,
            None => "",
        }
    }
}

impl EventSink for TracingSink {
    fn emit(&mut self, event: PipelineEvent) {
        match &event {
            PipelineEvent::RowSkipped { row, reason } => {
                debug!(row, reason = %reason, "payload row skipped");
            }
            PipelineEvent::OrderUnavailable { row, block, reason } => {
                trace!(row, block, reason = %reason, "item order unavailable");
            }
            PipelineEvent::MissingColumn { step, column } => {
                warn!(step, column = %column, "required column not found, step skipped");
            }
            PipelineEvent::ColumnRenameConflict { source, target } => {
                warn!(source = %source, target = %target, "item column name already taken");
            }
            PipelineEvent::CellsErased {
                row,
                subject,
                items,
                cells,
            } => {
                trace!(
                    row,
                    subject = self.subject(subject.as_deref()),
                    items = ?items,
                    cells,
                    "warm-up cells erased"
                );
            }
            PipelineEvent::PairImputed {
                item,
                field,
                side,
                fills,
            } => {
                debug!(item, field = %field, side = %side, fills, "paired side imputed");
            }
            PipelineEvent::NoTimeColumns { candidates } => {
                warn!(candidates, "no time column found, outlier filter skipped");
            }
            PipelineEvent::NoNumericTimeValues { columns } => {
                warn!(columns, "no numeric time values, outlier filter skipped");
            }
            PipelineEvent::OutlierThreshold {
                values,
                mean,
                std_dev,
                threshold,
            } => {
                info!(values, mean, std_dev, threshold, "outlier threshold");
            }
            PipelineEvent::RowDropped {
                row,
                subject,
                column,
                value,
                threshold,
            } => {
                debug!(
                    row,
                    subject = self.subject(subject.as_deref()),
                    column = %column,
                    value,
                    threshold,
                    "row dropped as outlier"
                );
            }
            PipelineEvent::ShiftSkipped {
                table,
                item,
                kind,
                missing,
            } => {
                trace!(
                    table = %table,
                    item,
                    kind = kind.prefix(),
                    missing = ?missing,
                    "shift metric skipped"
                );
            }
            PipelineEvent::StepFinished {
                step,
                table,
                rows,
                duration_ms,
            } => {
                info!(step, table = %table, rows, duration_ms, "step finished");
            }
        }
    }
}
