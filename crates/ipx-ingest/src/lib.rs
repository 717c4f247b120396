//! Survey payload ingestion.
//!
//! This crate turns the raw survey export into Polars DataFrames:
//!
//! - **Payload**: typed navigation of the per-subject JSON blob
//! - **Order**: stimulus presentation order per subject
//! - **Flatten/Materialize**: one flattened row per subject
//! - **CSV**: reading raw exports and writing processed tables
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use ipx_ingest::{attach_order_columns, materialize_results, read_csv_table};
//!
//! let raw = read_csv_table(Path::new("export.csv"))?;
//! let ordered = attach_order_columns(raw, "results")?;
//! let flat = materialize_results(&ordered.frame, "results")?;
//! ```

mod csv;
mod error;
mod flatten;
mod materialize;
mod order;
mod payload;
mod polars_utils;

// === Error Types ===
pub use error::{IngestError, Result};

// === Payload ===
pub use payload::{PayloadError, RowIssue, StimulusBlock, SubjectPayload};

// === Item Order ===
pub use order::{
    ItemOrder, OrderColumns, associated_order, attach_order_columns, extract_associated_order,
    extract_item_order, list_series, plain_order,
};

// === Flattening ===
pub use flatten::FlatRow;
pub use materialize::{Materialized, flatten_payload, materialize_results, rows_to_frame};

// === CSV ===
pub use csv::{read_csv_table, stringify_list_columns, write_csv_table};

// === Polars Utilities ===
pub use polars_utils::{
    LIST_SEPARATOR, any_to_f64, any_to_string, any_to_string_non_empty, any_to_tokens,
    format_numeric, parse_f64,
};
