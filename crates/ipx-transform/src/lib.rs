//! Table stages of the implicit-priming survey pipeline.
//!
//! Each stage takes a measurement table and returns the processed table,
//! reporting what it did through an [`EventSink`].

pub mod erase;
pub mod events;
pub mod frame_utils;
pub mod impute;
pub mod measurement;
pub mod outliers;
pub mod pipeline;
pub mod shift;
pub mod summary;
pub mod truncate;

pub use erase::{erase_warmup_items, warmup_items};
pub use events::{EventSink, PipelineEvent, REDACTED_VALUE, TracingSink};
pub use impute::{ImputationReport, PairFill, category_medians, impute_paired_columns, median};
pub use measurement::{carry_passthrough_columns, ensure_id_column, normalize_item_columns};
pub use outliers::{DroppedRow, OutlierReport, PooledStats, default_time_columns, filter_outliers};
pub use pipeline::{
    EraseWarmupStep, ImputeStep, OutlierStep, OutputVariant, PipelineOutput, PipelineState,
    ProcessingStep, TablePipeline, VariantReport, build_base_table, build_variant_pipeline,
    run_pipeline,
};
pub use shift::{add_shift_columns, derive_shift_metrics, shift_values};
pub use summary::{CategorySummary, category_summary, chart_columns};
pub use truncate::{add_first_associated_column, truncate};
