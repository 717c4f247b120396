//! Survey processing pipeline with ordered step execution.
//!
//! The raw export is turned into one base measurement table, which is then
//! processed once per output variant. Each step implements the
//! `ProcessingStep` trait and is executed in order.
//!
//! # Standard Pipeline Order
//!
//! Base table:
//! 1. order columns attached to the raw rows
//! 2. payloads flattened, passthrough columns carried over
//! 3. item columns named, `ID` ensured, first associated items added
//!
//! Per variant:
//! 1. **EraseWarmupStep** - null warm-up items (`warmup_erased` only)
//! 2. **ImputeStep** - fill single missing sides with category medians
//! 3. **OutlierStep** - drop rows with extreme response times
//!
//! Shift metrics are then derived across all variant tables.
//!
//! # Example
//!
//! ```ignore
//! use ipx_transform::{TracingSink, run_pipeline};
//!
//! let output = run_pipeline(raw, &options, &mut TracingSink::default())?;
//! for (name, table) in &output.tables {
//!     println!("{name}: {} rows", table.height());
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use anyhow::Result;
use polars::prelude::DataFrame;
use tracing::{info, info_span};

use ipx_ingest::{RowIssue, StimulusBlock, attach_order_columns, materialize_results};
use ipx_model::PipelineOptions;

use crate::erase::erase_warmup_items;
use crate::events::{EventSink, PipelineEvent};
use crate::impute::{ImputationReport, impute_paired_columns};
use crate::measurement::{carry_passthrough_columns, ensure_id_column, normalize_item_columns};
use crate::outliers::{OutlierReport, default_time_columns, filter_outliers};
use crate::shift::derive_shift_metrics;
use crate::truncate::add_first_associated_column;

/// Named output table produced by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputVariant {
    /// Every item kept.
    Full,
    /// Warm-up associated items erased.
    WarmupErased,
}

impl OutputVariant {
    pub fn table_name(self) -> &'static str {
        match self {
            OutputVariant::Full => "full",
            OutputVariant::WarmupErased => "warmup_erased",
        }
    }

    /// Variants enabled by `options`, in output order.
    pub fn enabled(options: &PipelineOptions) -> Vec<OutputVariant> {
        let mut variants = vec![OutputVariant::Full];
        if options.erase_warmup {
            variants.push(OutputVariant::WarmupErased);
        }
        variants
    }
}

impl fmt::Display for OutputVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// A single processing step in the variant pipeline.
pub trait ProcessingStep {
    /// Execute this step on the variant table.
    fn apply(
        &self,
        df: DataFrame,
        options: &PipelineOptions,
        state: &mut PipelineState,
        sink: &mut dyn EventSink,
    ) -> Result<DataFrame>;

    /// Human-readable name for this step (for logging/debugging).
    fn step_name(&self) -> &'static str;

    /// Whether this step should be skipped based on the options.
    ///
    /// Default implementation always runs the step.
    fn should_skip(&self, _options: &PipelineOptions) -> bool {
        false
    }
}

/// Mutable state shared across the steps of one variant.
#[derive(Debug, Default)]
pub struct PipelineState {
    pub imputation: Option<ImputationReport>,
    pub outliers: Option<OutlierReport>,
    /// Step execution log for debugging.
    pub executed_steps: Vec<String>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// An ordered pipeline of processing steps.
pub struct TablePipeline {
    steps: Vec<Box<dyn ProcessingStep>>,
}

impl Default for TablePipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl TablePipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Add a step to the end of the pipeline.
    #[must_use]
    pub fn add_step(mut self, step: Box<dyn ProcessingStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Remove a step by name.
    #[must_use]
    pub fn remove_step(mut self, step_name: &str) -> Self {
        self.steps.retain(|s| s.step_name() != step_name);
        self
    }

    /// Execute all steps in order.
    pub fn execute(
        &self,
        table: &str,
        mut df: DataFrame,
        options: &PipelineOptions,
        state: &mut PipelineState,
        sink: &mut dyn EventSink,
    ) -> Result<DataFrame> {
        for step in &self.steps {
            if step.should_skip(options) {
                continue;
            }
            let start = Instant::now();
            df = step.apply(df, options, state, sink)?;
            sink.emit(PipelineEvent::StepFinished {
                step: step.step_name(),
                table: table.to_string(),
                rows: df.height(),
                duration_ms: start.elapsed().as_millis(),
            });
            state.executed_steps.push(step.step_name().to_string());
        }
        Ok(df)
    }

    /// List step names in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.step_name()).collect()
    }
}

/// Build the step sequence of one output variant.
pub fn build_variant_pipeline(variant: OutputVariant) -> TablePipeline {
    let pipeline = match variant {
        OutputVariant::Full => TablePipeline::new(),
        OutputVariant::WarmupErased => TablePipeline::new().add_step(Box::new(EraseWarmupStep)),
    };
    pipeline
        .add_step(Box::new(ImputeStep))
        .add_step(Box::new(OutlierStep))
}

// ============================================================================
// Standard Processing Steps
// ============================================================================

/// Null the first distinct associated items of every row.
pub struct EraseWarmupStep;

impl ProcessingStep for EraseWarmupStep {
    fn apply(
        &self,
        df: DataFrame,
        options: &PipelineOptions,
        _state: &mut PipelineState,
        sink: &mut dyn EventSink,
    ) -> Result<DataFrame> {
        erase_warmup_items(&df, options.warmup_items, &options.id_column, sink)
    }

    fn step_name(&self) -> &'static str {
        "erase_warmup"
    }

    fn should_skip(&self, options: &PipelineOptions) -> bool {
        options.warmup_items == 0
    }
}

/// Fill single missing sides with category medians.
pub struct ImputeStep;

impl ProcessingStep for ImputeStep {
    fn apply(
        &self,
        df: DataFrame,
        options: &PipelineOptions,
        state: &mut PipelineState,
        sink: &mut dyn EventSink,
    ) -> Result<DataFrame> {
        let (df, report) = impute_paired_columns(df, &options.category_column, sink)?;
        state.imputation = Some(report);
        Ok(df)
    }

    fn step_name(&self) -> &'static str {
        "impute"
    }
}

/// Drop rows with response times above the pooled threshold.
pub struct OutlierStep;

impl ProcessingStep for OutlierStep {
    fn apply(
        &self,
        df: DataFrame,
        options: &PipelineOptions,
        state: &mut PipelineState,
        sink: &mut dyn EventSink,
    ) -> Result<DataFrame> {
        let candidates = if options.time_columns.is_empty() {
            default_time_columns(&df)
        } else {
            options.time_columns.clone()
        };
        let (df, report) = filter_outliers(
            df,
            &candidates,
            options.outlier_sigma,
            &options.id_column,
            sink,
        )?;
        state.outliers = Some(report);
        Ok(df)
    }

    fn step_name(&self) -> &'static str {
        "outliers"
    }
}

// ============================================================================
// Pipeline entry points
// ============================================================================

/// Reports of one processed variant.
#[derive(Debug, Clone, Default)]
pub struct VariantReport {
    pub imputation: Option<ImputationReport>,
    pub outliers: Option<OutlierReport>,
    pub executed_steps: Vec<String>,
}

impl From<PipelineState> for VariantReport {
    fn from(state: PipelineState) -> Self {
        Self {
            imputation: state.imputation,
            outliers: state.outliers,
            executed_steps: state.executed_steps,
        }
    }
}

/// Named output tables plus per-variant reports.
#[derive(Debug, Default)]
pub struct PipelineOutput {
    pub tables: BTreeMap<String, DataFrame>,
    pub reports: BTreeMap<String, VariantReport>,
    /// Rows of the base table before any variant step.
    pub base_rows: usize,
}

fn emit_order_issues(issues: Vec<RowIssue>, block: StimulusBlock, sink: &mut dyn EventSink) {
    for issue in issues {
        sink.emit(PipelineEvent::OrderUnavailable {
            row: issue.row,
            block: block.key(),
            reason: issue.error.to_string(),
        });
    }
}

/// Build the base measurement table from the raw export.
pub fn build_base_table(
    raw: DataFrame,
    options: &PipelineOptions,
    sink: &mut dyn EventSink,
) -> Result<DataFrame> {
    let ordered = attach_order_columns(raw, &options.results_column)?;
    emit_order_issues(ordered.plain_issues, StimulusBlock::Plain, sink);
    emit_order_issues(ordered.associated_issues, StimulusBlock::Associated, sink);

    let materialized = materialize_results(&ordered.frame, &options.results_column)?;
    for issue in &materialized.skipped {
        sink.emit(PipelineEvent::RowSkipped {
            row: issue.row,
            reason: issue.error.to_string(),
        });
    }

    let df = carry_passthrough_columns(
        materialized.frame,
        &ordered.frame,
        &materialized.accepted,
        &options.results_column,
    )?;
    let df = normalize_item_columns(df, sink)?;
    let df = ensure_id_column(df, &options.id_column)?;
    add_first_associated_column(df, options.first_associated, sink)
}

/// Run the full pipeline over a raw export.
pub fn run_pipeline(
    raw: DataFrame,
    options: &PipelineOptions,
    sink: &mut dyn EventSink,
) -> Result<PipelineOutput> {
    let span = info_span!("pipeline", raw_rows = raw.height());
    let _guard = span.enter();
    let start = Instant::now();

    let base = build_base_table(raw, options, sink)?;
    info!(
        rows = base.height(),
        columns = base.width(),
        "Built base measurement table"
    );

    let mut output = PipelineOutput {
        base_rows: base.height(),
        ..PipelineOutput::default()
    };
    for variant in OutputVariant::enabled(options) {
        let variant_span = info_span!("variant", name = variant.table_name());
        let _variant_guard = variant_span.enter();

        let pipeline = build_variant_pipeline(variant);
        let mut state = PipelineState::new();
        let table = pipeline.execute(
            variant.table_name(),
            base.clone(),
            options,
            &mut state,
            sink,
        )?;
        info!(rows = table.height(), "Variant processed");
        output.tables.insert(variant.table_name().to_string(), table);
        output
            .reports
            .insert(variant.table_name().to_string(), state.into());
    }

    output.tables = derive_shift_metrics(output.tables, &options.items, sink)?;
    info!(
        tables = output.tables.len(),
        duration_ms = start.elapsed().as_millis(),
        "Pipeline finished"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_pipelines_list_their_steps() {
        assert_eq!(
            build_variant_pipeline(OutputVariant::Full).step_names(),
            vec!["impute", "outliers"]
        );
        assert_eq!(
            build_variant_pipeline(OutputVariant::WarmupErased).step_names(),
            vec!["erase_warmup", "impute", "outliers"]
        );
        assert_eq!(
            build_variant_pipeline(OutputVariant::WarmupErased)
                .remove_step("outliers")
                .step_names(),
            vec!["erase_warmup", "impute"]
        );
    }

    #[test]
    fn erasure_variant_follows_options() {
        let options = PipelineOptions::default();
        assert_eq!(
            OutputVariant::enabled(&options),
            vec![OutputVariant::Full, OutputVariant::WarmupErased]
        );
        let options = options.with_erase_warmup(false);
        assert_eq!(OutputVariant::enabled(&options), vec![OutputVariant::Full]);
    }
}
