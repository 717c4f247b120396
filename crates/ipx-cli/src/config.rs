//! Pipeline options from an optional TOML file plus command-line overrides.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use ipx_model::PipelineOptions;

/// Command-line overrides of individual pipeline options.
#[derive(Debug, Clone, Default, Args)]
pub struct OptionOverrides {
    /// Raw column holding the JSON payload.
    #[arg(long = "results-column", value_name = "COLUMN")]
    pub results_column: Option<String>,

    /// Participant identifier column.
    #[arg(long = "id-column", value_name = "COLUMN")]
    pub id_column: Option<String>,

    /// Ideological category column used for imputation.
    #[arg(long = "category-column", value_name = "COLUMN")]
    pub category_column: Option<String>,

    /// Length of the first-associated-items prefix.
    #[arg(long = "first-associated", value_name = "N")]
    pub first_associated: Option<usize>,

    /// Distinct associated items erased as warm-up trials.
    #[arg(long = "warmup-items", value_name = "N")]
    pub warmup_items: Option<usize>,

    /// Skip the warm-up-erased output table.
    #[arg(long = "no-erase-warmup")]
    pub no_erase_warmup: bool,

    /// Outlier threshold in standard deviations above the mean.
    #[arg(long = "outlier-sigma", value_name = "SIGMA")]
    pub outlier_sigma: Option<f64>,

    /// Time column checked by the outlier filter (repeatable).
    #[arg(long = "time-column", value_name = "COLUMN")]
    pub time_columns: Vec<String>,
}

/// Load options from `path`, or the defaults when no file is given.
pub fn load_options(path: Option<&Path>) -> Result<PipelineOptions> {
    let Some(path) = path else {
        return Ok(PipelineOptions::default());
    };
    let source = fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    let options = PipelineOptions::from_toml_str(&source)
        .with_context(|| format!("parse config file {}", path.display()))?;
    debug!(path = %path.display(), items = options.items.len(), "Loaded pipeline options");
    Ok(options)
}

/// Apply the overrides that were given on the command line.
pub fn apply_overrides(mut options: PipelineOptions, overrides: &OptionOverrides) -> PipelineOptions {
    if let Some(column) = &overrides.results_column {
        options.results_column = column.clone();
    }
    if let Some(column) = &overrides.id_column {
        options.id_column = column.clone();
    }
    if let Some(column) = &overrides.category_column {
        options.category_column = column.clone();
    }
    if let Some(count) = overrides.first_associated {
        options = options.with_first_associated(count);
    }
    if let Some(count) = overrides.warmup_items {
        options.warmup_items = count;
    }
    if overrides.no_erase_warmup {
        options = options.with_erase_warmup(false);
    }
    if let Some(sigma) = overrides.outlier_sigma {
        options = options.with_outlier_sigma(sigma);
    }
    if !overrides.time_columns.is_empty() {
        options = options.with_time_columns(overrides.time_columns.clone());
    }
    options
}
