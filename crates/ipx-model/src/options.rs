//! Configuration options for the survey pipeline.

use serde::{Deserialize, Serialize};

use crate::catalog::ItemCatalog;
use crate::column::{CATEGORY_COLUMN, ID_COLUMN};
use crate::error::Result;

/// Options controlling pipeline behavior.
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// outlier_sigma = 2.5
/// erase_warmup = false
///
/// [[items]]
/// number = 3
/// title = "Aborto legal"
/// kind = "Pro"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineOptions {
    /// Raw column holding the per-subject JSON payload.
    pub results_column: String,

    /// Participant identifier column.
    pub id_column: String,

    /// Ideological grouping column used for imputation and summaries.
    pub category_column: String,

    /// Length of the `Primeros_IP_Items_Asociados` prefix.
    pub first_associated: usize,

    /// Also produce a table with the warm-up items erased.
    pub erase_warmup: bool,

    /// Distinct associated items treated as warm-up trials.
    pub warmup_items: usize,

    /// Outlier threshold in population standard deviations above the mean.
    pub outlier_sigma: f64,

    /// Candidate time columns for the outlier filter.
    /// Empty means every `Tiempo` item column in the table.
    pub time_columns: Vec<String>,

    /// Items that receive change-of-opinion/time columns.
    pub items: ItemCatalog,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            results_column: "results".to_string(),
            id_column: ID_COLUMN.to_string(),
            category_column: CATEGORY_COLUMN.to_string(),
            first_associated: 3,
            erase_warmup: true,
            warmup_items: 3,
            outlier_sigma: 3.0,
            time_columns: Vec::new(),
            items: ItemCatalog::default(),
        }
    }
}

impl PipelineOptions {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    #[must_use]
    pub fn with_outlier_sigma(mut self, sigma: f64) -> Self {
        self.outlier_sigma = sigma;
        self
    }

    #[must_use]
    pub fn with_erase_warmup(mut self, enable: bool) -> Self {
        self.erase_warmup = enable;
        self
    }

    #[must_use]
    pub fn with_first_associated(mut self, n: usize) -> Self {
        self.first_associated = n;
        self
    }

    #[must_use]
    pub fn with_time_columns(mut self, columns: Vec<String>) -> Self {
        self.time_columns = columns;
        self
    }

    #[must_use]
    pub fn with_items(mut self, items: ItemCatalog) -> Self {
        self.items = items;
        self
    }
}
