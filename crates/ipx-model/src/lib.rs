//! Data model for the implicit-priming survey pipeline.
//!
//! - **column**: typed measurement column keys and their legacy names
//! - **category**: PASO 2023 ideological categories
//! - **catalog**: item metadata and chart column selectors
//! - **options**: pipeline configuration

pub mod catalog;
pub mod category;
pub mod column;
pub mod error;
pub mod options;

pub use catalog::{ChartSelector, DEFAULT_ITEM_NUMBERS, ItemCatalog, ItemInfo};
pub use category::{PasoCategory, display_label};
pub use column::{
    ASSOCIATED_ORDER_COLUMN, CATEGORY_COLUMN, FIRST_ASSOCIATED_COLUMN, Field, ID_COLUMN,
    ITEM_KEY_PREFIX, ItemColumn, LAST_ASSOCIATED_COLUMN, LAST_ITEM_COLUMN, ORDER_COLUMN,
    SUBJECT_COLUMN, ShiftColumn, ShiftKind, Side,
};
pub use error::{ModelError, Result};
pub use options::PipelineOptions;
