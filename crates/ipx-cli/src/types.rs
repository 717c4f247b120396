use std::collections::BTreeMap;
use std::path::PathBuf;

use ipx_transform::{DroppedRow, PooledStats};

#[derive(Debug)]
pub struct RunResult {
    pub raw_csv: PathBuf,
    pub output_dir: PathBuf,
    pub raw_rows: usize,
    pub base_rows: usize,
    pub tables: Vec<TableSummary>,
    /// Event counts keyed by event kind.
    pub events: BTreeMap<&'static str, usize>,
    pub dry_run: bool,
}

#[derive(Debug)]
pub struct TableSummary {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    pub imputed_cells: usize,
    pub stats: Option<PooledStats>,
    pub dropped: Vec<DroppedRow>,
    pub path: Option<PathBuf>,
}
