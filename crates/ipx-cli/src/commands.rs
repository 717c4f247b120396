use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use comfy_table::Table;
use tracing::{info, info_span};

use ipx_cli::config::{apply_overrides, load_options};
use ipx_cli::logging::log_data_enabled;
use ipx_ingest::{read_csv_table, write_csv_table};
use ipx_model::ChartSelector;
use ipx_transform::{
    EventSink, PipelineEvent, TracingSink, category_summary, chart_columns, run_pipeline,
};

use crate::cli::{RunArgs, SummaryArgs};
use crate::summary::{apply_table_style, print_category_summary};
use crate::types::{RunResult, TableSummary};

/// Forwards events to `tracing` and counts them per kind.
struct CountingSink {
    inner: TracingSink,
    counts: BTreeMap<&'static str, usize>,
}

impl EventSink for CountingSink {
    fn emit(&mut self, event: PipelineEvent) {
        *self.counts.entry(event.kind()).or_default() += 1;
        self.inner.emit(event);
    }
}

pub fn run_pipeline_command(args: &RunArgs, config: Option<&Path>) -> Result<RunResult> {
    let span = info_span!("run", input = %args.raw_csv.display());
    let _guard = span.enter();
    let start = Instant::now();

    let options = apply_overrides(load_options(config)?, &args.overrides);
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| default_output_dir(&args.raw_csv));

    let raw = read_csv_table(&args.raw_csv).context("read raw export")?;
    let raw_rows = raw.height();
    let mut sink = CountingSink {
        inner: TracingSink::new(log_data_enabled()),
        counts: BTreeMap::new(),
    };
    let output = run_pipeline(raw, &options, &mut sink)?;

    if !args.dry_run {
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("create output directory {}", output_dir.display()))?;
    }
    let mut tables = Vec::new();
    for (name, df) in &output.tables {
        let path = if args.dry_run {
            None
        } else {
            let path = output_dir.join(format!("{name}.csv"));
            write_csv_table(df, &path).with_context(|| format!("write table {name}"))?;
            Some(path)
        };
        let report = output.reports.get(name);
        let outliers = report.and_then(|report| report.outliers.as_ref());
        tables.push(TableSummary {
            name: name.clone(),
            rows: df.height(),
            columns: df.width(),
            imputed_cells: report
                .and_then(|report| report.imputation.as_ref())
                .map_or(0, |imputation| imputation.total),
            stats: outliers.and_then(|outliers| outliers.stats),
            dropped: outliers.map(|outliers| outliers.dropped.clone()).unwrap_or_default(),
            path,
        });
    }

    info!(
        tables = tables.len(),
        duration_ms = start.elapsed().as_millis(),
        "Run complete"
    );
    Ok(RunResult {
        raw_csv: args.raw_csv.clone(),
        output_dir,
        raw_rows,
        base_rows: output.base_rows,
        tables,
        events: sink.counts,
        dry_run: args.dry_run,
    })
}

pub fn run_items(config: Option<&Path>) -> Result<()> {
    let options = load_options(config)?;

    let mut table = Table::new();
    table.set_header(vec!["Item", "Title", "Kind"]);
    apply_table_style(&mut table);
    for item in options.items.items() {
        table.add_row(vec![
            item.number.to_string(),
            item.title.clone().unwrap_or_else(|| "-".to_string()),
            item.kind.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!("{table}");

    let mut selectors = Table::new();
    selectors.set_header(vec!["Selector", "Example column", "Axis", "Range"]);
    apply_table_style(&mut selectors);
    let example_item = options.items.numbers().first().copied().unwrap_or(3);
    for selector in ChartSelector::ALL {
        let range = selector
            .value_range()
            .map_or_else(|| "-".to_string(), |(low, high)| format!("{low} .. {high}"));
        selectors.add_row(vec![
            selector.token().to_string(),
            selector.column_name(example_item),
            selector.axis_label().to_string(),
            range,
        ]);
    }
    println!("{selectors}");
    Ok(())
}

pub fn run_summary(args: &SummaryArgs, config: Option<&Path>) -> Result<()> {
    let options = load_options(config)?;
    let selector: ChartSelector = args.selector.parse()?;
    let category_column = args
        .category_column
        .clone()
        .unwrap_or_else(|| options.category_column.clone());

    let df = read_csv_table(&args.table_csv).context("read processed table")?;
    let columns = chart_columns(&df, &options.items, selector);
    if columns.is_empty() {
        bail!(
            "no column for selector {selector} in {}",
            args.table_csv.display()
        );
    }
    for (item, column) in columns {
        let rows = category_summary(&df, &column, &category_column)?;
        let title = match options.items.get(item).and_then(|info| info.title.as_deref()) {
            Some(title) => format!("{column} ({title})"),
            None => column,
        };
        print_category_summary(&title, selector, &rows);
    }
    Ok(())
}

fn default_output_dir(raw_csv: &Path) -> PathBuf {
    raw_csv
        .parent()
        .map_or_else(|| PathBuf::from("output"), |parent| parent.join("output"))
}
