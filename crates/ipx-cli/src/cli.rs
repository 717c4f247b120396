//! CLI argument definitions for the survey pipeline.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use ipx_cli::config::OptionOverrides;

#[derive(Parser)]
#[command(
    name = "ipx",
    version,
    about = "Implicit-priming survey pipeline - Turn raw survey exports into analysis tables",
    long_about = "Turn the raw implicit-priming survey export into analysis tables.\n\n\
                  Extracts the stimulus presentation order, flattens each subject's JSON\n\
                  payload, erases warm-up items, imputes single missing sides, drops\n\
                  response-time outliers and derives change-of-opinion/time metrics."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow subject identifiers in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// TOML file with pipeline options.
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Process a raw survey export and write the output tables.
    Run(RunArgs),

    /// List the item catalog and chart column selectors.
    Items,

    /// Print per-category statistics of a processed table.
    Summary(SummaryArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Raw survey export (CSV with a JSON results column).
    #[arg(value_name = "RAW_CSV")]
    pub raw_csv: PathBuf,

    /// Output directory for the tables (default: <RAW_CSV folder>/output).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Run the pipeline and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    #[command(flatten)]
    pub overrides: OptionOverrides,
}

#[derive(Parser)]
pub struct SummaryArgs {
    /// Processed table written by `ipx run`.
    #[arg(value_name = "TABLE_CSV")]
    pub table_csv: PathBuf,

    /// Chart column selector (see `ipx items`).
    #[arg(long = "selector", value_name = "TOKEN", default_value = "IP_Respuesta")]
    pub selector: String,

    /// Ideological category column.
    #[arg(long = "category-column", value_name = "COLUMN")]
    pub category_column: Option<String>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
