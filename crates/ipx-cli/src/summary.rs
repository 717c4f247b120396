use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use ipx_cli::logging::redact_value;
use ipx_model::ChartSelector;
use ipx_transform::{CategorySummary, PooledStats};

use crate::types::{RunResult, TableSummary};

pub fn print_run_summary(result: &RunResult) {
    println!("Input: {}", result.raw_csv.display());
    if result.dry_run {
        println!("Output: dry run, nothing written");
    } else {
        println!("Output: {}", result.output_dir.display());
    }
    println!(
        "Subjects: {} raw rows, {} materialized",
        result.raw_rows, result.base_rows
    );

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Rows"),
        header_cell("Columns"),
        header_cell("Imputed"),
        header_cell("Threshold"),
        header_cell("Dropped"),
        header_cell("CSV"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 5, CellAlignment::Right);
    align_column(&mut table, 6, CellAlignment::Center);
    for summary in &result.tables {
        table.add_row(vec![
            Cell::new(&summary.name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(summary.rows),
            Cell::new(summary.columns),
            count_cell(summary.imputed_cells, Color::Yellow),
            threshold_cell(summary.stats.as_ref()),
            count_cell(summary.dropped.len(), Color::Red),
            written_cell(summary),
        ]);
    }
    println!("{table}");
    print_dropped_rows(result);
    print_event_counts(result);
}

fn print_dropped_rows(result: &RunResult) {
    let dropped: Vec<_> = result
        .tables
        .iter()
        .flat_map(|summary| summary.dropped.iter().map(move |row| (&summary.name, row)))
        .collect();
    if dropped.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Row"),
        header_cell("ID"),
        header_cell("Column"),
        header_cell("Value"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    for (name, row) in dropped {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(row.row),
            row.id
                .as_deref()
                .map_or_else(|| dim_cell("-"), |id| Cell::new(redact_value(id))),
            Cell::new(&row.column),
            Cell::new(format!("{:.3}", row.value)).fg(Color::Red),
        ]);
    }
    println!();
    println!("Dropped rows:");
    println!("{table}");
}

fn print_event_counts(result: &RunResult) {
    if result.events.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Event"), header_cell("Count")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (kind, count) in &result.events {
        table.add_row(vec![Cell::new(kind), Cell::new(count)]);
    }
    println!();
    println!("Events:");
    println!("{table}");
}

/// Per-category statistics of one chart column.
pub fn print_category_summary(title: &str, selector: ChartSelector, rows: &[CategorySummary]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Category"),
        header_cell("N"),
        header_cell("Mean"),
        header_cell("Median"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for row in rows {
        table.add_row(vec![
            Cell::new(row.category.label()),
            Cell::new(row.count),
            value_cell(row.mean),
            value_cell(row.median),
        ]);
    }
    println!("{title} - {}", selector.axis_label());
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(120);
    if table.column_count() >= 7 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Fixed(16)),
            ColumnConstraint::LowerBoundary(Width::Fixed(6)),
            ColumnConstraint::LowerBoundary(Width::Fixed(7)),
            ColumnConstraint::LowerBoundary(Width::Fixed(7)),
            ColumnConstraint::LowerBoundary(Width::Fixed(9)),
            ColumnConstraint::LowerBoundary(Width::Fixed(7)),
            ColumnConstraint::UpperBoundary(Width::Percentage(40)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn written_cell(summary: &TableSummary) -> Cell {
    match &summary.path {
        Some(path) => Cell::new(path.display()).fg(Color::Green),
        None => dim_cell("-"),
    }
}

fn threshold_cell(stats: Option<&PooledStats>) -> Cell {
    match stats {
        Some(stats) => Cell::new(format!("{:.3}", stats.threshold)),
        None => dim_cell("-"),
    }
}

fn value_cell(value: Option<f64>) -> Cell {
    match value {
        Some(value) => Cell::new(format!("{value:.3}")),
        None => dim_cell("-"),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
