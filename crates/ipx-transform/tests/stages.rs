//! Integration tests for the individual table stages.

use polars::prelude::{AnyValue, Column, DataFrame, IntoColumn, NamedFrom, Series};
use proptest::prelude::*;

use ipx_ingest::{any_to_f64, any_to_string, any_to_tokens, list_series};
use ipx_model::{
    ASSOCIATED_ORDER_COLUMN, ChartSelector, Field, FIRST_ASSOCIATED_COLUMN, ItemCatalog,
    PasoCategory, Side,
};
use ipx_transform::{
    PipelineEvent, add_first_associated_column, category_summary, chart_columns,
    default_time_columns, derive_shift_metrics, erase_warmup_items, filter_outliers,
    impute_paired_columns, truncate, warmup_items,
};

fn test_df(columns: Vec<(&str, Vec<&str>)>) -> DataFrame {
    let cols: Vec<Column> = columns
        .into_iter()
        .map(|(name, values)| {
            Series::new(
                name.into(),
                values.iter().copied().map(String::from).collect::<Vec<_>>(),
            )
            .into_column()
        })
        .collect();
    DataFrame::new(cols).unwrap()
}

fn with_f64(mut df: DataFrame, name: &str, values: Vec<Option<f64>>) -> DataFrame {
    df.with_column(Series::new(name.into(), values)).unwrap();
    df
}

fn f64_at(df: &DataFrame, column: &str, row: usize) -> Option<f64> {
    any_to_f64(df.column(column).unwrap().get(row).unwrap())
}

fn order_column(rows: &[&[&str]]) -> Series {
    let lists = rows
        .iter()
        .map(|tokens| Series::new("".into(), tokens.to_vec()))
        .collect();
    list_series(
        ASSOCIATED_ORDER_COLUMN,
        lists,
        polars::prelude::DataType::String,
    )
    .unwrap()
}

// ============================================================================
// Imputation
// ============================================================================

fn imputation_table() -> DataFrame {
    let df = test_df(vec![
        ("ID", vec!["r1", "r2", "r3", "r4", "r5"]),
        ("Categoria_PASO_2023", vec!["X", "X", "X", "X", "Y"]),
    ]);
    let df = with_f64(
        df,
        "IP_Item_5_Izq_Respuesta",
        vec![Some(5.0), Some(f64::NAN), Some(3.0), None, Some(2.0)],
    );
    with_f64(
        df,
        "IP_Item_5_Der_Respuesta",
        vec![None, Some(7.0), Some(5.0), None, None],
    )
}

#[test]
fn imputation_fills_exactly_one_missing_side() {
    let mut events: Vec<PipelineEvent> = Vec::new();
    let (df, report) =
        impute_paired_columns(imputation_table(), "Categoria_PASO_2023", &mut events).unwrap();

    // r1 (5, NaN) -> (5, 6) and r2 (NaN, 7) -> (4, 7)
    assert_eq!(f64_at(&df, "IP_Item_5_Izq_Respuesta", 0), Some(5.0));
    assert_eq!(f64_at(&df, "IP_Item_5_Der_Respuesta", 0), Some(6.0));
    assert_eq!(f64_at(&df, "IP_Item_5_Izq_Respuesta", 1), Some(4.0));
    assert_eq!(f64_at(&df, "IP_Item_5_Der_Respuesta", 1), Some(7.0));

    // both present / both missing rows are untouched
    assert_eq!(f64_at(&df, "IP_Item_5_Izq_Respuesta", 2), Some(3.0));
    assert_eq!(f64_at(&df, "IP_Item_5_Der_Respuesta", 2), Some(5.0));
    assert_eq!(f64_at(&df, "IP_Item_5_Izq_Respuesta", 3), None);
    assert_eq!(f64_at(&df, "IP_Item_5_Der_Respuesta", 3), None);

    // category Y has no Der values, so no median to fill with
    assert_eq!(f64_at(&df, "IP_Item_5_Der_Respuesta", 4), None);

    assert_eq!(report.total, 2);
    assert_eq!(report.count_for(5, Field::Respuesta, Side::Der), 1);
    assert_eq!(report.count_for(5, Field::Respuesta, Side::Izq), 1);
    assert_eq!(
        events
            .iter()
            .filter(|event| event.kind() == "pair_imputed")
            .count(),
        2
    );
}

#[test]
fn imputation_is_idempotent() {
    let mut events: Vec<PipelineEvent> = Vec::new();
    let (once, first) =
        impute_paired_columns(imputation_table(), "Categoria_PASO_2023", &mut events).unwrap();
    let (twice, second) =
        impute_paired_columns(once.clone(), "Categoria_PASO_2023", &mut events).unwrap();

    assert_eq!(first.total, 2);
    assert_eq!(second.total, 0);
    assert!(once.equals_missing(&twice));
}

#[test]
fn imputation_needs_both_sides_and_category() {
    let df = with_f64(
        test_df(vec![("Categoria_PASO_2023", vec!["X", "X"])]),
        "IP_Item_9_Izq_Tiempo",
        vec![Some(1.0), None],
    );
    let mut events: Vec<PipelineEvent> = Vec::new();
    let (out, report) = impute_paired_columns(df, "Categoria_PASO_2023", &mut events).unwrap();
    assert_eq!(report.total, 0);
    assert!(report.fills.is_empty());
    assert_eq!(f64_at(&out, "IP_Item_9_Izq_Tiempo", 1), None);

    let (_, report) = impute_paired_columns(out, "Categoria", &mut events).unwrap();
    assert_eq!(report.total, 0);
    assert_eq!(events.last().map(PipelineEvent::kind), Some("missing_column"));
}

// ============================================================================
// Outliers
// ============================================================================

#[test]
fn pooled_value_below_threshold_survives() {
    let df = with_f64(
        test_df(vec![("ID", vec!["a", "b"])]),
        "IP_Item_3_Izq_Tiempo",
        vec![Some(1.0), Some(3.0)],
    );
    let df = with_f64(df, "IP_Item_3_Der_Tiempo", vec![Some(2.0), Some(100.0)]);

    let candidates = default_time_columns(&df);
    let mut events: Vec<PipelineEvent> = Vec::new();
    let (out, report) = filter_outliers(df, &candidates, 3.0, "ID", &mut events).unwrap();

    let stats = report.stats.unwrap();
    assert!((stats.mean - 26.5).abs() < 1e-9);
    assert!((stats.std_dev - 42.44).abs() < 0.01);
    assert!((stats.threshold - 154.0).abs() < 0.5);
    assert_eq!(out.height(), 2);
    assert!(report.dropped.is_empty());
}

#[test]
fn value_above_threshold_drops_its_row() {
    let mut izq = vec![Some(1.0); 10];
    let mut der = vec![Some(1.0); 10];
    izq[4] = Some(100.0);
    der[7] = Some(50.0);
    let ids: Vec<String> = (0..10).map(|i| format!("s{i}")).collect();
    let df = DataFrame::new(vec![
        Series::new("ID".into(), ids).into_column(),
        Series::new("IP_Item_3_Izq_Tiempo".into(), izq).into_column(),
        Series::new("IP_Item_3_Der_Tiempo".into(), der).into_column(),
    ])
    .unwrap();

    let candidates = default_time_columns(&df);
    let mut events: Vec<PipelineEvent> = Vec::new();
    let (out, report) = filter_outliers(df, &candidates, 3.0, "ID", &mut events).unwrap();

    // mean 8.4, sigma ~23.57, threshold ~79.1
    assert_eq!(out.height(), 9);
    assert_eq!(report.dropped.len(), 1);
    assert_eq!(report.dropped[0].row, 4);
    assert_eq!(report.dropped[0].id.as_deref(), Some("s4"));
    assert_eq!(report.dropped[0].column, "IP_Item_3_Izq_Tiempo");
    assert_eq!(f64_at(&out, "IP_Item_3_Der_Tiempo", 6), Some(50.0));

    let surviving: Vec<String> = (0..out.height())
        .map(|row| any_to_string(out.column("ID").unwrap().get(row).unwrap()))
        .collect();
    assert_eq!(
        surviving,
        vec!["s0", "s1", "s2", "s3", "s5", "s6", "s7", "s8", "s9"]
    );
}

#[test]
fn value_equal_to_threshold_is_kept() {
    let mut times = vec![Some(1.0); 10];
    times[9] = Some(1000.0);
    let df = with_f64(
        test_df(vec![("ID", vec!["a"; 10])]),
        "IP_Item_3_Izq_Tiempo",
        times,
    );

    let candidates = default_time_columns(&df);
    let mut events: Vec<PipelineEvent> = Vec::new();
    let (out, report) = filter_outliers(df, &candidates, 3.0, "ID", &mut events).unwrap();

    // mean 100.9, sigma 299.7
    let stats = report.stats.unwrap();
    assert!((stats.threshold - 1000.0).abs() < 1e-9);
    assert_eq!(out.height(), 10);
    assert!(report.dropped.is_empty());
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, PipelineEvent::RowDropped { .. }))
    );
}

#[test]
fn value_far_below_the_mean_survives() {
    let mut times = vec![Some(50.0); 20];
    times[3] = Some(0.0);
    let df = with_f64(
        test_df(vec![("ID", vec!["a"; 20])]),
        "IP_Item_3_Der_Tiempo",
        times,
    );

    let candidates = default_time_columns(&df);
    let mut events: Vec<PipelineEvent> = Vec::new();
    let (out, report) = filter_outliers(df, &candidates, 3.0, "ID", &mut events).unwrap();

    // mean 47.5, sigma ~10.9, so 0.0 sits far below mean - 3 sigma
    let stats = report.stats.unwrap();
    assert!(stats.mean - 3.0 * stats.std_dev > 0.0);
    assert_eq!(out.height(), 20);
    assert_eq!(f64_at(&out, "IP_Item_3_Der_Tiempo", 3), Some(0.0));
    assert!(report.dropped.is_empty());
}

#[test]
fn empty_candidate_list_returns_the_table_unchanged() {
    let df = with_f64(
        test_df(vec![("ID", vec!["a", "b", "c", "d"])]),
        "IP_Item_3_Izq_Tiempo",
        vec![Some(1.0), Some(1.0), Some(1.0), Some(5000.0)],
    );

    let mut events: Vec<PipelineEvent> = Vec::new();
    let (out, report) = filter_outliers(df.clone(), &[], 3.0, "ID", &mut events).unwrap();

    assert!(out.equals_missing(&df));
    assert!(report.columns.is_empty());
    assert!(report.stats.is_none());
    assert_eq!(events, vec![PipelineEvent::NoTimeColumns { candidates: 0 }]);
}

#[test]
fn explicit_candidates_restrict_the_population() {
    let df = with_f64(
        test_df(vec![("ID", vec!["a", "b"])]),
        "IP_Item_3_Izq_Tiempo",
        vec![Some(1.0), Some(2.0)],
    );
    let mut events: Vec<PipelineEvent> = Vec::new();
    let candidates = vec!["IP_Item_4_Izq_Tiempo".to_string()];
    let (out, report) = filter_outliers(df, &candidates, 3.0, "ID", &mut events).unwrap();
    assert_eq!(out.height(), 2);
    assert!(report.stats.is_none());
    assert_eq!(events[0], PipelineEvent::NoTimeColumns { candidates: 1 });

    let df = test_df(vec![("IP_Item_3_Izq_Tiempo", vec!["n/a", ""])]);
    let candidates = default_time_columns(&df);
    let (out, report) = filter_outliers(df, &candidates, 3.0, "ID", &mut events).unwrap();
    assert_eq!(out.height(), 2);
    assert!(report.stats.is_none());
    assert_eq!(events[1], PipelineEvent::NoNumericTimeValues { columns: 1 });
}

// ============================================================================
// Truncation and erasure
// ============================================================================

#[test]
fn first_associated_items_are_a_prefix() {
    let mut df = test_df(vec![("ID", vec!["a", "b"])]);
    df.with_column(order_column(&[&["5_Izq", "5_Der", "9_Izq", "3_Der"], &["8_Der"]]))
        .unwrap();

    let mut events: Vec<PipelineEvent> = Vec::new();
    let out = add_first_associated_column(df, 3, &mut events).unwrap();
    let first = |row| any_to_tokens(out.column(FIRST_ASSOCIATED_COLUMN).unwrap().get(row).unwrap());
    assert_eq!(
        first(0),
        Some(vec!["5_Izq".to_string(), "5_Der".to_string(), "9_Izq".to_string()])
    );
    assert_eq!(first(1), Some(vec!["8_Der".to_string()]));
}

#[test]
fn text_order_cells_are_copied_unchanged() {
    let df = test_df(vec![
        ("ID", vec!["a", "b", "c"]),
        (
            ASSOCIATED_ORDER_COLUMN,
            vec!["5_Izq, 9_Der, 3_Izq, 7_Der", "8_Der", ""],
        ),
    ]);

    let mut events: Vec<PipelineEvent> = Vec::new();
    let out = add_first_associated_column(df, 3, &mut events).unwrap();

    let first = out.column(FIRST_ASSOCIATED_COLUMN).unwrap();
    assert_eq!(first.dtype(), &polars::prelude::DataType::String);
    for row in 0..3 {
        assert_eq!(
            any_to_string(first.get(row).unwrap()),
            any_to_string(out.column(ASSOCIATED_ORDER_COLUMN).unwrap().get(row).unwrap())
        );
    }
    assert_eq!(
        any_to_string(first.get(0).unwrap()),
        "5_Izq, 9_Der, 3_Izq, 7_Der"
    );
    assert!(events.is_empty());
}

#[test]
fn eraser_nulls_sided_cells_of_warmup_items() {
    let mut df = test_df(vec![
        ("ID", vec!["a", "b"]),
        ("IP_Item_5_Izq_Candidato", vec!["M", "M"]),
    ]);
    df.with_column(order_column(&[&["5_Izq", "5_Der", "9_Izq", "3_Der", "8_Izq"], &[]]))
        .unwrap();
    for name in [
        "IP_Item_5_Izq_Respuesta",
        "IP_Item_5_Der_Respuesta",
        "IP_Item_9_Der_Tiempo",
        "IP_Item_8_Izq_Respuesta",
        "IP_Item_5_Respuesta",
    ] {
        df = with_f64(df, name, vec![Some(1.0), Some(2.0)]);
    }

    let mut events: Vec<PipelineEvent> = Vec::new();
    let out = erase_warmup_items(&df, 3, "ID", &mut events).unwrap();

    for name in [
        "IP_Item_5_Izq_Respuesta",
        "IP_Item_5_Der_Respuesta",
        "IP_Item_9_Der_Tiempo",
    ] {
        assert_eq!(f64_at(&out, name, 0), None, "{name}");
        assert_eq!(f64_at(&out, name, 1), Some(2.0), "{name}");
    }
    assert_eq!(
        out.column("IP_Item_5_Izq_Candidato").unwrap().get(0).unwrap(),
        AnyValue::Null
    );
    // item 8 is the fourth distinct item; baselines are never erased
    assert_eq!(f64_at(&out, "IP_Item_8_Izq_Respuesta", 0), Some(1.0));
    assert_eq!(f64_at(&out, "IP_Item_5_Respuesta", 0), Some(1.0));
    // the input table is left untouched
    assert_eq!(f64_at(&df, "IP_Item_5_Izq_Respuesta", 0), Some(1.0));
    assert_eq!(out.get_column_names(), df.get_column_names());

    assert_eq!(
        events,
        vec![PipelineEvent::CellsErased {
            row: 0,
            subject: Some("a".to_string()),
            items: vec![5, 9, 3],
            cells: 4,
        }]
    );
}

#[test]
fn eraser_accepts_text_order_cells() {
    let df = with_f64(
        test_df(vec![("Orden_IP_Items_Asociados", vec!["4_Der, 4_Izq", ""])]),
        "IP_Item_4_Der_Tiempo",
        vec![Some(3.0), Some(3.0)],
    );
    let mut events: Vec<PipelineEvent> = Vec::new();
    let out = erase_warmup_items(&df, 3, "ID", &mut events).unwrap();
    assert_eq!(f64_at(&out, "IP_Item_4_Der_Tiempo", 0), None);
    assert_eq!(f64_at(&out, "IP_Item_4_Der_Tiempo", 1), Some(3.0));
}

// ============================================================================
// Shift metrics and summaries
// ============================================================================

#[test]
fn shift_metrics_need_baseline_and_both_sides() {
    let df = test_df(vec![("ID", vec!["a", "b"])]);
    let df = with_f64(df, "IP_Item_3_Respuesta", vec![Some(2.0), None]);
    let df = with_f64(df, "IP_Item_3_Izq_Respuesta", vec![Some(4.0), Some(1.0)]);
    let df = with_f64(df, "IP_Item_3_Der_Respuesta", vec![Some(1.0), Some(5.0)]);
    let df = with_f64(df, "IP_Item_3_Izq_Tiempo", vec![Some(1.0), Some(1.0)]);
    let df = with_f64(df, "IP_Item_3_Der_Tiempo", vec![Some(1.0), Some(1.0)]);

    let tables = [("full".to_string(), df)].into_iter().collect();
    let mut events: Vec<PipelineEvent> = Vec::new();
    let tables = derive_shift_metrics(tables, &ItemCatalog::from_numbers([3]), &mut events).unwrap();
    let out = &tables["full"];

    assert_eq!(f64_at(out, "CO_Item_3_Izq", 0), Some(2.0));
    assert_eq!(f64_at(out, "CO_Item_3_Der", 0), Some(-1.0));
    assert_eq!(f64_at(out, "CO_Item_3_Der", 1), None);
    assert!(out.column("CT_Item_3_Izq").is_err());
    assert_eq!(
        events,
        vec![PipelineEvent::ShiftSkipped {
            table: "full".to_string(),
            item: 3,
            kind: ipx_model::ShiftKind::Time,
            missing: vec!["IP_Item_3_Tiempo".to_string()],
        }]
    );
}

#[test]
fn category_summary_uses_display_categories() {
    let df = test_df(vec![(
        "Categoria_PASO_2023",
        vec!["Centre", "Centre", "Centre", "No apply", "Left_Wing"],
    )]);
    let df = with_f64(
        df,
        "CO_Item_3_Izq",
        vec![Some(1.0), Some(2.0), Some(6.0), Some(50.0), None],
    );

    let summary = category_summary(&df, "CO_Item_3_Izq", "Categoria_PASO_2023").unwrap();
    let categories: Vec<PasoCategory> = summary.iter().map(|row| row.category).collect();
    assert_eq!(categories, PasoCategory::DISPLAY_ORDER.to_vec());

    let centre = &summary[2];
    assert_eq!(centre.count, 3);
    assert_eq!(centre.mean, Some(3.0));
    assert_eq!(centre.median, Some(2.0));
    let left = &summary[0];
    assert_eq!(left.count, 0);
    assert_eq!(left.mean, None);
}

#[test]
fn category_summary_skips_sentinel_and_unknown_values() {
    let df = test_df(vec![(
        "Categoria_PASO_2023",
        vec![" Centre ", "No response", "Other", "centre", "Blank", "Centre"],
    )]);
    let df = with_f64(
        df,
        "CO_Item_3_Der",
        vec![Some(4.0), Some(90.0), Some(90.0), Some(90.0), Some(90.0), Some(8.0)],
    );

    let summary = category_summary(&df, "CO_Item_3_Der", "Categoria_PASO_2023").unwrap();
    let total: usize = summary.iter().map(|row| row.count).sum();
    assert_eq!(total, 2);
    let centre = &summary[2];
    assert_eq!(centre.category, PasoCategory::Centre);
    assert_eq!(centre.mean, Some(6.0));
}

#[test]
fn chart_columns_follow_catalog_order() {
    let df = with_f64(
        test_df(vec![("ID", vec!["a"])]),
        "IP_Item_9_Der_Tiempo",
        vec![Some(1.0)],
    );
    let df = with_f64(df, "IP_Item_4_Der_Tiempo", vec![Some(1.0)]);
    let catalog = ItemCatalog::from_numbers([4, 7, 9]);
    assert_eq!(
        chart_columns(&df, &catalog, ChartSelector::IpDerTiempo),
        vec![
            (4, "IP_Item_4_Der_Tiempo".to_string()),
            (9, "IP_Item_9_Der_Tiempo".to_string())
        ]
    );
    assert!(chart_columns(&df, &catalog, ChartSelector::CtProDer).is_empty());
}

proptest! {
    #[test]
    fn truncation_is_a_bounded_prefix(list in prop::collection::vec(0i64..50, 0..12), n in 0usize..15) {
        let prefix = truncate(&list, n);
        prop_assert_eq!(prefix.len(), list.len().min(n));
        prop_assert_eq!(&list[..prefix.len()], prefix.as_slice());
    }

    #[test]
    fn warmup_items_are_distinct_and_bounded(
        items in prop::collection::vec((1u32..12, prop::bool::ANY), 0..20),
        count in 0usize..5,
    ) {
        let tokens: Vec<String> = items
            .iter()
            .map(|(item, left)| format!("{item}_{}", if *left { "Izq" } else { "Der" }))
            .collect();
        let warmup = warmup_items(&tokens, count);
        prop_assert!(warmup.len() <= count);
        let mut seen = Vec::new();
        for item in &items {
            if seen.len() == count {
                break;
            }
            if !seen.contains(&item.0) {
                seen.push(item.0);
            }
        }
        prop_assert_eq!(warmup, seen);
    }
}
