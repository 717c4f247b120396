//! Integration tests for option loading and command-line overrides.

use std::fs;

use ipx_cli::config::{OptionOverrides, apply_overrides, load_options};
use ipx_model::PipelineOptions;

#[test]
fn missing_config_path_uses_defaults() {
    let options = load_options(None).unwrap();
    assert_eq!(options, PipelineOptions::default());
}

#[test]
fn config_file_changes_only_listed_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ipx.toml");
    fs::write(
        &path,
        r#"
outlier_sigma = 2.5
erase_warmup = false

[[items]]
number = 3
title = "Aborto legal"
kind = "Pro"

[[items]]
number = 9
"#,
    )
    .unwrap();

    let options = load_options(Some(&path)).unwrap();
    assert_eq!(options.outlier_sigma, 2.5);
    assert!(!options.erase_warmup);
    assert_eq!(options.items.numbers(), vec![3, 9]);
    assert_eq!(options.warmup_items, 3);
    assert_eq!(options.results_column, "results");
}

#[test]
fn invalid_config_reports_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ipx.toml");
    fs::write(&path, "outlier_sigmaa = 2.0\n").unwrap();

    let error = load_options(Some(&path)).unwrap_err();
    let message = format!("{error:#}");
    assert!(message.contains("parse config file"), "{message}");
    assert!(message.contains("ipx.toml"), "{message}");
}

#[test]
fn unreadable_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let error = load_options(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(format!("{error:#}").contains("read config file"));
}

#[test]
fn overrides_win_over_file_values() {
    let base = PipelineOptions::default().with_outlier_sigma(2.5);
    let overrides = OptionOverrides {
        id_column: Some("participant".to_string()),
        warmup_items: Some(0),
        no_erase_warmup: true,
        outlier_sigma: Some(4.0),
        time_columns: vec!["IP_Item_3_Izq_Tiempo".to_string()],
        ..OptionOverrides::default()
    };

    let options = apply_overrides(base, &overrides);
    assert_eq!(options.id_column, "participant");
    assert_eq!(options.warmup_items, 0);
    assert!(!options.erase_warmup);
    assert_eq!(options.outlier_sigma, 4.0);
    assert_eq!(options.time_columns, vec!["IP_Item_3_Izq_Tiempo"]);
    assert_eq!(options.category_column, "Categoria_PASO_2023");
}

#[test]
fn empty_overrides_keep_options() {
    let base = PipelineOptions::default().with_first_associated(5);
    let options = apply_overrides(base.clone(), &OptionOverrides::default());
    assert_eq!(options, base);
}
