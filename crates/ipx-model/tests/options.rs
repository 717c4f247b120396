//! Tests for pipeline options loading.

use ipx_model::{ItemInfo, ModelError, PipelineOptions};

#[test]
fn empty_config_uses_defaults() {
    let options = PipelineOptions::from_toml_str("").unwrap();
    assert_eq!(options, PipelineOptions::default());
    assert_eq!(options.results_column, "results");
    assert_eq!(options.category_column, "Categoria_PASO_2023");
    assert_eq!(options.warmup_items, 3);
    assert!((options.outlier_sigma - 3.0).abs() < f64::EPSILON);
    assert_eq!(options.items.len(), 20);
}

#[test]
fn partial_config_overrides_only_named_keys() {
    let options = PipelineOptions::from_toml_str(
        r#"
outlier_sigma = 2.5
erase_warmup = false
time_columns = ["IP_Item_3_Izq_Tiempo", "IP_Item_3_Der_Tiempo"]

[[items]]
number = 3
title = "Aborto legal"
kind = "Pro"

[[items]]
number = 4
"#,
    )
    .unwrap();

    assert!((options.outlier_sigma - 2.5).abs() < f64::EPSILON);
    assert!(!options.erase_warmup);
    assert_eq!(options.time_columns.len(), 2);
    assert_eq!(options.id_column, "ID");
    assert_eq!(options.items.numbers(), vec![3, 4]);
    assert_eq!(
        options.items.get(3),
        Some(&ItemInfo {
            number: 3,
            title: Some("Aborto legal".to_string()),
            kind: Some("Pro".to_string()),
        })
    );
    assert_eq!(options.items.get(4).and_then(|item| item.title.clone()), None);
}

#[test]
fn unknown_keys_are_rejected() {
    let error = PipelineOptions::from_toml_str("outlier_sigmas = 2").unwrap_err();
    assert!(matches!(error, ModelError::InvalidOptions(_)));
}

#[test]
fn options_serialize_to_json() {
    let options = PipelineOptions::default().with_outlier_sigma(2.0);
    let json = serde_json::to_value(&options).unwrap();
    assert_eq!(json["outlier_sigma"], 2.0);
    assert_eq!(json["items"][0]["number"], 3);
}
