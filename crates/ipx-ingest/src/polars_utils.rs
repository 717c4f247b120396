//! Polars AnyValue utility functions.
//!
//! Cell conversions shared by the ingestion and transform stages. Numeric
//! coercion is lenient: anything that does not read as a finite number is
//! `None`, which is how the stages treat missing data.

use polars::prelude::*;

/// Separator used when a list cell is stored as text.
pub const LIST_SEPARATOR: &str = ", ";

/// Converts a Polars AnyValue to a String representation.
/// Returns empty string for Null, formats floats without trailing zeros.
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => b.to_string(),
        AnyValue::List(series) => list_tokens(&series).join(LIST_SEPARATOR),
        other => other.to_string(),
    }
}

/// Converts AnyValue to String, returning None if the result is empty.
pub fn any_to_string_non_empty(value: AnyValue<'_>) -> Option<String> {
    let s = any_to_string(value);
    if s.trim().is_empty() { None } else { Some(s) }
}

/// Formats a floating-point number as a string without trailing zeros.
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if !s.contains('.') {
        return s;
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Converts an AnyValue to f64, returning None for non-numeric, NaN, or null values.
pub fn any_to_f64(value: AnyValue<'_>) -> Option<f64> {
    let number = match value {
        AnyValue::Null => None,
        AnyValue::Int8(v) => Some(f64::from(v)),
        AnyValue::Int16(v) => Some(f64::from(v)),
        AnyValue::Int32(v) => Some(f64::from(v)),
        AnyValue::Int64(v) => Some(v as f64),
        AnyValue::UInt8(v) => Some(f64::from(v)),
        AnyValue::UInt16(v) => Some(f64::from(v)),
        AnyValue::UInt32(v) => Some(f64::from(v)),
        AnyValue::UInt64(v) => Some(v as f64),
        AnyValue::Float32(v) => Some(f64::from(v)),
        AnyValue::Float64(v) => Some(v),
        AnyValue::String(s) => parse_f64(s),
        AnyValue::StringOwned(s) => parse_f64(&s),
        _ => None,
    };
    number.filter(|v| !v.is_nan())
}

/// Reads a list-like cell as text tokens.
///
/// List cells yield their elements; text cells are split on `", "` the way
/// list columns are written to CSV. Null and other scalars yield `None`.
pub fn any_to_tokens(value: AnyValue<'_>) -> Option<Vec<String>> {
    match value {
        AnyValue::List(series) => Some(list_tokens(&series)),
        AnyValue::String(s) => Some(split_tokens(s)),
        AnyValue::StringOwned(s) => Some(split_tokens(&s)),
        _ => None,
    }
}

fn list_tokens(series: &Series) -> Vec<String> {
    (0..series.len())
        .filter_map(|idx| series.get(idx).ok())
        .map(any_to_string)
        .collect()
}

fn split_tokens(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed
        .split(LIST_SEPARATOR)
        .map(|token| token.trim().to_string())
        .collect()
}

/// Parses a string as f64, returning None for invalid or empty strings.
pub fn parse_f64(value: &str) -> Option<f64> {
    if value.trim().is_empty() {
        return None;
    }
    value.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_and_text_coerce_to_none() {
        assert_eq!(any_to_f64(AnyValue::Float64(f64::NAN)), None);
        assert_eq!(any_to_f64(AnyValue::String("abc")), None);
        assert_eq!(any_to_f64(AnyValue::String(" 4.5 ")), Some(4.5));
        assert_eq!(any_to_f64(AnyValue::Int64(3)), Some(3.0));
    }

    #[test]
    fn numeric_formatting_keeps_integers() {
        assert_eq!(format_numeric(3.0), "3");
        assert_eq!(format_numeric(2.50), "2.5");
        assert_eq!(format_numeric(100.0), "100");
        assert_eq!(format_numeric(1e21), "1000000000000000000000");
    }

    #[test]
    fn tokens_from_list_and_text_cells() {
        let inner = Series::new("".into(), ["5_Izq", "9_Der"]);
        assert_eq!(
            any_to_tokens(AnyValue::List(inner)),
            Some(vec!["5_Izq".to_string(), "9_Der".to_string()])
        );
        assert_eq!(
            any_to_tokens(AnyValue::String("5_Izq, 9_Der")),
            Some(vec!["5_Izq".to_string(), "9_Der".to_string()])
        );
        assert_eq!(any_to_tokens(AnyValue::String("")), Some(Vec::new()));
        assert_eq!(any_to_tokens(AnyValue::Null), None);
    }
}
