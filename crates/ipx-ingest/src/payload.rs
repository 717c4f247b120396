//! Per-subject survey payload.
//!
//! A payload is one JSON object exported by the survey platform:
//!
//! ```json
//! {"subject": "s-01", "results": [{...}, {"fase_3": {"IP": {...}, "IP_modificada": {...}}}]}
//! ```
//!
//! Navigation into the stimulus blocks is a chain of fallible lookups, each
//! failing with its own [`PayloadError`] variant.

use polars::prelude::AnyValue;
use serde_json::{Map, Value};
use thiserror::Error;

/// Phase entry of `results` holding the priming blocks.
const PHASE_INDEX: usize = 1;
const STAGE_KEY: &str = "fase_3";

/// Stimulus block inside `fase_3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StimulusBlock {
    /// `IP`: items shown without a candidate.
    Plain,
    /// `IP_modificada`: items shown next to a candidate.
    Associated,
}

impl StimulusBlock {
    pub fn key(self) -> &'static str {
        match self {
            StimulusBlock::Plain => "IP",
            StimulusBlock::Associated => "IP_modificada",
        }
    }
}

/// Why a payload cell could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("cell is null")]
    Null,
    #[error("cell is not text")]
    NotText,
    #[error("invalid JSON: {0}")]
    Decode(String),
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("payload has no results array")]
    MissingResults,
    #[error("results has no entry {0}")]
    MissingPhase(usize),
    #[error("results entry has no fase_3 object")]
    MissingStage,
    #[error("fase_3 has no {0} object")]
    MissingBlock(&'static str),
}

/// A payload problem tied to the source row it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    pub row: usize,
    pub error: PayloadError,
}

/// Decoded per-subject payload. Object key order is preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectPayload {
    root: Map<String, Value>,
}

impl SubjectPayload {
    pub fn parse(raw: &str) -> Result<Self, PayloadError> {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(root)) => Ok(Self { root }),
            Ok(_) => Err(PayloadError::NotAnObject),
            Err(err) => Err(PayloadError::Decode(err.to_string())),
        }
    }

    /// Decode a table cell; only non-null text cells carry a payload.
    pub fn from_cell(cell: AnyValue<'_>) -> Result<Self, PayloadError> {
        match cell {
            AnyValue::Null => Err(PayloadError::Null),
            AnyValue::String(raw) => Self::parse(raw),
            AnyValue::StringOwned(raw) => Self::parse(&raw),
            _ => Err(PayloadError::NotText),
        }
    }

    /// The `subject` value, `Value::Null` when absent.
    pub fn subject(&self) -> &Value {
        self.root.get("subject").unwrap_or(&Value::Null)
    }

    /// Elements of `results`; empty when absent or not an array.
    pub fn results(&self) -> &[Value] {
        match self.root.get("results") {
            Some(Value::Array(entries)) => entries,
            _ => &[],
        }
    }

    /// `results[1].fase_3.<block>`.
    pub fn stimulus_block(&self, block: StimulusBlock) -> Result<&Map<String, Value>, PayloadError> {
        let results = match self.root.get("results") {
            Some(Value::Array(entries)) => entries,
            _ => return Err(PayloadError::MissingResults),
        };
        let phase = results
            .get(PHASE_INDEX)
            .ok_or(PayloadError::MissingPhase(PHASE_INDEX))?;
        let stage = phase
            .get(STAGE_KEY)
            .and_then(Value::as_object)
            .ok_or(PayloadError::MissingStage)?;
        stage
            .get(block.key())
            .and_then(Value::as_object)
            .ok_or(PayloadError::MissingBlock(block.key()))
    }
}
