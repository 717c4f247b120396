//! CLI library components for the implicit-priming survey pipeline.

pub mod config;
pub mod logging;
