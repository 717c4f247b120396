use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid column name '{name}': {reason}")]
    InvalidColumn { name: String, reason: &'static str },
    #[error("unknown chart selector '{0}'")]
    UnknownSelector(String),
    #[error("unknown PASO 2023 category '{0}'")]
    UnknownCategory(String),
    #[error("invalid pipeline options: {0}")]
    InvalidOptions(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;
