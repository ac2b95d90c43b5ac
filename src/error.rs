use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Failures at the I/O edges of the crate. The derivation functions themselves
/// never return these.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// The API envelope reported `success: false`.
    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}
