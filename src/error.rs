use thiserror::Error;

/// Why a single source produced nothing. Never surfaced past the aggregator.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid base url `{0}`")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("upstream returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("no playable titles")]
    Empty,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("timeout must be at least one second")]
    ZeroTimeout,

    #[error("source #{0} has an empty name")]
    EmptySourceName(usize),

    #[error("source `{name}` has an invalid base url `{base_url}`")]
    InvalidBaseUrl { name: String, base_url: String },
}
