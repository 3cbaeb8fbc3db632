//! Error types for the load tester

use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown content mode: {0}")]
    UnknownMode(String),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Load test errors
#[derive(Debug, Error)]
pub enum LoadTestError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Print(#[from] crab_printer::PrintError),

    /// The run task panicked or was aborted
    #[error("Run task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type LoadTestResult<T> = Result<T, LoadTestError>;
