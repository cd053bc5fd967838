//! Error types for cashflow

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Date out of range: {0}")]
    DateOutOfRange(String),

    #[error("Computation error: {0}")]
    Computation(String),

    /// A boundary or reducer failure, annotated where traversal caught it
    #[error("Aggregation '{group}' failed on {date} at observation {index}: {source}")]
    Traversal {
        group: String,
        date: String,
        index: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// True for errors that should have been caught before traversal began
    pub fn is_config(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::Traversal { source, .. } => source.is_config(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
