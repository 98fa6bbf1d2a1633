//! Error handling and custom error types
//!
//! Provides unified error handling across the crate using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport failure talking to the vendor. Carries the bare detail text.
    #[error("{0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
