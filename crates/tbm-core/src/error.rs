//! Error types for tbm-core

use thiserror::Error;

/// Main error type for tbm-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for tbm-core
pub type Result<T> = std::result::Result<T, Error>;
