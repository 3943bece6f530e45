//! Error handling for Folio
//!
//! Defines custom error types and establishes a unified Result type
//! using anyhow for context chaining and error propagation.

use thiserror::Error;

/// Core error types for the portfolio pipeline
#[derive(Error, Debug)]
pub enum FolioError {
    #[error("holdings source error: {0}")]
    HoldingsSource(String),

    #[error("quote error: {0}")]
    Quote(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("delivery error: {0}")]
    Delivery(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pipeline operations
pub type Result<T> = anyhow::Result<T>;
