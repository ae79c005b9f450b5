//! Error types for Roti Planta.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    /// The AI table service rejected a request or returned an unreadable body.
    #[error("Table service error: {0}")]
    TableService(String),

    /// The document store rejected a query or returned an unreadable body.
    #[error("Document store error: {0}")]
    Store(String),

    #[error("Extraction error: {0}")]
    Extraction(String),
}

pub type Result<T> = std::result::Result<T, Error>;
