//! Error types for netpush-inventory

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while talking to the controller
#[derive(Error, Debug)]
pub enum InventoryError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Controller returned an error status
    #[error("controller API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Response did not match the expected shape
    #[error("unexpected {context} response: {message}")]
    Schema {
        /// Which call produced the response
        context: String,
        /// Decoder message
        message: String,
    },

    /// Token exchange failed
    #[error("controller authentication failed: {0}")]
    Auth(String),

    /// Invalid URL
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl InventoryError {
    /// Schema errors mean the controller API is not the one we speak
    #[must_use]
    pub fn is_schema(&self) -> bool {
        matches!(self, InventoryError::Schema { .. })
    }
}

/// Errors loading the seed hostname list
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("seed file not found: {0}")]
    NotFound(PathBuf),

    #[error("seed file {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("seed file {path} has no {column} column")]
    MissingColumn { path: PathBuf, column: String },

    #[error("no valid hostnames found in seed file {0}")]
    Empty(PathBuf),

    #[error("I/O error reading seed file: {0}")]
    Io(#[from] std::io::Error),
}
