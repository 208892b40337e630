//! Setup errors
//!
//! Anything that stops a run before the first transaction starts.

use std::path::PathBuf;

use netpush_core::CoreError;
use netpush_exec::SessionError;
use netpush_inventory::{InventoryError, SeedError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("failed to read config file {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    ParseConfig {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Seed(#[from] SeedError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("none of the {seeded} seed hostnames resolved to a device")]
    NoDevices { seeded: usize },

    #[error("cannot prepare NETCONF sessions: {0}")]
    Session(#[from] SessionError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("failed to write report {path}: {message}")]
    Report { path: PathBuf, message: String },
}
