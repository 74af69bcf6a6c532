//! Error taxonomy for catalogue generation.
//!
//! Every fatal condition is raised before the first record is written, except
//! for I/O failures on the catalogue sink itself.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while configuring or running catalogue generation
#[derive(Error, Debug)]
pub enum CatalogueError {
    /// Missing or malformed configuration value, including bad redshift bounds
    #[error("Invalid configuration: {0}")]
    ConfigValidation(String),
    /// Map container missing, unreadable, or with inconsistent fields
    #[error("Map load error: {0}")]
    MapLoad(String),
    /// Catalogue destination could not be created or truncated
    #[error("Cannot open catalogue file {}: {source}", .path.display())]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// I/O failure while streaming rows to an already open catalogue
    #[error("Catalogue write failed: {0}")]
    OutputWrite(#[from] std::io::Error),
    /// Worker pool for parallel generation could not be started
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl CatalogueError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        CatalogueError::ConfigValidation(msg.into())
    }

    pub(crate) fn map_load(msg: impl Into<String>) -> Self {
        CatalogueError::MapLoad(msg.into())
    }
}
