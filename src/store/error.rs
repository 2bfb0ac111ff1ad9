// Error types for Store module

use std::path::PathBuf;
use thiserror::Error;

/// Test script lookup errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read test script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list exercises in {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;
