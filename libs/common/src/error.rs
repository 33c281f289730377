//! Custom error types for the common library
//!
//! This module defines the failures a data source can report. Every
//! variant is fatal for the request that triggered it: callers turn it
//! into a failure envelope and never return partial data.

use sqlx::Error as SqlxError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Error raised by a data source (relational store or fixture set)
#[derive(Error, Debug)]
pub enum DataSourceError {
    /// Error occurred while connecting to the store
    #[error("Data source connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during query execution
    #[error("Data source query error: {0}")]
    Query(#[source] SqlxError),

    /// The per-query time bound elapsed
    #[error("Data source query timed out after {0:?}")]
    Timeout(Duration),

    /// Configuration error
    #[error("Data source configuration error: {0}")]
    Configuration(String),

    /// A fixture file exists but could not be read
    #[error("Failed to read fixture {path}: {source}")]
    FixtureIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A fixture file is not valid JSON for its collection
    #[error("Malformed fixture {path}: {source}")]
    FixtureFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Type alias for Result with DataSourceError
pub type DataSourceResult<T> = Result<T, DataSourceError>;
