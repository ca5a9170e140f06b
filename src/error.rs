//! Crate-level error type.
//!
//! Wraps the per-module errors raised by a run.

use thiserror::Error;

use crate::client::ValkeyError;
use crate::migration::MigrationError;
use crate::queries::QueryError;
use crate::relational::SourceError;
use crate::slots::TopologyError;

/// Error type for top-level operations
#[derive(Error, Debug)]
pub enum Error {
    /// Key-value store error
    #[error(transparent)]
    Valkey(#[from] ValkeyError),

    /// Slot table could not be built or fetched
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// Relational source error
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Migration stopped part way through
    #[error(transparent)]
    Migration(#[from] MigrationError),

    /// A lookup failed
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Reading input or writing output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid command line or environment configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for top-level operations
pub type Result<T> = std::result::Result<T, Error>;
