//! The MySQL side of the migration.
//!
//! - `models`: `User`, `Hotel`, `Booking` rows and the [`Dataset`] they form
//! - `mysql`: schema creation, seed insertion and read-back
//! - `seed`: the demo rows

pub mod models;
pub mod mysql;
pub mod seed;

use std::time::Duration;

use thiserror::Error;

pub use models::{Booking, Dataset, Hotel, User};
pub use mysql::{InsertReport, MySqlSettings, MySqlSource, SeedReport};
pub use seed::seed_dataset;

/// Errors from the relational source.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("MySQL error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("MySQL {operation} timed out after {duration:?}")]
    Timeout {
        operation: String,
        duration: Duration,
    },
}

impl SourceError {
    /// Whether the database could not be reached.
    pub fn is_connectivity(&self) -> bool {
        match self {
            SourceError::Database(e) => matches!(
                e,
                sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut
            ),
            SourceError::Timeout { .. } => true,
        }
    }
}
