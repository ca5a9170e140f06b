//! Writes the key-value projection of a dataset through a store.
//!
//! Every record line shows the key's slot and the node the current topology
//! says owns it. That lookup is for display only: the store routes each
//! command itself.
//!
//! Running twice against the same store is not idempotent. Hash fields and
//! set members converge, but `user:{id}:bookings` gets every id appended
//! again. Use [`clear_projection`] first to start from a clean target.

use std::io::Write;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::client::{KeyValueStore, ValkeyError};
use crate::projection::{Entity, IndexWrite, Record, project};
use crate::relational::Dataset;
use crate::slots::{SlotTable, TopologyError, TopologyResolver, key_slot};

/// Counts of what a migration wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationStats {
    pub users: usize,
    pub hotels: usize,
    pub bookings: usize,
    /// Bookings not written because a referenced row is missing.
    pub skipped_bookings: usize,
}

impl MigrationStats {
    fn count(&mut self, entity: Entity) {
        match entity {
            Entity::User => self.users += 1,
            Entity::Hotel => self.hotels += 1,
            Entity::Booking => self.bookings += 1,
        }
    }
}

impl std::fmt::Display for MigrationStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} users, {} hotels, {} bookings",
            self.users, self.hotels, self.bookings
        )?;
        if self.skipped_bookings > 0 {
            write!(f, " ({} bookings skipped)", self.skipped_bookings)?;
        }
        Ok(())
    }
}

/// Why a migration stopped.
#[derive(Error, Debug)]
pub enum MigrationFailure {
    #[error(transparent)]
    Store(#[from] ValkeyError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error("Failed to write progress: {0}")]
    Output(#[from] std::io::Error),
}

/// A migration that stopped part way. `stats` counts the records fully
/// written before the failure.
#[derive(Error, Debug)]
#[error("Migration stopped after {stats}: {source}")]
pub struct MigrationError {
    pub stats: MigrationStats,
    pub source: MigrationFailure,
}

impl MigrationError {
    fn new(stats: MigrationStats, source: impl Into<MigrationFailure>) -> Self {
        Self {
            stats,
            source: source.into(),
        }
    }
}

/// Format the placement line printed for a record.
pub fn placement_line(key: &str, table: &SlotTable) -> String {
    let slot = key_slot(key);
    match table.resolve(slot) {
        Some(owner) => format!("    {} -> slot {} -> {}", key, slot, owner),
        None => format!("    {} -> slot {} -> unassigned", key, slot),
    }
}

async fn write_index<S: KeyValueStore>(store: &S, index: &IndexWrite) -> Result<(), ValkeyError> {
    match index {
        IndexWrite::SetMember { key, member } => store.sadd(key, member).await,
        IndexWrite::Lookup { key, value } => store.set(key, value).await,
        IndexWrite::ListAppend { key, value } => store.rpush(key, value).await.map(|_| ()),
    }
}

async fn write_record<S: KeyValueStore>(store: &S, record: &Record) -> Result<(), ValkeyError> {
    store.hset(&record.key, &record.fields).await?;
    for index in &record.indexes {
        write_index(store, index).await?;
    }
    Ok(())
}

fn section_header(entity: Entity) -> &'static str {
    match entity {
        Entity::User => "  Users (row -> hash):",
        Entity::Hotel => "  Hotels (row -> hash):",
        Entity::Booking => "  Bookings (foreign key -> list):",
    }
}

/// Migrate `data` into `store`, printing each key's placement to `out`.
///
/// Users and hotels are written before bookings. One topology snapshot is
/// taken for the whole run.
#[instrument(skip_all, fields(topology = resolver.mode_name()))]
pub async fn migrate<S, W>(
    store: &S,
    data: &Dataset,
    resolver: &TopologyResolver,
    out: &mut W,
) -> Result<MigrationStats, MigrationError>
where
    S: KeyValueStore,
    W: Write,
{
    let mut stats = MigrationStats::default();

    let table = resolver
        .snapshot(store)
        .await
        .map_err(|e| MigrationError::new(stats, e))?;
    let projection = project(data);

    let mut section = None;
    for record in &projection.records {
        if section != Some(record.entity) {
            section = Some(record.entity);
            writeln!(out, "{}", section_header(record.entity))
                .map_err(|e| MigrationError::new(stats, e))?;
        }

        if let Err(e) = write_record(store, record).await {
            warn!(key = %record.key, error = %e, "Migration stopped");
            return Err(MigrationError::new(stats, e));
        }
        stats.count(record.entity);

        debug!(key = %record.key, slot = key_slot(&record.key), "Migrated record");
        writeln!(out, "{}", placement_line(&record.key, &table))
            .map_err(|e| MigrationError::new(stats, e))?;
    }

    for dangling in &projection.dangling {
        warn!(
            booking_id = dangling.booking_id,
            missing = %dangling.missing,
            missing_id = dangling.missing_id,
            "Skipping booking with missing reference"
        );
        writeln!(out, "    skipped: {}", dangling).map_err(|e| MigrationError::new(stats, e))?;
        stats.skipped_bookings += 1;
    }

    info!(%stats, "Migration finished");
    Ok(stats)
}

/// Delete every key the projection of `data` would write. Returns how many
/// keys existed.
#[instrument(skip_all)]
pub async fn clear_projection<S: KeyValueStore>(
    store: &S,
    data: &Dataset,
) -> Result<usize, ValkeyError> {
    let mut removed = 0;
    for key in project(data).keys() {
        if store.del(&key).await? {
            removed += 1;
        }
    }
    info!(removed, "Cleared projected keys");
    Ok(removed)
}
