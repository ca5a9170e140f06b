//! Slot to node resolution.
//!
//! A [`SlotTable`] maps slot ranges to a [`SlotOwner`]. Tables come from one
//! of two places:
//!
//! - **Static**: ranges supplied on the command line (or an even split over
//!   the seed nodes). These must partition `0..=16383` exactly.
//! - **Live**: built from `CLUSTER NODES`, so a replica promoted during a
//!   failover shows up as the new primary. Live tables may have gaps while
//!   slots are unassigned.
//!
//! [`TopologyResolver`] hands out a table per migration run or per query. In
//! live mode it asks the cluster every time and never falls back to static
//! data when the cluster cannot be reached.

use std::borrow::Cow;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use super::distribution::{MAX_SLOT, SlotRange, calculate_distribution};
use crate::client::{KeyValueStore, ParsedClusterNodes, ValkeyError};

/// Errors produced while building or fetching a slot table.
#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("Slot table has no ranges")]
    Empty,

    #[error("Slot range {0} is outside 0-16383")]
    OutOfRange(SlotRange),

    #[error("Slot ranges {first} and {second} overlap")]
    Overlap { first: SlotRange, second: SlotRange },

    #[error("Slots {0} are not assigned to any node")]
    Gap(SlotRange),

    #[error("Invalid static range '{input}': {reason}")]
    InvalidRange { input: String, reason: String },

    #[error("Cluster topology unavailable: {0}")]
    Unavailable(#[from] ValkeyError),
}

/// The node serving a slot, plus one of its replicas when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotOwner {
    /// `host:port` of the primary.
    pub primary: String,
    /// `host:port` of a replica of the primary.
    pub replica: Option<String>,
}

impl SlotOwner {
    pub fn new(primary: impl Into<String>, replica: Option<String>) -> Self {
        Self {
            primary: primary.into(),
            replica,
        }
    }

    /// A primary without a known replica.
    pub fn primary(primary: impl Into<String>) -> Self {
        Self::new(primary, None)
    }
}

impl std::fmt::Display for SlotOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (replica {})",
            self.primary,
            self.replica.as_deref().unwrap_or("-")
        )
    }
}

/// One row of a slot table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotAssignment {
    pub range: SlotRange,
    pub owner: SlotOwner,
}

impl SlotAssignment {
    pub fn new(range: SlotRange, owner: SlotOwner) -> Self {
        Self { range, owner }
    }
}

impl FromStr for SlotAssignment {
    type Err = TopologyError;

    /// Parse `<lo>-<hi>=<primary>[/<replica>]`, e.g. `0-5460=127.0.0.1:7001/127.0.0.1:7004`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| TopologyError::InvalidRange {
            input: s.to_string(),
            reason,
        };

        let (range, nodes) = s
            .split_once('=')
            .ok_or_else(|| invalid("expected <lo>-<hi>=<primary>[/<replica>]".to_string()))?;

        let range: SlotRange = range.parse().map_err(|e| invalid(format!("{}", e)))?;

        let (primary, replica) = match nodes.split_once('/') {
            Some((primary, replica)) => (primary.trim(), Some(replica.trim())),
            None => (nodes.trim(), None),
        };
        if primary.is_empty() {
            return Err(invalid("primary node is empty".to_string()));
        }
        let replica = match replica {
            Some("") => return Err(invalid("replica node is empty".to_string())),
            other => other.map(str::to_string),
        };

        Ok(SlotAssignment::new(range, SlotOwner::new(primary, replica)))
    }
}

/// Sorted, non-overlapping slot ranges with their owners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotTable {
    entries: Vec<SlotAssignment>,
}

impl SlotTable {
    /// Sort `entries` and reject out-of-range or overlapping ranges.
    fn sorted(mut entries: Vec<SlotAssignment>) -> Result<Self, TopologyError> {
        entries.sort_by_key(|e| e.range.start);

        for entry in &entries {
            if entry.range.start > entry.range.end || entry.range.end > MAX_SLOT {
                return Err(TopologyError::OutOfRange(entry.range));
            }
        }

        for pair in entries.windows(2) {
            if let [a, b] = pair
                && a.range.overlaps(&b.range)
            {
                return Err(TopologyError::Overlap {
                    first: a.range,
                    second: b.range,
                });
            }
        }

        Ok(Self { entries })
    }

    /// Build a static table. The ranges must cover every slot exactly once.
    pub fn static_partition(entries: Vec<SlotAssignment>) -> Result<Self, TopologyError> {
        if entries.is_empty() {
            return Err(TopologyError::Empty);
        }
        let table = Self::sorted(entries)?;

        let mut next: u32 = 0;
        for entry in &table.entries {
            let start = u32::from(entry.range.start);
            if start > next {
                return Err(TopologyError::Gap(gap(next, start - 1)));
            }
            next = u32::from(entry.range.end) + 1;
        }
        if next <= u32::from(MAX_SLOT) {
            return Err(TopologyError::Gap(gap(next, u32::from(MAX_SLOT))));
        }

        Ok(table)
    }

    /// Split the slot space evenly over `owners`, the way
    /// `redis-cli --cluster create` does.
    pub fn even(owners: Vec<SlotOwner>) -> Result<Self, TopologyError> {
        let count = u16::try_from(owners.len()).unwrap_or(u16::MAX);
        let entries = calculate_distribution(count)
            .into_iter()
            .zip(owners)
            .map(|(range, owner)| SlotAssignment::new(range, owner))
            .collect();
        Self::static_partition(entries)
    }

    /// Build the live table from `CLUSTER NODES`.
    ///
    /// Each primary's ranges map to the primary's address. The replica is the
    /// first healthy replica of that primary, or the first listed one when
    /// none is healthy.
    pub fn from_cluster_nodes(nodes: &ParsedClusterNodes) -> Result<Self, TopologyError> {
        let mut entries = Vec::new();

        for master in nodes.masters() {
            if master.slots.is_empty() {
                continue;
            }
            let replicas = nodes.replicas_of(&master.node_id);
            let replica = replicas
                .iter()
                .find(|r| r.is_healthy())
                .or_else(|| replicas.first())
                .map(|r| r.address.clone());

            let owner = SlotOwner::new(master.address.clone(), replica);
            for range in &master.slots {
                entries.push(SlotAssignment::new(*range, owner.clone()));
            }
        }

        Self::sorted(entries)
    }

    /// Owner of `slot`, or `None` when no range holds it.
    pub fn resolve(&self, slot: u16) -> Option<&SlotOwner> {
        let idx = self.entries.partition_point(|e| e.range.end < slot);
        self.entries
            .get(idx)
            .filter(|e| e.range.contains(slot))
            .map(|e| &e.owner)
    }

    /// Whether every slot has an owner.
    pub fn covers_all_slots(&self) -> bool {
        let assigned: u32 = self.entries.iter().map(|e| u32::from(e.range.count())).sum();
        assigned == u32::from(MAX_SLOT) + 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlotAssignment> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn gap(start: u32, end: u32) -> SlotRange {
    // Both bounds come from slots already validated against MAX_SLOT.
    let clamp = |v: u32| u16::try_from(v).unwrap_or(MAX_SLOT);
    SlotRange::new(clamp(start), clamp(end))
}

/// Where slot owners come from for a run.
#[derive(Debug, Clone)]
pub enum TopologyResolver {
    /// A fixed table supplied at configuration time.
    Static(SlotTable),
    /// Ask the cluster through the store on every snapshot.
    Live,
}

impl TopologyResolver {
    /// Short name for output.
    pub fn mode_name(&self) -> &'static str {
        match self {
            TopologyResolver::Static(_) => "static",
            TopologyResolver::Live => "live",
        }
    }

    /// Table to use for one migration run or one query.
    ///
    /// Live mode issues `CLUSTER NODES`; its failure is returned as
    /// [`TopologyError::Unavailable`].
    pub async fn snapshot<S: KeyValueStore>(
        &self,
        store: &S,
    ) -> Result<Cow<'_, SlotTable>, TopologyError> {
        match self {
            TopologyResolver::Static(table) => Ok(Cow::Borrowed(table)),
            TopologyResolver::Live => {
                let nodes = store.cluster_nodes().await?;
                let table = SlotTable::from_cluster_nodes(&nodes)?;
                debug!(
                    ranges = table.len(),
                    complete = table.covers_all_slots(),
                    "Fetched live slot table"
                );
                Ok(Cow::Owned(table))
            }
        }
    }
}
