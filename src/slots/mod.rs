//! Hash slot logic for Valkey clusters.
//!
//! Everything here is pure except [`TopologyResolver::snapshot`] in live mode,
//! which asks the store for `CLUSTER NODES`.
//!
//! ## Module Structure
//!
//! - [`hashing`]: key to slot (CRC16/XMODEM mod 16384)
//! - [`distribution`]: slot ranges and the even split across primaries
//! - [`topology`]: slot to owning primary and replica, static or live

pub mod distribution;
pub mod hashing;
pub mod topology;

pub use distribution::{
    MAX_SLOT, SlotRange, SlotRangeParseError, TOTAL_SLOTS, calculate_distribution,
};
pub use hashing::{key_slot, key_slot_bytes};
pub use topology::{SlotAssignment, SlotOwner, SlotTable, TopologyError, TopologyResolver};
