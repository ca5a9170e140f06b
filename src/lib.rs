//! booking-migrator library crate
//!
//! Moves the Users/Hotels/Bookings schema from MySQL into a Valkey (or Redis)
//! cluster as hashes, lists and sets, and reports which hash slot and node
//! every key lands on.
//!
//! ## Modules
//!
//! - [`slots`]: CRC16 key slots, slot ranges and slot-to-node resolution
//! - [`client`]: the [`client::KeyValueStore`] seam with fred-backed and in-memory stores
//! - [`relational`]: MySQL schema, seed rows and read-back
//! - [`projection`]: pure mapping from rows to keys and values
//! - [`migration`]: writes the projection and prints key placement
//! - [`queries`] / [`menu`]: lookups over the migrated data
//! - [`config`] / [`app`]: command line and subcommand dispatch

pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod menu;
pub mod migration;
pub mod projection;
pub mod queries;
pub mod relational;
pub mod retry;
pub mod slots;

pub use error::{Error, Result};
