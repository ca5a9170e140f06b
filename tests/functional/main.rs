// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Functional tests for the migration and query flow.
//!
//! These tests run the migration, the query service and the menu against the
//! in-memory store, so they need neither MySQL nor a Valkey cluster. Live
//! topology is simulated by feeding `CLUSTER NODES` replies to the store.
//!
//! ```bash
//! # Run all functional tests
//! cargo test --test functional
//!
//! # Run specific test
//! cargo test --test functional test_failover_between_queries
//! ```
//!
//! ## Test Categories
//!
//! - **Migration tests**: key layout, list order, reruns and resets
//! - **Failover tests**: live topology picked up between runs and queries
//! - **Menu tests**: the query menu driven by scripted input
//! - **App tests**: whole subcommands in dry-run mode

#[path = "../common/mod.rs"]
mod common;

mod app_tests;
mod menu_tests;
mod migration_tests;
