// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Integration tests for booking-migrator
//!
//! These tests require a running MySQL server and a 6-node Valkey cluster
//! (three primaries on 127.0.0.1:7001-7003, replicas on 7004-7006). Tests are
//! marked with #[ignore] and must be run explicitly:
//!
//! ```bash
//! # Run all integration tests
//! cargo test --test integration -- --ignored
//!
//! # Run specific test
//! cargo test --test integration test_keyslot_matches_server -- --ignored
//! ```
//!
//! MySQL is reached with the defaults (`root`/`root` on localhost:3306). The
//! tests use their own database so the demo's `hotel_db` is left alone.

#[path = "../common/mod.rs"]
mod common;

mod cluster_tests;
mod mysql_tests;
