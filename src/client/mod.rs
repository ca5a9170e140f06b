//! Key-value store access.
//!
//! ## Architecture
//!
//! - `store`: the [`KeyValueStore`] trait the migration and queries are written against
//! - `valkey_client`: fred-backed implementation for clusters and standalone nodes
//! - `memory`: in-process implementation for dry runs and tests
//! - `types`: parsed `CLUSTER NODES` / `CLUSTER INFO` output
//! - `cluster_ops`: cluster introspection helpers on [`ValkeyClient`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use booking_migrator::client::{KeyValueStore, ValkeyClient, ValkeyClientConfig};
//!
//! let client = ValkeyClient::connect(ValkeyClientConfig::new(hosts)).await?;
//! client.hset("user:1", &[("name", "Alice".to_string())]).await?;
//! ```

pub mod cluster_ops;
pub mod memory;
pub mod store;
pub mod types;
pub mod valkey_client;

pub use cluster_ops::ClusterOverview;
pub use memory::MemoryStore;
pub use store::{KeyType, KeyValueStore};
pub use types::{ClusterInfo, ClusterNode, ClusterState, NodeRole, ParsedClusterNodes, ReplyError};
pub use valkey_client::{ValkeyClient, ValkeyClientConfig, ValkeyError};
