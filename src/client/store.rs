//! The key-value operations the migration and queries rely on.
//!
//! [`KeyValueStore`] is implemented by [`ValkeyClient`](super::ValkeyClient)
//! for real clusters and by [`MemoryStore`](super::MemoryStore) for dry runs
//! and tests. Callers never choose a node: routing is the store's business.

use std::collections::BTreeMap;
use std::str::FromStr;

use super::types::ParsedClusterNodes;
use super::valkey_client::ValkeyError;

/// Value type of a key, as reported by `TYPE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyType {
    String,
    List,
    Set,
    ZSet,
    Hash,
    Stream,
    /// The key does not exist.
    None,
    Other(String),
}

impl FromStr for KeyType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "string" => KeyType::String,
            "list" => KeyType::List,
            "set" => KeyType::Set,
            "zset" => KeyType::ZSet,
            "hash" => KeyType::Hash,
            "stream" => KeyType::Stream,
            "none" => KeyType::None,
            other => KeyType::Other(other.to_string()),
        })
    }
}

impl std::fmt::Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyType::String => write!(f, "string"),
            KeyType::List => write!(f, "list"),
            KeyType::Set => write!(f, "set"),
            KeyType::ZSet => write!(f, "zset"),
            KeyType::Hash => write!(f, "hash"),
            KeyType::Stream => write!(f, "stream"),
            KeyType::None => write!(f, "none"),
            KeyType::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Hash, list, set, string and key commands, plus cluster introspection.
///
/// Every method issues exactly one command. Lookups of missing keys return
/// empty values, never errors.
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    /// `HSET key field value [field value ...]`
    async fn hset(&self, key: &str, fields: &[(&str, String)]) -> Result<(), ValkeyError>;

    /// `HGETALL key`; empty when the key is missing.
    async fn hgetall(&self, key: &str) -> Result<BTreeMap<String, String>, ValkeyError>;

    /// `SADD key member`
    async fn sadd(&self, key: &str, member: &str) -> Result<(), ValkeyError>;

    /// `SMEMBERS key`, in no particular order.
    async fn smembers(&self, key: &str) -> Result<Vec<String>, ValkeyError>;

    /// `SET key value`
    async fn set(&self, key: &str, value: &str) -> Result<(), ValkeyError>;

    /// `GET key`
    async fn get(&self, key: &str) -> Result<Option<String>, ValkeyError>;

    /// `RPUSH key value`; returns the new list length.
    async fn rpush(&self, key: &str, value: &str) -> Result<u64, ValkeyError>;

    /// `LRANGE key 0 -1`
    async fn lrange_all(&self, key: &str) -> Result<Vec<String>, ValkeyError>;

    /// `EXISTS key`
    async fn exists(&self, key: &str) -> Result<bool, ValkeyError>;

    /// `TYPE key`
    async fn key_type(&self, key: &str) -> Result<KeyType, ValkeyError>;

    /// `DEL key`; returns whether the key existed.
    async fn del(&self, key: &str) -> Result<bool, ValkeyError>;

    /// `CLUSTER NODES`, parsed.
    async fn cluster_nodes(&self) -> Result<ParsedClusterNodes, ValkeyError>;
}
