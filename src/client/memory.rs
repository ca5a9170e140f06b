//! In-process key-value store.
//!
//! Backs `--dry-run` and the test suite. Commands follow Valkey semantics for
//! the subset in [`KeyValueStore`]: hash writes overwrite fields, set adds are
//! idempotent, list pushes append, and using a key with the wrong command
//! fails with a WRONGTYPE error.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use super::store::{KeyType, KeyValueStore};
use super::types::ParsedClusterNodes;
use super::valkey_client::ValkeyError;

#[derive(Debug, Clone)]
enum Value {
    String(String),
    List(Vec<String>),
    Set(BTreeSet<String>),
    Hash(BTreeMap<String, String>),
}

impl Value {
    fn key_type(&self) -> KeyType {
        match self {
            Value::String(_) => KeyType::String,
            Value::List(_) => KeyType::List,
            Value::Set(_) => KeyType::Set,
            Value::Hash(_) => KeyType::Hash,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    data: BTreeMap<String, Value>,
    cluster_nodes: Option<String>,
    /// Remaining successful writes before every command fails.
    write_budget: Option<usize>,
    commands: u64,
}

impl Inner {
    fn check_available(&mut self) -> Result<(), ValkeyError> {
        self.commands += 1;
        if self.write_budget == Some(0) {
            return Err(ValkeyError::Connection("store is unreachable".to_string()));
        }
        Ok(())
    }

    fn spend_write(&mut self) -> Result<(), ValkeyError> {
        self.check_available()?;
        if let Some(budget) = self.write_budget.as_mut() {
            *budget -= 1;
        }
        Ok(())
    }
}

/// A [`KeyValueStore`] that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store that does not answer `CLUSTER NODES`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that answers `CLUSTER NODES` with `raw`.
    pub fn with_cluster_nodes(raw: impl Into<String>) -> Self {
        let store = Self::new();
        store.set_cluster_nodes(Some(raw.into()));
        store
    }

    /// Replace the `CLUSTER NODES` reply, e.g. to simulate a failover.
    /// `None` makes the command fail.
    pub fn set_cluster_nodes(&self, raw: Option<String>) {
        self.lock().cluster_nodes = raw;
    }

    /// Allow `writes` more successful writes; after that every command fails
    /// with a connection error. `None` removes the limit.
    pub fn set_write_budget(&self, writes: Option<usize>) {
        self.lock().write_budget = writes;
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.lock().data.len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.lock().data.is_empty()
    }

    /// All keys in lexical order.
    pub fn keys(&self) -> Vec<String> {
        self.lock().data.keys().cloned().collect()
    }

    /// Number of commands issued so far.
    pub fn command_count(&self) -> u64 {
        self.lock().commands
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn wrong_type(key: &str, expected: KeyType, found: &Value) -> ValkeyError {
    ValkeyError::WrongType {
        key: key.to_string(),
        expected,
        found: found.key_type(),
    }
}

impl KeyValueStore for MemoryStore {
    async fn hset(&self, key: &str, fields: &[(&str, String)]) -> Result<(), ValkeyError> {
        let mut inner = self.lock();
        inner.spend_write()?;
        let value = inner
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::Hash(BTreeMap::new()));
        match value {
            Value::Hash(hash) => {
                for (field, v) in fields {
                    hash.insert((*field).to_string(), v.clone());
                }
                Ok(())
            }
            other => Err(wrong_type(key, KeyType::Hash, other)),
        }
    }

    async fn hgetall(&self, key: &str) -> Result<BTreeMap<String, String>, ValkeyError> {
        let mut inner = self.lock();
        inner.check_available()?;
        match inner.data.get(key) {
            None => Ok(BTreeMap::new()),
            Some(Value::Hash(hash)) => Ok(hash.clone()),
            Some(other) => Err(wrong_type(key, KeyType::Hash, other)),
        }
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<(), ValkeyError> {
        let mut inner = self.lock();
        inner.spend_write()?;
        let value = inner
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::Set(BTreeSet::new()));
        match value {
            Value::Set(set) => {
                set.insert(member.to_string());
                Ok(())
            }
            other => Err(wrong_type(key, KeyType::Set, other)),
        }
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, ValkeyError> {
        let mut inner = self.lock();
        inner.check_available()?;
        match inner.data.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(other) => Err(wrong_type(key, KeyType::Set, other)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), ValkeyError> {
        let mut inner = self.lock();
        inner.spend_write()?;
        inner
            .data
            .insert(key.to_string(), Value::String(value.to_string()));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, ValkeyError> {
        let mut inner = self.lock();
        inner.check_available()?;
        match inner.data.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(wrong_type(key, KeyType::String, other)),
        }
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<u64, ValkeyError> {
        let mut inner = self.lock();
        inner.spend_write()?;
        let entry = inner
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::List(Vec::new()));
        match entry {
            Value::List(list) => {
                list.push(value.to_string());
                Ok(list.len() as u64)
            }
            other => Err(wrong_type(key, KeyType::List, other)),
        }
    }

    async fn lrange_all(&self, key: &str) -> Result<Vec<String>, ValkeyError> {
        let mut inner = self.lock();
        inner.check_available()?;
        match inner.data.get(key) {
            None => Ok(Vec::new()),
            Some(Value::List(list)) => Ok(list.clone()),
            Some(other) => Err(wrong_type(key, KeyType::List, other)),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, ValkeyError> {
        let mut inner = self.lock();
        inner.check_available()?;
        Ok(inner.data.contains_key(key))
    }

    async fn key_type(&self, key: &str) -> Result<KeyType, ValkeyError> {
        let mut inner = self.lock();
        inner.check_available()?;
        Ok(inner
            .data
            .get(key)
            .map(Value::key_type)
            .unwrap_or(KeyType::None))
    }

    async fn del(&self, key: &str) -> Result<bool, ValkeyError> {
        let mut inner = self.lock();
        inner.spend_write()?;
        Ok(inner.data.remove(key).is_some())
    }

    async fn cluster_nodes(&self) -> Result<ParsedClusterNodes, ValkeyError> {
        let mut inner = self.lock();
        inner.check_available()?;
        match inner.cluster_nodes.as_deref() {
            Some(raw) => Ok(ParsedClusterNodes::parse(raw)?),
            None => Err(ValkeyError::Unsupported(
                "CLUSTER NODES: in-memory store is not clustered".to_string(),
            )),
        }
    }
}
