//! Valkey client wrapper using the fred crate.
//!
//! Connects to a cluster (or a single standalone node) and implements
//! [`KeyValueStore`] on top of fred's command interfaces. fred routes every
//! command to the node that owns the key's slot; nothing here picks a
//! connection by slot.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use fred::error::ErrorKind;
use fred::prelude::*;
use fred::types::config::ClusterDiscoveryPolicy;
use fred::types::{ClusterHash, CustomCommand};
use thiserror::Error;
use tracing::{debug, instrument};

use super::store::{KeyType, KeyValueStore};
use super::types::{ParsedClusterNodes, ReplyError};

/// Errors that can occur during Valkey operations.
#[derive(Error, Debug)]
pub enum ValkeyError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Redis error: {0}")]
    Redis(#[from] fred::error::Error),

    #[error(transparent)]
    Reply(#[from] ReplyError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("WRONGTYPE: key '{key}' holds a {found}, not a {expected}")]
    WrongType {
        key: String,
        expected: KeyType,
        found: KeyType,
    },

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl ValkeyError {
    /// Whether the error means the server could not be reached.
    pub fn is_connectivity(&self) -> bool {
        match self {
            ValkeyError::Connection(_) => true,
            ValkeyError::Redis(e) => matches!(
                e.kind(),
                ErrorKind::IO | ErrorKind::Timeout | ErrorKind::Canceled
            ),
            _ => false,
        }
    }
}

/// Where and how to connect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValkeyClientConfig {
    /// Seed nodes. In cluster mode fred discovers the rest from any of them.
    pub hosts: Vec<(String, u16)>,
    /// When false only the first host is used.
    pub clustered: bool,
    pub connection_timeout: Duration,
    pub command_timeout: Duration,
    pub password: Option<String>,
}

impl ValkeyClientConfig {
    pub fn new(hosts: Vec<(String, u16)>) -> Self {
        Self {
            hosts,
            clustered: true,
            connection_timeout: Duration::from_secs(10),
            command_timeout: Duration::from_secs(30),
            password: None,
        }
    }

    /// Talk to a single node instead of a cluster.
    pub fn standalone(self) -> Self {
        Self {
            clustered: false,
            ..self
        }
    }

    pub fn with_password(self, password: String) -> Self {
        Self {
            password: Some(password),
            ..self
        }
    }

    fn server_config(&self) -> Result<ServerConfig, ValkeyError> {
        let mut servers = self
            .hosts
            .iter()
            .map(|(host, port)| Server::new(host.clone(), *port));

        if !self.clustered {
            let server = servers
                .next()
                .ok_or_else(|| ValkeyError::InvalidConfig("no Valkey node given".to_string()))?;
            return Ok(ServerConfig::Centralized { server });
        }

        let hosts: Vec<Server> = servers.collect();
        if hosts.is_empty() {
            return Err(ValkeyError::InvalidConfig("no Valkey node given".to_string()));
        }
        Ok(ServerConfig::Clustered {
            hosts,
            policy: ClusterDiscoveryPolicy::ConfigEndpoint,
        })
    }
}

/// Valkey client used for the migration and the queries.
pub struct ValkeyClient {
    client: Client,
}

impl ValkeyClient {
    /// Build the fred client, wait for it to connect, then PING.
    #[instrument(skip(config), fields(hosts = ?config.hosts, clustered = config.clustered))]
    pub async fn connect(config: ValkeyClientConfig) -> Result<Self, ValkeyError> {
        let fred_config = Config {
            server: config.server_config()?,
            password: config.password.clone(),
            ..Default::default()
        };

        let client = Builder::from_config(fred_config)
            .with_performance_config(|perf| perf.default_command_timeout = config.command_timeout)
            .with_connection_config(|conn| conn.connection_timeout = config.connection_timeout)
            .build()?;
        client.init().await?;

        let this = Self { client };
        let pong = this.ping().await?;
        debug!(%pong, "Connected to Valkey");
        Ok(this)
    }

    pub async fn close(&self) -> Result<(), ValkeyError> {
        self.client.quit().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<String, ValkeyError> {
        Ok(self.client.ping(None).await?)
    }

    /// Raw `CLUSTER INFO` reply.
    #[instrument(skip(self))]
    pub async fn cluster_info_raw(&self) -> Result<String, ValkeyError> {
        Ok(self.client.cluster_info().await?)
    }

    /// Raw `CLUSTER NODES` reply.
    #[instrument(skip(self))]
    pub async fn cluster_nodes_raw(&self) -> Result<String, ValkeyError> {
        Ok(self.client.cluster_nodes().await?)
    }

    /// The slot the server computes for `key`.
    #[instrument(skip(self))]
    pub async fn cluster_keyslot(&self, key: &str) -> Result<u16, ValkeyError> {
        Ok(self.client.cluster_keyslot(key).await?)
    }
}

impl KeyValueStore for ValkeyClient {
    #[instrument(skip(self, entries), fields(field_count = entries.len()))]
    async fn hset(&self, key: &str, entries: &[(&str, String)]) -> Result<(), ValkeyError> {
        let values: HashMap<String, String> = entries
            .iter()
            .map(|(field, value)| ((*field).to_string(), value.clone()))
            .collect();
        let _added: i64 = self.client.hset(key, values).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn hgetall(&self, key: &str) -> Result<BTreeMap<String, String>, ValkeyError> {
        let values: HashMap<String, String> = self.client.hgetall(key).await?;
        Ok(values.into_iter().collect())
    }

    #[instrument(skip(self))]
    async fn sadd(&self, key: &str, member: &str) -> Result<(), ValkeyError> {
        let _added: i64 = self.client.sadd(key, member.to_string()).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn smembers(&self, key: &str) -> Result<Vec<String>, ValkeyError> {
        let members: Vec<String> = self.client.smembers(key).await?;
        Ok(members)
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> Result<(), ValkeyError> {
        self.client
            .set::<(), _, _>(key, value.to_string(), None, None, false)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, ValkeyError> {
        let value: Option<String> = self.client.get(key).await?;
        Ok(value)
    }

    #[instrument(skip(self))]
    async fn rpush(&self, key: &str, value: &str) -> Result<u64, ValkeyError> {
        let len: u64 = self.client.rpush(key, value.to_string()).await?;
        Ok(len)
    }

    #[instrument(skip(self))]
    async fn lrange_all(&self, key: &str) -> Result<Vec<String>, ValkeyError> {
        let values: Vec<String> = self.client.lrange(key, 0, -1).await?;
        Ok(values)
    }

    #[instrument(skip(self))]
    async fn exists(&self, key: &str) -> Result<bool, ValkeyError> {
        let count: u64 = self.client.exists(key).await?;
        Ok(count > 0)
    }

    #[instrument(skip(self))]
    async fn key_type(&self, key: &str) -> Result<KeyType, ValkeyError> {
        let cmd = CustomCommand::new_static("TYPE", ClusterHash::FirstKey, false);
        let name: String = self.client.custom(cmd, vec![key.to_string()]).await?;
        Ok(name.parse().unwrap_or(KeyType::Other(name)))
    }

    #[instrument(skip(self))]
    async fn del(&self, key: &str) -> Result<bool, ValkeyError> {
        let removed: u64 = self.client.del(key).await?;
        Ok(removed > 0)
    }

    #[instrument(skip(self))]
    async fn cluster_nodes(&self) -> Result<ParsedClusterNodes, ValkeyError> {
        let raw = self.cluster_nodes_raw().await?;
        Ok(ParsedClusterNodes::parse(&raw)?)
    }
}
