//! Command line and environment configuration.
//!
//! Every option can also be set through the environment variable shown in
//! `--help`.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::client::ValkeyClientConfig;
use crate::relational::MySqlSettings;
use crate::retry::RetryPolicy;
use crate::slots::{SlotAssignment, SlotOwner, SlotTable, TopologyError, TopologyResolver};

/// Where slot owners come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TopologyMode {
    /// Fixed ranges from `--static-range`, or an even split over the nodes.
    Static,
    /// Ask the cluster with `CLUSTER NODES` on every run and query.
    Live,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Migrate a hotel booking schema from MySQL into a Valkey/Redis cluster and
/// show where every key lands.
#[derive(Debug, Clone, Parser)]
#[command(name = "booking-migrator", version)]
pub struct Cli {
    #[command(flatten)]
    pub mysql: MySqlArgs,

    #[command(flatten)]
    pub valkey: ValkeyArgs,

    /// Slot owner source for migration output and queries.
    #[arg(long, value_enum, env = "TOPOLOGY", default_value = "live", global = true)]
    pub topology: TopologyMode,

    /// Static slot range, e.g. `0-5460=127.0.0.1:7001/127.0.0.1:7004`.
    /// Repeat to cover all 16384 slots.
    #[arg(
        long = "static-range",
        env = "STATIC_RANGES",
        value_name = "LO-HI=PRIMARY[/REPLICA]",
        value_delimiter = ',',
        value_parser = parse_static_range,
        global = true
    )]
    pub static_ranges: Vec<SlotAssignment>,

    /// Attempts per backend at startup.
    #[arg(long, env = "CONNECT_ATTEMPTS", default_value_t = 10, global = true)]
    pub connect_attempts: u32,

    /// Seconds between MySQL connection attempts.
    #[arg(long, env = "MYSQL_RETRY_DELAY_SECS", default_value_t = 3, global = true)]
    pub mysql_retry_delay_secs: u64,

    /// Seconds between Valkey connection attempts.
    #[arg(long, env = "VALKEY_RETRY_DELAY_SECS", default_value_t = 2, global = true)]
    pub valkey_retry_delay_secs: u64,

    /// Log format (logs go to stderr).
    #[arg(long, value_enum, env = "LOG_FORMAT", default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Migrate into an in-memory store instead of Valkey. Uses static topology.
    #[arg(long, env = "DRY_RUN", global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Args)]
pub struct MySqlArgs {
    #[arg(long, env = "MYSQL_HOST", default_value = "localhost", global = true)]
    pub mysql_host: String,

    #[arg(long, env = "MYSQL_PORT", default_value_t = 3306, global = true)]
    pub mysql_port: u16,

    #[arg(long, env = "MYSQL_USER", default_value = "root", global = true)]
    pub mysql_user: String,

    #[arg(
        long,
        env = "MYSQL_PASSWORD",
        default_value = "root",
        hide_env_values = true,
        global = true
    )]
    pub mysql_password: String,

    #[arg(long, env = "MYSQL_DATABASE", default_value = "hotel_db", global = true)]
    pub mysql_database: String,
}

impl MySqlArgs {
    pub fn settings(&self) -> MySqlSettings {
        MySqlSettings {
            host: self.mysql_host.clone(),
            port: self.mysql_port,
            ..MySqlSettings::default()
        }
        .with_credentials(self.mysql_user.clone(), self.mysql_password.clone())
        .with_database(self.mysql_database.clone())
    }
}

#[derive(Debug, Clone, Args)]
pub struct ValkeyArgs {
    /// Seed node `host:port`. Repeat or comma-separate for several.
    #[arg(
        long = "valkey-node",
        env = "VALKEY_NODES",
        value_name = "HOST:PORT",
        value_delimiter = ',',
        default_values = ["127.0.0.1:7001", "127.0.0.1:7002", "127.0.0.1:7003"],
        value_parser = parse_node,
        global = true
    )]
    pub valkey_nodes: Vec<(String, u16)>,

    #[arg(long, env = "VALKEY_PASSWORD", hide_env_values = true, global = true)]
    pub valkey_password: Option<String>,

    /// Talk to a single non-clustered node (the first `--valkey-node`).
    #[arg(long, env = "VALKEY_STANDALONE", global = true)]
    pub valkey_standalone: bool,
}

impl ValkeyArgs {
    pub fn client_config(&self) -> ValkeyClientConfig {
        let mut config = ValkeyClientConfig::new(self.valkey_nodes.clone());
        if let Some(password) = &self.valkey_password {
            config = config.with_password(password.clone());
        }
        if self.valkey_standalone {
            config = config.standalone();
        }
        config
    }

    fn addresses(&self) -> Vec<String> {
        self.valkey_nodes
            .iter()
            .map(|(host, port)| format!("{}:{}", host, port))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct MigrateArgs {
    /// Delete the projected keys before migrating, so list indexes are not
    /// appended twice.
    #[arg(long)]
    pub reset_target: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create schema, seed, migrate, then run every query once (default).
    Demo(MigrateArgs),
    /// Create schema, seed, migrate, then open the query menu.
    Interactive {
        #[command(flatten)]
        migrate: MigrateArgs,
        /// Open the menu on the existing key-value data without touching MySQL.
        #[arg(long)]
        skip_migration: bool,
    },
    /// Create schema, seed and migrate, then print a summary.
    Migrate(MigrateArgs),
    /// Print the slot and owner of each key.
    Keyslot {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Print cluster health and slot ownership.
    Topology,
}

impl Cli {
    /// The subcommand, defaulting to `demo`.
    pub fn selected_command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Demo(MigrateArgs::default()))
    }

    /// Static mode is forced for dry runs, which have no cluster to ask.
    pub fn effective_topology(&self) -> TopologyMode {
        if self.dry_run {
            TopologyMode::Static
        } else {
            self.topology
        }
    }

    /// Build the resolver for the selected mode.
    pub fn resolver(&self) -> Result<TopologyResolver, TopologyError> {
        match self.effective_topology() {
            TopologyMode::Live => Ok(TopologyResolver::Live),
            TopologyMode::Static if self.static_ranges.is_empty() => {
                let owners = self
                    .valkey
                    .addresses()
                    .into_iter()
                    .map(SlotOwner::primary)
                    .collect();
                Ok(TopologyResolver::Static(SlotTable::even(owners)?))
            }
            TopologyMode::Static => Ok(TopologyResolver::Static(SlotTable::static_partition(
                self.static_ranges.clone(),
            )?)),
        }
    }

    pub fn mysql_retry(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.connect_attempts,
            Duration::from_secs(self.mysql_retry_delay_secs),
        )
    }

    pub fn valkey_retry(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.connect_attempts,
            Duration::from_secs(self.valkey_retry_delay_secs),
        )
    }
}

fn parse_node(raw: &str) -> Result<(String, u16), String> {
    let (host, port) = raw
        .trim()
        .rsplit_once(':')
        .ok_or_else(|| format!("expected HOST:PORT, got '{}'", raw))?;
    if host.is_empty() {
        return Err(format!("missing host in '{}'", raw));
    }
    let port = port
        .parse::<u16>()
        .map_err(|error| format!("invalid port in '{}': {}", raw, error))?;
    Ok((host.to_string(), port))
}

fn parse_static_range(raw: &str) -> Result<SlotAssignment, String> {
    raw.parse::<SlotAssignment>().map_err(|error| error.to_string())
}
