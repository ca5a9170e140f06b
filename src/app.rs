//! Subcommand dispatch.
//!
//! Connects the backends the selected command needs, runs it, and prints
//! progress to `out`. Logs go through `tracing` and never to `out`.

use std::io::Write;

use tokio::io::AsyncBufRead;
use tracing::{error, info, warn};

use crate::client::{KeyValueStore, MemoryStore, ValkeyClient};
use crate::config::{Cli, Command, MigrateArgs, TopologyMode};
use crate::error::{Error, Result};
use crate::menu;
use crate::migration::{self, MigrationStats, placement_line};
use crate::queries::QueryService;
use crate::relational::{Dataset, MySqlSource, seed_dataset};
use crate::retry::connect_with_retry;
use crate::slots::{SlotTable, TopologyResolver, key_slot};

/// Run the command selected on the command line.
pub async fn run<R, W>(cli: &Cli, input: &mut R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    match cli.selected_command() {
        Command::Keyslot { keys } => keyslot(cli, &keys, out).await,
        Command::Topology => topology(cli, out).await,
        command => session(cli, &command, input, out).await,
    }
}

async fn connect_valkey(cli: &Cli) -> Result<ValkeyClient> {
    let config = cli.valkey.client_config();
    let client = connect_with_retry("valkey", cli.valkey_retry(), || {
        ValkeyClient::connect(config.clone())
    })
    .await?;
    Ok(client)
}

/// Create the schema, load the seed rows and read everything back.
async fn load_source<W: Write>(cli: &Cli, out: &mut W) -> Result<Dataset> {
    writeln!(out, "STEP 1: Connect to MySQL (relational database)")?;
    writeln!(out, "  Tables: Users, Hotels, Bookings (with foreign keys)")?;

    let settings = cli.mysql.settings();
    let mut source =
        connect_with_retry("mysql", cli.mysql_retry(), || MySqlSource::connect(&settings)).await?;

    source.create_tables().await?;
    let seeded = source.seed(&seed_dataset()).await?;
    writeln!(out, "  Seed: {}", seeded)?;
    let data = source.fetch_dataset().await?;
    writeln!(out, "  Data: {}", data)?;

    if let Err(e) = source.close().await {
        warn!(error = %e, "Failed to close MySQL connection");
    }
    Ok(data)
}

/// Schema, seed and migration, then the demo or menu if requested.
async fn session<R, W>(cli: &Cli, command: &Command, input: &mut R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let resolver = cli.resolver()?;
    let skip_migration = matches!(
        command,
        Command::Interactive {
            skip_migration: true,
            ..
        }
    );

    writeln!(out, "\n=== Hotel Booking System ===")?;
    writeln!(out, "MySQL (relational) -> Valkey cluster (key-value)\n")?;

    if cli.dry_run {
        let data = seed_dataset();
        writeln!(out, "STEP 1: Dry run, using built-in seed data")?;
        writeln!(out, "  Data: {}", data)?;
        writeln!(out, "\nSTEP 2: In-memory key-value store")?;
        let store = MemoryStore::new();
        let data = (!skip_migration).then_some(&data);
        return drive(&store, data, &resolver, command, input, out).await;
    }

    let data = if skip_migration {
        None
    } else {
        Some(load_source(cli, out).await?)
    };

    writeln!(out, "\nSTEP 2: Connect to Valkey cluster")?;
    let client = connect_valkey(cli).await?;
    writeln!(out, "  Connected to {} seed node(s)", cli.valkey.valkey_nodes.len())?;

    let result = drive(&client, data.as_ref(), &resolver, command, input, out).await;
    if let Err(e) = client.close().await {
        warn!(error = %e, "Failed to close Valkey connection");
    }
    result
}

fn reset_target(command: &Command) -> bool {
    match command {
        Command::Demo(MigrateArgs { reset_target })
        | Command::Migrate(MigrateArgs { reset_target })
        | Command::Interactive {
            migrate: MigrateArgs { reset_target },
            ..
        } => *reset_target,
        Command::Keyslot { .. } | Command::Topology => false,
    }
}

async fn drive<S, R, W>(
    store: &S,
    data: Option<&Dataset>,
    resolver: &TopologyResolver,
    command: &Command,
    input: &mut R,
    out: &mut W,
) -> Result<()>
where
    S: KeyValueStore,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if let Some(data) = data {
        let stats = migrate_step(store, data, resolver, reset_target(command), out).await?;
        info!(%stats, "Migrated");
    }

    let service = QueryService::new(store, resolver);
    match command {
        Command::Demo(_) => {
            writeln!(out, "\nSTEP 4: Query the key-value store")?;
            menu::run_demo(&service, out).await?;
        }
        Command::Interactive { .. } => {
            writeln!(out, "\nSTEP 4: Query the key-value store")?;
            writeln!(out, "  Data is sharded across primaries by hash slot")?;
            menu::run_interactive(&service, input, out).await?;
        }
        Command::Migrate(_) | Command::Keyslot { .. } | Command::Topology => {}
    }

    writeln!(out, "\nDone.")?;
    Ok(())
}

async fn migrate_step<S, W>(
    store: &S,
    data: &Dataset,
    resolver: &TopologyResolver,
    reset: bool,
    out: &mut W,
) -> Result<MigrationStats>
where
    S: KeyValueStore,
    W: Write,
{
    writeln!(out, "\nSTEP 3: Migrate data (relational -> key-value)")?;
    writeln!(out, "  Topology: {}", resolver.mode_name())?;

    if reset {
        let removed = migration::clear_projection(store, data).await?;
        writeln!(out, "  Cleared {} existing key(s)", removed)?;
    }

    match migration::migrate(store, data, resolver, out).await {
        Ok(stats) => {
            writeln!(out, "  Migrated: {}", stats)?;
            Ok(stats)
        }
        Err(e) => {
            error!(error = %e, "Migration failed");
            writeln!(out, "  Partial migration: {}", e.stats)?;
            Err(Error::Migration(e))
        }
    }
}

async fn keyslot<W: Write>(cli: &Cli, keys: &[String], out: &mut W) -> Result<()> {
    let resolver = cli.resolver()?;
    if let TopologyResolver::Static(table) = &resolver {
        for key in keys {
            writeln!(out, "{}", placement_line(key, table).trim_start())?;
        }
        return Ok(());
    }

    let client = connect_valkey(cli).await?;
    let result = live_keyslot(&client, &resolver, keys, out).await;
    if let Err(e) = client.close().await {
        warn!(error = %e, "Failed to close Valkey connection");
    }
    result
}

/// Print placements from the live table and check each slot against
/// `CLUSTER KEYSLOT`.
async fn live_keyslot<W: Write>(
    client: &ValkeyClient,
    resolver: &TopologyResolver,
    keys: &[String],
    out: &mut W,
) -> Result<()> {
    let table = resolver.snapshot(client).await?;
    for key in keys {
        writeln!(out, "{}", placement_line(key, &table).trim_start())?;
        let server_slot = client.cluster_keyslot(key).await?;
        let local_slot = key_slot(key);
        if server_slot != local_slot {
            warn!(key = %key, local_slot, server_slot, "Slot differs from server");
            writeln!(out, "  server reports slot {}", server_slot)?;
        }
    }
    Ok(())
}

fn write_table<W: Write>(out: &mut W, table: &SlotTable) -> std::io::Result<()> {
    for entry in table.iter() {
        writeln!(out, "  {:<12} {}", entry.range.to_string(), entry.owner)?;
    }
    Ok(())
}

async fn topology<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    if cli.dry_run || cli.topology == TopologyMode::Static {
        let TopologyResolver::Static(table) = cli.resolver()? else {
            return Err(Error::Config("static topology expected".to_string()));
        };
        writeln!(out, "Static slot table:")?;
        write_table(out, &table)?;
        return Ok(());
    }

    let client = connect_valkey(cli).await?;
    let overview = client.cluster_overview().await;
    if let Err(e) = client.close().await {
        warn!(error = %e, "Failed to close Valkey connection");
    }
    let overview = overview?;

    writeln!(out, "{}", overview.health_status_message())?;
    writeln!(
        out,
        "State: {}, known nodes: {}, slots assigned: {}",
        overview.info.state, overview.info.known_nodes, overview.info.slots_assigned
    )?;
    writeln!(out, "Live slot table:")?;
    write_table(out, &SlotTable::from_cluster_nodes(&overview.nodes)?)?;

    for node in overview.nodes.nodes.iter().filter(|n| !n.is_healthy()) {
        writeln!(out, "  unhealthy: {} ({})", node.address, node.role())?;
    }
    Ok(())
}
