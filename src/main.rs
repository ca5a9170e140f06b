//! booking-migrator - migrate the hotel booking schema from MySQL into a
//! Valkey cluster and show hash-slot placement.
//!
//! This is the entry point that:
//! - Parses command line and environment configuration
//! - Initializes structured logging on stderr
//! - Runs the selected subcommand with stdin/stdout

use clap::Parser;
use tokio::io::BufReader;
use tracing::{error, info};

use booking_migrator::app;
use booking_migrator::config::{Cli, LogFormat};

fn init_tracing(format: LogFormat) -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("booking_migrator=info".parse()?)
        .add_directive("sqlx=warn".parse()?)
        .add_directive("fred=warn".parse()?);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    info!(
        topology = ?cli.effective_topology(),
        dry_run = cli.dry_run,
        "Starting booking-migrator"
    );

    let mut input = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();

    if let Err(e) = app::run(&cli, &mut input, &mut out).await {
        error!(error = %e, "Run failed");
        return Err(e.into());
    }
    Ok(())
}
