//! Whole subcommands without any backend: dry runs and static topology.

use booking_migrator::Error;
use booking_migrator::app;
use booking_migrator::config::Cli;
use booking_migrator::slots::TopologyError;
use clap::Parser;

fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("booking-migrator").chain(args.iter().copied())).unwrap()
}

async fn run(args: &[&str], input: &str) -> Result<String, Error> {
    let cli = cli(args);
    let mut input = input.as_bytes();
    let mut out = Vec::new();
    app::run(&cli, &mut input, &mut out).await?;
    Ok(String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn test_dry_run_migrate() {
    let out = run(&["--dry-run", "migrate"], "").await.unwrap();

    assert!(out.contains("STEP 1: Dry run, using built-in seed data"));
    assert!(out.contains("  Data: 5 users, 5 hotels, 6 bookings"));
    assert!(out.contains("  Topology: static"));
    assert!(out.contains("  Migrated: 5 users, 5 hotels, 6 bookings"));
    assert!(!out.contains("STEP 4"));
    assert!(out.trim_end().ends_with("Done."));
}

#[tokio::test]
async fn test_dry_run_migrate_with_reset() {
    let out = run(&["--dry-run", "migrate", "--reset-target"], "")
        .await
        .unwrap();

    assert!(out.contains("  Cleared 0 existing key(s)"));
}

#[tokio::test]
async fn test_dry_run_demo_is_default() {
    let out = run(&["--dry-run"], "").await.unwrap();

    assert!(out.contains("STEP 4: Query the key-value store"));
    assert!(out.contains("--- Get user by ID (1) ---"));
    assert!(out.contains("--- Show key info (user:1) ---"));
    assert!(out.contains("Master: 127.0.0.1:700"));
}

#[tokio::test]
async fn test_dry_run_interactive() {
    let out = run(&["--dry-run", "interactive"], "3\n1\n0\n").await.unwrap();

    assert!(out.contains("Query Menu:"));
    assert!(out.contains("User: Alice Johnson"));
    assert!(out.contains("Booking 2: 2024-07-15 at Mountain Lodge"));
}

#[tokio::test]
async fn test_dry_run_interactive_without_migration() {
    let out = run(&["--dry-run", "interactive", "--skip-migration"], "1\n1\n0\n")
        .await
        .unwrap();

    assert!(!out.contains("STEP 3"));
    assert!(out.contains("User not found"));
}

#[tokio::test]
async fn test_static_keyslot() {
    let out = run(&["--topology", "static", "keyslot", "foo", "hello"], "")
        .await
        .unwrap();

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            "foo -> slot 12182 -> 127.0.0.1:7003 (replica -)",
            "hello -> slot 866 -> 127.0.0.1:7001 (replica -)",
        ]
    );
}

#[tokio::test]
async fn test_keyslot_with_static_ranges() {
    let out = run(
        &[
            "--topology",
            "static",
            "--static-range",
            "0-99=a:1/a:2,100-16383=b:1",
            "keyslot",
            "foo",
        ],
        "",
    )
    .await
    .unwrap();

    assert_eq!(out.trim_end(), "foo -> slot 12182 -> b:1 (replica -)");
}

#[tokio::test]
async fn test_incomplete_static_ranges_fail() {
    let err = run(
        &["--topology", "static", "--static-range", "0-99=a:1", "keyslot", "foo"],
        "",
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Topology(TopologyError::Gap(_))));
}

#[tokio::test]
async fn test_static_topology_table() {
    let out = run(&["--dry-run", "topology"], "").await.unwrap();

    assert!(out.starts_with("Static slot table:"));
    let rows: Vec<&str> = out.lines().skip(1).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].trim_start().starts_with("0-5460"));
    assert!(rows[0].ends_with("127.0.0.1:7001 (replica -)"));
    assert!(rows[2].trim_start().starts_with("10923-16383"));
}
