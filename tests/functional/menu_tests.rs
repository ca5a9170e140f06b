//! The query menu driven by scripted input.

use booking_migrator::client::MemoryStore;
use booking_migrator::menu::{self, MenuAction};
use booking_migrator::migration::migrate;
use booking_migrator::queries::QueryService;
use booking_migrator::relational::seed_dataset;
use booking_migrator::slots::{TopologyResolver, key_slot};

use crate::common::fixtures::static_resolver;

async fn seeded(resolver: &TopologyResolver) -> MemoryStore {
    let store = MemoryStore::new();
    migrate(&store, &seed_dataset(), resolver, &mut Vec::new())
        .await
        .unwrap();
    store
}

async fn run_script(store: &MemoryStore, resolver: &TopologyResolver, script: &str) -> String {
    let queries = QueryService::new(store, resolver);
    let mut input = script.as_bytes();
    let mut out = Vec::new();
    menu::run_interactive(&queries, &mut input, &mut out)
        .await
        .unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_user_then_city_then_exit() {
    let resolver = static_resolver();
    let store = seeded(&resolver).await;

    let out = run_script(&store, &resolver, "1\n1\n5\nNew York\n0\n").await;

    assert!(out.contains(&format!("Key: user:1, Slot: {}, Master: ", key_slot("user:1"))));
    assert!(out.contains("Name: Alice Johnson, Email: alice@example.com"));
    assert!(out.contains("[1] Grand Plaza (slot "));
    assert!(out.contains("[4] Central Park Inn (slot "));
    assert_eq!(out.matches("Query Menu:").count(), 3);
}

#[tokio::test]
async fn test_not_found_messages() {
    let resolver = static_resolver();
    let store = seeded(&resolver).await;

    let out = run_script(
        &store,
        &resolver,
        "1\n99\n2\nnobody@example.com\n4\n99\n6\n99\n5\nAtlantis\n0\n",
    )
    .await;

    assert_eq!(out.matches("User not found").count(), 2);
    assert!(out.contains("Hotel not found"));
    assert!(out.contains("Booking not found"));
    assert!(out.contains("No hotels found"));
}

#[tokio::test]
async fn test_invalid_choice_and_blank_answer() {
    let resolver = static_resolver();
    let store = seeded(&resolver).await;

    let out = run_script(&store, &resolver, "42\n1\n\n0\n").await;

    assert!(out.contains("Invalid choice: '42'"));
    assert!(!out.contains("Name: "));
    assert_eq!(out.matches("Query Menu:").count(), 3);
}

#[tokio::test]
async fn test_end_of_input_exits() {
    let resolver = static_resolver();
    let store = seeded(&resolver).await;

    let out = run_script(&store, &resolver, "7\n").await;

    assert!(out.contains("[5] Eva Green - master "));
    assert_eq!(out.matches("Query Menu:").count(), 2);
}

#[tokio::test]
async fn test_key_info_for_missing_key() {
    let resolver = static_resolver();
    let store = seeded(&resolver).await;

    let out = run_script(&store, &resolver, "10\nuser:77\n10\nuser:1:bookings\n0\n").await;

    assert!(out.contains("Key 'user:77' does NOT exist"));
    assert!(out.contains(&format!("(Would be at Slot: {}, master ", key_slot("user:77"))));
    assert!(out.contains("Type: list"));
}

#[tokio::test]
async fn test_query_failure_keeps_menu_running() {
    // Live mode with no cluster reply: every lookup fails.
    let store = MemoryStore::new();
    let resolver = TopologyResolver::Live;

    let out = run_script(&store, &resolver, "7\n8\n0\n").await;

    assert_eq!(out.matches("Query failed: ").count(), 2);
    assert_eq!(out.matches("Query Menu:").count(), 3);
}

#[tokio::test]
async fn test_demo_runs_every_query() {
    let resolver = static_resolver();
    let store = seeded(&resolver).await;
    let queries = QueryService::new(&store, &resolver);
    let mut out = Vec::new();

    menu::run_demo(&queries, &mut out).await.unwrap();
    let out = String::from_utf8(out).unwrap();

    assert_eq!(out.matches("\n--- ").count(), menu::demo_script().len());
    assert!(out.contains("--- Get hotels by city (New York) ---"));
    assert!(out.contains("User: Alice Johnson"));
    assert!(out.contains("[6] Eva Green booked Grand Plaza on 2024-10-12 - master "));
    assert!(out.contains("Type: hash"));
}

#[tokio::test]
async fn test_execute_single_action() {
    let resolver = static_resolver();
    let store = seeded(&resolver).await;
    let queries = QueryService::new(&store, &resolver);
    let mut out = Vec::new();

    menu::execute(&queries, &MenuAction::UserBookings("1".to_string()), &mut out)
        .await
        .unwrap();
    let out = String::from_utf8(out).unwrap();

    let first = out.find("Booking 1: 2024-06-01 at Grand Plaza").unwrap();
    let second = out.find("Booking 2: 2024-07-15 at Mountain Lodge").unwrap();
    assert!(first < second);
}
