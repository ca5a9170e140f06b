//! Migration of the seed data into the in-memory store.

use booking_migrator::client::{KeyType, KeyValueStore, MemoryStore};
use booking_migrator::migration::{MigrationStats, clear_projection, migrate};
use booking_migrator::projection::{keys, project};
use booking_migrator::relational::seed_dataset;
use booking_migrator::slots::{TopologyResolver, key_slot};

use crate::common::fixtures::{DatasetBuilder, static_resolver};

async fn migrated() -> (MemoryStore, String) {
    let store = MemoryStore::new();
    let mut out = Vec::new();
    migrate(&store, &seed_dataset(), &static_resolver(), &mut out)
        .await
        .unwrap();
    (store, String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn test_user_hash_and_indexes() {
    let (store, _) = migrated().await;

    let user = store.hgetall("user:1").await.unwrap();
    assert_eq!(user["id"], "1");
    assert_eq!(user["name"], "Alice Johnson");
    assert_eq!(user["email"], "alice@example.com");

    let mut users = store.smembers(keys::USERS_ALL).await.unwrap();
    users.sort();
    assert_eq!(users, vec!["1", "2", "3", "4", "5"]);

    assert_eq!(
        store.get("user:email:alice@example.com").await.unwrap().as_deref(),
        Some("1")
    );
}

#[tokio::test]
async fn test_booking_hash_fields() {
    let (store, _) = migrated().await;

    let booking = store.hgetall("booking:2").await.unwrap();
    assert_eq!(booking["user_id"], "1");
    assert_eq!(booking["hotel_id"], "3");
    assert_eq!(booking["date"], "2024-07-15");
    assert_eq!(store.key_type("booking:2").await.unwrap(), KeyType::Hash);
}

#[tokio::test]
async fn test_user_bookings_keep_insertion_order() {
    let (store, _) = migrated().await;

    assert_eq!(store.lrange_all("user:1:bookings").await.unwrap(), vec!["1", "2"]);
    assert_eq!(store.lrange_all("user:5:bookings").await.unwrap(), vec!["6"]);
    assert_eq!(store.key_type("user:1:bookings").await.unwrap(), KeyType::List);
}

#[tokio::test]
async fn test_city_index() {
    let (store, _) = migrated().await;

    let mut new_york = store.smembers("hotels:city:New York").await.unwrap();
    new_york.sort();
    assert_eq!(new_york, vec!["1", "4"]);
    assert_eq!(
        store.smembers("hotels:city:San Francisco").await.unwrap(),
        vec!["5"]
    );
}

#[tokio::test]
async fn test_store_holds_exactly_the_projection() {
    let (store, _) = migrated().await;

    let expected: Vec<String> = project(&seed_dataset()).keys().into_iter().collect();
    assert_eq!(store.keys(), expected);
    assert_eq!(store.len(), 33);
}

#[tokio::test]
async fn test_output_reports_each_placement() {
    let (_, out) = migrated().await;

    let slot = key_slot("hotel:3");
    assert!(out.contains(&format!("    hotel:3 -> slot {} -> ", slot)));
    assert!(out.contains("  Users (row -> hash):"));

    let users_at = out.find("user:5 -> slot").unwrap();
    let hotels_at = out.find("hotel:1 -> slot").unwrap();
    let bookings_at = out.find("booking:1 -> slot").unwrap();
    assert!(users_at < hotels_at && hotels_at < bookings_at);
}

#[tokio::test]
async fn test_rerun_appends_list_entries_again() {
    let store = MemoryStore::new();
    let data = seed_dataset();
    let resolver = static_resolver();

    migrate(&store, &data, &resolver, &mut Vec::new()).await.unwrap();
    migrate(&store, &data, &resolver, &mut Vec::new()).await.unwrap();

    assert_eq!(
        store.lrange_all("user:1:bookings").await.unwrap(),
        vec!["1", "2", "1", "2"]
    );
    // Hashes, sets and lookups converge.
    assert_eq!(store.len(), 33);
    assert_eq!(store.smembers(keys::USERS_ALL).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_reset_before_rerun_keeps_lists_single() {
    let store = MemoryStore::new();
    let data = seed_dataset();
    let resolver = static_resolver();

    migrate(&store, &data, &resolver, &mut Vec::new()).await.unwrap();
    assert_eq!(clear_projection(&store, &data).await.unwrap(), 33);
    migrate(&store, &data, &resolver, &mut Vec::new()).await.unwrap();

    assert_eq!(store.lrange_all("user:1:bookings").await.unwrap(), vec!["1", "2"]);
}

#[tokio::test]
async fn test_dangling_booking_is_skipped() {
    let data = DatasetBuilder::seeded()
        .booking(7, 42, 1, "2024-11-01")
        .booking(8, 2, 99, "2024-11-02")
        .build();
    let store = MemoryStore::new();
    let mut out = Vec::new();

    let stats = migrate(&store, &data, &static_resolver(), &mut out)
        .await
        .unwrap();

    assert_eq!(
        stats,
        MigrationStats {
            users: 5,
            hotels: 5,
            bookings: 6,
            skipped_bookings: 2,
        }
    );
    assert!(!store.exists("booking:7").await.unwrap());
    assert!(!store.exists("user:42:bookings").await.unwrap());
    assert_eq!(store.lrange_all("user:2:bookings").await.unwrap(), vec!["3"]);

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("    skipped: booking 7 references missing user 42"));
    assert!(out.contains("    skipped: booking 8 references missing hotel 99"));
}

#[tokio::test]
async fn test_empty_dataset_writes_nothing() {
    let store = MemoryStore::new();
    let stats = migrate(
        &store,
        &DatasetBuilder::new().build(),
        &static_resolver(),
        &mut Vec::new(),
    )
    .await
    .unwrap();

    assert_eq!(stats, MigrationStats::default());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_partial_failure_leaves_earlier_writes() {
    let store = MemoryStore::new();
    // Five users cost fifteen writes, the first hotel three more.
    store.set_write_budget(Some(18));

    let err = migrate(&store, &seed_dataset(), &static_resolver(), &mut Vec::new())
        .await
        .unwrap_err();

    assert_eq!(err.stats.users, 5);
    assert_eq!(err.stats.hotels, 1);
    assert_eq!(err.stats.bookings, 0);

    store.set_write_budget(None);
    assert!(store.exists("hotel:1").await.unwrap());
    assert!(!store.exists("hotel:2").await.unwrap());
}

#[tokio::test]
async fn test_live_without_cluster_fails_up_front() {
    let store = MemoryStore::new();
    let err = migrate(&store, &seed_dataset(), &TopologyResolver::Live, &mut Vec::new())
        .await
        .unwrap_err();

    assert_eq!(err.stats, MigrationStats::default());
    assert!(store.is_empty());
}
