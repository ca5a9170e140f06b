//! Tests against a live Valkey cluster.

use std::time::Duration;

use booking_migrator::client::{KeyValueStore, ValkeyClient, ValkeyClientConfig};
use booking_migrator::migration::{clear_projection, migrate};
use booking_migrator::queries::QueryService;
use booking_migrator::relational::seed_dataset;
use booking_migrator::retry::{RetryPolicy, connect_with_retry};
use booking_migrator::slots::{TopologyResolver, key_slot};

async fn connect() -> ValkeyClient {
    let config = ValkeyClientConfig::new(vec![
        ("127.0.0.1".to_string(), 7001),
        ("127.0.0.1".to_string(), 7002),
        ("127.0.0.1".to_string(), 7003),
    ]);
    connect_with_retry("valkey", RetryPolicy::new(5, Duration::from_secs(1)), || {
        ValkeyClient::connect(config.clone())
    })
    .await
    .expect("Valkey cluster should be reachable on 127.0.0.1:7001-7003")
}

#[tokio::test]
#[ignore = "requires a Valkey cluster on 127.0.0.1:7001-7006"]
async fn test_keyslot_matches_server() {
    let client = connect().await;

    for key in ["foo", "user:1", "hotels:city:New York", "user:email:alice@example.com", ""] {
        assert_eq!(client.cluster_keyslot(key).await.unwrap(), key_slot(key), "key '{}'", key);
    }

    client.close().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a Valkey cluster on 127.0.0.1:7001-7006"]
async fn test_live_table_covers_cluster() {
    let client = connect().await;

    let overview = client.cluster_overview().await.unwrap();
    assert!(overview.info.is_healthy(), "{}", overview.health_status_message());

    let table = TopologyResolver::Live.snapshot(&client).await.unwrap();
    assert!(table.covers_all_slots());
    assert_eq!(table.iter().count(), overview.nodes.masters().len());

    client.close().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a Valkey cluster on 127.0.0.1:7001-7006"]
async fn test_migrate_seed_into_cluster() {
    let client = connect().await;
    let data = seed_dataset();
    let resolver = TopologyResolver::Live;

    clear_projection(&client, &data).await.unwrap();
    let stats = migrate(&client, &data, &resolver, &mut Vec::new())
        .await
        .unwrap();
    assert_eq!(stats.bookings, 6);

    assert_eq!(
        client.lrange_all("user:1:bookings").await.unwrap(),
        vec!["1", "2"]
    );

    let queries = QueryService::new(&client, &resolver);
    let user = queries
        .user_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.value.name, "Alice Johnson");
    assert!(user.placement.owner.is_some());

    let hotels = queries.hotels_by_city("New York").await.unwrap();
    assert_eq!(hotels.len(), 2);

    client.close().await.unwrap();
}
