//! Tests against a live MySQL server.

use booking_migrator::relational::{MySqlSettings, MySqlSource, SourceError, seed_dataset};

use crate::common::fixtures::DatasetBuilder;

fn settings() -> MySqlSettings {
    MySqlSettings::default().with_database("booking_migrator_test")
}

async fn connect() -> MySqlSource {
    let mut source = MySqlSource::connect(&settings())
        .await
        .expect("MySQL should be reachable on localhost:3306");
    source.create_tables().await.unwrap();
    source
}

#[tokio::test]
#[ignore = "requires MySQL on localhost:3306 with database booking_migrator_test"]
async fn test_seed_then_fetch() {
    let mut source = connect().await;

    source.seed(&seed_dataset()).await.unwrap();
    let data = source.fetch_dataset().await.unwrap();
    assert_eq!(data, seed_dataset());

    source.close().await.unwrap();
}

#[tokio::test]
#[ignore = "requires MySQL on localhost:3306 with database booking_migrator_test"]
async fn test_reseeding_counts_duplicates() {
    let mut source = connect().await;

    source.seed(&seed_dataset()).await.unwrap();
    let report = source.seed(&seed_dataset()).await.unwrap();
    assert_eq!(report.users.inserted, 0);
    assert_eq!(report.users.duplicates, 5);
    assert_eq!(report.bookings.duplicates, 6);

    source.close().await.unwrap();
}

#[tokio::test]
#[ignore = "requires MySQL on localhost:3306 with database booking_migrator_test"]
async fn test_dangling_booking_is_rejected_by_foreign_key() {
    let mut source = connect().await;
    source.seed(&seed_dataset()).await.unwrap();

    let extra = DatasetBuilder::new().booking(900, 4242, 1, "2024-12-01").build();
    let report = source.insert_bookings(&extra.bookings).await.unwrap();
    assert_eq!(report.inserted, 0);
    assert_eq!(report.dangling, 1);

    source.close().await.unwrap();
}

#[tokio::test]
#[ignore = "requires nothing listening on 127.0.0.1:1"]
async fn test_unreachable_server_is_connectivity_error() {
    let mut settings = settings();
    settings.host = "127.0.0.1".to_string();
    settings.port = 1;

    let err = MySqlSource::connect(&settings).await.err().unwrap();
    assert!(matches!(err, SourceError::Database(_) | SourceError::Timeout { .. }));
    assert!(err.is_connectivity());
}
