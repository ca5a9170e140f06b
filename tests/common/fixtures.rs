//! Fixtures for the seed dataset, slot tables and `CLUSTER NODES` replies.

#![allow(dead_code)]

use booking_migrator::relational::{Booking, Dataset, Hotel, User, seed_dataset};
use booking_migrator::slots::{SlotOwner, SlotTable, TopologyResolver};
use chrono::NaiveDate;

/// Three primaries on 7001-7003, each with one replica on 7004-7006.
pub const CLUSTER_NODES: &str = "\
67ed2db8d677e59ec4a4cefb06858cf2a1a89fa1 127.0.0.1:7001@17001 myself,master - 0 0 1 connected 0-5460
07c37dfeb235213a872192d90877d0cd55635b91 127.0.0.1:7002@17002 master - 0 0 2 connected 5461-10922
292f8b365bb7edb5e285caf0b7e6ddc7265d2f4f 127.0.0.1:7003@17003 master - 0 0 3 connected 10923-16383
e7d1eecce10fd6bb5eb35b9f99a514335d9ba9ca 127.0.0.1:7004@17004 slave 07c37dfeb235213a872192d90877d0cd55635b91 0 0 2 connected
a1b2c3d4e5f60718293a4b5c6d7e8f9012345678 127.0.0.1:7005@17005 slave 292f8b365bb7edb5e285caf0b7e6ddc7265d2f4f 0 0 3 connected
f0e1d2c3b4a5968778695a4b3c2d1e0f12345678 127.0.0.1:7006@17006 slave 67ed2db8d677e59ec4a4cefb06858cf2a1a89fa1 0 0 1 connected";

/// [`CLUSTER_NODES`] after 7002 failed and its replica 7004 took over.
pub fn cluster_nodes_after_failover() -> String {
    CLUSTER_NODES
        .replace(
            "127.0.0.1:7002@17002 master - 0 0 2 connected 5461-10922",
            "127.0.0.1:7002@17002 master,fail - 0 0 2 disconnected",
        )
        .replace(
            "127.0.0.1:7004@17004 slave 07c37dfeb235213a872192d90877d0cd55635b91 0 0 2 connected",
            "127.0.0.1:7004@17004 master - 0 0 4 connected 5461-10922",
        )
}

/// The 3-primary layout with replicas, as a static table.
pub fn three_node_table() -> SlotTable {
    SlotTable::even(vec![
        SlotOwner::new("127.0.0.1:7001", Some("127.0.0.1:7006".to_string())),
        SlotOwner::new("127.0.0.1:7002", Some("127.0.0.1:7004".to_string())),
        SlotOwner::new("127.0.0.1:7003", Some("127.0.0.1:7005".to_string())),
    ])
    .expect("three owners always partition the slot space")
}

pub fn static_resolver() -> TopologyResolver {
    TopologyResolver::Static(three_node_table())
}

/// Builder for small datasets beyond the seed rows.
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    data: Dataset,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the seed rows.
    pub fn seeded() -> Self {
        Self {
            data: seed_dataset(),
        }
    }

    pub fn user(mut self, id: i32, name: &str, email: &str) -> Self {
        self.data.users.push(User {
            id,
            name: name.to_string(),
            email: email.to_string(),
        });
        self
    }

    pub fn hotel(mut self, id: i32, name: &str, city: &str) -> Self {
        self.data.hotels.push(Hotel {
            id,
            name: name.to_string(),
            city: city.to_string(),
        });
        self
    }

    pub fn booking(mut self, id: i32, user_id: i32, hotel_id: i32, date: &str) -> Self {
        self.data.bookings.push(Booking {
            id,
            user_id,
            hotel_id,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("fixture dates are valid"),
        });
        self
    }

    pub fn build(self) -> Dataset {
        self.data
    }
}
