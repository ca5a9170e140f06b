//! Relational rows to key-value records.
//!
//! [`project`] is a pure function of the [`Dataset`]: it decides every key
//! and value the migration writes, without touching a store.

use std::collections::BTreeSet;
use std::fmt::Display;

use crate::relational::{Booking, Dataset, Hotel, User};

/// Key names shared by the migration and the queries.
pub mod keys {
    use std::fmt::Display;

    /// Set of every user id.
    pub const USERS_ALL: &str = "users:all";
    /// Set of every hotel id.
    pub const HOTELS_ALL: &str = "hotels:all";
    /// Set of every booking id.
    pub const BOOKINGS_ALL: &str = "bookings:all";

    pub fn user(id: impl Display) -> String {
        format!("user:{}", id)
    }

    pub fn hotel(id: impl Display) -> String {
        format!("hotel:{}", id)
    }

    pub fn booking(id: impl Display) -> String {
        format!("booking:{}", id)
    }

    /// List of a user's booking ids.
    pub fn user_bookings(user_id: impl Display) -> String {
        format!("user:{}:bookings", user_id)
    }

    /// Set of hotel ids in a city.
    pub fn hotels_in_city(city: &str) -> String {
        format!("hotels:city:{}", city)
    }

    /// Email to user id lookup.
    pub fn user_by_email(email: &str) -> String {
        format!("user:email:{}", email)
    }
}

/// Which table a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Hotel,
    Booking,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::User => write!(f, "user"),
            Entity::Hotel => write!(f, "hotel"),
            Entity::Booking => write!(f, "booking"),
        }
    }
}

/// A secondary write that accompanies a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexWrite {
    /// `SADD key member`
    SetMember { key: String, member: String },
    /// `SET key value`
    Lookup { key: String, value: String },
    /// `RPUSH key value`
    ListAppend { key: String, value: String },
}

impl IndexWrite {
    pub fn key(&self) -> &str {
        match self {
            IndexWrite::SetMember { key, .. }
            | IndexWrite::Lookup { key, .. }
            | IndexWrite::ListAppend { key, .. } => key,
        }
    }

    fn set_member(key: String, member: impl Display) -> Self {
        IndexWrite::SetMember {
            key,
            member: member.to_string(),
        }
    }
}

/// One row as a hash plus its index entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub entity: Entity,
    pub id: i32,
    /// Key of the hash holding the row.
    pub key: String,
    pub fields: Vec<(&'static str, String)>,
    pub indexes: Vec<IndexWrite>,
}

/// A booking left out of the projection because a referenced row is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingBooking {
    pub booking_id: i32,
    pub missing: Entity,
    pub missing_id: i32,
}

impl std::fmt::Display for DanglingBooking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "booking {} references missing {} {}",
            self.booking_id, self.missing, self.missing_id
        )
    }
}

/// Everything a migration writes, in write order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    /// Users, then hotels, then bookings.
    pub records: Vec<Record>,
    pub dangling: Vec<DanglingBooking>,
}

impl Projection {
    /// Every key the projection writes, deduplicated.
    pub fn keys(&self) -> BTreeSet<String> {
        self.records
            .iter()
            .flat_map(|r| {
                std::iter::once(r.key.clone()).chain(r.indexes.iter().map(|i| i.key().to_string()))
            })
            .collect()
    }
}

fn user_record(user: &User) -> Record {
    Record {
        entity: Entity::User,
        id: user.id,
        key: keys::user(user.id),
        fields: vec![
            ("id", user.id.to_string()),
            ("name", user.name.clone()),
            ("email", user.email.clone()),
        ],
        indexes: vec![
            IndexWrite::set_member(keys::USERS_ALL.to_string(), user.id),
            IndexWrite::Lookup {
                key: keys::user_by_email(&user.email),
                value: user.id.to_string(),
            },
        ],
    }
}

fn hotel_record(hotel: &Hotel) -> Record {
    Record {
        entity: Entity::Hotel,
        id: hotel.id,
        key: keys::hotel(hotel.id),
        fields: vec![
            ("id", hotel.id.to_string()),
            ("name", hotel.name.clone()),
            ("city", hotel.city.clone()),
        ],
        indexes: vec![
            IndexWrite::set_member(keys::HOTELS_ALL.to_string(), hotel.id),
            IndexWrite::set_member(keys::hotels_in_city(&hotel.city), hotel.id),
        ],
    }
}

fn booking_record(booking: &Booking) -> Record {
    Record {
        entity: Entity::Booking,
        id: booking.id,
        key: keys::booking(booking.id),
        fields: vec![
            ("id", booking.id.to_string()),
            ("user_id", booking.user_id.to_string()),
            ("hotel_id", booking.hotel_id.to_string()),
            ("date", booking.date.format("%Y-%m-%d").to_string()),
        ],
        indexes: vec![
            IndexWrite::ListAppend {
                key: keys::user_bookings(booking.user_id),
                value: booking.id.to_string(),
            },
            IndexWrite::set_member(keys::BOOKINGS_ALL.to_string(), booking.id),
        ],
    }
}

fn dangling(data: &Dataset, booking: &Booking) -> Option<DanglingBooking> {
    let missing = if data.user(booking.user_id).is_none() {
        (Entity::User, booking.user_id)
    } else if data.hotel(booking.hotel_id).is_none() {
        (Entity::Hotel, booking.hotel_id)
    } else {
        return None;
    };
    Some(DanglingBooking {
        booking_id: booking.id,
        missing: missing.0,
        missing_id: missing.1,
    })
}

/// Build the key-value projection of `data`.
///
/// Bookings whose user or hotel is not in `data` are reported in
/// [`Projection::dangling`] instead of being projected.
pub fn project(data: &Dataset) -> Projection {
    let mut projection = Projection::default();

    projection.records.extend(data.users.iter().map(user_record));
    projection.records.extend(data.hotels.iter().map(hotel_record));

    for booking in &data.bookings {
        match dangling(data, booking) {
            Some(d) => projection.dangling.push(d),
            None => projection.records.push(booking_record(booking)),
        }
    }

    projection
}
