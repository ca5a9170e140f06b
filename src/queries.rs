//! Lookups against the migrated key-value data.
//!
//! Every result carries the [`KeyPlacement`] of the key it was read from. In
//! live mode each operation fetches a fresh topology snapshot, so a failover
//! between two queries shows up in the second one.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::client::{KeyType, KeyValueStore, ValkeyError};
use crate::projection::keys;
use crate::slots::{SlotOwner, SlotTable, TopologyError, TopologyResolver, key_slot};

/// Errors from a query. A missing key is not an error.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Store(#[from] ValkeyError),

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Where a key lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPlacement {
    pub key: String,
    pub slot: u16,
    /// `None` when no node currently serves the slot.
    pub owner: Option<SlotOwner>,
}

impl KeyPlacement {
    fn new(key: impl Into<String>, table: &SlotTable) -> Self {
        let key = key.into();
        let slot = key_slot(&key);
        let owner = table.resolve(slot).cloned();
        Self { key, slot, owner }
    }

    /// `master 127.0.0.1:7001, replica 127.0.0.1:7004`
    pub fn nodes(&self) -> String {
        match &self.owner {
            Some(owner) => format!(
                "master {}, replica {}",
                owner.primary,
                owner.replica.as_deref().unwrap_or("-")
            ),
            None => "master -, replica -".to_string(),
        }
    }
}

impl std::fmt::Display for KeyPlacement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (primary, replica) = match &self.owner {
            Some(owner) => (owner.primary.as_str(), owner.replica.as_deref().unwrap_or("-")),
            None => ("-", "-"),
        };
        write!(
            f,
            "Key: {}, Slot: {}, Master: {}, Replica: {}",
            self.key, self.slot, primary, replica
        )
    }
}

/// A value together with the placement of the key it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Found<T> {
    pub placement: KeyPlacement,
    pub value: T,
}

fn field(hash: &BTreeMap<String, String>, name: &str) -> String {
    hash.get(name).cloned().unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl UserRecord {
    fn from_hash(hash: &BTreeMap<String, String>) -> Self {
        Self {
            id: field(hash, "id"),
            name: field(hash, "name"),
            email: field(hash, "email"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotelRecord {
    pub id: String,
    pub name: String,
    pub city: String,
}

impl HotelRecord {
    fn from_hash(hash: &BTreeMap<String, String>) -> Self {
        Self {
            id: field(hash, "id"),
            name: field(hash, "name"),
            city: field(hash, "city"),
        }
    }
}

/// A booking joined with the names of its user and hotel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRecord {
    pub id: String,
    pub user_id: String,
    pub hotel_id: String,
    pub date: String,
    /// `None` when the referenced user hash is missing.
    pub user_name: Option<String>,
    /// `None` when the referenced hotel hash is missing.
    pub hotel_name: Option<String>,
}

/// A user and their bookings in list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserBookings {
    pub user: Found<UserRecord>,
    pub bookings: Vec<Found<BookingRecord>>,
}

/// Contents of a key, by type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyContent {
    Hash(BTreeMap<String, String>),
    List(Vec<String>),
    Set(Vec<String>),
    String(String),
    /// A type the menu does not display.
    Other(KeyType),
}

impl std::fmt::Display for KeyContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyContent::Hash(hash) => {
                let pairs: Vec<String> =
                    hash.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
            KeyContent::List(items) | KeyContent::Set(items) => write!(f, "[{}]", items.join(", ")),
            KeyContent::String(value) => write!(f, "{}", value),
            KeyContent::Other(kind) => write!(f, "<{} not shown>", kind),
        }
    }
}

/// What `key_info` reports. `content` is `None` when the key does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    pub placement: KeyPlacement,
    pub key_type: KeyType,
    pub content: Option<KeyContent>,
}

/// Sort ids numerically, with anything non-numeric last.
fn sort_ids(ids: &mut [String]) {
    ids.sort_by_key(|id| (id.parse::<i64>().unwrap_or(i64::MAX), id.clone()));
}

/// Read-only queries over a migrated store.
pub struct QueryService<'a, S> {
    store: &'a S,
    resolver: &'a TopologyResolver,
}

impl<'a, S: KeyValueStore> QueryService<'a, S> {
    pub fn new(store: &'a S, resolver: &'a TopologyResolver) -> Self {
        Self { store, resolver }
    }

    pub fn resolver(&self) -> &TopologyResolver {
        self.resolver
    }

    async fn table(&self) -> Result<std::borrow::Cow<'a, SlotTable>, QueryError> {
        let resolver: &'a TopologyResolver = self.resolver;
        Ok(resolver.snapshot(self.store).await?)
    }

    async fn hash(&self, key: &str) -> Result<Option<BTreeMap<String, String>>, QueryError> {
        let hash = self.store.hgetall(key).await?;
        Ok((!hash.is_empty()).then_some(hash))
    }

    async fn user_with(
        &self,
        id: &str,
        table: &SlotTable,
    ) -> Result<Option<Found<UserRecord>>, QueryError> {
        let key = keys::user(id);
        Ok(self.hash(&key).await?.map(|hash| Found {
            placement: KeyPlacement::new(key, table),
            value: UserRecord::from_hash(&hash),
        }))
    }

    async fn hotel_with(
        &self,
        id: &str,
        table: &SlotTable,
    ) -> Result<Option<Found<HotelRecord>>, QueryError> {
        let key = keys::hotel(id);
        Ok(self.hash(&key).await?.map(|hash| Found {
            placement: KeyPlacement::new(key, table),
            value: HotelRecord::from_hash(&hash),
        }))
    }

    async fn booking_with(
        &self,
        id: &str,
        table: &SlotTable,
    ) -> Result<Option<Found<BookingRecord>>, QueryError> {
        let key = keys::booking(id);
        let Some(hash) = self.hash(&key).await? else {
            return Ok(None);
        };

        let user_id = field(&hash, "user_id");
        let hotel_id = field(&hash, "hotel_id");
        let user_name = self.hash(&keys::user(&user_id)).await?.map(|h| field(&h, "name"));
        let hotel_name = self.hash(&keys::hotel(&hotel_id)).await?.map(|h| field(&h, "name"));

        Ok(Some(Found {
            placement: KeyPlacement::new(key, table),
            value: BookingRecord {
                id: field(&hash, "id"),
                user_id,
                hotel_id,
                date: field(&hash, "date"),
                user_name,
                hotel_name,
            },
        }))
    }

    async fn sorted_members(&self, key: &str) -> Result<Vec<String>, QueryError> {
        let mut ids = self.store.smembers(key).await?;
        sort_ids(&mut ids);
        Ok(ids)
    }

    /// Slot and owner of any key, whether or not it exists.
    #[instrument(skip(self))]
    pub async fn locate(&self, key: &str) -> Result<KeyPlacement, QueryError> {
        let table = self.table().await?;
        Ok(KeyPlacement::new(key, &table))
    }

    #[instrument(skip(self))]
    pub async fn user_by_id(&self, id: &str) -> Result<Option<Found<UserRecord>>, QueryError> {
        let table = self.table().await?;
        self.user_with(id, &table).await
    }

    /// Resolve the email index, then read the user hash.
    #[instrument(skip(self))]
    pub async fn user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Found<UserRecord>>, QueryError> {
        let Some(id) = self.store.get(&keys::user_by_email(email)).await? else {
            debug!("No user with this email");
            return Ok(None);
        };
        let table = self.table().await?;
        self.user_with(&id, &table).await
    }

    /// The user and each booking in `user:{id}:bookings`, in list order.
    #[instrument(skip(self))]
    pub async fn user_bookings(&self, user_id: &str) -> Result<Option<UserBookings>, QueryError> {
        let table = self.table().await?;
        let Some(user) = self.user_with(user_id, &table).await? else {
            return Ok(None);
        };

        let mut bookings = Vec::new();
        for id in self.store.lrange_all(&keys::user_bookings(user_id)).await? {
            if let Some(booking) = self.booking_with(&id, &table).await? {
                bookings.push(booking);
            }
        }

        Ok(Some(UserBookings { user, bookings }))
    }

    #[instrument(skip(self))]
    pub async fn hotel_by_id(&self, id: &str) -> Result<Option<Found<HotelRecord>>, QueryError> {
        let table = self.table().await?;
        self.hotel_with(id, &table).await
    }

    /// Hotels in `city`, ordered by id.
    #[instrument(skip(self))]
    pub async fn hotels_by_city(&self, city: &str) -> Result<Vec<Found<HotelRecord>>, QueryError> {
        let ids = self.sorted_members(&keys::hotels_in_city(city)).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let table = self.table().await?;
        let mut hotels = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(hotel) = self.hotel_with(id, &table).await? {
                hotels.push(hotel);
            }
        }
        Ok(hotels)
    }

    /// The booking with its user and hotel names.
    #[instrument(skip(self))]
    pub async fn booking_by_id(
        &self,
        id: &str,
    ) -> Result<Option<Found<BookingRecord>>, QueryError> {
        let table = self.table().await?;
        self.booking_with(id, &table).await
    }

    #[instrument(skip(self))]
    pub async fn all_users(&self) -> Result<Vec<Found<UserRecord>>, QueryError> {
        let table = self.table().await?;
        let mut users = Vec::new();
        for id in self.sorted_members(keys::USERS_ALL).await? {
            if let Some(user) = self.user_with(&id, &table).await? {
                users.push(user);
            }
        }
        Ok(users)
    }

    #[instrument(skip(self))]
    pub async fn all_hotels(&self) -> Result<Vec<Found<HotelRecord>>, QueryError> {
        let table = self.table().await?;
        let mut hotels = Vec::new();
        for id in self.sorted_members(keys::HOTELS_ALL).await? {
            if let Some(hotel) = self.hotel_with(&id, &table).await? {
                hotels.push(hotel);
            }
        }
        Ok(hotels)
    }

    #[instrument(skip(self))]
    pub async fn all_bookings(&self) -> Result<Vec<Found<BookingRecord>>, QueryError> {
        let table = self.table().await?;
        let mut bookings = Vec::new();
        for id in self.sorted_members(keys::BOOKINGS_ALL).await? {
            if let Some(booking) = self.booking_with(&id, &table).await? {
                bookings.push(booking);
            }
        }
        Ok(bookings)
    }

    /// Existence, type and contents of any key.
    #[instrument(skip(self))]
    pub async fn key_info(&self, key: &str) -> Result<KeyInfo, QueryError> {
        let placement = self.locate(key).await?;

        if !self.store.exists(key).await? {
            return Ok(KeyInfo {
                placement,
                key_type: KeyType::None,
                content: None,
            });
        }

        let key_type = self.store.key_type(key).await?;
        let content = match &key_type {
            KeyType::Hash => KeyContent::Hash(self.store.hgetall(key).await?),
            KeyType::List => KeyContent::List(self.store.lrange_all(key).await?),
            KeyType::Set => {
                let mut members = self.store.smembers(key).await?;
                members.sort();
                KeyContent::Set(members)
            }
            KeyType::String => KeyContent::String(self.store.get(key).await?.unwrap_or_default()),
            other => KeyContent::Other(other.clone()),
        };

        Ok(KeyInfo {
            placement,
            key_type,
            content: Some(content),
        })
    }
}
