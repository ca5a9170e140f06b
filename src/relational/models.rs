//! Rows of the three relational tables.

use chrono::NaiveDate;

/// A row of `Users`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
}

/// A row of `Hotels`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Hotel {
    pub id: i32,
    pub name: String,
    pub city: String,
}

/// A row of `Bookings`. `user_id` and `hotel_id` reference `Users` and `Hotels`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Booking {
    pub id: i32,
    pub user_id: i32,
    pub hotel_id: i32,
    pub date: NaiveDate,
}

/// Every row of every table, each in primary-key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub users: Vec<User>,
    pub hotels: Vec<Hotel>,
    pub bookings: Vec<Booking>,
}

impl Dataset {
    pub fn user(&self, id: i32) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn hotel(&self, id: i32) -> Option<&Hotel> {
        self.hotels.iter().find(|h| h.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.hotels.is_empty() && self.bookings.is_empty()
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} users, {} hotels, {} bookings",
            self.users.len(),
            self.hotels.len(),
            self.bookings.len()
        )
    }
}
