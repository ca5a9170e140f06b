//! Demo rows loaded into MySQL before migrating.

use chrono::NaiveDate;

use super::models::{Booking, Dataset, Hotel, User};

fn user(id: i32, name: &str, email: &str) -> User {
    User {
        id,
        name: name.to_string(),
        email: email.to_string(),
    }
}

fn hotel(id: i32, name: &str, city: &str) -> Hotel {
    Hotel {
        id,
        name: name.to_string(),
        city: city.to_string(),
    }
}

fn booking(id: i32, user_id: i32, hotel_id: i32, (y, m, d): (i32, u32, u32)) -> Booking {
    Booking {
        id,
        user_id,
        hotel_id,
        // All seed dates are valid calendar dates.
        date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
    }
}

/// Five users, five hotels and six bookings with fixed ids.
///
/// Alice (user 1) holds bookings 1 and 2, and hotels 1 and 4 are in New York.
pub fn seed_dataset() -> Dataset {
    Dataset {
        users: vec![
            user(1, "Alice Johnson", "alice@example.com"),
            user(2, "Bob Smith", "bob@example.com"),
            user(3, "Carol White", "carol@example.com"),
            user(4, "David Brown", "david@example.com"),
            user(5, "Eva Green", "eva@example.com"),
        ],
        hotels: vec![
            hotel(1, "Grand Plaza", "New York"),
            hotel(2, "Ocean View Resort", "Miami"),
            hotel(3, "Mountain Lodge", "Denver"),
            hotel(4, "Central Park Inn", "New York"),
            hotel(5, "Golden Gate Suites", "San Francisco"),
        ],
        bookings: vec![
            booking(1, 1, 1, (2024, 6, 1)),
            booking(2, 1, 3, (2024, 7, 15)),
            booking(3, 2, 2, (2024, 6, 10)),
            booking(4, 3, 4, (2024, 8, 20)),
            booking(5, 4, 5, (2024, 9, 5)),
            booking(6, 5, 1, (2024, 10, 12)),
        ],
    }
}
