//! Interactive query menu and the scripted demo.
//!
//! Both drive a [`QueryService`] through [`MenuAction`]s and print plain text.
//! Input and output are generic so the menu can run against scripted input.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::client::KeyValueStore;
use crate::error::Result;
use crate::queries::{BookingRecord, Found, KeyPlacement, QueryService};

/// One query the menu can run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    UserById(String),
    UserByEmail(String),
    UserBookings(String),
    HotelById(String),
    HotelsByCity(String),
    BookingById(String),
    AllUsers,
    AllHotels,
    AllBookings,
    KeyInfo(String),
}

impl MenuAction {
    fn title(&self) -> String {
        match self {
            MenuAction::UserById(id) => format!("Get user by ID ({})", id),
            MenuAction::UserByEmail(email) => format!("Get user by email ({})", email),
            MenuAction::UserBookings(id) => format!("Get user's bookings ({})", id),
            MenuAction::HotelById(id) => format!("Get hotel by ID ({})", id),
            MenuAction::HotelsByCity(city) => format!("Get hotels by city ({})", city),
            MenuAction::BookingById(id) => format!("Get booking by ID ({})", id),
            MenuAction::AllUsers => "List all users".to_string(),
            MenuAction::AllHotels => "List all hotels".to_string(),
            MenuAction::AllBookings => "List all bookings".to_string(),
            MenuAction::KeyInfo(key) => format!("Show key info ({})", key),
        }
    }
}

/// What a menu choice needs before it can run.
enum Choice {
    Exit,
    Ready(MenuAction),
    Needs(&'static str, fn(String) -> MenuAction),
    Invalid,
}

const MENU: &str = "\nQuery Menu:
1. Get user by ID
2. Get user by email
3. Get user's bookings
4. Get hotel by ID
5. Get hotels by city
6. Get booking by ID
7. List all users
8. List all hotels
9. List all bookings
10. Show key info
0. Exit";

fn parse_choice(choice: &str) -> Choice {
    match choice {
        "0" => Choice::Exit,
        "1" => Choice::Needs("User ID: ", MenuAction::UserById),
        "2" => Choice::Needs("Email: ", MenuAction::UserByEmail),
        "3" => Choice::Needs("User ID: ", MenuAction::UserBookings),
        "4" => Choice::Needs("Hotel ID: ", MenuAction::HotelById),
        "5" => Choice::Needs("City: ", MenuAction::HotelsByCity),
        "6" => Choice::Needs("Booking ID: ", MenuAction::BookingById),
        "7" => Choice::Ready(MenuAction::AllUsers),
        "8" => Choice::Ready(MenuAction::AllHotels),
        "9" => Choice::Ready(MenuAction::AllBookings),
        "10" => Choice::Needs("Key (e.g. user:1): ", MenuAction::KeyInfo),
        _ => Choice::Invalid,
    }
}

/// Print `label` and read one trimmed line. `None` at end of input.
async fn prompt<R, W>(input: &mut R, out: &mut W, label: &str) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write!(out, "{}", label)?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn name_or_unknown(name: &Option<String>) -> &str {
    name.as_deref().unwrap_or("?")
}

fn short_placement(placement: &KeyPlacement) -> String {
    format!("slot {}, {}", placement.slot, placement.nodes())
}

fn write_booking_line<W: Write>(
    out: &mut W,
    booking: &Found<BookingRecord>,
) -> std::io::Result<()> {
    let b = &booking.value;
    writeln!(
        out,
        "[{}] {} booked {} on {} - {}",
        b.id,
        name_or_unknown(&b.user_name),
        name_or_unknown(&b.hotel_name),
        b.date,
        booking.placement.nodes()
    )
}

/// Run one action and print its result.
pub async fn execute<S, W>(
    service: &QueryService<'_, S>,
    action: &MenuAction,
    out: &mut W,
) -> Result<()>
where
    S: KeyValueStore,
    W: Write,
{
    debug!(?action, "Running query");
    match action {
        MenuAction::UserById(id) => match service.user_by_id(id).await? {
            Some(user) => {
                writeln!(out, "{}", user.placement)?;
                writeln!(out, "Name: {}, Email: {}", user.value.name, user.value.email)?;
            }
            None => writeln!(out, "User not found")?,
        },
        MenuAction::UserByEmail(email) => match service.user_by_email(email).await? {
            Some(user) => writeln!(
                out,
                "ID: {}, Name: {}, Email: {}",
                user.value.id, user.value.name, user.value.email
            )?,
            None => writeln!(out, "User not found")?,
        },
        MenuAction::UserBookings(id) => match service.user_bookings(id).await? {
            Some(result) => {
                writeln!(out, "User: {}", result.user.value.name)?;
                if result.bookings.is_empty() {
                    writeln!(out, "No bookings")?;
                }
                for booking in &result.bookings {
                    writeln!(
                        out,
                        "Booking {}: {} at {} ({})",
                        booking.value.id,
                        booking.value.date,
                        name_or_unknown(&booking.value.hotel_name),
                        short_placement(&booking.placement)
                    )?;
                }
            }
            None => writeln!(out, "User not found")?,
        },
        MenuAction::HotelById(id) => match service.hotel_by_id(id).await? {
            Some(hotel) => {
                writeln!(out, "{}", hotel.placement)?;
                writeln!(out, "Name: {}, City: {}", hotel.value.name, hotel.value.city)?;
            }
            None => writeln!(out, "Hotel not found")?,
        },
        MenuAction::HotelsByCity(city) => {
            let hotels = service.hotels_by_city(city).await?;
            if hotels.is_empty() {
                writeln!(out, "No hotels found")?;
            }
            for hotel in &hotels {
                writeln!(
                    out,
                    "[{}] {} ({})",
                    hotel.value.id,
                    hotel.value.name,
                    short_placement(&hotel.placement)
                )?;
            }
        }
        MenuAction::BookingById(id) => match service.booking_by_id(id).await? {
            Some(booking) => {
                writeln!(out, "{}", booking.placement)?;
                writeln!(
                    out,
                    "Date: {}, User: {}, Hotel: {}",
                    booking.value.date,
                    name_or_unknown(&booking.value.user_name),
                    name_or_unknown(&booking.value.hotel_name)
                )?;
            }
            None => writeln!(out, "Booking not found")?,
        },
        MenuAction::AllUsers => {
            for user in service.all_users().await? {
                writeln!(
                    out,
                    "[{}] {} - {}",
                    user.value.id,
                    user.value.name,
                    user.placement.nodes()
                )?;
            }
        }
        MenuAction::AllHotels => {
            for hotel in service.all_hotels().await? {
                writeln!(
                    out,
                    "[{}] {} in {} - {}",
                    hotel.value.id,
                    hotel.value.name,
                    hotel.value.city,
                    hotel.placement.nodes()
                )?;
            }
        }
        MenuAction::AllBookings => {
            for booking in service.all_bookings().await? {
                write_booking_line(out, &booking)?;
            }
        }
        MenuAction::KeyInfo(key) => {
            let info = service.key_info(key).await?;
            match info.content {
                None => {
                    writeln!(out, "Key '{}' does NOT exist", key)?;
                    let p = &info.placement;
                    writeln!(out, "(Would be at Slot: {}, {})", p.slot, p.nodes())?;
                }
                Some(content) => {
                    writeln!(out, "{}", info.placement)?;
                    writeln!(out, "Type: {}", info.key_type)?;
                    writeln!(out, "Data: {}", content)?;
                }
            }
        }
    }
    Ok(())
}

/// Print a failed query and keep the menu running. Other errors propagate.
fn report_query_error<W: Write>(out: &mut W, error: crate::Error) -> Result<()> {
    match error {
        crate::Error::Query(e) => {
            warn!(error = %e, "Query failed");
            writeln!(out, "Query failed: {}", e)?;
            Ok(())
        }
        other => Err(other),
    }
}

/// Show the menu until `0` or end of input.
///
/// A blank answer to a prompt returns to the menu without running anything.
/// A failed query is printed and the menu continues.
pub async fn run_interactive<S, R, W>(
    service: &QueryService<'_, S>,
    input: &mut R,
    out: &mut W,
) -> Result<()>
where
    S: KeyValueStore,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    loop {
        writeln!(out, "{}", MENU)?;
        let Some(choice) = prompt(input, out, "Choice: ").await? else {
            writeln!(out)?;
            return Ok(());
        };

        let action = match parse_choice(&choice) {
            Choice::Exit => return Ok(()),
            Choice::Invalid => {
                writeln!(out, "Invalid choice: '{}'", choice)?;
                continue;
            }
            Choice::Ready(action) => action,
            Choice::Needs(label, build) => match prompt(input, out, label).await? {
                None => {
                    writeln!(out)?;
                    return Ok(());
                }
                Some(value) if value.is_empty() => continue,
                Some(value) => build(value),
            },
        };

        if let Err(e) = execute(service, &action, out).await {
            report_query_error(out, e)?;
        }
    }
}

/// The queries the demo runs against the seed data.
pub fn demo_script() -> Vec<MenuAction> {
    vec![
        MenuAction::UserById("1".to_string()),
        MenuAction::UserByEmail("alice@example.com".to_string()),
        MenuAction::UserBookings("1".to_string()),
        MenuAction::HotelById("1".to_string()),
        MenuAction::HotelsByCity("New York".to_string()),
        MenuAction::BookingById("1".to_string()),
        MenuAction::AllUsers,
        MenuAction::AllHotels,
        MenuAction::AllBookings,
        MenuAction::KeyInfo("user:1".to_string()),
    ]
}

/// Run every query of [`demo_script`] with a heading per query.
pub async fn run_demo<S, W>(service: &QueryService<'_, S>, out: &mut W) -> Result<()>
where
    S: KeyValueStore,
    W: Write,
{
    for action in demo_script() {
        writeln!(out, "\n--- {} ---", action.title())?;
        execute(service, &action, out).await?;
    }
    Ok(())
}
