//! MySQL access through a single `sqlx` connection.
//!
//! Covers the three things the migration needs from the relational side:
//! creating the schema, loading the seed rows and reading every table back.

use std::time::Duration;

use sqlx::error::ErrorKind;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlQueryResult};
use sqlx::Connection;
use tracing::{debug, info, instrument, warn};

use super::SourceError;
use super::models::{Booking, Dataset, Hotel, User};

const CREATE_USERS: &str = "CREATE TABLE IF NOT EXISTS Users (
    id INT PRIMARY KEY AUTO_INCREMENT,
    name VARCHAR(100) NOT NULL,
    email VARCHAR(255) NOT NULL UNIQUE
)";

const CREATE_HOTELS: &str = "CREATE TABLE IF NOT EXISTS Hotels (
    id INT PRIMARY KEY AUTO_INCREMENT,
    name VARCHAR(200) NOT NULL,
    city VARCHAR(100) NOT NULL
)";

const CREATE_BOOKINGS: &str = "CREATE TABLE IF NOT EXISTS Bookings (
    id INT PRIMARY KEY AUTO_INCREMENT,
    user_id INT NOT NULL,
    hotel_id INT NOT NULL,
    date DATE NOT NULL,
    FOREIGN KEY (user_id) REFERENCES Users(id),
    FOREIGN KEY (hotel_id) REFERENCES Hotels(id)
)";

/// Connection settings for the source database.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MySqlSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub connect_timeout: Duration,
}

impl Default for MySqlSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: "root".to_string(),
            database: "hotel_db".to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl MySqlSettings {
    /// Set the database name.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set user and password.
    pub fn with_credentials(
        mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

/// Outcome of inserting a batch of rows into one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertReport {
    /// Rows written.
    pub inserted: usize,
    /// Rows skipped because their id or a unique column already exists.
    pub duplicates: usize,
    /// Rows skipped because they reference a missing parent row.
    pub dangling: usize,
}

impl InsertReport {
    pub fn skipped(&self) -> usize {
        self.duplicates + self.dangling
    }
}

impl std::fmt::Display for InsertReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} inserted", self.inserted)?;
        if self.duplicates > 0 {
            write!(f, ", {} already present", self.duplicates)?;
        }
        if self.dangling > 0 {
            write!(f, ", {} with missing references", self.dangling)?;
        }
        Ok(())
    }
}

/// Per-table outcome of [`MySqlSource::seed`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: InsertReport,
    pub hotels: InsertReport,
    pub bookings: InsertReport,
}

impl std::fmt::Display for SeedReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "users: {}; hotels: {}; bookings: {}",
            self.users, self.hotels, self.bookings
        )
    }
}

/// How a failed insert is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowRejection {
    Duplicate,
    Dangling,
}

fn classify_rejection(error: &sqlx::Error) -> Option<RowRejection> {
    let sqlx::Error::Database(db) = error else {
        return None;
    };
    match db.kind() {
        ErrorKind::UniqueViolation => Some(RowRejection::Duplicate),
        ErrorKind::ForeignKeyViolation => Some(RowRejection::Dangling),
        _ => None,
    }
}

/// Record one insert result. Constraint violations are logged and counted;
/// any other error is returned.
fn record(
    report: &mut InsertReport,
    table: &'static str,
    id: i32,
    result: Result<MySqlQueryResult, sqlx::Error>,
) -> Result<(), SourceError> {
    match result {
        Ok(_) => {
            report.inserted += 1;
            Ok(())
        }
        Err(e) => match classify_rejection(&e) {
            Some(RowRejection::Duplicate) => {
                warn!(table, id, error = %e, "Row already exists, skipping");
                report.duplicates += 1;
                Ok(())
            }
            Some(RowRejection::Dangling) => {
                warn!(table, id, error = %e, "Row references a missing parent, skipping");
                report.dangling += 1;
                Ok(())
            }
            None => Err(SourceError::Database(e)),
        },
    }
}

/// The relational source of truth.
pub struct MySqlSource {
    conn: MySqlConnection,
}

impl MySqlSource {
    /// Open one connection. Retrying is left to the caller.
    #[instrument(
        skip(settings),
        fields(host = %settings.host, port = settings.port, database = %settings.database)
    )]
    pub async fn connect(settings: &MySqlSettings) -> Result<Self, SourceError> {
        let options = settings.connect_options();
        let connecting = MySqlConnection::connect_with(&options);
        let conn = tokio::time::timeout(settings.connect_timeout, connecting)
            .await
            .map_err(|_| SourceError::Timeout {
                operation: "connect".to_string(),
                duration: settings.connect_timeout,
            })??;
        debug!("Connected to MySQL");
        Ok(Self { conn })
    }

    /// Create `Users`, `Hotels` and `Bookings` if they do not exist.
    #[instrument(skip(self))]
    pub async fn create_tables(&mut self) -> Result<(), SourceError> {
        for ddl in [CREATE_USERS, CREATE_HOTELS, CREATE_BOOKINGS] {
            sqlx::query(ddl).execute(&mut self.conn).await?;
        }
        info!("Schema ready");
        Ok(())
    }

    #[instrument(skip(self, users), fields(rows = users.len()))]
    pub async fn insert_users(&mut self, users: &[User]) -> Result<InsertReport, SourceError> {
        let mut report = InsertReport::default();
        for user in users {
            let result = sqlx::query("INSERT INTO Users (id, name, email) VALUES (?, ?, ?)")
                .bind(user.id)
                .bind(&user.name)
                .bind(&user.email)
                .execute(&mut self.conn)
                .await;
            record(&mut report, "Users", user.id, result)?;
        }
        Ok(report)
    }

    #[instrument(skip(self, hotels), fields(rows = hotels.len()))]
    pub async fn insert_hotels(&mut self, hotels: &[Hotel]) -> Result<InsertReport, SourceError> {
        let mut report = InsertReport::default();
        for hotel in hotels {
            let result = sqlx::query("INSERT INTO Hotels (id, name, city) VALUES (?, ?, ?)")
                .bind(hotel.id)
                .bind(&hotel.name)
                .bind(&hotel.city)
                .execute(&mut self.conn)
                .await;
            record(&mut report, "Hotels", hotel.id, result)?;
        }
        Ok(report)
    }

    #[instrument(skip(self, bookings), fields(rows = bookings.len()))]
    pub async fn insert_bookings(
        &mut self,
        bookings: &[Booking],
    ) -> Result<InsertReport, SourceError> {
        let mut report = InsertReport::default();
        for booking in bookings {
            let result = sqlx::query(
                "INSERT INTO Bookings (id, user_id, hotel_id, date) VALUES (?, ?, ?, ?)",
            )
            .bind(booking.id)
            .bind(booking.user_id)
            .bind(booking.hotel_id)
            .bind(booking.date)
            .execute(&mut self.conn)
            .await;
            record(&mut report, "Bookings", booking.id, result)?;
        }
        Ok(report)
    }

    /// Insert users, hotels, then bookings, so that foreign keys resolve.
    pub async fn seed(&mut self, data: &Dataset) -> Result<SeedReport, SourceError> {
        let report = SeedReport {
            users: self.insert_users(&data.users).await?,
            hotels: self.insert_hotels(&data.hotels).await?,
            bookings: self.insert_bookings(&data.bookings).await?,
        };
        info!(%report, "Seed data loaded");
        Ok(report)
    }

    /// Read every table in primary-key order.
    #[instrument(skip(self))]
    pub async fn fetch_dataset(&mut self) -> Result<Dataset, SourceError> {
        let users = sqlx::query_as::<_, User>("SELECT id, name, email FROM Users ORDER BY id")
            .fetch_all(&mut self.conn)
            .await?;
        let hotels = sqlx::query_as::<_, Hotel>("SELECT id, name, city FROM Hotels ORDER BY id")
            .fetch_all(&mut self.conn)
            .await?;
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT id, user_id, hotel_id, date FROM Bookings ORDER BY id",
        )
        .fetch_all(&mut self.conn)
        .await?;

        let data = Dataset {
            users,
            hotels,
            bookings,
        };
        debug!(%data, "Fetched relational data");
        Ok(data)
    }

    /// Close the connection gracefully.
    pub async fn close(self) -> Result<(), SourceError> {
        self.conn.close().await?;
        Ok(())
    }
}
