use crate::models::{Coordinate, Donor};
use crate::services::DirectoryError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Row layout of the `donors` table
#[derive(Debug, sqlx::FromRow)]
struct DonorRow {
    id: String,
    name: String,
    blood_type: String,
    phone: String,
    latitude: f64,
    longitude: f64,
    is_available: bool,
    last_donation_date: Option<chrono::NaiveDate>,
    registered_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<DonorRow> for Donor {
    fn from(row: DonorRow) -> Self {
        Donor {
            id: row.id,
            name: row.name,
            blood_type: row.blood_type,
            phone: row.phone,
            location: Coordinate {
                lat: row.latitude,
                lon: row.longitude,
            },
            is_available: row.is_available,
            last_donation_date: row.last_donation_date,
            registered_at: row.registered_at,
        }
    }
}

const DONOR_COLUMNS: &str =
    "id, name, blood_type, phone, latitude, longitude, is_available, last_donation_date, registered_at";

/// PostgreSQL-backed donor store
///
/// The `donors` table carries a unique index on `phone`; a violation is
/// reported as [`DirectoryError::PhoneAlreadyRegistered`].
pub struct PostgresDonorStore {
    pool: PgPool,
}

impl PostgresDonorStore {
    /// Create a new store from a connection string and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, DirectoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, DirectoryError> {
        tracing::info!("Connecting to PostgreSQL donor directory");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    pub async fn insert(&self, donor: Donor) -> Result<Donor, DirectoryError> {
        let query = format!(
            r#"
            INSERT INTO donors ({DONOR_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {DONOR_COLUMNS}
            "#
        );

        let row: DonorRow = sqlx::query_as(&query)
            .bind(&donor.id)
            .bind(&donor.name)
            .bind(&donor.blood_type)
            .bind(&donor.phone)
            .bind(donor.location.lat)
            .bind(donor.location.lon)
            .bind(donor.is_available)
            .bind(donor.last_donation_date)
            .bind(donor.registered_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    DirectoryError::PhoneAlreadyRegistered(donor.phone.clone())
                }
                other => other.into(),
            })?;

        tracing::debug!("Registered donor {}", row.id);
        Ok(row.into())
    }

    pub async fn phone_exists(&self, phone: &str) -> Result<bool, DirectoryError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM donors WHERE phone = $1)")
            .bind(phone)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    pub async fn get(&self, id: &str) -> Result<Donor, DirectoryError> {
        let query = format!("SELECT {DONOR_COLUMNS} FROM donors WHERE id = $1");

        sqlx::query_as::<_, DonorRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Donor::from)
            .ok_or_else(|| DirectoryError::NotFound(format!("Donor {}", id)))
    }

    /// All donors in registration order
    pub async fn list(&self) -> Result<Vec<Donor>, DirectoryError> {
        let query = format!("SELECT {DONOR_COLUMNS} FROM donors ORDER BY registered_at ASC, id ASC");

        let rows: Vec<DonorRow> = sqlx::query_as(&query).fetch_all(&self.pool).await?;

        tracing::debug!("Loaded {} donors", rows.len());
        Ok(rows.into_iter().map(Donor::from).collect())
    }

    pub async fn update_location(
        &self,
        id: &str,
        location: Coordinate,
    ) -> Result<Donor, DirectoryError> {
        let query = format!(
            r#"
            UPDATE donors
            SET latitude = $2, longitude = $3
            WHERE id = $1
            RETURNING {DONOR_COLUMNS}
            "#
        );

        sqlx::query_as::<_, DonorRow>(&query)
            .bind(id)
            .bind(location.lat)
            .bind(location.lon)
            .fetch_optional(&self.pool)
            .await?
            .map(Donor::from)
            .ok_or_else(|| DirectoryError::NotFound(format!("Donor {}", id)))
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, DirectoryError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
