use crate::config::{StorageBackend, StorageSettings};
use crate::models::{Coordinate, Donor, LocateError, RegisterDonorRequest};
use crate::services::{MemoryDonorStore, PostgresDonorStore};
use thiserror::Error;
use validator::Validate;

/// Errors that can occur when reading or writing the donor directory
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Phone number already registered: {0}")]
    PhoneAlreadyRegistered(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Seed file error: {0}")]
    SeedError(String),
}

impl From<LocateError> for DirectoryError {
    fn from(err: LocateError) -> Self {
        DirectoryError::InvalidInput(err.to_string())
    }
}

impl From<validator::ValidationErrors> for DirectoryError {
    fn from(errors: validator::ValidationErrors) -> Self {
        DirectoryError::InvalidInput(errors.to_string())
    }
}

/// Build a new donor record from a registration request
///
/// Validates the request and assigns a fresh id. Uniqueness of the phone
/// number is the store's concern.
pub fn new_donor(request: &RegisterDonorRequest) -> Result<Donor, DirectoryError> {
    request.validate()?;
    let location = Coordinate::new(request.latitude, request.longitude)?;

    Ok(Donor {
        id: uuid::Uuid::new_v4().to_string(),
        name: request.name.trim().to_string(),
        blood_type: request.blood_type.to_string(),
        phone: request.phone.clone(),
        location,
        is_available: true,
        last_donation_date: request.last_donation_date,
        registered_at: Some(chrono::Utc::now()),
    })
}

/// The donor directory, backed by memory or PostgreSQL
pub enum DonorDirectory {
    Memory(MemoryDonorStore),
    Postgres(PostgresDonorStore),
}

impl DonorDirectory {
    /// Open the directory selected by the storage settings
    pub async fn from_settings(settings: &StorageSettings) -> Result<Self, DirectoryError> {
        match settings.backend {
            StorageBackend::Memory => {
                let store = match &settings.seed_file {
                    Some(path) => MemoryDonorStore::from_seed_file(path)?,
                    None => MemoryDonorStore::new(),
                };
                Ok(DonorDirectory::Memory(store))
            }
            StorageBackend::Postgres => {
                let url = settings.database_url.as_deref().ok_or_else(|| {
                    DirectoryError::InvalidInput("storage.database_url is required for the postgres backend".into())
                })?;
                let store = PostgresDonorStore::from_settings(
                    url,
                    settings.max_connections,
                    settings.min_connections,
                    settings.acquire_timeout_secs,
                    settings.idle_timeout_secs,
                )
                .await?;
                Ok(DonorDirectory::Postgres(store))
            }
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            DonorDirectory::Memory(_) => "memory",
            DonorDirectory::Postgres(_) => "postgres",
        }
    }

    /// Register a donor, rejecting duplicate phone numbers
    pub async fn register(&self, request: &RegisterDonorRequest) -> Result<Donor, DirectoryError> {
        let donor = new_donor(request)?;
        match self {
            DonorDirectory::Memory(store) => store.insert(donor).await,
            DonorDirectory::Postgres(store) => store.insert(donor).await,
        }
    }

    pub async fn phone_exists(&self, phone: &str) -> Result<bool, DirectoryError> {
        match self {
            DonorDirectory::Memory(store) => Ok(store.phone_exists(phone).await),
            DonorDirectory::Postgres(store) => store.phone_exists(phone).await,
        }
    }

    pub async fn get(&self, id: &str) -> Result<Donor, DirectoryError> {
        match self {
            DonorDirectory::Memory(store) => store.get(id).await,
            DonorDirectory::Postgres(store) => store.get(id).await,
        }
    }

    /// Snapshot of every donor in registration order
    pub async fn list(&self) -> Result<Vec<Donor>, DirectoryError> {
        match self {
            DonorDirectory::Memory(store) => Ok(store.list().await),
            DonorDirectory::Postgres(store) => store.list().await,
        }
    }

    pub async fn update_location(
        &self,
        id: &str,
        location: Coordinate,
    ) -> Result<Donor, DirectoryError> {
        location.validate()?;
        match self {
            DonorDirectory::Memory(store) => store.update_location(id, location).await,
            DonorDirectory::Postgres(store) => store.update_location(id, location).await,
        }
    }

    pub async fn health_check(&self) -> bool {
        match self {
            DonorDirectory::Memory(_) => true,
            DonorDirectory::Postgres(store) => store.health_check().await.unwrap_or(false),
        }
    }
}
