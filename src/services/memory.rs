use crate::models::{Coordinate, Donor};
use crate::services::DirectoryError;
use std::path::Path;
use tokio::sync::RwLock;

/// In-process donor store
///
/// Keeps donors in registration order. Phone uniqueness is checked under
/// the write lock so concurrent registrations cannot both succeed.
pub struct MemoryDonorStore {
    donors: RwLock<Vec<Donor>>,
}

impl MemoryDonorStore {
    pub fn new() -> Self {
        Self::with_donors(Vec::new())
    }

    pub fn with_donors(donors: Vec<Donor>) -> Self {
        Self {
            donors: RwLock::new(donors),
        }
    }

    /// Load a JSON array of donors
    ///
    /// Records with invalid coordinates, duplicate ids or duplicate phones
    /// are rejected so the store starts in the same state registration
    /// would produce.
    pub fn from_seed_file<P: AsRef<Path>>(path: P) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DirectoryError::SeedError(format!("{}: {}", path.display(), e)))?;
        let donors: Vec<Donor> = serde_json::from_str(&raw)
            .map_err(|e| DirectoryError::SeedError(format!("{}: {}", path.display(), e)))?;

        let mut ids = std::collections::HashSet::new();
        let mut phones = std::collections::HashSet::new();
        for donor in &donors {
            donor.location.validate()?;
            if !ids.insert(donor.id.as_str()) {
                return Err(DirectoryError::SeedError(format!(
                    "{}: duplicate donor id {}",
                    path.display(),
                    donor.id
                )));
            }
            if !phones.insert(donor.phone.as_str()) {
                return Err(DirectoryError::PhoneAlreadyRegistered(donor.phone.clone()));
            }
        }

        tracing::info!("Seeded {} donors from {}", donors.len(), path.display());
        Ok(Self::with_donors(donors))
    }

    pub async fn insert(&self, donor: Donor) -> Result<Donor, DirectoryError> {
        let mut donors = self.donors.write().await;
        if donors.iter().any(|d| d.phone == donor.phone) {
            return Err(DirectoryError::PhoneAlreadyRegistered(donor.phone));
        }
        donors.push(donor.clone());

        tracing::debug!("Registered donor {} ({} total)", donor.id, donors.len());
        Ok(donor)
    }

    pub async fn phone_exists(&self, phone: &str) -> bool {
        self.donors.read().await.iter().any(|d| d.phone == phone)
    }

    pub async fn get(&self, id: &str) -> Result<Donor, DirectoryError> {
        self.donors
            .read()
            .await
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(format!("Donor {}", id)))
    }

    pub async fn list(&self) -> Vec<Donor> {
        self.donors.read().await.clone()
    }

    pub async fn update_location(
        &self,
        id: &str,
        location: Coordinate,
    ) -> Result<Donor, DirectoryError> {
        let mut donors = self.donors.write().await;
        let donor = donors
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| DirectoryError::NotFound(format!("Donor {}", id)))?;

        donor.location = location;
        Ok(donor.clone())
    }
}

impl Default for MemoryDonorStore {
    fn default() -> Self {
        Self::new()
    }
}
