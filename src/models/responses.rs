use serde::{Deserialize, Serialize};
use crate::models::domain::{Coordinate, DistanceAnnotatedDonor};

/// Response for the locate endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocateDonorsResponse {
    pub donors: Vec<DistanceAnnotatedDonor>,
    pub user_location: Coordinate,
    pub used_fallback_location: bool,
}

/// Response for the nearest-first search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyDonorsResponse {
    pub donors: Vec<DistanceAnnotatedDonor>,
    pub total_candidates: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneExistsResponse {
    pub exists: bool,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
