use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use crate::models::domain::{BloodType, BloodTypeFilter, Coordinate};

/// Request to register a new blood donor
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDonorRequest {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    pub blood_type: BloodType,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[serde(default)]
    pub last_donation_date: Option<NaiveDate>,
}

impl RegisterDonorRequest {
    pub fn location(&self) -> Coordinate {
        Coordinate { lat: self.latitude, lon: self.longitude }
    }
}

/// Names must contain 1 to 100 characters once surrounding whitespace is trimmed
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let length = name.trim().chars().count();
    if (1..=100).contains(&length) {
        Ok(())
    } else {
        let mut error = ValidationError::new("name");
        error.message = Some("name must be between 1 and 100 characters".into());
        Err(error)
    }
}

/// Phone numbers are local mobile numbers: exactly 11 digits
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.len() == 11 && phone.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        let mut error = ValidationError::new("phone");
        error.message = Some("phone must be exactly 11 digits".into());
        Err(error)
    }
}

/// Request to annotate the donor snapshot with distances from the user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocateDonorsRequest {
    /// Missing when the client could not obtain a position
    #[serde(default)]
    pub user_location: Option<Coordinate>,
    #[serde(default)]
    pub blood_type: BloodTypeFilter,
}

/// Query string for the nearest-first search
///
/// `+` must be percent-encoded (`A%2B`) since a bare `+` decodes to a space.
/// `UNSPECIFIED` is accepted as a blood type meaning any type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyDonorsQuery {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, deserialize_with = "deserialize_nearby_blood_type")]
    pub blood_type: Option<BloodTypeFilter>,
    #[serde(default)]
    pub radius_km: Option<f64>,
    #[serde(default)]
    pub limit: Option<usize>,
}

const UNSPECIFIED_BLOOD_TYPE: &str = "UNSPECIFIED";

fn deserialize_nearby_blood_type<'de, D>(deserializer: D) -> Result<Option<BloodTypeFilter>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None => Ok(None),
        Some(UNSPECIFIED_BLOOD_TYPE) => Ok(Some(BloodTypeFilter::All)),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
