use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised by the proximity computations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocateError {
    #[error(
        "invalid coordinate ({latitude}, {longitude}): latitude must be within [-90, 90] \
         and longitude within [-180, 180]"
    )]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("invalid search radius: {0} km (must be a positive, finite number)")]
    InvalidRadius(f64),
}

/// A point on the globe in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(rename = "latitude", alias = "lat")]
    pub lat: f64,
    #[serde(rename = "longitude", alias = "lng", alias = "lon")]
    pub lon: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting anything outside the valid ranges
    pub fn new(lat: f64, lon: f64) -> Result<Self, LocateError> {
        let coordinate = Self { lat, lon };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// NaN fails both range checks, so it is never valid.
    #[inline]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }

    pub fn validate(&self) -> Result<(), LocateError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(LocateError::InvalidCoordinate {
                latitude: self.lat,
                longitude: self.lon,
            })
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

/// ABO/Rh blood group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodType {
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
}

impl BloodType {
    pub const ALL: [BloodType; 8] = [
        BloodType::OPositive,
        BloodType::ONegative,
        BloodType::APositive,
        BloodType::ANegative,
        BloodType::BPositive,
        BloodType::BNegative,
        BloodType::AbPositive,
        BloodType::AbNegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodType::OPositive => "O+",
            BloodType::ONegative => "O-",
            BloodType::APositive => "A+",
            BloodType::ANegative => "A-",
            BloodType::BPositive => "B+",
            BloodType::BNegative => "B-",
            BloodType::AbPositive => "AB+",
            BloodType::AbNegative => "AB-",
        }
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when text is not one of the eight blood type literals
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown blood type '{0}' (expected one of O+, O-, A+, A-, B+, B-, AB+, AB-)")]
pub struct UnknownBloodType(pub String);

impl FromStr for BloodType {
    type Err = UnknownBloodType;

    /// Exact, case-sensitive match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BloodType::ALL
            .into_iter()
            .find(|blood_type| blood_type.as_str() == s)
            .ok_or_else(|| UnknownBloodType(s.to_string()))
    }
}

/// Blood type criterion for donor searches: a single type, or the `ALL` sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BloodTypeFilter {
    #[default]
    All,
    Only(BloodType),
}

impl BloodTypeFilter {
    pub const ALL_SENTINEL: &'static str = "ALL";

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodTypeFilter::All => Self::ALL_SENTINEL,
            BloodTypeFilter::Only(blood_type) => blood_type.as_str(),
        }
    }
}

impl fmt::Display for BloodTypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodTypeFilter {
    type Err = UnknownBloodType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::ALL_SENTINEL {
            Ok(BloodTypeFilter::All)
        } else {
            s.parse().map(BloodTypeFilter::Only)
        }
    }
}

impl TryFrom<String> for BloodTypeFilter {
    type Error = UnknownBloodType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BloodTypeFilter> for String {
    fn from(filter: BloodTypeFilter) -> Self {
        filter.as_str().to_string()
    }
}

impl From<BloodType> for BloodTypeFilter {
    fn from(blood_type: BloodType) -> Self {
        BloodTypeFilter::Only(blood_type)
    }
}

/// A registered blood donor as held by the directory
///
/// `blood_type` is kept as the raw text the directory stored so that a
/// malformed record can still be listed; it simply never matches a specific
/// blood type filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donor {
    pub id: String,
    pub name: String,
    pub blood_type: String,
    pub phone: String,
    pub location: Coordinate,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub last_donation_date: Option<NaiveDate>,
    #[serde(default)]
    pub registered_at: Option<DateTime<Utc>>,
}

impl Donor {
    /// The donor's blood type, if the stored text is a known literal
    pub fn known_blood_type(&self) -> Option<BloodType> {
        self.blood_type.parse().ok()
    }
}

fn default_true() -> bool { true }

/// A donor together with its distance from the searching user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceAnnotatedDonor {
    #[serde(flatten)]
    pub donor: Donor,
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Parameters of a radius-bounded, nearest-first donor search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyQuery {
    pub center: Coordinate,
    pub filter: BloodTypeFilter,
    pub radius_km: f64,
    pub limit: usize,
}
