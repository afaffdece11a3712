//! Donor Locator - blood donor proximity search for the MomCare platform
//!
//! The `core` module holds the pure proximity computations: Haversine
//! distance, blood type filtering and the distance-annotated donor list shown
//! on the donor map. The remaining modules wrap it in a small HTTP service
//! backed by a donor directory.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{compute_distance_km, filter_donors, locate_nearby_donors, DonorLocator};
pub use models::{BloodType, BloodTypeFilter, Coordinate, DistanceAnnotatedDonor, Donor, LocateError};
