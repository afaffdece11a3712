// Core algorithm exports
pub mod distance;
pub mod filters;
pub mod locator;

pub use distance::{haversine_distance, compute_distance_km, calculate_bounding_box, is_within_bounding_box};
pub use filters::{filter_donors, matches_blood_type, matches_nearby_constraints};
pub use locator::{locate_nearby_donors, DonorLocator, NearbyResult};
