use crate::models::{BoundingBox, Coordinate, LocateError};

/// Earth's mean radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Approximate length of one degree of latitude, rounded down so the
/// bounding box always over-covers the search radius
const KM_PER_DEGREE: f64 = 111.0;

/// Calculate the Haversine distance between two points in kilometers
///
/// Inputs are not range-checked; see [`compute_distance_km`] for the
/// validating, rounded variant.
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in kilometers
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push h just past 1 for antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Round a distance to one decimal place
#[inline]
pub fn round_to_tenth(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}

/// Great-circle distance between two validated coordinates, in kilometers
/// rounded to one decimal place.
///
/// Returns [`LocateError::InvalidCoordinate`] if either point is out of range.
pub fn compute_distance_km(a: &Coordinate, b: &Coordinate) -> Result<f64, LocateError> {
    a.validate()?;
    b.validate()?;

    Ok(round_to_tenth(haversine_distance(a.lat, a.lon, b.lat, b.lon)))
}

/// Calculate a bounding box around a center point
///
/// This is much faster than Haversine for pre-filtering.
/// 1° latitude ≈ 111km, 1° longitude ≈ 111km * cos(latitude).
/// The longitude span is taken at the box edge nearest a pole, and covers
/// the whole longitude range when the box reaches a pole or would wrap the
/// antimeridian.
pub fn calculate_bounding_box(lat: f64, lon: f64, radius_km: f64) -> BoundingBox {
    let lat_delta = radius_km / KM_PER_DEGREE;
    let min_lat = (lat - lat_delta).max(-90.0);
    let max_lat = (lat + lat_delta).min(90.0);

    let full_lon = BoundingBox {
        min_lat,
        max_lat,
        min_lon: -180.0,
        max_lon: 180.0,
    };

    if min_lat <= -90.0 || max_lat >= 90.0 {
        return full_lon;
    }

    let edge_lat = min_lat.abs().max(max_lat.abs());
    let lon_delta = radius_km / (KM_PER_DEGREE * edge_lat.to_radians().cos());

    if lon - lon_delta < -180.0 || lon + lon_delta > 180.0 {
        return full_lon;
    }

    BoundingBox {
        min_lat,
        max_lat,
        min_lon: lon - lon_delta,
        max_lon: lon + lon_delta,
    }
}

/// Check if a point is within a bounding box
#[inline]
pub fn is_within_bounding_box(lat: f64, lon: f64, bbox: &BoundingBox) -> bool {
    lat >= bbox.min_lat
        && lat <= bbox.max_lat
        && lon >= bbox.min_lon
        && lon <= bbox.max_lon
}
