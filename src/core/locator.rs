use crate::models::{BloodTypeFilter, Coordinate, DistanceAnnotatedDonor, Donor, LocateError, NearbyQuery};
use crate::core::{
    distance::{calculate_bounding_box, compute_distance_km, haversine_distance, round_to_tenth},
    filters::{matches_blood_type, matches_nearby_constraints},
};

/// Annotate the donors matching `filter` with their distance from the user
///
/// Applies the blood type filter, then computes the rounded Haversine
/// distance to each surviving donor. The output keeps the relative order of
/// the input; no sorting by distance happens here. An empty donor list
/// yields an empty result.
///
/// # Errors
/// [`LocateError::InvalidCoordinate`] if the user location, or the location
/// of any donor that passes the filter, is out of range.
pub fn locate_nearby_donors(
    user_location: &Coordinate,
    donors: &[Donor],
    filter: BloodTypeFilter,
) -> Result<Vec<DistanceAnnotatedDonor>, LocateError> {
    user_location.validate()?;

    donors
        .iter()
        .filter(|donor| matches_blood_type(donor, filter))
        .map(|donor| {
            let distance_km = compute_distance_km(user_location, &donor.location)?;
            Ok(DistanceAnnotatedDonor {
                donor: donor.clone(),
                distance_km,
            })
        })
        .collect()
}

/// Result of a nearby search
#[derive(Debug)]
pub struct NearbyResult {
    pub donors: Vec<DistanceAnnotatedDonor>,
    pub total_candidates: usize,
}

/// Radius-bounded, nearest-first donor search
///
/// # Pipeline Stages
/// 1. Geospatial bounding box pre-filter, availability and blood type
/// 2. Exact Haversine radius check
/// 3. Sort by distance (stable) and truncate to the limit
#[derive(Debug, Clone, Copy)]
pub struct DonorLocator {
    default_radius_km: f64,
    default_limit: usize,
    max_limit: usize,
}

impl DonorLocator {
    pub const DEFAULT_RADIUS_KM: f64 = 10.0;
    pub const DEFAULT_LIMIT: usize = 20;
    pub const MAX_LIMIT: usize = 100;

    pub fn new(default_radius_km: f64, default_limit: usize, max_limit: usize) -> Self {
        let max_limit = max_limit.max(1);
        Self {
            default_radius_km,
            default_limit: default_limit.clamp(1, max_limit),
            max_limit,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(Self::DEFAULT_RADIUS_KM, Self::DEFAULT_LIMIT, Self::MAX_LIMIT)
    }

    /// Build a query, filling in the configured radius and limit
    pub fn query(
        &self,
        center: Coordinate,
        filter: BloodTypeFilter,
        radius_km: Option<f64>,
        limit: Option<usize>,
    ) -> NearbyQuery {
        NearbyQuery {
            center,
            filter,
            radius_km: radius_km.unwrap_or(self.default_radius_km),
            limit: limit.unwrap_or(self.default_limit).clamp(1, self.max_limit),
        }
    }

    /// Find available donors within the query radius, nearest first
    ///
    /// # Arguments
    /// * `query` - Center, blood type filter, radius and limit
    /// * `donors` - Snapshot of the donor directory
    ///
    /// # Returns
    /// NearbyResult with at most `query.limit` donors, sorted by ascending
    /// distance; donors at equal distance keep their input order
    pub fn find_nearby(
        &self,
        query: &NearbyQuery,
        donors: &[Donor],
    ) -> Result<NearbyResult, LocateError> {
        query.center.validate()?;
        if !query.radius_km.is_finite() || query.radius_km <= 0.0 {
            return Err(LocateError::InvalidRadius(query.radius_km));
        }

        let total_candidates = donors.len();
        let limit = query.limit.clamp(1, self.max_limit);
        let bbox = calculate_bounding_box(query.center.lat, query.center.lon, query.radius_km);

        let mut within_radius: Vec<(f64, &Donor)> = donors
            .iter()
            // Stage 1: Bounding box, availability, blood type
            .filter(|donor| matches_nearby_constraints(donor, query, &bbox))
            // Stage 2: Exact distance
            .filter_map(|donor| {
                let distance_km = haversine_distance(
                    query.center.lat,
                    query.center.lon,
                    donor.location.lat,
                    donor.location.lon,
                );
                (distance_km <= query.radius_km).then_some((distance_km, donor))
            })
            .collect();

        // Stage 3: Nearest first
        within_radius.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        within_radius.truncate(limit);

        let donors = within_radius
            .into_iter()
            .map(|(distance_km, donor)| DistanceAnnotatedDonor {
                donor: donor.clone(),
                distance_km: round_to_tenth(distance_km),
            })
            .collect();

        Ok(NearbyResult {
            donors,
            total_candidates,
        })
    }
}

impl Default for DonorLocator {
    fn default() -> Self {
        Self::with_defaults()
    }
}
