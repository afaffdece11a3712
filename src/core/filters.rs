use crate::models::{BloodTypeFilter, Donor, NearbyQuery};

/// Check if a donor satisfies a blood type criterion
///
/// `ALL` matches every donor. A specific type matches only donors whose
/// stored blood type is exactly that literal; unknown or malformed values
/// never match.
#[inline]
pub fn matches_blood_type(donor: &Donor, filter: BloodTypeFilter) -> bool {
    match filter {
        BloodTypeFilter::All => true,
        BloodTypeFilter::Only(blood_type) => donor.known_blood_type() == Some(blood_type),
    }
}

/// Keep the donors matching `filter`, in their original order
pub fn filter_donors(donors: &[Donor], filter: BloodTypeFilter) -> Vec<Donor> {
    donors
        .iter()
        .filter(|donor| matches_blood_type(donor, filter))
        .cloned()
        .collect()
}

/// Pre-distance constraints of a nearby search
///
/// Checks availability, blood type and the bounding box. The exact radius
/// check happens after the Haversine distance is known.
#[inline]
pub fn matches_nearby_constraints(
    donor: &Donor,
    query: &NearbyQuery,
    bbox: &crate::models::BoundingBox,
) -> bool {
    if !donor.is_available {
        return false;
    }

    if !matches_blood_type(donor, query.filter) {
        return false;
    }

    super::distance::is_within_bounding_box(donor.location.lat, donor.location.lon, bbox)
}
