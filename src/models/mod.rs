// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BloodType, BloodTypeFilter, BoundingBox, Coordinate, DistanceAnnotatedDonor, Donor,
    LocateError, NearbyQuery, UnknownBloodType,
};
pub use requests::{LocateDonorsRequest, NearbyDonorsQuery, RegisterDonorRequest};
pub use responses::{
    ErrorResponse, HealthResponse, LocateDonorsResponse, NearbyDonorsResponse, PhoneExistsResponse,
};
