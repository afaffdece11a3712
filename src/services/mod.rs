// Service exports
pub mod auth;
pub mod cache;
pub mod directory;
pub mod memory;
pub mod postgres;

pub use auth::{AuthError, TokenClaims, TokenVerifier};
pub use cache::{CacheKey, NearbyCache};
pub use directory::{new_donor, DirectoryError, DonorDirectory};
pub use memory::MemoryDonorStore;
pub use postgres::PostgresDonorStore;
