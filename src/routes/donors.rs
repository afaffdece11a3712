use actix_web::{http::header, web, HttpRequest, HttpResponse, Responder};
use validator::Validate;
use crate::models::{
    Coordinate, ErrorResponse, HealthResponse, LocateDonorsRequest, LocateDonorsResponse,
    LocateError, NearbyDonorsQuery, NearbyDonorsResponse, PhoneExistsResponse, RegisterDonorRequest,
};
use crate::core::{locate_nearby_donors, DonorLocator};
use crate::services::{CacheKey, DirectoryError, DonorDirectory, NearbyCache, TokenVerifier};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<DonorDirectory>,
    pub cache: Arc<NearbyCache>,
    pub verifier: Arc<TokenVerifier>,
    pub locator: DonorLocator,
    /// Substituted when a client cannot supply its own position
    pub fallback_location: Coordinate,
}

/// Configure all donor-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/donors", web::get().to(list_donors))
        .route("/donors/register", web::post().to(register_donor))
        .route("/donors/check-phone/{phone}", web::get().to(check_phone))
        .route("/donors/locate", web::post().to(locate_donors))
        .route("/donors/nearby", web::get().to(nearby_donors))
        .route("/donors/location", web::put().to(update_location));
}

fn error_response(status: actix_web::http::StatusCode, error: &str, message: String) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: status.as_u16(),
    })
}

fn directory_error_response(context: &str, err: &DirectoryError) -> HttpResponse {
    use actix_web::http::StatusCode;

    match err {
        DirectoryError::InvalidInput(_) => {
            error_response(StatusCode::BAD_REQUEST, "Validation failed", err.to_string())
        }
        DirectoryError::PhoneAlreadyRegistered(_) => {
            error_response(StatusCode::CONFLICT, "Phone number already registered", err.to_string())
        }
        DirectoryError::NotFound(_) => error_response(StatusCode::NOT_FOUND, "Not found", err.to_string()),
        _ => {
            tracing::error!("{}: {}", context, err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, context, err.to_string())
        }
    }
}

fn locate_error_response(err: &LocateError) -> HttpResponse {
    error_response(
        actix_web::http::StatusCode::BAD_REQUEST,
        "Invalid search parameters",
        err.to_string(),
    )
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = state.directory.health_check().await;

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// GET /api/v1/donors
async fn list_donors(state: web::Data<AppState>) -> impl Responder {
    match state.directory.list().await {
        Ok(donors) => HttpResponse::Ok().json(donors),
        Err(e) => directory_error_response("Failed to list donors", &e),
    }
}

/// Register donor endpoint
///
/// POST /api/v1/donors/register
///
/// Request body:
/// ```json
/// {
///   "name": "string",
///   "phone": "01712345678",
///   "bloodType": "O+",
///   "latitude": 23.9985,
///   "longitude": 90.4125
/// }
/// ```
async fn register_donor(
    state: web::Data<AppState>,
    req: web::Json<RegisterDonorRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for register request: field_errors={:?}", errors);
        return error_response(
            actix_web::http::StatusCode::BAD_REQUEST,
            "Validation failed",
            errors.to_string(),
        );
    }

    match state.directory.register(&req).await {
        Ok(donor) => {
            state.cache.invalidate_all();
            tracing::info!("Registered donor {} ({})", donor.id, donor.blood_type);
            HttpResponse::Ok().json(donor)
        }
        Err(e) => {
            tracing::info!("Donor registration rejected: {}", e);
            directory_error_response("Failed to register donor", &e)
        }
    }
}

/// GET /api/v1/donors/check-phone/{phone}
async fn check_phone(state: web::Data<AppState>, phone: web::Path<String>) -> impl Responder {
    match state.directory.phone_exists(&phone).await {
        Ok(exists) => HttpResponse::Ok().json(PhoneExistsResponse { exists }),
        Err(e) => directory_error_response("Failed to check phone", &e),
    }
}

/// Locate donors endpoint
///
/// POST /api/v1/donors/locate
///
/// Annotates the donor snapshot with distances from the user, keeping the
/// directory order. A missing `userLocation` is replaced by the configured
/// fallback position.
///
/// Request body:
/// ```json
/// {
///   "userLocation": { "latitude": 23.9985, "longitude": 90.4125 },
///   "bloodType": "ALL"
/// }
/// ```
async fn locate_donors(
    state: web::Data<AppState>,
    req: web::Json<LocateDonorsRequest>,
) -> impl Responder {
    let (user_location, used_fallback_location) = match req.user_location {
        Some(location) => (location, false),
        None => (state.fallback_location, true),
    };

    let donors = match state.directory.list().await {
        Ok(donors) => donors,
        Err(e) => return directory_error_response("Failed to load donors", &e),
    };

    match locate_nearby_donors(&user_location, &donors, req.blood_type) {
        Ok(annotated) => {
            tracing::debug!(
                "Located {} of {} donors for filter {} from {}",
                annotated.len(),
                donors.len(),
                req.blood_type,
                user_location
            );
            HttpResponse::Ok().json(LocateDonorsResponse {
                donors: annotated,
                user_location,
                used_fallback_location,
            })
        }
        Err(e) => {
            tracing::info!("Rejected locate request: {}", e);
            locate_error_response(&e)
        }
    }
}

/// Nearby donors endpoint
///
/// GET /api/v1/donors/nearby?latitude=..&longitude=..&bloodType=..&radiusKm=..&limit=..
///
/// Available donors within the radius, nearest first.
async fn nearby_donors(
    state: web::Data<AppState>,
    query: web::Query<NearbyDonorsQuery>,
) -> impl Responder {
    let center = Coordinate {
        lat: query.latitude,
        lon: query.longitude,
    };
    let nearby = state.locator.query(
        center,
        query.blood_type.unwrap_or_default(),
        query.radius_km,
        query.limit,
    );

    let cache_key = CacheKey::nearby(&nearby);
    if let Some(cached) = state.cache.get(&cache_key).await {
        return HttpResponse::Ok().json(cached);
    }

    let generation = state.cache.generation();
    let donors = match state.directory.list().await {
        Ok(donors) => donors,
        Err(e) => return directory_error_response("Failed to load donors", &e),
    };

    let result = match state.locator.find_nearby(&nearby, &donors) {
        Ok(result) => result,
        Err(e) => {
            tracing::info!("Rejected nearby request: {}", e);
            return locate_error_response(&e);
        }
    };

    let response = NearbyDonorsResponse {
        donors: result.donors,
        total_candidates: result.total_candidates,
    };

    tracing::info!(
        "Returning {} donors within {}km of {} (from {} candidates)",
        response.donors.len(),
        nearby.radius_km,
        center,
        response.total_candidates
    );

    state.cache.insert(generation, &cache_key, response.clone()).await;
    HttpResponse::Ok().json(response)
}

/// Update donor location endpoint
///
/// PUT /api/v1/donors/location
///
/// Requires `Authorization: Bearer <token>`; the token subject is the donor id.
async fn update_location(
    state: web::Data<AppState>,
    http_req: HttpRequest,
    location: web::Json<Coordinate>,
) -> impl Responder {
    let auth_header = http_req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let donor_id = match state.verifier.authorize(auth_header) {
        Ok(id) => id,
        Err(e) => {
            tracing::info!("Rejected location update: {}", e);
            return error_response(
                actix_web::http::StatusCode::UNAUTHORIZED,
                "Unauthorized",
                e.to_string(),
            );
        }
    };

    match state.directory.update_location(&donor_id, location.into_inner()).await {
        Ok(donor) => {
            state.cache.invalidate_all();
            tracing::info!("Updated location for donor {}", donor.id);
            HttpResponse::Ok().json(donor)
        }
        Err(e) => directory_error_response("Failed to update donor location", &e),
    }
}
