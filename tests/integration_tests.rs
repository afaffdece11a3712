// Integration tests for the donor locator

use actix_web::{http::StatusCode, test, web, App};
use donor_locator::core::{locate_nearby_donors, DonorLocator};
use donor_locator::models::{
    BloodType, BloodTypeFilter, Coordinate, Donor, NearbyDonorsResponse, RegisterDonorRequest,
};
use donor_locator::routes::{self, AppState};
use donor_locator::services::{
    CacheKey, DonorDirectory, MemoryDonorStore, NearbyCache, TokenClaims, TokenVerifier,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;

const SECRET: &str = "integration-secret";

fn create_test_donor(id: &str, blood_type: &str, phone: &str, lat: f64, lon: f64) -> Donor {
    Donor {
        id: id.to_string(),
        name: format!("Donor {}", id),
        blood_type: blood_type.to_string(),
        phone: phone.to_string(),
        location: Coordinate { lat, lon },
        is_available: true,
        last_donation_date: None,
        registered_at: None,
    }
}

fn gazipur() -> Coordinate {
    Coordinate::new(23.9985, 90.4125).unwrap()
}

fn seeded_donors() -> Vec<Donor> {
    vec![
        create_test_donor("abdul", "O-", "01823456789", 23.9825, 90.4275),      // ~2.3km
        create_test_donor("fatima", "B+", "01934567890", 23.9615, 90.3650),     // ~6.3km
        create_test_donor("kamal", "A-", "01467890123", 23.8698, 90.3855),      // Uttara, ~14.6km
        create_test_donor("nasreen", "O+", "01190123456", 23.9895, 90.4225),    // ~1.4km
        create_test_donor("nusrat", "O+", "01556789012", 23.9605, 90.3645),     // ~6.4km
    ]
}

fn app_state(donors: Vec<Donor>) -> AppState {
    AppState {
        directory: Arc::new(DonorDirectory::Memory(MemoryDonorStore::with_donors(donors))),
        cache: Arc::new(NearbyCache::new(100, 60)),
        verifier: Arc::new(TokenVerifier::new(SECRET)),
        locator: DonorLocator::with_defaults(),
        fallback_location: gazipur(),
    }
}

fn bearer(donor_id: &str) -> String {
    let claims = TokenClaims {
        sub: donor_id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();
    format!("Bearer {}", token)
}

macro_rules! init_app {
    ($donors:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(app_state($donors)))
                .configure(routes::configure_extractors)
                .configure(routes::configure_routes),
        )
        .await
    };
}

#[std::prelude::v1::test]
fn test_scenario_single_donor_all_filter() {
    let donors = vec![create_test_donor("2", "O-", "01823456789", 23.9825, 90.4275)];

    let result = locate_nearby_donors(&gazipur(), &donors, BloodTypeFilter::All).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].donor.blood_type, "O-");
    assert!((result[0].distance_km - 2.34).abs() < 0.1, "got {}", result[0].distance_km);
}

#[std::prelude::v1::test]
fn test_scenario_no_matching_blood_type() {
    let donors = vec![create_test_donor("2", "O-", "01823456789", 23.9825, 90.4275)];

    let result = locate_nearby_donors(&gazipur(), &donors, BloodType::APositive.into()).unwrap();
    assert!(result.is_empty());
}

#[std::prelude::v1::test]
fn test_scenario_donors_at_user_location() {
    let user = gazipur();
    let donors = vec![
        create_test_donor("first", "B-", "01700000001", user.lat, user.lon),
        create_test_donor("second", "AB+", "01700000002", user.lat, user.lon),
    ];

    let result = locate_nearby_donors(&user, &donors, BloodTypeFilter::All).unwrap();

    let ids: Vec<_> = result.iter().map(|d| d.donor.id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second"]);
    assert!(result.iter().all(|d| d.distance_km == 0.0));
}

#[std::prelude::v1::test]
fn test_empty_donor_list_is_not_an_error() {
    for filter in [BloodTypeFilter::All, BloodType::ONegative.into()] {
        assert!(locate_nearby_donors(&gazipur(), &[], filter).unwrap().is_empty());
    }
}

#[actix_web::test]
async fn test_health_endpoint() {
    let app = init_app!(vec![]);

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[actix_web::test]
async fn test_register_and_check_phone() {
    let app = init_app!(vec![]);

    let payload = json!({
        "name": "Rahima Begum",
        "phone": "01712345678",
        "bloodType": "A+",
        "latitude": 23.9985,
        "longitude": 90.4125
    });

    let req = test::TestRequest::post()
        .uri("/api/v1/donors/register")
        .set_json(&payload)
        .to_request();
    let donor: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(donor["bloodType"], "A+");
    assert_eq!(donor["isAvailable"], true);
    assert!(donor["id"].as_str().is_some());

    let req = test::TestRequest::get()
        .uri("/api/v1/donors/check-phone/01712345678")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["exists"], true);

    let req = test::TestRequest::get()
        .uri("/api/v1/donors/check-phone/01999999999")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["exists"], false);

    // Same phone again
    let req = test::TestRequest::post()
        .uri("/api/v1/donors/register")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_register_validation() {
    let app = init_app!(vec![]);

    let bad_phone = json!({
        "name": "Rahima Begum",
        "phone": "12345",
        "bloodType": "A+",
        "latitude": 23.9985,
        "longitude": 90.4125
    });
    let req = test::TestRequest::post()
        .uri("/api/v1/donors/register")
        .set_json(&bad_phone)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let blank_name = json!({
        "name": "   ",
        "phone": "01712345678",
        "bloodType": "A+",
        "latitude": 23.9985,
        "longitude": 90.4125
    });
    let req = test::TestRequest::post()
        .uri("/api/v1/donors/register")
        .set_json(&blank_name)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/v1/donors/check-phone/01712345678")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["exists"], false);

    let bad_blood_type = json!({
        "name": "Rahima Begum",
        "phone": "01712345678",
        "bloodType": "C+",
        "latitude": 23.9985,
        "longitude": 90.4125
    });
    let req = test::TestRequest::post()
        .uri("/api/v1/donors/register")
        .set_json(&bad_blood_type)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_json");
}

#[actix_web::test]
async fn test_locate_uses_fallback_location() {
    let app = init_app!(seeded_donors());

    let req = test::TestRequest::post()
        .uri("/api/v1/donors/locate")
        .set_json(json!({ "bloodType": "O-" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["usedFallbackLocation"], true);
    assert_eq!(body["userLocation"]["latitude"], 23.9985);
    let donors = body["donors"].as_array().unwrap();
    assert_eq!(donors.len(), 1);
    assert_eq!(donors[0]["id"], "abdul");
    assert_eq!(donors[0]["distanceKm"], 2.3);
}

#[actix_web::test]
async fn test_locate_preserves_directory_order() {
    let app = init_app!(seeded_donors());

    let req = test::TestRequest::post()
        .uri("/api/v1/donors/locate")
        .set_json(json!({
            "userLocation": { "lat": 23.9985, "lng": 90.4125 },
            "bloodType": "ALL"
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["usedFallbackLocation"], false);
    let ids: Vec<_> = body["donors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["abdul", "fatima", "kamal", "nasreen", "nusrat"]);
}

#[actix_web::test]
async fn test_locate_rejects_invalid_location() {
    let app = init_app!(seeded_donors());

    let req = test::TestRequest::post()
        .uri("/api/v1/donors/locate")
        .set_json(json!({ "userLocation": { "latitude": 95.0, "longitude": 90.4 } }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].as_str().unwrap().contains("invalid coordinate"));
}

#[actix_web::test]
async fn test_nearby_sorted_nearest_first() {
    let app = init_app!(seeded_donors());

    let req = test::TestRequest::get()
        .uri("/api/v1/donors/nearby?latitude=23.9985&longitude=90.4125")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let ids: Vec<_> = body["donors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap().to_string())
        .collect();
    // Uttara is outside the default 10km radius
    assert_eq!(ids, vec!["nasreen", "abdul", "fatima", "nusrat"]);
    assert_eq!(body["totalCandidates"], 5);
}

#[actix_web::test]
async fn test_nearby_blood_type_and_limit() {
    let app = init_app!(seeded_donors());

    let req = test::TestRequest::get()
        .uri("/api/v1/donors/nearby?latitude=23.9985&longitude=90.4125&bloodType=O%2B&limit=1")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let donors = body["donors"].as_array().unwrap();
    assert_eq!(donors.len(), 1);
    assert_eq!(donors[0]["id"], "nasreen");

    let req = test::TestRequest::get()
        .uri("/api/v1/donors/nearby?latitude=23.9985&longitude=90.4125&bloodType=UNSPECIFIED")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["donors"].as_array().unwrap().len(), 4);

    // The locate body only takes ALL or a concrete type
    let req = test::TestRequest::post()
        .uri("/api/v1/donors/locate")
        .set_json(json!({ "bloodType": "UNSPECIFIED" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_nearby_bad_query() {
    let app = init_app!(seeded_donors());

    let req = test::TestRequest::get()
        .uri("/api/v1/donors/nearby?longitude=90.4125")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_query");

    let req = test::TestRequest::get()
        .uri("/api/v1/donors/nearby?latitude=23.9985&longitude=90.4125&bloodType=ab%2B")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/v1/donors/nearby?latitude=23.9985&longitude=90.4125&radiusKm=-1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_update_location_requires_token() {
    let app = init_app!(seeded_donors());

    let req = test::TestRequest::put()
        .uri("/api/v1/donors/location")
        .set_json(json!({ "latitude": 23.99, "longitude": 90.41 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::put()
        .uri("/api/v1/donors/location")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .set_json(json!({ "latitude": 23.99, "longitude": 90.41 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_update_location_refreshes_nearby_results() {
    let app = init_app!(seeded_donors());
    let nearby_uri = "/api/v1/donors/nearby?latitude=23.9985&longitude=90.4125";

    // Prime the cache
    let req = test::TestRequest::get().uri(nearby_uri).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["donors"].as_array().unwrap().len(), 4);

    // Kamal moves from Uttara to Gazipur
    let req = test::TestRequest::put()
        .uri("/api/v1/donors/location")
        .insert_header(("Authorization", bearer("kamal")))
        .set_json(json!({ "latitude": 23.9985, "longitude": 90.4125 }))
        .to_request();
    let donor: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(donor["location"]["latitude"], 23.9985);

    let req = test::TestRequest::get().uri(nearby_uri).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let donors = body["donors"].as_array().unwrap();
    assert_eq!(donors.len(), 5);
    assert_eq!(donors[0]["id"], "kamal");
    assert_eq!(donors[0]["distanceKm"], 0.0);
}

#[actix_web::test]
async fn test_nearby_ignores_response_from_replaced_snapshot() {
    let state = app_state(vec![]);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure_extractors)
            .configure(routes::configure_routes),
    )
    .await;

    let query = state.locator.query(gazipur(), BloodTypeFilter::All, None, None);
    let key = CacheKey::nearby(&query);

    // A search reads its snapshot while a registration is in flight
    let generation = state.cache.generation();
    let snapshot = state.directory.list().await.unwrap();

    let request = RegisterDonorRequest {
        name: "Abdul Karim".to_string(),
        phone: "01823456789".to_string(),
        blood_type: BloodType::ONegative,
        latitude: 23.9825,
        longitude: 90.4275,
        last_donation_date: None,
    };
    state.directory.register(&request).await.unwrap();
    state.cache.invalidate_all();

    let result = state.locator.find_nearby(&query, &snapshot).unwrap();
    let stale = NearbyDonorsResponse {
        donors: result.donors,
        total_candidates: result.total_candidates,
    };
    state.cache.insert(generation, &key, stale).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/donors/nearby?latitude=23.9985&longitude=90.4125")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["donors"].as_array().unwrap().len(), 1);
    assert_eq!(body["totalCandidates"], 1);
}

#[actix_web::test]
async fn test_update_location_unknown_donor() {
    let app = init_app!(seeded_donors());

    let req = test::TestRequest::put()
        .uri("/api/v1/donors/location")
        .insert_header(("Authorization", bearer("ghost")))
        .set_json(json!({ "latitude": 23.99, "longitude": 90.41 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_malformed_json() {
    let app = init_app!(seeded_donors());

    let req = test::TestRequest::post()
        .uri("/api/v1/donors/locate")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_json");
    assert_eq!(body["status_code"], 400);
}
