use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use donor_locator::config::Settings;
use donor_locator::core::DonorLocator;
use donor_locator::models::Coordinate;
use donor_locator::routes::{self, AppState};
use donor_locator::services::{DonorDirectory, NearbyCache, TokenVerifier};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Initialize logging
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting donor locator service...");

    // Load configuration
    let settings = Settings::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    info!("Configuration loaded successfully");

    let fallback_location = Coordinate::new(
        settings.search.fallback_latitude,
        settings.search.fallback_longitude,
    )
    .map_err(|e| {
        error!("Invalid fallback location: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    // Open the donor directory
    let directory = DonorDirectory::from_settings(&settings.storage)
        .await
        .map_err(|e| {
            error!("Failed to open donor directory: {}", e);
            std::io::Error::other(format!("Donor directory error: {}", e))
        })?;

    info!("Donor directory initialized ({} backend)", directory.backend_name());

    let cache = NearbyCache::new(settings.cache.max_entries, settings.cache.ttl_secs);

    info!(
        "Nearby cache initialized ({} entries, TTL: {}s)",
        settings.cache.max_entries, settings.cache.ttl_secs
    );

    let locator = DonorLocator::new(
        settings.search.default_radius_km,
        settings.search.default_limit,
        settings.search.max_limit,
    );

    info!("Locator initialized: {:?}", locator);

    // Build application state
    let app_state = AppState {
        directory: Arc::new(directory),
        cache: Arc::new(cache),
        verifier: Arc::new(TokenVerifier::new(&settings.auth.jwt_secret)),
        locator,
        fallback_location,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .configure(routes::configure_extractors)
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
