use actix_cors::Cors;
use actix_web::{error, middleware, web, App, HttpServer};
use roomie_match::config::Settings;
use roomie_match::core::CompatibilityScorer;
use roomie_match::engine::MatchEngine;
use roomie_match::error::EngineError;
use roomie_match::routes::{self, AppState};
use roomie_match::services::{CacheManager, HttpProfileProvider, PostgresStore};
use std::io;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Handle JSON payload errors
fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    EngineError::InvalidRequest(format!("Invalid JSON: {}", err)).into()
}

/// Handle query payload errors
fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    EngineError::InvalidRequest(format!("Invalid query: {}", err)).into()
}

/// Handle path segment errors
fn handle_path_error(err: error::PathError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    EngineError::InvalidRequest(format!("Invalid path: {}", err)).into()
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| startup_error("Failed to load configuration", e))?;

    // RUST_LOG takes precedence over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.is_pretty() {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting roommate matching service...");
    info!("Configuration loaded successfully");

    let policy = settings
        .scoring
        .to_policy()
        .map_err(|e| startup_error("Invalid scoring configuration", e))?;
    let scorer = CompatibilityScorer::new(policy).map_err(|e| startup_error("Invalid scoring configuration", e))?;

    info!("Scorer initialized with weights: {:?}", policy.weights);

    let profiles = Arc::new(
        HttpProfileProvider::new(settings.profiles.to_api_config())
            .map_err(|e| startup_error("Failed to build profile client", e))?,
    );

    info!("Profile client initialized ({})", settings.profiles.endpoint);

    // Cache is optional; without Redis the in-process tier still applies
    let cache_ttl = settings.cache.ttl_secs.unwrap_or(300);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(10_000);

    let cache = match &settings.cache.redis_url {
        Some(redis_url) => match CacheManager::new(redis_url, l1_cache_size, cache_ttl).await {
            Ok(c) => {
                info!("Cache manager initialized with Redis (L1: {} entries, TTL: {}s)", l1_cache_size, cache_ttl);
                c
            }
            Err(e) => {
                warn!("Failed to connect to Redis ({}), using in-process cache only", e);
                CacheManager::local(l1_cache_size, cache_ttl)
            }
        },
        None => {
            info!("No Redis configured, using in-process cache (L1: {} entries)", l1_cache_size);
            CacheManager::local(l1_cache_size, cache_ttl)
        }
    };

    info!("Cache ready: {:?}", cache.stats());

    let db_max_conn = settings.database.max_connections.unwrap_or(10);

    let store = Arc::new(
        PostgresStore::from_settings(
            &settings.database.url,
            Some(db_max_conn),
            settings.database.min_connections,
            settings.database.acquire_timeout_secs,
            settings.database.idle_timeout_secs,
        )
        .await
        .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?,
    );

    info!("PostgreSQL store initialized (max: {} connections)", db_max_conn);

    let engine = MatchEngine::new(profiles, store, scorer)
        .with_cache(Arc::new(cache))
        .with_resolve_concurrency(settings.ranking.resolve_concurrency);

    let app_state = AppState {
        engine,
        ranking: settings.ranking.clone(),
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
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
