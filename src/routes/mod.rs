// Route exports
pub mod compatibility;
pub mod swipes;

use actix_web::web;
use validator::Validate;

use crate::config::RankingSettings;
use crate::engine::MatchEngine;
use crate::error::EngineError;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: MatchEngine,
    pub ranking: RankingSettings,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(compatibility::configure)
            .configure(swipes::configure),
    );
}

/// Run validator rules and fold failures into the engine's error type
fn validated<T: Validate>(request: &T) -> Result<(), EngineError> {
    request.validate().map_err(|errors| {
        tracing::info!("Validation failed: {}", errors);
        EngineError::InvalidRequest(errors.to_string())
    })
}
