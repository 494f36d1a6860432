use actix_web::{web, HttpResponse};

use super::{validated, AppState};
use crate::error::EngineError;
use crate::models::{HealthResponse, RankRequest, RankResponse};

/// Configure scoring and ranking routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/compatibility/{user_a}/{user_b}", web::get().to(get_compatibility))
        .route("/rank", web::post().to(rank_candidates));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let store_healthy = state
        .engine
        .swipes()
        .store()
        .health_check()
        .await
        .unwrap_or(false);

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Pairwise compatibility
///
/// GET /api/v1/compatibility/{userA}/{userB}
async fn get_compatibility(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, EngineError> {
    let (user_a, user_b) = path.into_inner();

    let result = state.engine.compatibility(&user_a, &user_b).await?;

    tracing::debug!(
        "Compatibility {} <-> {}: {:.3} ({})",
        user_a,
        user_b,
        result.composite_score,
        result.level.label()
    );

    Ok(HttpResponse::Ok().json(result))
}

/// Rank a candidate pool
///
/// POST /api/v1/rank
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "candidateIds": ["string"],
///   "limit": 20
/// }
/// ```
async fn rank_candidates(
    state: web::Data<AppState>,
    req: web::Json<RankRequest>,
) -> Result<HttpResponse, EngineError> {
    validated(&*req)?;

    let limit = state.ranking.effective_limit(req.limit);

    tracing::info!(
        "Ranking {} candidates for user: {}, limit: {}",
        req.candidate_ids.len(),
        req.user_id,
        limit
    );

    let result = state.engine.rank(&req.user_id, &req.candidate_ids, limit).await?;

    tracing::info!(
        "Returning {} candidates for user {} ({} skipped)",
        result.candidates.len(),
        req.user_id,
        result.skipped
    );

    Ok(HttpResponse::Ok().json(RankResponse {
        candidates: result.candidates,
        total_candidates: result.total_candidates,
    }))
}
