use actix_web::{web, HttpResponse};

use super::{validated, AppState};
use crate::error::EngineError;
use crate::models::{
    MatchesResponse, OutgoingResponse, PairQuery, PairStateResponse, SetMatchActiveRequest,
    SwipeRequest, UserQuery,
};

/// Configure swipe and match routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/swipes/like", web::post().to(record_like))
        .route("/swipes/pass", web::post().to(record_pass))
        .route("/swipes/state", web::get().to(pair_state))
        .route("/swipes/outgoing", web::get().to(outgoing_actions))
        .route("/swipes/history", web::get().to(action_history))
        .route("/matches", web::get().to(list_matches))
        .route("/matches/active", web::put().to(set_match_active));
}

/// Record a Like
///
/// POST /api/v1/swipes/like
///
/// Request body:
/// ```json
/// {
///   "actorId": "string",
///   "targetId": "string"
/// }
/// ```
async fn record_like(
    state: web::Data<AppState>,
    req: web::Json<SwipeRequest>,
) -> Result<HttpResponse, EngineError> {
    validated(&*req)?;

    let outcome = state.engine.record_like(&req.actor_id, &req.target_id).await?;

    Ok(HttpResponse::Ok().json(outcome))
}

/// Record a Pass
///
/// POST /api/v1/swipes/pass
async fn record_pass(
    state: web::Data<AppState>,
    req: web::Json<SwipeRequest>,
) -> Result<HttpResponse, EngineError> {
    validated(&*req)?;

    let outcome = state.engine.record_pass(&req.actor_id, &req.target_id).await?;

    Ok(HttpResponse::Ok().json(outcome))
}

/// GET /api/v1/swipes/state?userA={userA}&userB={userB}
async fn pair_state(
    state: web::Data<AppState>,
    query: web::Query<PairQuery>,
) -> Result<HttpResponse, EngineError> {
    validated(&*query)?;

    let pair_state = state.engine.swipes().pair_state(&query.user_a, &query.user_b).await?;

    Ok(HttpResponse::Ok().json(PairStateResponse {
        user_a: query.user_a.clone(),
        user_b: query.user_b.clone(),
        state: pair_state,
    }))
}

/// Current outgoing swipes of a user
///
/// GET /api/v1/swipes/outgoing?userId={userId}
async fn outgoing_actions(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, EngineError> {
    validated(&*query)?;

    let actions = state.engine.swipes().outgoing_actions(&query.user_id).await?;

    Ok(HttpResponse::Ok().json(OutgoingResponse {
        user_id: query.user_id.clone(),
        count: actions.len(),
        actions,
    }))
}

/// Audit log of userA's actions towards userB
///
/// GET /api/v1/swipes/history?userA={actor}&userB={target}
async fn action_history(
    state: web::Data<AppState>,
    query: web::Query<PairQuery>,
) -> Result<HttpResponse, EngineError> {
    validated(&*query)?;

    let history = state
        .engine
        .swipes()
        .action_history(&query.user_a, &query.user_b)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "actorId": query.user_a,
        "targetId": query.user_b,
        "history": history,
        "count": history.len(),
    })))
}

/// GET /api/v1/matches?userId={userId}
async fn list_matches(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, EngineError> {
    validated(&*query)?;

    let matches = state.engine.swipes().matches_for(&query.user_id).await?;

    Ok(HttpResponse::Ok().json(MatchesResponse {
        user_id: query.user_id.clone(),
        count: matches.len(),
        matches,
    }))
}

/// Toggle a match's active flag
///
/// PUT /api/v1/matches/active
async fn set_match_active(
    state: web::Data<AppState>,
    req: web::Json<SetMatchActiveRequest>,
) -> Result<HttpResponse, EngineError> {
    validated(&*req)?;

    let updated = state
        .engine
        .swipes()
        .set_match_active(&req.user_a, &req.user_b, req.is_active)
        .await?;

    Ok(HttpResponse::Ok().json(updated))
}
