use serde::{Deserialize, Serialize};
use crate::models::domain::{PairState, RankedCandidate, SwipeAction, UserMatch};

/// Response for the rank endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankResponse {
    pub candidates: Vec<RankedCandidate>,
    pub total_candidates: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Pair state lookup response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairStateResponse {
    #[serde(rename = "userA")]
    pub user_a: String,
    #[serde(rename = "userB")]
    pub user_b: String,
    #[serde(flatten)]
    pub state: PairState,
}

/// A user's matches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchesResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub matches: Vec<UserMatch>,
    pub count: usize,
}

/// A user's current outgoing swipes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub actions: Vec<SwipeAction>,
    pub count: usize,
}
