use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to rank a candidate pool
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RankRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[serde(alias = "candidate_ids", rename = "candidateIds", default)]
    pub candidate_ids: Vec<String>,
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Request to record a Like or Pass
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SwipeRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "actor_id", rename = "actorId")]
    pub actor_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "target_id", rename = "targetId")]
    pub target_id: String,
}

/// Request to toggle a match's active flag
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetMatchActiveRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_a", rename = "userA")]
    pub user_a: String,
    #[validate(length(min = 1))]
    #[serde(alias = "user_b", rename = "userB")]
    pub user_b: String,
    #[serde(alias = "is_active", rename = "isActive")]
    pub is_active: bool,
}

/// Query string for pair lookups
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PairQuery {
    #[validate(length(min = 1))]
    #[serde(rename = "userA")]
    pub user_a: String,
    #[validate(length(min = 1))]
    #[serde(rename = "userB")]
    pub user_b: String,
}

/// Query string for per-user lookups
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserQuery {
    #[validate(length(min = 1))]
    #[serde(rename = "userId")]
    pub user_id: String,
}
