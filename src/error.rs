use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Errors surfaced by the matching engine
///
/// Collaborator errors (store, profile service) are folded into this
/// taxonomy at the boundary. Nothing here is retried automatically.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Profile {user_id} is missing required attribute '{attribute}'")]
    MissingAttribute {
        user_id: String,
        attribute: &'static str,
    },

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid actor: {0}")]
    InvalidActor(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl EngineError {
    pub fn missing(user_id: &str, attribute: &'static str) -> Self {
        EngineError::MissingAttribute {
            user_id: user_id.to_string(),
            attribute,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            EngineError::NotFound(_) => "not_found",
            EngineError::MissingAttribute { .. } => "missing_attribute",
            EngineError::InvalidProfile(_) => "invalid_profile",
            EngineError::InvalidActor(_) => "invalid_actor",
            EngineError::Conflict(_) => "conflict",
            EngineError::Unavailable(_) => "unavailable",
            EngineError::InvalidRequest(_) => "invalid_request",
        }
    }
}

impl ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::MissingAttribute { .. } | EngineError::InvalidProfile(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            EngineError::InvalidActor(_) | EngineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            EngineError::Conflict(_) => StatusCode::CONFLICT,
            EngineError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}

/// Rejected scoring configuration
#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("Scoring weights must sum to 1.0, got {0}")]
    WeightSum(f64),

    #[error("Scoring weight for {0} must be non-negative")]
    NegativeWeight(&'static str),

    #[error("Level thresholds must be strictly descending within (0, 1]")]
    Thresholds,

    #[error("{0} must lie within [0, 1]")]
    OutOfRange(&'static str),

    #[error("max_age_spread must be positive")]
    AgeSpread,
}
