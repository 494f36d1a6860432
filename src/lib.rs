//! Roomie Match - roommate compatibility scoring and swipe matching
//!
//! Scores pairs of student profiles across five weighted dimensions, ranks
//! candidate pools by that score, and turns mutual likes into exactly one
//! persisted match even when both likes arrive at the same time.

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{CompatibilityScorer, Ranker, SwipeCoordinator};
pub use engine::MatchEngine;
pub use error::{EngineError, PolicyError};
pub use models::{
    CanonicalPair, CompatibilityLevel, CompatibilityResult, LikeOutcome, PairState, PassOutcome,
    ProfileSnapshot, RankedCandidate, ScoringPolicy,
};
