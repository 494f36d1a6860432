// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    CanonicalPair, CompatibilityLevel, CompatibilityResult, Dimension, DimensionScore,
    DirectedState, LevelThresholds, LikeOutcome, PairState, PassOutcome, ProfileSnapshot,
    RankedCandidate, ScoringPolicy, ScoringWeights, SwipeAction, SwipeKind, UserMatch,
};
pub use requests::{PairQuery, RankRequest, SetMatchActiveRequest, SwipeRequest, UserQuery};
pub use responses::{
    ErrorResponse, HealthResponse, MatchesResponse, OutgoingResponse, PairStateResponse,
    RankResponse,
};
