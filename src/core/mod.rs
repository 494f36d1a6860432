// Core algorithm exports
pub mod overlap;
pub mod ranker;
pub mod scoring;
pub mod swipe;

pub use overlap::{normalize_tags, shared_tags, tag_overlap};
pub use ranker::{order_candidates, RankResult, Ranker};
pub use scoring::{CompatibilityScorer, PreparedProfile};
pub use swipe::SwipeCoordinator;
