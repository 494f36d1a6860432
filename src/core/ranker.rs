use std::cmp::Ordering;
use std::collections::HashSet;

use crate::core::scoring::{CompatibilityScorer, PreparedProfile};
use crate::error::EngineError;
use crate::models::{CompatibilityResult, ProfileSnapshot, RankedCandidate};

/// Result of a ranking pass
#[derive(Debug)]
pub struct RankResult {
    pub candidates: Vec<RankedCandidate>,
    pub total_candidates: usize,
    pub skipped: usize,
}

/// Ranks a candidate pool by compatibility with the requester
///
/// # Pipeline Stages
/// 1. Drop the requester and duplicate candidate ids
/// 2. Score each candidate (candidates that fail validation are skipped)
/// 3. Sort by composite score, then by candidate id
/// 4. Truncate to the limit
///
/// Previously passed or matched candidates are not filtered here.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ranker {
    scorer: CompatibilityScorer,
}

impl Ranker {
    pub fn new(scorer: CompatibilityScorer) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &CompatibilityScorer {
        &self.scorer
    }

    /// Rank already-resolved candidate snapshots
    ///
    /// Fails only when the requester's own snapshot cannot be scored.
    pub fn rank(
        &self,
        requester: &ProfileSnapshot,
        candidates: Vec<ProfileSnapshot>,
        limit: usize,
    ) -> Result<RankResult, EngineError> {
        let requester = PreparedProfile::prepare(requester)?;
        let total_candidates = candidates.len();
        let mut seen = HashSet::new();
        let mut skipped = 0;

        let ranked: Vec<RankedCandidate> = candidates
            .into_iter()
            // Stage 1: exclude self and duplicates
            .filter(|candidate| candidate.user_id != requester.user_id)
            .filter(|candidate| seen.insert(candidate.user_id.clone()))
            // Stage 2: score
            .filter_map(|candidate| match PreparedProfile::prepare(&candidate) {
                Ok(prepared) => Some(RankedCandidate {
                    user_id: candidate.user_id,
                    compatibility: self.scorer.score_prepared(&requester, &prepared),
                }),
                Err(e) => {
                    tracing::warn!("Skipping candidate {}: {}", candidate.user_id, e);
                    skipped += 1;
                    None
                }
            })
            .collect();

        Ok(RankResult {
            candidates: order_candidates(ranked, limit),
            total_candidates,
            skipped,
        })
    }
}

/// Sort descending by composite score, ties by ascending candidate id, then truncate
pub fn order_candidates(mut ranked: Vec<RankedCandidate>, limit: usize) -> Vec<RankedCandidate> {
    ranked.sort_by(|a, b| {
        compare_scores(&b.compatibility, &a.compatibility)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    ranked.truncate(limit);
    ranked
}

#[inline]
fn compare_scores(a: &CompatibilityResult, b: &CompatibilityResult) -> Ordering {
    a.composite_score.total_cmp(&b.composite_score)
}
