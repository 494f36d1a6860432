use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;

use crate::core::{order_candidates, CompatibilityScorer, PreparedProfile, RankResult, Ranker, SwipeCoordinator};
use crate::error::EngineError;
use crate::models::{CanonicalPair, CompatibilityResult, LikeOutcome, PassOutcome, RankedCandidate};
use crate::services::{CacheManager, ProfileProvider, SwipeStore};

/// Default number of candidate profiles resolved concurrently
pub const DEFAULT_RESOLVE_CONCURRENCY: usize = 16;

/// Entry point tying the scorer, ranker and swipe coordinator to their collaborators
///
/// Scoring and ranking read live profile snapshots through the provider and
/// are safe to call from any number of tasks. Swipes go through the
/// coordinator, which owns no state of its own.
#[derive(Clone)]
pub struct MatchEngine {
    profiles: Arc<dyn ProfileProvider>,
    cache: Option<Arc<CacheManager>>,
    ranker: Ranker,
    swipes: SwipeCoordinator,
    resolve_concurrency: usize,
}

impl MatchEngine {
    pub fn new(
        profiles: Arc<dyn ProfileProvider>,
        store: Arc<dyn SwipeStore>,
        scorer: CompatibilityScorer,
    ) -> Self {
        Self {
            profiles,
            cache: None,
            ranker: Ranker::new(scorer),
            swipes: SwipeCoordinator::new(store),
            resolve_concurrency: DEFAULT_RESOLVE_CONCURRENCY,
        }
    }

    pub fn with_cache(mut self, cache: Arc<CacheManager>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_resolve_concurrency(mut self, concurrency: usize) -> Self {
        self.resolve_concurrency = concurrency.max(1);
        self
    }

    pub fn swipes(&self) -> &SwipeCoordinator {
        &self.swipes
    }

    pub fn scorer(&self) -> &CompatibilityScorer {
        self.ranker.scorer()
    }

    /// Compatibility between two users, resolved through the profile provider
    ///
    /// Always reads live snapshots, so unknown users fail with `NotFound`.
    /// The result is written to the cache for later ranking passes.
    pub async fn compatibility(&self, user_a: &str, user_b: &str) -> Result<CompatibilityResult, EngineError> {
        let (a, b) = tokio::try_join!(
            self.profiles.get_snapshot(user_a),
            self.profiles.get_snapshot(user_b)
        )?;
        let result = self.scorer().score(&a, &b)?;

        if let Some(pair) = CanonicalPair::new(user_a, user_b) {
            self.store_cached(&pair, &result).await;
        }

        Ok(result)
    }

    /// Rank candidate ids by compatibility with the requester
    ///
    /// Fails only if the requester cannot be resolved or scored. Candidates
    /// that cannot be resolved or lack required attributes are skipped.
    pub async fn rank(
        &self,
        requester: &str,
        candidate_ids: &[String],
        limit: usize,
    ) -> Result<RankResult, EngineError> {
        let snapshot = self.profiles.get_snapshot(requester).await?;
        let requester = PreparedProfile::prepare(&snapshot)?;

        let mut seen = HashSet::new();
        let ids: Vec<&str> = candidate_ids
            .iter()
            .map(String::as_str)
            .filter(|id| *id != requester.user_id)
            .filter(|id| seen.insert(*id))
            .collect();

        let requester = &requester;
        let scored: Vec<(&str, Result<CompatibilityResult, EngineError>)> = stream::iter(ids)
            .map(|id| async move { (id, self.score_candidate(requester, id).await) })
            .buffer_unordered(self.resolve_concurrency)
            .collect()
            .await;

        let mut skipped = 0;
        let ranked: Vec<RankedCandidate> = scored
            .into_iter()
            .filter_map(|(id, result)| match result {
                Ok(compatibility) => Some(RankedCandidate {
                    user_id: id.to_string(),
                    compatibility,
                }),
                Err(e) => {
                    tracing::warn!("Skipping candidate {} for {}: {}", id, requester.user_id, e);
                    skipped += 1;
                    None
                }
            })
            .collect();

        tracing::debug!(
            "Ranked {} of {} candidates for {} ({} skipped)",
            ranked.len(),
            candidate_ids.len(),
            requester.user_id,
            skipped
        );

        Ok(RankResult {
            candidates: order_candidates(ranked, limit),
            total_candidates: candidate_ids.len(),
            skipped,
        })
    }

    pub async fn record_like(&self, actor: &str, target: &str) -> Result<LikeOutcome, EngineError> {
        self.swipes.record_like(actor, target).await
    }

    pub async fn record_pass(&self, actor: &str, target: &str) -> Result<PassOutcome, EngineError> {
        self.swipes.record_pass(actor, target).await
    }

    async fn score_candidate(
        &self,
        requester: &PreparedProfile,
        candidate_id: &str,
    ) -> Result<CompatibilityResult, EngineError> {
        let pair = CanonicalPair::new(&requester.user_id, candidate_id)
            .ok_or_else(|| EngineError::InvalidActor(candidate_id.to_string()))?;

        if let Some(cached) = self.cached(&requester.user_id, &pair).await {
            return Ok(cached);
        }

        let snapshot = self.profiles.get_snapshot(candidate_id).await?;
        let candidate = PreparedProfile::prepare(&snapshot)?;
        let result = self.scorer().score_prepared(requester, &candidate);

        self.store_cached(&pair, &result).await;

        Ok(result)
    }

    async fn cached(&self, user_a: &str, pair: &CanonicalPair) -> Option<CompatibilityResult> {
        let cache = self.cache.as_ref()?;
        cache.get_compatibility(user_a, pair).await.ok()
    }

    async fn store_cached(&self, pair: &CanonicalPair, result: &CompatibilityResult) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put_compatibility(pair, result).await {
                tracing::warn!("Failed to cache compatibility for {}: {}", pair, e);
            }
        }
    }
}
