use std::sync::Arc;

use crate::error::EngineError;
use crate::models::{
    CanonicalPair, DirectedState, LikeOutcome, PairState, PassOutcome, SwipeAction, SwipeKind,
    UserMatch,
};
use crate::services::store::SwipeStore;

/// Records Like/Pass actions and turns mutual likes into exactly one match
///
/// The coordinator holds no per-pair state of its own. Exactly-once match
/// creation rests on the store's conditional insert keyed by canonical pair,
/// so any number of coordinator instances may share one store.
#[derive(Clone)]
pub struct SwipeCoordinator {
    store: Arc<dyn SwipeStore>,
}

impl SwipeCoordinator {
    pub fn new(store: Arc<dyn SwipeStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SwipeStore> {
        &self.store
    }

    /// Record a Like from `actor` towards `target`
    ///
    /// Returns `created = true` only for the call that created the match.
    /// Once a match exists every later like reports it with `created = false`.
    pub async fn record_like(&self, actor: &str, target: &str) -> Result<LikeOutcome, EngineError> {
        let pair = swipe_pair(actor, target)?;

        self.store
            .record_action(&SwipeAction::new(actor, target, SwipeKind::Like))
            .await?;

        // Our like is committed before this read, so of two racing likes at
        // least one sees the other and both end at the same insert
        let reciprocal = self.store.directed_state(target, actor).await?;

        if reciprocal == DirectedState::Liked {
            let insert = self.store.insert_match_if_absent(UserMatch::new(&pair)).await?;

            if insert.created {
                tracing::info!(
                    "Match {} created for {} (completed by {})",
                    insert.record.match_id,
                    pair,
                    actor
                );
            } else {
                tracing::debug!("Match {} already exists for {}", insert.record.match_id, pair);
            }

            return Ok(LikeOutcome {
                created: insert.created,
                match_id: Some(insert.record.match_id),
            });
        }

        let existing = self.store.find_match(&pair).await?;

        tracing::debug!("Recorded like {} -> {} (reciprocal: {:?})", actor, target, reciprocal);

        Ok(LikeOutcome {
            created: false,
            match_id: existing.map(|m| m.match_id),
        })
    }

    /// Record a Pass from `actor` towards `target`
    ///
    /// Only the actor's direction changes; an existing match is left untouched.
    pub async fn record_pass(&self, actor: &str, target: &str) -> Result<PassOutcome, EngineError> {
        swipe_pair(actor, target)?;

        self.store
            .record_action(&SwipeAction::new(actor, target, SwipeKind::Pass))
            .await?;

        tracing::debug!("Recorded pass {} -> {}", actor, target);

        Ok(PassOutcome { acknowledged: true })
    }

    /// Current state of the pair's swipe state machine
    pub async fn pair_state(&self, user_a: &str, user_b: &str) -> Result<PairState, EngineError> {
        let pair = swipe_pair(user_a, user_b)?;

        let existing = self.store.find_match(&pair).await?;
        let low_to_high = self.store.directed_state(&pair.low, &pair.high).await?;
        let high_to_low = self.store.directed_state(&pair.high, &pair.low).await?;

        Ok(PairState::derive(&pair, low_to_high, high_to_low, existing.as_ref()))
    }

    /// Matches involving the user, newest first
    pub async fn matches_for(&self, user_id: &str) -> Result<Vec<UserMatch>, EngineError> {
        require_user(user_id)?;
        Ok(self.store.matches_for(user_id).await?)
    }

    /// Toggle a match's active flag (the downstream relationship workflow)
    pub async fn set_match_active(
        &self,
        user_a: &str,
        user_b: &str,
        is_active: bool,
    ) -> Result<UserMatch, EngineError> {
        let pair = swipe_pair(user_a, user_b)?;

        let updated = self
            .store
            .set_match_active(&pair, is_active)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("No match for {}", pair)))?;

        tracing::info!("Match {} active flag set to {}", updated.match_id, is_active);

        Ok(updated)
    }

    /// Current outgoing actions of a user
    pub async fn outgoing_actions(&self, actor: &str) -> Result<Vec<SwipeAction>, EngineError> {
        require_user(actor)?;
        Ok(self.store.outgoing_actions(actor).await?)
    }

    /// Audit log of one directed edge
    pub async fn action_history(&self, actor: &str, target: &str) -> Result<Vec<SwipeAction>, EngineError> {
        swipe_pair(actor, target)?;
        Ok(self.store.action_history(actor, target).await?)
    }
}

fn require_user(user_id: &str) -> Result<(), EngineError> {
    if user_id.trim().is_empty() {
        return Err(EngineError::InvalidActor("user id must not be empty".to_string()));
    }
    Ok(())
}

/// Canonical pair for a swipe; self-swipes and blank ids are rejected
fn swipe_pair(actor: &str, target: &str) -> Result<CanonicalPair, EngineError> {
    require_user(actor)?;
    require_user(target)?;
    CanonicalPair::new(actor, target)
        .ok_or_else(|| EngineError::InvalidActor(format!("user {} cannot swipe on themselves", actor)))
}
