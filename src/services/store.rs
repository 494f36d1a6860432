use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

use crate::error::EngineError;
use crate::models::{CanonicalPair, DirectedState, SwipeAction, UserMatch};

/// Errors that can occur in a swipe/match store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Match insert for {0} conflicted but no existing row is visible")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(pair) => {
                EngineError::Conflict(format!("match creation for {} could not be resolved", pair))
            }
            other => EngineError::Unavailable(other.to_string()),
        }
    }
}

/// Outcome of a conditional match insert
#[derive(Debug, Clone, PartialEq)]
pub struct MatchInsert {
    pub record: UserMatch,
    /// True when this insert created the row
    pub created: bool,
}

/// Durable storage for swipe state, the swipe audit log and matches
///
/// Implementations must make `insert_match_if_absent` atomic per canonical
/// pair and must make `record_action` visible to any `directed_state` call
/// that starts after it returns.
#[async_trait]
pub trait SwipeStore: Send + Sync {
    /// Upsert the directed state for (actor, target). Appends an audit row only
    /// when the state actually changed. Returns whether it changed.
    async fn record_action(&self, action: &SwipeAction) -> Result<bool, StoreError>;

    async fn directed_state(&self, actor_id: &str, target_id: &str) -> Result<DirectedState, StoreError>;

    /// Insert `candidate` unless a match already exists for its pair, in which
    /// case the existing row is returned with `created = false`
    async fn insert_match_if_absent(&self, candidate: UserMatch) -> Result<MatchInsert, StoreError>;

    async fn find_match(&self, pair: &CanonicalPair) -> Result<Option<UserMatch>, StoreError>;

    async fn set_match_active(
        &self,
        pair: &CanonicalPair,
        is_active: bool,
    ) -> Result<Option<UserMatch>, StoreError>;

    /// Matches involving the user, newest first
    async fn matches_for(&self, user_id: &str) -> Result<Vec<UserMatch>, StoreError>;

    /// Current directed actions taken by the actor, newest first
    async fn outgoing_actions(&self, actor_id: &str) -> Result<Vec<SwipeAction>, StoreError>;

    /// Audit log for one directed edge, oldest first
    async fn action_history(&self, actor_id: &str, target_id: &str) -> Result<Vec<SwipeAction>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}

#[derive(Debug, Clone)]
struct DirectedEdge {
    current: SwipeAction,
    history: Vec<SwipeAction>,
}

/// In-process store with the same guarantees as the PostgreSQL store
///
/// Each key is guarded by its DashMap shard lock, so the per-pair match insert
/// is atomic. Useful for tests, benches and single-instance deployments.
#[derive(Debug)]
pub struct MemoryStore {
    edges: DashMap<(String, String), DirectedEdge>,
    matches: DashMap<CanonicalPair, UserMatch>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            edges: DashMap::new(),
            matches: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate an outage; every call fails with `Unavailable` while false
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        }
    }
}

#[async_trait]
impl SwipeStore for MemoryStore {
    async fn record_action(&self, action: &SwipeAction) -> Result<bool, StoreError> {
        self.ensure_available()?;

        let key = (action.actor_id.clone(), action.target_id.clone());
        let changed = match self.edges.entry(key) {
            Entry::Occupied(mut occupied) => {
                let edge = occupied.get_mut();
                if edge.current.action == action.action {
                    false
                } else {
                    edge.current = action.clone();
                    edge.history.push(action.clone());
                    true
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(DirectedEdge {
                    current: action.clone(),
                    history: vec![action.clone()],
                });
                true
            }
        };

        Ok(changed)
    }

    async fn directed_state(&self, actor_id: &str, target_id: &str) -> Result<DirectedState, StoreError> {
        self.ensure_available()?;

        Ok(self
            .edges
            .get(&(actor_id.to_string(), target_id.to_string()))
            .map(|edge| DirectedState::from(edge.current.action))
            .unwrap_or_default())
    }

    async fn insert_match_if_absent(&self, candidate: UserMatch) -> Result<MatchInsert, StoreError> {
        self.ensure_available()?;

        let insert = match self.matches.entry(candidate.pair()) {
            Entry::Occupied(existing) => MatchInsert {
                record: existing.get().clone(),
                created: false,
            },
            Entry::Vacant(vacant) => {
                vacant.insert(candidate.clone());
                MatchInsert {
                    record: candidate,
                    created: true,
                }
            }
        };

        Ok(insert)
    }

    async fn find_match(&self, pair: &CanonicalPair) -> Result<Option<UserMatch>, StoreError> {
        self.ensure_available()?;
        Ok(self.matches.get(pair).map(|m| m.clone()))
    }

    async fn set_match_active(
        &self,
        pair: &CanonicalPair,
        is_active: bool,
    ) -> Result<Option<UserMatch>, StoreError> {
        self.ensure_available()?;
        Ok(self.matches.get_mut(pair).map(|mut m| {
            m.is_active = is_active;
            m.clone()
        }))
    }

    async fn matches_for(&self, user_id: &str) -> Result<Vec<UserMatch>, StoreError> {
        self.ensure_available()?;

        let mut matches: Vec<UserMatch> = self
            .matches
            .iter()
            .filter(|m| m.user_low == user_id || m.user_high == user_id)
            .map(|m| m.clone())
            .collect();
        matches.sort_by(|a, b| b.matched_at.cmp(&a.matched_at).then_with(|| a.match_id.cmp(&b.match_id)));

        Ok(matches)
    }

    async fn outgoing_actions(&self, actor_id: &str) -> Result<Vec<SwipeAction>, StoreError> {
        self.ensure_available()?;

        let mut actions: Vec<SwipeAction> = self
            .edges
            .iter()
            .filter(|edge| edge.key().0 == actor_id)
            .map(|edge| edge.current.clone())
            .collect();
        actions.sort_by(|a, b| {
            b.recorded_at
                .cmp(&a.recorded_at)
                .then_with(|| a.target_id.cmp(&b.target_id))
        });

        Ok(actions)
    }

    async fn action_history(&self, actor_id: &str, target_id: &str) -> Result<Vec<SwipeAction>, StoreError> {
        self.ensure_available()?;

        Ok(self
            .edges
            .get(&(actor_id.to_string(), target_id.to_string()))
            .map(|edge| edge.history.clone())
            .unwrap_or_default())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(self.available.load(Ordering::SeqCst))
    }
}
