use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

use crate::models::{CanonicalPair, DirectedState, SwipeAction, SwipeKind, UserMatch};
use crate::services::store::{MatchInsert, StoreError, SwipeStore};

/// Swipe action column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "swipe_action", rename_all = "lowercase")]
pub enum ActionType {
    Like,
    Pass,
}

impl From<SwipeKind> for ActionType {
    fn from(value: SwipeKind) -> Self {
        match value {
            SwipeKind::Like => ActionType::Like,
            SwipeKind::Pass => ActionType::Pass,
        }
    }
}

impl From<ActionType> for SwipeKind {
    fn from(value: ActionType) -> Self {
        match value {
            ActionType::Like => SwipeKind::Like,
            ActionType::Pass => SwipeKind::Pass,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MatchRow {
    match_id: Uuid,
    user_low: String,
    user_high: String,
    matched_at: chrono::DateTime<chrono::Utc>,
    is_active: bool,
}

impl From<MatchRow> for UserMatch {
    fn from(row: MatchRow) -> Self {
        UserMatch {
            match_id: row.match_id,
            user_low: row.user_low,
            user_high: row.user_high,
            matched_at: row.matched_at,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ActionRow {
    actor_id: String,
    target_id: String,
    action: ActionType,
    recorded_at: chrono::DateTime<chrono::Utc>,
}

impl From<ActionRow> for SwipeAction {
    fn from(row: ActionRow) -> Self {
        SwipeAction {
            actor_id: row.actor_id,
            target_id: row.target_id,
            action: row.action.into(),
            recorded_at: row.recorded_at,
        }
    }
}

/// PostgreSQL-backed swipe and match store
///
/// `swipe_states` holds the current directed state (one row per actor/target),
/// `swipe_events` is the append-only audit log, and `matches` carries a unique
/// constraint on the canonical pair so match creation is an insert-if-absent
/// that stays correct across service instances.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and run embedded migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a store from optional settings, falling back to defaults
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Wrap an existing pool (migrations are assumed to have run)
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SwipeStore for PostgresStore {
    /// Uses INSERT ... ON CONFLICT so repeated identical actions touch nothing;
    /// the audit row is written in the same transaction only on change.
    async fn record_action(&self, action: &SwipeAction) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let upsert = r#"
            INSERT INTO swipe_states (actor_id, target_id, action, recorded_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (actor_id, target_id)
            DO UPDATE SET
                action = EXCLUDED.action,
                recorded_at = EXCLUDED.recorded_at
            WHERE swipe_states.action IS DISTINCT FROM EXCLUDED.action
        "#;

        let changed = sqlx::query(upsert)
            .bind(&action.actor_id)
            .bind(&action.target_id)
            .bind(ActionType::from(action.action))
            .bind(action.recorded_at)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if changed {
            let append = r#"
                INSERT INTO swipe_events (actor_id, target_id, action, recorded_at)
                VALUES ($1, $2, $3, $4)
            "#;

            sqlx::query(append)
                .bind(&action.actor_id)
                .bind(&action.target_id)
                .bind(ActionType::from(action.action))
                .bind(action.recorded_at)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            "Recorded swipe: {} -> {} ({:?}, changed: {})",
            action.actor_id,
            action.target_id,
            action.action,
            changed
        );

        Ok(changed)
    }

    async fn directed_state(&self, actor_id: &str, target_id: &str) -> Result<DirectedState, StoreError> {
        let query = r#"
            SELECT action
            FROM swipe_states
            WHERE actor_id = $1 AND target_id = $2
        "#;

        let row = sqlx::query(query)
            .bind(actor_id)
            .bind(target_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row
            .map(|row| DirectedState::from(SwipeKind::from(row.get::<ActionType, _>("action"))))
            .unwrap_or_default())
    }

    async fn insert_match_if_absent(&self, candidate: UserMatch) -> Result<MatchInsert, StoreError> {
        let insert = r#"
            INSERT INTO matches (match_id, user_low, user_high, matched_at, is_active)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_low, user_high) DO NOTHING
            RETURNING match_id, user_low, user_high, matched_at, is_active
        "#;

        let inserted: Option<MatchRow> = sqlx::query_as(insert)
            .bind(candidate.match_id)
            .bind(&candidate.user_low)
            .bind(&candidate.user_high)
            .bind(candidate.matched_at)
            .bind(candidate.is_active)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = inserted {
            return Ok(MatchInsert {
                record: row.into(),
                created: true,
            });
        }

        // Lost the race: the winning row is committed by the time ON CONFLICT returns
        let pair = candidate.pair();
        match self.find_match(&pair).await? {
            Some(existing) => Ok(MatchInsert {
                record: existing,
                created: false,
            }),
            None => Err(StoreError::Conflict(pair.to_string())),
        }
    }

    async fn find_match(&self, pair: &CanonicalPair) -> Result<Option<UserMatch>, StoreError> {
        let query = r#"
            SELECT match_id, user_low, user_high, matched_at, is_active
            FROM matches
            WHERE user_low = $1 AND user_high = $2
        "#;

        let row: Option<MatchRow> = sqlx::query_as(query)
            .bind(&pair.low)
            .bind(&pair.high)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn set_match_active(
        &self,
        pair: &CanonicalPair,
        is_active: bool,
    ) -> Result<Option<UserMatch>, StoreError> {
        let query = r#"
            UPDATE matches
            SET is_active = $3
            WHERE user_low = $1 AND user_high = $2
            RETURNING match_id, user_low, user_high, matched_at, is_active
        "#;

        let row: Option<MatchRow> = sqlx::query_as(query)
            .bind(&pair.low)
            .bind(&pair.high)
            .bind(is_active)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn matches_for(&self, user_id: &str) -> Result<Vec<UserMatch>, StoreError> {
        let query = r#"
            SELECT match_id, user_low, user_high, matched_at, is_active
            FROM matches
            WHERE user_low = $1 OR user_high = $1
            ORDER BY matched_at DESC, match_id
        "#;

        let rows: Vec<MatchRow> = sqlx::query_as(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!("User {} has {} matches", user_id, rows.len());

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn outgoing_actions(&self, actor_id: &str) -> Result<Vec<SwipeAction>, StoreError> {
        let query = r#"
            SELECT actor_id, target_id, action, recorded_at
            FROM swipe_states
            WHERE actor_id = $1
            ORDER BY recorded_at DESC, target_id
        "#;

        let rows: Vec<ActionRow> = sqlx::query_as(query)
            .bind(actor_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn action_history(&self, actor_id: &str, target_id: &str) -> Result<Vec<SwipeAction>, StoreError> {
        let query = r#"
            SELECT actor_id, target_id, action, recorded_at
            FROM swipe_events
            WHERE actor_id = $1 AND target_id = $2
            ORDER BY id
        "#;

        let rows: Vec<ActionRow> = sqlx::query_as(query)
            .bind(actor_id)
            .bind(target_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
