use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Profile attributes used for compatibility scoring
///
/// Owned by the profile subsystem; the engine only ever reads it.
/// `age` and `gender` are required for scoring, everything else may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(rename = "preferredGender", default)]
    pub preferred_gender: Option<String>,
    #[serde(default)]
    pub university: Option<String>,
    #[serde(default, deserialize_with = "tags_or_text")]
    pub lifestyle: Vec<String>,
    #[serde(default, deserialize_with = "tags_or_text")]
    pub interests: Vec<String>,
}

impl ProfileSnapshot {
    pub fn new(user_id: impl Into<String>, age: u8, gender: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            age: Some(age),
            gender: Some(gender.into()),
            preferred_gender: None,
            university: None,
            lifestyle: Vec::new(),
            interests: Vec::new(),
        }
    }

    pub fn with_university(mut self, university: impl Into<String>) -> Self {
        self.university = Some(university.into());
        self
    }

    pub fn with_preferred_gender(mut self, gender: impl Into<String>) -> Self {
        self.preferred_gender = Some(gender.into());
        self
    }

    pub fn with_lifestyle<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lifestyle = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_interests<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interests = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Tag fields arrive either as a JSON array or as one free-text string
#[derive(Deserialize)]
#[serde(untagged)]
enum TagsOrText {
    Tags(Vec<String>),
    Text(String),
}

fn tags_or_text<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<TagsOrText>::deserialize(deserializer)? {
        Some(TagsOrText::Tags(tags)) => tags,
        Some(TagsOrText::Text(text)) => vec![text],
        None => Vec::new(),
    })
}

/// Scoring dimensions, in the order they are evaluated and summed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Age,
    Gender,
    University,
    Lifestyle,
    Interests,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Age,
        Dimension::Gender,
        Dimension::University,
        Dimension::Lifestyle,
        Dimension::Interests,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Age => "age",
            Dimension::Gender => "gender",
            Dimension::University => "university",
            Dimension::Lifestyle => "lifestyle",
            Dimension::Interests => "interests",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Overall compatibility label derived from the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CompatibilityLevel {
    Low,
    Fair,
    Good,
    Excellent,
}

impl CompatibilityLevel {
    pub fn label(&self) -> &'static str {
        match self {
            CompatibilityLevel::Excellent => "Excellent",
            CompatibilityLevel::Good => "Good",
            CompatibilityLevel::Fair => "Fair",
            CompatibilityLevel::Low => "Low",
        }
    }
}

impl fmt::Display for CompatibilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Score and explanation for a single dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub score: f64,
    pub weight: f64,
    pub description: String,
}

/// Full compatibility breakdown for a pair of profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityResult {
    #[serde(rename = "userIdA")]
    pub user_a: String,
    #[serde(rename = "userIdB")]
    pub user_b: String,
    #[serde(rename = "compositeScore")]
    pub composite_score: f64,
    #[serde(rename = "compatibilityLevel")]
    pub level: CompatibilityLevel,
    pub dimensions: BTreeMap<Dimension, DimensionScore>,
    #[serde(rename = "sharedLifestyle", default)]
    pub shared_lifestyle: Vec<String>,
    #[serde(rename = "sharedInterests", default)]
    pub shared_interests: Vec<String>,
}

impl CompatibilityResult {
    pub fn dimension(&self, dimension: Dimension) -> Option<&DimensionScore> {
        self.dimensions.get(&dimension)
    }

    /// Composite score on a 0-100 scale, for display
    pub fn percentage(&self) -> f64 {
        (self.composite_score * 100.0).round()
    }

    /// Re-orient a (possibly cached) result so that `user_a` is the given user.
    /// Scores are symmetric, so only the identifiers move.
    pub fn oriented_for(mut self, user_a: &str) -> Self {
        if self.user_a != user_a && self.user_b == user_a {
            std::mem::swap(&mut self.user_a, &mut self.user_b);
        }
        self
    }
}

/// A unilateral swipe decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeKind {
    Like,
    Pass,
}

/// Current-state projection of one directed edge (actor -> target)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectedState {
    #[default]
    NoAction,
    Liked,
    Passed,
}

impl From<SwipeKind> for DirectedState {
    fn from(kind: SwipeKind) -> Self {
        match kind {
            SwipeKind::Like => DirectedState::Liked,
            SwipeKind::Pass => DirectedState::Passed,
        }
    }
}

/// Swipe event, also used as an audit log row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwipeAction {
    #[serde(rename = "actorId")]
    pub actor_id: String,
    #[serde(rename = "targetId")]
    pub target_id: String,
    pub action: SwipeKind,
    #[serde(rename = "recordedAt")]
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}

impl SwipeAction {
    pub fn new(actor_id: &str, target_id: &str, action: SwipeKind) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            target_id: target_id.to_string(),
            action,
            recorded_at: chrono::Utc::now(),
        }
    }
}

/// Unordered user pair normalized to ascending order
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalPair {
    pub low: String,
    pub high: String,
}

impl CanonicalPair {
    /// Returns `None` when both identifiers are the same user
    pub fn new(a: &str, b: &str) -> Option<Self> {
        match a.cmp(b) {
            std::cmp::Ordering::Less => Some(Self { low: a.to_string(), high: b.to_string() }),
            std::cmp::Ordering::Greater => Some(Self { low: b.to_string(), high: a.to_string() }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.low == user_id || self.high == user_id
    }

    /// Stable key for the pair; the length prefix keeps ids containing `:` apart
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.low.len(), self.low, self.high)
    }
}

impl fmt::Display for CanonicalPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}}}", self.low, self.high)
    }
}

/// Persisted mutual match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMatch {
    #[serde(rename = "matchId")]
    pub match_id: Uuid,
    #[serde(rename = "userIdLow")]
    pub user_low: String,
    #[serde(rename = "userIdHigh")]
    pub user_high: String,
    #[serde(rename = "matchedAt")]
    pub matched_at: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "isActive")]
    pub is_active: bool,
}

impl UserMatch {
    pub fn new(pair: &CanonicalPair) -> Self {
        Self {
            match_id: Uuid::new_v4(),
            user_low: pair.low.clone(),
            user_high: pair.high.clone(),
            matched_at: chrono::Utc::now(),
            is_active: true,
        }
    }

    pub fn pair(&self) -> CanonicalPair {
        CanonicalPair {
            low: self.user_low.clone(),
            high: self.user_high.clone(),
        }
    }

    pub fn other_user(&self, user_id: &str) -> &str {
        if self.user_low == user_id {
            &self.user_high
        } else {
            &self.user_low
        }
    }
}

/// Swipe state machine state for an unordered pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PairState {
    NoAction,
    OneSidedLike {
        from: String,
        to: String,
    },
    Matched {
        #[serde(rename = "matchId")]
        match_id: Uuid,
    },
    OneSidedOrMutualPass,
}

impl PairState {
    /// Derive the pair state from both directed edges and match existence.
    /// `low_to_high` is the edge from `pair.low` towards `pair.high`.
    pub fn derive(
        pair: &CanonicalPair,
        low_to_high: DirectedState,
        high_to_low: DirectedState,
        existing: Option<&UserMatch>,
    ) -> Self {
        if let Some(m) = existing {
            return PairState::Matched { match_id: m.match_id };
        }
        match (low_to_high, high_to_low) {
            (DirectedState::NoAction, DirectedState::NoAction) => PairState::NoAction,
            // Both liked but the match insert never landed (store failure mid-call).
            // The next like from either side completes it.
            (DirectedState::Liked, _) => PairState::OneSidedLike {
                from: pair.low.clone(),
                to: pair.high.clone(),
            },
            (_, DirectedState::Liked) => PairState::OneSidedLike {
                from: pair.high.clone(),
                to: pair.low.clone(),
            },
            _ => PairState::OneSidedOrMutualPass,
        }
    }
}

/// Result of recording a Like
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikeOutcome {
    /// True iff this call created the match
    pub created: bool,
    #[serde(rename = "matchId")]
    pub match_id: Option<Uuid>,
}

/// Result of recording a Pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassOutcome {
    pub acknowledged: bool,
}

/// Ranked candidate with its compatibility breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCandidate {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub compatibility: CompatibilityResult,
}

/// Scoring weights, one per dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub age: f64,
    pub gender: f64,
    pub university: f64,
    pub lifestyle: f64,
    pub interests: f64,
}

impl ScoringWeights {
    pub fn for_dimension(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Age => self.age,
            Dimension::Gender => self.gender,
            Dimension::University => self.university,
            Dimension::Lifestyle => self.lifestyle,
            Dimension::Interests => self.interests,
        }
    }

    pub fn total(&self) -> f64 {
        Dimension::ALL.iter().map(|d| self.for_dimension(*d)).sum()
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            age: 0.25,
            gender: 0.20,
            university: 0.15,
            lifestyle: 0.25,
            interests: 0.15,
        }
    }
}

/// Composite score thresholds for each compatibility level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelThresholds {
    pub excellent: f64,
    pub good: f64,
    pub fair: f64,
}

impl LevelThresholds {
    pub fn level_for(&self, composite: f64) -> CompatibilityLevel {
        if composite >= self.excellent {
            CompatibilityLevel::Excellent
        } else if composite >= self.good {
            CompatibilityLevel::Good
        } else if composite >= self.fair {
            CompatibilityLevel::Fair
        } else {
            CompatibilityLevel::Low
        }
    }
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            excellent: 0.8,
            good: 0.6,
            fair: 0.4,
        }
    }
}

/// Every tunable constant of the scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub weights: ScoringWeights,
    /// Age gap (years) at which the age score reaches its floor
    pub max_age_spread: f64,
    pub age_floor: f64,
    pub university_mismatch: f64,
    pub gender_partial: f64,
    /// Tag overlap score when neither side has any tags
    pub empty_tags: f64,
    pub levels: LevelThresholds,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            max_age_spread: 10.0,
            age_floor: 0.1,
            university_mismatch: 0.2,
            gender_partial: 0.5,
            empty_tags: 0.5,
            levels: LevelThresholds::default(),
        }
    }
}
