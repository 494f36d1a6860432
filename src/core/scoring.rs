use std::collections::{BTreeMap, BTreeSet};

use crate::core::overlap::{normalize_tags, same_text, shared_tags, tag_overlap};
use crate::error::{EngineError, PolicyError};
use crate::models::{
    CompatibilityResult, Dimension, DimensionScore, ProfileSnapshot, ScoringPolicy,
};

/// Profile with validated required attributes and normalized tag sets
#[derive(Debug, Clone)]
pub struct PreparedProfile {
    pub user_id: String,
    pub age: u8,
    pub gender: String,
    pub preferred_gender: Option<String>,
    pub university: Option<String>,
    pub lifestyle: BTreeSet<String>,
    pub interests: BTreeSet<String>,
}

impl PreparedProfile {
    /// Validate and normalize a snapshot.
    ///
    /// Fails with `MissingAttribute` when age or gender is absent.
    pub fn prepare(snapshot: &ProfileSnapshot) -> Result<Self, EngineError> {
        let age = snapshot
            .age
            .ok_or_else(|| EngineError::missing(&snapshot.user_id, "age"))?;

        let gender = snapshot
            .gender
            .as_deref()
            .map(|g| g.trim().to_lowercase())
            .filter(|g| !g.is_empty())
            .ok_or_else(|| EngineError::missing(&snapshot.user_id, "gender"))?;

        // "any" and blank both mean no stated preference
        let preferred_gender = snapshot
            .preferred_gender
            .as_deref()
            .map(|g| g.trim().to_lowercase())
            .filter(|g| !g.is_empty() && g != "any");

        let university = snapshot
            .university
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        Ok(Self {
            user_id: snapshot.user_id.clone(),
            age,
            gender,
            preferred_gender,
            university,
            lifestyle: normalize_tags(&snapshot.lifestyle),
            interests: normalize_tags(&snapshot.interests),
        })
    }
}

type ScoreFn = fn(&PreparedProfile, &PreparedProfile, &ScoringPolicy) -> f64;

/// Description attached to every score at or above `min`
struct Bucket {
    min: f64,
    description: &'static str,
}

/// A named sub-scorer with the buckets used to explain its result
struct DimensionScorer {
    dimension: Dimension,
    score: ScoreFn,
    buckets: &'static [Bucket],
}

impl DimensionScorer {
    fn describe(&self, score: f64) -> &'static str {
        self.buckets
            .iter()
            .find(|bucket| score >= bucket.min)
            .or_else(|| self.buckets.last())
            .map(|bucket| bucket.description)
            .unwrap_or("")
    }
}

const SCORERS: [DimensionScorer; 5] = [
    DimensionScorer {
        dimension: Dimension::Age,
        score: age_score,
        buckets: &[
            Bucket { min: 0.8, description: "Similar age" },
            Bucket { min: 0.5, description: "Moderate age gap" },
            Bucket { min: 0.0, description: "Large age gap" },
        ],
    },
    DimensionScorer {
        dimension: Dimension::Gender,
        score: gender_score,
        buckets: &[
            Bucket { min: 1.0, description: "Gender preferences aligned" },
            Bucket { min: f64::MIN_POSITIVE, description: "No gender preference stated" },
            Bucket { min: 0.0, description: "Gender preference not met" },
        ],
    },
    DimensionScorer {
        dimension: Dimension::University,
        score: university_score,
        buckets: &[
            Bucket { min: 1.0, description: "Same university" },
            Bucket { min: 0.0, description: "Different universities" },
        ],
    },
    DimensionScorer {
        dimension: Dimension::Lifestyle,
        score: lifestyle_score,
        buckets: &[
            Bucket { min: 0.6, description: "Very similar lifestyles" },
            Bucket { min: 0.3, description: "Some shared lifestyle habits" },
            Bucket { min: 0.0, description: "Different lifestyles" },
        ],
    },
    DimensionScorer {
        dimension: Dimension::Interests,
        score: interests_score,
        buckets: &[
            Bucket { min: 0.6, description: "Many shared interests" },
            Bucket { min: 0.3, description: "Some shared interests" },
            Bucket { min: 0.0, description: "Few shared interests" },
        ],
    },
];

/// Age score (0-1)
/// Decays linearly with the age gap and never drops below the floor
#[inline]
fn age_score(a: &PreparedProfile, b: &PreparedProfile, policy: &ScoringPolicy) -> f64 {
    let gap = (a.age as f64 - b.age as f64).abs();
    (1.0 - gap / policy.max_age_spread).max(policy.age_floor)
}

/// Whether `pref` admits `gender`; `None` when no preference is stated
#[inline]
fn accepts(pref: Option<&str>, gender: &str) -> Option<bool> {
    pref.map(|p| p == gender)
}

/// Gender score: a violated stated preference on either side zeroes it,
/// same gender or mutually satisfied preferences give full marks
#[inline]
fn gender_score(a: &PreparedProfile, b: &PreparedProfile, policy: &ScoringPolicy) -> f64 {
    let a_accepts_b = accepts(a.preferred_gender.as_deref(), &b.gender);
    let b_accepts_a = accepts(b.preferred_gender.as_deref(), &a.gender);

    if a_accepts_b == Some(false) || b_accepts_a == Some(false) {
        0.0
    } else if a.gender == b.gender || (a_accepts_b == Some(true) && b_accepts_a == Some(true)) {
        1.0
    } else {
        policy.gender_partial
    }
}

#[inline]
fn university_score(a: &PreparedProfile, b: &PreparedProfile, policy: &ScoringPolicy) -> f64 {
    match (&a.university, &b.university) {
        (Some(ua), Some(ub)) if same_text(ua, ub) => 1.0,
        _ => policy.university_mismatch,
    }
}

#[inline]
fn lifestyle_score(a: &PreparedProfile, b: &PreparedProfile, policy: &ScoringPolicy) -> f64 {
    tag_overlap(&a.lifestyle, &b.lifestyle, policy.empty_tags)
}

#[inline]
fn interests_score(a: &PreparedProfile, b: &PreparedProfile, policy: &ScoringPolicy) -> f64 {
    tag_overlap(&a.interests, &b.interests, policy.empty_tags)
}

impl ScoringPolicy {
    /// Check that the policy is internally consistent
    pub fn validate(&self) -> Result<(), PolicyError> {
        for dimension in Dimension::ALL {
            if self.weights.for_dimension(dimension) < 0.0 {
                return Err(PolicyError::NegativeWeight(dimension.name()));
            }
        }

        let total = self.weights.total();
        if (total - 1.0).abs() > 1e-6 {
            return Err(PolicyError::WeightSum(total));
        }

        if !(self.max_age_spread > 0.0) {
            return Err(PolicyError::AgeSpread);
        }

        for (name, value) in [
            ("age_floor", self.age_floor),
            ("university_mismatch", self.university_mismatch),
            ("gender_partial", self.gender_partial),
            ("empty_tags", self.empty_tags),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PolicyError::OutOfRange(name));
            }
        }

        let levels = &self.levels;
        if !(levels.excellent <= 1.0
            && levels.excellent > levels.good
            && levels.good > levels.fair
            && levels.fair > 0.0)
        {
            return Err(PolicyError::Thresholds);
        }

        Ok(())
    }
}

/// Pure pairwise compatibility scorer
///
/// Combines the five dimension scores with the policy weights:
///
/// composite = (
///     age_score * 0.25 +           # Smaller age gap = higher
///     gender_score * 0.20 +        # Stated preferences respected
///     university_score * 0.15 +    # Same campus
///     lifestyle_score * 0.25 +     # Shared lifestyle tags
///     interests_score * 0.15       # Shared interest tags
/// )
///
/// Every dimension is symmetric, so `score(a, b)` and `score(b, a)`
/// produce identical numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompatibilityScorer {
    policy: ScoringPolicy,
}

impl CompatibilityScorer {
    pub fn new(policy: ScoringPolicy) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Score two profile snapshots
    pub fn score(
        &self,
        a: &ProfileSnapshot,
        b: &ProfileSnapshot,
    ) -> Result<CompatibilityResult, EngineError> {
        let a = PreparedProfile::prepare(a)?;
        let b = PreparedProfile::prepare(b)?;
        Ok(self.score_prepared(&a, &b))
    }

    /// Score two already-prepared profiles; cannot fail
    pub fn score_prepared(&self, a: &PreparedProfile, b: &PreparedProfile) -> CompatibilityResult {
        let mut dimensions = BTreeMap::new();
        let mut composite = 0.0;

        for scorer in &SCORERS {
            let score = (scorer.score)(a, b, &self.policy).clamp(0.0, 1.0);
            let weight = self.policy.weights.for_dimension(scorer.dimension);
            composite += score * weight;

            dimensions.insert(
                scorer.dimension,
                DimensionScore {
                    score,
                    weight,
                    description: scorer.describe(score).to_string(),
                },
            );
        }

        let composite_score = composite.clamp(0.0, 1.0);

        CompatibilityResult {
            user_a: a.user_id.clone(),
            user_b: b.user_id.clone(),
            composite_score,
            level: self.policy.levels.level_for(composite_score),
            dimensions,
            shared_lifestyle: shared_tags(&a.lifestyle, &b.lifestyle),
            shared_interests: shared_tags(&a.interests, &b.interests),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompatibilityLevel, ScoringWeights};

    fn profile(id: &str, age: u8) -> ProfileSnapshot {
        ProfileSnapshot::new(id, age, "female")
            .with_university("State University")
            .with_lifestyle(["early riser", "non-smoker", "tidy"])
            .with_interests(["hiking", "reading"])
    }

    fn prepared(p: &ProfileSnapshot) -> PreparedProfile {
        PreparedProfile::prepare(p).unwrap()
    }

    #[test]
    fn test_age_score_example() {
        let policy = ScoringPolicy::default();
        let score = age_score(&prepared(&profile("a", 25)), &prepared(&profile("b", 27)), &policy);
        assert!((score - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_age_score_floor() {
        let policy = ScoringPolicy::default();
        let score = age_score(&prepared(&profile("a", 20)), &prepared(&profile("b", 60)), &policy);
        assert_eq!(score, policy.age_floor);
    }

    #[test]
    fn test_age_score_monotonic() {
        let policy = ScoringPolicy::default();
        let base = prepared(&profile("a", 20));
        let mut previous = f64::INFINITY;
        for age in 20..=60 {
            let score = age_score(&base, &prepared(&profile("b", age)), &policy);
            assert!(score <= previous);
            previous = score;
        }
    }

    #[test]
    fn test_gender_policy() {
        let policy = ScoringPolicy::default();
        let woman = prepared(&ProfileSnapshot::new("a", 22, "female"));
        let man = prepared(&ProfileSnapshot::new("b", 22, "male"));
        let picky_man = prepared(&ProfileSnapshot::new("c", 22, "male").with_preferred_gender("male"));
        let open_woman = prepared(&ProfileSnapshot::new("d", 22, "Female").with_preferred_gender("male"));
        let open_man = prepared(&ProfileSnapshot::new("e", 22, "male").with_preferred_gender("female"));

        assert_eq!(gender_score(&woman, &woman, &policy), 1.0);
        assert_eq!(gender_score(&woman, &man, &policy), policy.gender_partial);
        assert_eq!(gender_score(&woman, &picky_man, &policy), 0.0);
        assert_eq!(gender_score(&picky_man, &woman, &policy), 0.0);
        assert_eq!(gender_score(&open_woman, &open_man, &policy), 1.0);
    }

    #[test]
    fn test_any_preference_is_unstated() {
        let p = ProfileSnapshot::new("a", 22, "female").with_preferred_gender("Any");
        assert_eq!(prepared(&p).preferred_gender, None);
    }

    #[test]
    fn test_university_score() {
        let policy = ScoringPolicy::default();
        let a = prepared(&profile("a", 22));
        let b = prepared(&profile("b", 22).with_university("state university "));
        let c = prepared(&profile("c", 22).with_university("Tech Institute"));
        let mut d = profile("d", 22);
        d.university = None;

        assert_eq!(university_score(&a, &b, &policy), 1.0);
        assert_eq!(university_score(&a, &c, &policy), policy.university_mismatch);
        assert_eq!(university_score(&a, &prepared(&d), &policy), policy.university_mismatch);
    }

    #[test]
    fn test_missing_attribute() {
        let mut p = profile("a", 22);
        p.age = None;
        let err = CompatibilityScorer::default().score(&p, &profile("b", 22)).unwrap_err();
        assert!(matches!(err, EngineError::MissingAttribute { attribute: "age", .. }));

        let mut p = profile("a", 22);
        p.gender = Some("  ".to_string());
        let err = CompatibilityScorer::default().score(&profile("b", 22), &p).unwrap_err();
        assert!(matches!(err, EngineError::MissingAttribute { attribute: "gender", .. }));
    }

    #[test]
    fn test_reflexive_maximum() {
        let p = profile("a", 24);
        let result = CompatibilityScorer::default().score(&p, &p).unwrap();

        assert!((result.composite_score - 1.0).abs() < 1e-9);
        assert_eq!(result.level, CompatibilityLevel::Excellent);
        for dimension in Dimension::ALL {
            assert_eq!(result.dimension(dimension).unwrap().score, 1.0, "{dimension}");
        }
    }

    #[test]
    fn test_shared_tags_reported() {
        let a = profile("a", 25).with_interests(["Hiking", "reading"]);
        let b = profile("b", 25).with_interests(["hiking, gaming"]);
        let result = CompatibilityScorer::default().score(&a, &b).unwrap();

        assert_eq!(result.shared_interests, vec!["hiking"]);
        let interests = result.dimension(Dimension::Interests).unwrap();
        assert!((interests.score - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(interests.description, "Some shared interests");
    }

    #[test]
    fn test_empty_tags_are_neutral() {
        let a = ProfileSnapshot::new("a", 22, "female");
        let b = ProfileSnapshot::new("b", 22, "female");
        let result = CompatibilityScorer::default().score(&a, &b).unwrap();

        assert_eq!(result.dimension(Dimension::Lifestyle).unwrap().score, 0.5);
        assert_eq!(result.dimension(Dimension::Interests).unwrap().score, 0.5);
    }

    #[test]
    fn test_descriptions_follow_buckets() {
        let a = profile("a", 25);
        let b = profile("b", 27).with_university("Elsewhere");
        let result = CompatibilityScorer::default().score(&a, &b).unwrap();

        assert_eq!(result.dimension(Dimension::Age).unwrap().description, "Similar age");
        assert_eq!(
            result.dimension(Dimension::University).unwrap().description,
            "Different universities"
        );

        let c = profile("c", 33);
        let result = CompatibilityScorer::default().score(&a, &c).unwrap();
        assert_eq!(result.dimension(Dimension::Age).unwrap().description, "Large age gap");
    }

    #[test]
    fn test_levels() {
        let levels = ScoringPolicy::default().levels;
        assert_eq!(levels.level_for(0.95), CompatibilityLevel::Excellent);
        assert_eq!(levels.level_for(0.8), CompatibilityLevel::Excellent);
        assert_eq!(levels.level_for(0.6), CompatibilityLevel::Good);
        assert_eq!(levels.level_for(0.45), CompatibilityLevel::Fair);
        assert_eq!(levels.level_for(0.1), CompatibilityLevel::Low);
    }

    #[test]
    fn test_policy_validation() {
        assert!(ScoringPolicy::default().validate().is_ok());

        let mut policy = ScoringPolicy::default();
        policy.weights = ScoringWeights { age: 0.5, ..ScoringWeights::default() };
        assert!(matches!(policy.validate(), Err(PolicyError::WeightSum(_))));

        let mut policy = ScoringPolicy::default();
        policy.levels.good = 0.9;
        assert_eq!(policy.validate(), Err(PolicyError::Thresholds));

        let mut policy = ScoringPolicy::default();
        policy.max_age_spread = 0.0;
        assert_eq!(policy.validate(), Err(PolicyError::AgeSpread));

        let mut policy = ScoringPolicy::default();
        policy.age_floor = 1.5;
        assert_eq!(policy.validate(), Err(PolicyError::OutOfRange("age_floor")));
    }
}
