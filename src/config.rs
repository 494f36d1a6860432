use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::PolicyError;
use crate::models::{LevelThresholds, ScoringPolicy, ScoringWeights};
use crate::services::ProfileApiConfig;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub profiles: ProfileSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub ranking: RankingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Profile document service
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileSettings {
    pub endpoint: String,
    pub api_key: String,
    pub project_id: String,
    pub database_id: String,
    pub collection: String,
    pub timeout_secs: Option<u64>,
}

impl ProfileSettings {
    pub fn to_api_config(&self) -> ProfileApiConfig {
        ProfileApiConfig {
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
            project_id: self.project_id.clone(),
            database_id: self.database_id.clone(),
            collection: self.collection.clone(),
            timeout: Duration::from_secs(self.timeout_secs.unwrap_or(10)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

/// Compatibility result cache; Redis is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    pub redis_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingSettings {
    #[serde(default = "default_limit")]
    pub default_limit: u16,
    #[serde(default = "default_max_limit")]
    pub max_limit: u16,
    #[serde(default = "default_resolve_concurrency")]
    pub resolve_concurrency: usize,
}

impl RankingSettings {
    /// Requested limit clamped to the configured maximum
    pub fn effective_limit(&self, requested: Option<u16>) -> usize {
        requested.unwrap_or(self.default_limit).min(self.max_limit) as usize
    }
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            resolve_concurrency: default_resolve_concurrency(),
        }
    }
}

fn default_limit() -> u16 { 20 }
fn default_max_limit() -> u16 { 100 }
fn default_resolve_concurrency() -> usize { 16 }

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default = "default_max_age_spread")]
    pub max_age_spread: f64,
    #[serde(default = "default_age_floor")]
    pub age_floor: f64,
    #[serde(default = "default_university_mismatch")]
    pub university_mismatch: f64,
    #[serde(default = "default_gender_partial")]
    pub gender_partial: f64,
    #[serde(default = "default_empty_tags")]
    pub empty_tags: f64,
    #[serde(default)]
    pub levels: LevelsConfig,
}

impl ScoringSettings {
    /// Build and validate the scoring policy
    pub fn to_policy(&self) -> Result<ScoringPolicy, PolicyError> {
        let policy = ScoringPolicy {
            weights: ScoringWeights {
                age: self.weights.age,
                gender: self.weights.gender,
                university: self.weights.university,
                lifestyle: self.weights.lifestyle,
                interests: self.weights.interests,
            },
            max_age_spread: self.max_age_spread,
            age_floor: self.age_floor,
            university_mismatch: self.university_mismatch,
            gender_partial: self.gender_partial,
            empty_tags: self.empty_tags,
            levels: LevelThresholds {
                excellent: self.levels.excellent,
                good: self.levels.good,
                fair: self.levels.fair,
            },
        };
        policy.validate()?;
        Ok(policy)
    }
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            weights: WeightsConfig::default(),
            max_age_spread: default_max_age_spread(),
            age_floor: default_age_floor(),
            university_mismatch: default_university_mismatch(),
            gender_partial: default_gender_partial(),
            empty_tags: default_empty_tags(),
            levels: LevelsConfig::default(),
        }
    }
}

fn default_max_age_spread() -> f64 { 10.0 }
fn default_age_floor() -> f64 { 0.1 }
fn default_university_mismatch() -> f64 { 0.2 }
fn default_gender_partial() -> f64 { 0.5 }
fn default_empty_tags() -> f64 { 0.5 }

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_age_weight")]
    pub age: f64,
    #[serde(default = "default_gender_weight")]
    pub gender: f64,
    #[serde(default = "default_university_weight")]
    pub university: f64,
    #[serde(default = "default_lifestyle_weight")]
    pub lifestyle: f64,
    #[serde(default = "default_interests_weight")]
    pub interests: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            age: default_age_weight(),
            gender: default_gender_weight(),
            university: default_university_weight(),
            lifestyle: default_lifestyle_weight(),
            interests: default_interests_weight(),
        }
    }
}

fn default_age_weight() -> f64 { 0.25 }
fn default_gender_weight() -> f64 { 0.20 }
fn default_university_weight() -> f64 { 0.15 }
fn default_lifestyle_weight() -> f64 { 0.25 }
fn default_interests_weight() -> f64 { 0.15 }

#[derive(Debug, Clone, Deserialize)]
pub struct LevelsConfig {
    #[serde(default = "default_excellent")]
    pub excellent: f64,
    #[serde(default = "default_good")]
    pub good: f64,
    #[serde(default = "default_fair")]
    pub fair: f64,
}

impl Default for LevelsConfig {
    fn default() -> Self {
        Self {
            excellent: default_excellent(),
            good: default_good(),
            fair: default_fair(),
        }
    }
}

fn default_excellent() -> f64 { 0.8 }
fn default_good() -> f64 { 0.6 }
fn default_fair() -> f64 { 0.4 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingSettings {
    pub fn is_pretty(&self) -> bool {
        self.format.eq_ignore_ascii_case("pretty")
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration files (config/default.toml, config/local.toml)
    /// 3. Environment variables (prefixed with ROOMIE_)
    /// 4. DATABASE_URL, LOG_LEVEL and LOG_FORMAT, if set
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., ROOMIE__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        with_conventional_overrides(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        with_conventional_overrides(settings)?.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("ROOMIE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Conventional unprefixed variables win over anything in files
const CONVENTIONAL_OVERRIDES: [(&str, &str); 3] = [
    ("DATABASE_URL", "database.url"),
    ("LOG_LEVEL", "logging.level"),
    ("LOG_FORMAT", "logging.format"),
];

fn with_conventional_overrides(settings: Config) -> Result<Config, ConfigError> {
    let mut builder = Config::builder().add_source(settings);
    for (var, key) in CONVENTIONAL_OVERRIDES {
        if let Ok(value) = std::env::var(var) {
            builder = builder.set_override(key, value)?;
        }
    }
    builder.build()
}
