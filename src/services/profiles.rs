use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::error::EngineError;
use crate::models::ProfileSnapshot;

/// Errors that can occur when resolving profile snapshots
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Malformed profile: {0}")]
    Malformed(String),
}

impl From<ProfileError> for EngineError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::NotFound(what) => EngineError::NotFound(what),
            ProfileError::Malformed(what) => EngineError::InvalidProfile(what),
            other => EngineError::Unavailable(other.to_string()),
        }
    }
}

/// Source of profile snapshots, owned by the profile subsystem
#[async_trait]
pub trait ProfileProvider: Send + Sync {
    async fn get_snapshot(&self, user_id: &str) -> Result<ProfileSnapshot, ProfileError>;
}

/// Connection details for the profile document API
#[derive(Debug, Clone)]
pub struct ProfileApiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub project_id: String,
    pub database_id: String,
    pub collection: String,
    pub timeout: Duration,
}

/// Appwrite-style document API client for the profile collection
pub struct HttpProfileProvider {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    collection: String,
    client: Client,
}

impl HttpProfileProvider {
    pub fn new(config: ProfileApiConfig) -> Result<Self, ProfileError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            project_id: config.project_id,
            database_id: config.database_id,
            collection: config.collection,
            client,
        })
    }

    fn documents_url(&self, user_id: &str) -> String {
        let query = serde_json::json!({
            "method": "equal",
            "attribute": "userId",
            "values": [user_id],
        })
        .to_string();

        format!(
            "{}/databases/{}/collections/{}/documents?queries[0]={}",
            self.base_url,
            self.database_id,
            self.collection,
            urlencoding::encode(&query)
        )
    }
}

#[async_trait]
impl ProfileProvider for HttpProfileProvider {
    async fn get_snapshot(&self, user_id: &str) -> Result<ProfileSnapshot, ProfileError> {
        let url = self.documents_url(user_id);

        tracing::debug!("Fetching profile snapshot for user: {}", user_id);

        let response = self
            .client
            .get(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(ProfileError::Unauthorized),
            StatusCode::NOT_FOUND => {
                return Err(ProfileError::NotFound(format!("Profile not found for user {}", user_id)))
            }
            status => {
                return Err(ProfileError::ApiError(format!("Failed to fetch profile: {}", status)));
            }
        }

        let json: Value = response.json().await?;

        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| ProfileError::InvalidResponse("Missing documents array".into()))?;

        let doc = documents
            .first()
            .ok_or_else(|| ProfileError::NotFound(format!("Profile not found for user {}", user_id)))?;

        let data = doc.get("data").unwrap_or(doc);

        serde_json::from_value(data.clone())
            .map_err(|e| ProfileError::Malformed(format!("profile of {} failed to parse: {}", user_id, e)))
    }
}

/// In-memory profile provider for tests, benches and local runs
#[derive(Debug, Default)]
pub struct MemoryProfiles {
    profiles: DashMap<String, ProfileSnapshot>,
    unreachable: DashSet<String>,
}

impl MemoryProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: impl IntoIterator<Item = ProfileSnapshot>) -> Self {
        let provider = Self::new();
        for profile in profiles {
            provider.insert(profile);
        }
        provider
    }

    pub fn insert(&self, profile: ProfileSnapshot) {
        self.profiles.insert(profile.user_id.clone(), profile);
    }

    pub fn remove(&self, user_id: &str) {
        self.profiles.remove(user_id);
    }

    /// Make lookups for this user fail as if the profile service timed out
    pub fn make_unreachable(&self, user_id: &str) {
        self.unreachable.insert(user_id.to_string());
    }
}

#[async_trait]
impl ProfileProvider for MemoryProfiles {
    async fn get_snapshot(&self, user_id: &str) -> Result<ProfileSnapshot, ProfileError> {
        if self.unreachable.contains(user_id) {
            return Err(ProfileError::ApiError(format!("Profile service timed out for {}", user_id)));
        }

        self.profiles
            .get(user_id)
            .map(|p| p.clone())
            .ok_or_else(|| ProfileError::NotFound(format!("Profile not found for user {}", user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    fn config(endpoint: String) -> ProfileApiConfig {
        ProfileApiConfig {
            endpoint,
            api_key: "test_key".to_string(),
            project_id: "test_project".to_string(),
            database_id: "test_db".to_string(),
            collection: "profiles".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_documents_url() {
        let client = HttpProfileProvider::new(config("https://profiles.test/v1/".to_string())).unwrap();
        let url = client.documents_url("user123");

        assert!(url.starts_with("https://profiles.test/v1/databases/test_db/collections/profiles/documents?queries[0]="));
        assert!(url.contains("user123"));
    }

    #[tokio::test]
    async fn test_get_snapshot_parses_document() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Regex(r"^/databases/test_db/collections/profiles/documents".to_string()))
            .match_header("X-Appwrite-Key", "test_key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"total":1,"documents":[{"$id":"doc1","userId":"u1","age":22,"gender":"female",
                "university":"MIT","lifestyle":"tidy, early riser","interests":["chess"]}]}"#,
            )
            .create_async()
            .await;

        let client = HttpProfileProvider::new(config(server.url())).unwrap();
        let snapshot = client.get_snapshot("u1").await.unwrap();

        assert_eq!(snapshot.user_id, "u1");
        assert_eq!(snapshot.age, Some(22));
        assert_eq!(snapshot.lifestyle, vec!["tidy, early riser"]);
        assert_eq!(snapshot.interests, vec!["chess"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_snapshot_empty_documents_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"total":0,"documents":[]}"#)
            .create_async()
            .await;

        let client = HttpProfileProvider::new(config(server.url())).unwrap();
        let err = client.get_snapshot("ghost").await.unwrap_err();

        assert!(matches!(err, ProfileError::NotFound(_)));
        assert!(matches!(EngineError::from(err), EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_snapshot_server_error_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let client = HttpProfileProvider::new(config(server.url())).unwrap();
        let err = client.get_snapshot("u1").await.unwrap_err();

        assert!(matches!(EngineError::from(err), EngineError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_get_snapshot_bad_field_is_invalid_profile() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"total":1,"documents":[{"userId":"u1","age":"22","gender":"female"}]}"#)
            .create_async()
            .await;

        let client = HttpProfileProvider::new(config(server.url())).unwrap();
        let err = client.get_snapshot("u1").await.unwrap_err();

        assert!(matches!(err, ProfileError::Malformed(_)));
        let err = EngineError::from(err);
        assert!(matches!(err, EngineError::InvalidProfile(_)));
        assert_eq!(err.status_code(), actix_web::http::StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_memory_profiles() {
        let profiles = MemoryProfiles::with_profiles([ProfileSnapshot::new("a", 21, "male")]);
        profiles.make_unreachable("b");

        assert_eq!(profiles.get_snapshot("a").await.unwrap().age, Some(21));
        assert!(matches!(profiles.get_snapshot("b").await, Err(ProfileError::ApiError(_))));
        assert!(matches!(profiles.get_snapshot("c").await, Err(ProfileError::NotFound(_))));

        profiles.remove("a");
        assert!(matches!(profiles.get_snapshot("a").await, Err(ProfileError::NotFound(_))));
    }
}
