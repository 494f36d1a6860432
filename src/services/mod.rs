// Service exports
pub mod cache;
pub mod postgres;
pub mod profiles;
pub mod store;

pub use cache::{CacheError, CacheKey, CacheManager, CacheStats};
pub use postgres::{ActionType, PostgresStore};
pub use profiles::{HttpProfileProvider, MemoryProfiles, ProfileApiConfig, ProfileError, ProfileProvider};
pub use store::{MatchInsert, MemoryStore, StoreError, SwipeStore};
