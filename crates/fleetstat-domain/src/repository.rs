use crate::directory::DirectoryEntry;
use crate::error::DomainResult;
use crate::status::{NewStatusRecord, StatusRecord};
use async_trait::async_trait;
use std::time::Duration;

/// Repository trait for status record storage.
/// Infrastructure layer (fleetstat-postgres) implements this trait.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait StatusRepository: Send + Sync {
    /// Insert one status record; the store assigns `created_at`
    async fn insert_status(&self, record: NewStatusRecord) -> DomainResult<()>;

    /// All persisted status records
    async fn find_all(&self) -> DomainResult<Vec<StatusRecord>>;

    /// Most recent record for one device, if any
    async fn find_latest_by_device(&self, device_id: &str) -> DomainResult<Option<StatusRecord>>;

    /// Full history for one device, most recent first
    async fn find_history_by_device(&self, device_id: &str) -> DomainResult<Vec<StatusRecord>>;

    /// Ranked/windowed history: for each device in the set, the `limit`
    /// most recent records, ordered by device then recency descending
    async fn find_recent_per_device(
        &self,
        device_ids: &[String],
        limit: i64,
    ) -> DomainResult<Vec<StatusRecord>>;
}

/// External directory collaborator: one synchronous fetch of the full
/// current device/group directory.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DirectoryFetcher: Send + Sync {
    async fn fetch_directory(&self) -> DomainResult<Vec<DirectoryEntry>>;
}

/// Key/value store used by the cache-aside directory layer.
/// Infrastructure layer (fleetstat-redis) implements this trait.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DirectoryCacheStore: Send + Sync {
    /// Fetch a cached value; `None` on a clean miss
    async fn get(&self, key: &str) -> DomainResult<Option<String>>;

    /// Store a value with a time-to-live
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> DomainResult<()>;
}

/// Directory snapshot provider consumed by the report aggregator.
/// Implemented by [`crate::directory_service::CachedDirectoryService`].
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DirectoryProvider: Send + Sync {
    async fn get_directory(&self) -> DomainResult<Vec<DirectoryEntry>>;
}
