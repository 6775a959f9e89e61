use crate::directory::DirectoryEntry;
use crate::error::DomainResult;
use crate::repository::{DirectoryCacheStore, DirectoryFetcher, DirectoryProvider};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fixed cache key for the directory snapshot.
pub const DIRECTORY_CACHE_KEY: &str = "directory:devices";

/// Cache-aside wrapper around the external directory fetcher.
///
/// Reads consult the cache first; any cache read failure or corrupt entry
/// is treated as a miss, never surfaced. On a miss the external fetcher is
/// called and its result is stored best-effort with the configured TTL —
/// a cache write failure is logged and the fresh data is still returned.
/// A fetch failure propagates to the caller; there is no stale-on-error
/// fallback.
pub struct CachedDirectoryService {
    fetcher: Arc<dyn DirectoryFetcher>,
    cache: Arc<dyn DirectoryCacheStore>,
    ttl: Duration,
}

impl CachedDirectoryService {
    pub fn new(
        fetcher: Arc<dyn DirectoryFetcher>,
        cache: Arc<dyn DirectoryCacheStore>,
        ttl: Duration,
    ) -> Self {
        Self {
            fetcher,
            cache,
            ttl,
        }
    }

    fn read_cached(&self, cached: &str) -> Option<Vec<DirectoryEntry>> {
        match serde_json::from_str::<Vec<DirectoryEntry>>(cached) {
            Ok(entries) => Some(entries),
            Err(e) => {
                warn!(error = %e, "corrupt directory cache entry, treating as miss");
                None
            }
        }
    }
}

#[async_trait]
impl DirectoryProvider for CachedDirectoryService {
    async fn get_directory(&self) -> DomainResult<Vec<DirectoryEntry>> {
        match self.cache.get(DIRECTORY_CACHE_KEY).await {
            Ok(Some(cached)) => {
                if let Some(entries) = self.read_cached(&cached) {
                    debug!(entry_count = entries.len(), "directory served from cache");
                    return Ok(entries);
                }
            }
            Ok(None) => {
                debug!("directory cache miss");
            }
            Err(e) => {
                warn!(error = %e, "directory cache read failed, treating as miss");
            }
        }

        let entries = self.fetcher.fetch_directory().await?;
        info!(entry_count = entries.len(), "fetched directory from external source");

        match serde_json::to_string(&entries) {
            Ok(serialized) => {
                if let Err(e) = self
                    .cache
                    .set_with_ttl(DIRECTORY_CACHE_KEY, &serialized, self.ttl)
                    .await
                {
                    warn!(error = %e, "failed to cache directory snapshot");
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to serialize directory snapshot for caching");
            }
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MockDirectoryCacheStore, MockDirectoryFetcher};
    use crate::DomainError;

    fn entries() -> Vec<DirectoryEntry> {
        vec![
            DirectoryEntry {
                device_id: "dev1".to_string(),
                group_id: "G1".to_string(),
                group_name: "North".to_string(),
            },
            DirectoryEntry {
                device_id: "dev2".to_string(),
                group_id: "G2".to_string(),
                group_name: "South".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn test_cache_hit_skips_fetcher() {
        let cached = serde_json::to_string(&entries()).unwrap();

        let mut mock_cache = MockDirectoryCacheStore::new();
        mock_cache
            .expect_get()
            .withf(|key: &str| key == DIRECTORY_CACHE_KEY)
            .times(1)
            .return_once(move |_| Ok(Some(cached)));

        let mut mock_fetcher = MockDirectoryFetcher::new();
        mock_fetcher.expect_fetch_directory().times(0);

        let service = CachedDirectoryService::new(
            Arc::new(mock_fetcher),
            Arc::new(mock_cache),
            Duration::from_secs(86400),
        );

        let result = service.get_directory().await.unwrap();
        assert_eq!(result, entries());
    }

    #[tokio::test]
    async fn test_cache_miss_fetches_exactly_once_and_stores() {
        let mut mock_cache = MockDirectoryCacheStore::new();
        mock_cache.expect_get().times(1).return_once(|_| Ok(None));
        mock_cache
            .expect_set_with_ttl()
            .withf(|key: &str, value: &str, ttl: &Duration| {
                key == DIRECTORY_CACHE_KEY
                    && value.contains("dev1")
                    && *ttl == Duration::from_secs(86400)
            })
            .times(1)
            .return_once(|_, _, _| Ok(()));

        let mut mock_fetcher = MockDirectoryFetcher::new();
        mock_fetcher
            .expect_fetch_directory()
            .times(1)
            .return_once(|| Ok(entries()));

        let service = CachedDirectoryService::new(
            Arc::new(mock_fetcher),
            Arc::new(mock_cache),
            Duration::from_secs(86400),
        );

        let result = service.get_directory().await.unwrap();
        assert_eq!(result, entries());
    }

    #[tokio::test]
    async fn test_corrupt_cache_entry_is_a_miss() {
        let mut mock_cache = MockDirectoryCacheStore::new();
        mock_cache
            .expect_get()
            .times(1)
            .return_once(|_| Ok(Some("not json".to_string())));
        mock_cache
            .expect_set_with_ttl()
            .times(1)
            .return_once(|_, _, _| Ok(()));

        let mut mock_fetcher = MockDirectoryFetcher::new();
        mock_fetcher
            .expect_fetch_directory()
            .times(1)
            .return_once(|| Ok(entries()));

        let service = CachedDirectoryService::new(
            Arc::new(mock_fetcher),
            Arc::new(mock_cache),
            Duration::from_secs(86400),
        );

        let result = service.get_directory().await.unwrap();
        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_cache_read_failure_is_a_miss() {
        let mut mock_cache = MockDirectoryCacheStore::new();
        mock_cache
            .expect_get()
            .times(1)
            .return_once(|_| Err(DomainError::CacheUnavailable("redis down".to_string())));
        mock_cache
            .expect_set_with_ttl()
            .times(1)
            .return_once(|_, _, _| Ok(()));

        let mut mock_fetcher = MockDirectoryFetcher::new();
        mock_fetcher
            .expect_fetch_directory()
            .times(1)
            .return_once(|| Ok(entries()));

        let service = CachedDirectoryService::new(
            Arc::new(mock_fetcher),
            Arc::new(mock_cache),
            Duration::from_secs(86400),
        );

        assert!(service.get_directory().await.is_ok());
    }

    #[tokio::test]
    async fn test_cache_write_failure_still_returns_fresh_data() {
        let mut mock_cache = MockDirectoryCacheStore::new();
        mock_cache.expect_get().times(1).return_once(|_| Ok(None));
        mock_cache
            .expect_set_with_ttl()
            .times(1)
            .return_once(|_, _, _| Err(DomainError::CacheUnavailable("redis down".to_string())));

        let mut mock_fetcher = MockDirectoryFetcher::new();
        mock_fetcher
            .expect_fetch_directory()
            .times(1)
            .return_once(|| Ok(entries()));

        let service = CachedDirectoryService::new(
            Arc::new(mock_fetcher),
            Arc::new(mock_cache),
            Duration::from_secs(86400),
        );

        let result = service.get_directory().await.unwrap();
        assert_eq!(result, entries());
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let mut mock_cache = MockDirectoryCacheStore::new();
        mock_cache.expect_get().times(1).return_once(|_| Ok(None));

        let mut mock_fetcher = MockDirectoryFetcher::new();
        mock_fetcher
            .expect_fetch_directory()
            .times(1)
            .return_once(|| Err(DomainError::DirectoryFetchFailed("api down".to_string())));

        let service = CachedDirectoryService::new(
            Arc::new(mock_fetcher),
            Arc::new(mock_cache),
            Duration::from_secs(86400),
        );

        let result = service.get_directory().await;
        assert!(matches!(result, Err(DomainError::DirectoryFetchFailed(_))));
    }
}
