use async_trait::async_trait;
use fleetstat_domain::{DirectoryCacheStore, DomainError, DomainResult};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::debug;

/// Redis-backed store for the directory snapshot cache.
///
/// The `ConnectionManager` multiplexes one connection and reconnects on
/// its own; it is cloned per call.
#[derive(Clone)]
pub struct RedisDirectoryCache {
    manager: ConnectionManager,
}

impl RedisDirectoryCache {
    pub async fn connect(url: &str) -> DomainResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| DomainError::CacheUnavailable(format!("redis client: {e}")))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| DomainError::CacheUnavailable(format!("redis connect: {e}")))?;

        debug!(url = %url, "connected to redis");
        Ok(Self { manager })
    }
}

#[async_trait]
impl DirectoryCacheStore for RedisDirectoryCache {
    async fn get(&self, key: &str) -> DomainResult<Option<String>> {
        let mut conn = self.manager.clone();
        conn.get(key)
            .await
            .map_err(|e| DomainError::CacheUnavailable(format!("redis get: {e}")))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> DomainResult<()> {
        let mut conn = self.manager.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs())
            .await
            .map_err(|e| DomainError::CacheUnavailable(format!("redis set: {e}")))
    }
}
