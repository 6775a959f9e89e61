use fleetstat_domain::DirectoryCacheStore;
use fleetstat_redis::RedisDirectoryCache;
use std::time::Duration;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::redis::Redis;

async fn setup() -> (testcontainers::ContainerAsync<Redis>, RedisDirectoryCache) {
    let redis = Redis::default().start().await.unwrap();
    let host = redis.get_host().await.unwrap();
    let port = redis.get_host_port_ipv4(6379).await.unwrap();

    let cache = RedisDirectoryCache::connect(&format!("redis://{}:{}", host, port))
        .await
        .unwrap();

    (redis, cache)
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn test_set_and_get_roundtrip() {
    let (_container, cache) = setup().await;

    cache
        .set_with_ttl("directory:devices", r#"[{"device_id":"dev1"}]"#, Duration::from_secs(60))
        .await
        .unwrap();

    let value = cache.get("directory:devices").await.unwrap();
    assert_eq!(value.as_deref(), Some(r#"[{"device_id":"dev1"}]"#));
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn test_missing_key_is_a_clean_miss() {
    let (_container, cache) = setup().await;

    let value = cache.get("directory:devices").await.unwrap();
    assert!(value.is_none());
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn test_ttl_expires_the_entry() {
    let (_container, cache) = setup().await;

    cache
        .set_with_ttl("directory:devices", "[]", Duration::from_secs(1))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(1500)).await;

    let value = cache.get("directory:devices").await.unwrap();
    assert!(value.is_none());
}
