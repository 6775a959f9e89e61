mod config;
mod telemetry;

use config::ServiceConfig;
use fleetstat_directory::HttpDirectoryClient;
use fleetstat_domain::{
    CachedDirectoryService, GroupReportService, StatusIngestService, StatusQueryService,
};
use fleetstat_http::AppState;
use fleetstat_mqtt::{MqttClientConfig, MqttEventLoop, MqttIngestClient, StatusMessageHandler};
use fleetstat_postgres::{run_migrations, PostgresClient, PostgresConfig, PostgresStatusRepository};
use fleetstat_redis::RedisDirectoryCache;
use fleetstat_runner::Runner;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use telemetry::init_telemetry;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_telemetry(&config.log_level);

    info!(
        broker_url = %config.mqtt_broker_url,
        http_port = config.http_port,
        "Starting fleetstat service"
    );
    debug!("Configuration: {:?}", config);

    // Storage and directory dependencies
    let status_repository = match initialize_postgres(&config).await {
        Ok(repo) => repo,
        Err(e) => {
            error!("Failed to initialize PostgreSQL: {}", e);
            std::process::exit(1);
        }
    };

    let directory = match initialize_directory(&config).await {
        Ok(dir) => dir,
        Err(e) => {
            error!("Failed to initialize directory layer: {}", e);
            std::process::exit(1);
        }
    };

    // Domain services
    let ingest_service = Arc::new(StatusIngestService::new(status_repository.clone()));
    let query_service = Arc::new(StatusQueryService::new(status_repository.clone()));
    let report_service = Arc::new(GroupReportService::new(
        directory,
        status_repository,
        config.report_history_limit,
    ));

    // MQTT ingest
    let mqtt_event_loop = match initialize_mqtt(&config, ingest_service).await {
        Ok(event_loop) => event_loop,
        Err(e) => {
            error!("Failed to initialize MQTT: {}", e);
            std::process::exit(1);
        }
    };

    // HTTP surface
    let state = Arc::new(AppState {
        query: query_service,
        report: report_service,
    });
    let router = fleetstat_http::app(state);
    let http_host = config.http_host.clone();
    let http_port = config.http_port;

    let runner = Runner::new()
        .with_named_process("mqtt_event_loop", move |token| mqtt_event_loop.run(token))
        .with_named_process("http_server", move |token| async move {
            fleetstat_http::serve(router, &http_host, http_port, token).await
        })
        .with_closer(|| async move {
            info!("Cleanup complete");
            Ok(())
        })
        .with_closer_timeout(Duration::from_secs(10));

    if runner.run().await.is_err() {
        std::process::exit(1);
    }
}

/// Runs migrations, verifies connectivity, and builds the status repository.
async fn initialize_postgres(
    config: &ServiceConfig,
) -> anyhow::Result<Arc<PostgresStatusRepository>> {
    info!("Initializing PostgreSQL...");
    let client = PostgresClient::new(&PostgresConfig {
        host: config.postgres_host.clone(),
        port: config.postgres_port,
        database: config.postgres_database.clone(),
        username: config.postgres_username.clone(),
        password: config.postgres_password.clone(),
        pool_size: config.postgres_pool_size,
    })?;
    run_migrations(&client).await?;
    client.ping().await?;

    Ok(Arc::new(PostgresStatusRepository::new(client)))
}

/// Builds the cache-aside directory layer over Redis and the directory API.
async fn initialize_directory(
    config: &ServiceConfig,
) -> anyhow::Result<Arc<CachedDirectoryService>> {
    info!("Initializing directory layer...");
    let fetcher = Arc::new(HttpDirectoryClient::new(
        config.directory_base_url.clone(),
        Duration::from_secs(config.directory_timeout_secs),
    )?);
    let cache = Arc::new(RedisDirectoryCache::connect(&config.redis_url).await?);

    Ok(Arc::new(CachedDirectoryService::new(
        fetcher,
        cache,
        Duration::from_secs(config.directory_cache_ttl_secs),
    )))
}

/// Connects to the broker and subscribes the status handler.
async fn initialize_mqtt(
    config: &ServiceConfig,
    ingest_service: Arc<StatusIngestService>,
) -> anyhow::Result<MqttEventLoop> {
    info!("Initializing MQTT...");
    let (client, event_loop) = MqttIngestClient::connect(MqttClientConfig {
        broker_url: config.mqtt_broker_url.clone(),
        client_id: unique_client_id(&config.mqtt_client_id),
        username: config.mqtt_username.clone(),
        password: config.mqtt_password.clone(),
        keep_alive: Duration::from_secs(config.mqtt_keep_alive_secs),
        reconnect_interval: Duration::from_secs(config.mqtt_reconnect_secs),
        operation_timeout: Duration::from_secs(config.mqtt_operation_timeout_secs),
        connect_timeout: Duration::from_secs(config.mqtt_connect_timeout_secs),
    })
    .await?;

    client
        .subscribe(
            &config.mqtt_status_topic,
            Arc::new(StatusMessageHandler::new(ingest_service)),
        )
        .await?;

    Ok(event_loop)
}

/// Appends a nanosecond suffix so parallel replicas never collide on the
/// broker session.
fn unique_client_id(base: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{}-{}", base, nanos)
}
