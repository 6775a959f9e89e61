use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // HTTP server configuration
    /// HTTP listen host
    #[serde(default = "default_http_host")]
    pub http_host: String,

    /// HTTP listen port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    // MQTT configuration
    /// Broker URL (mqtt://host:port, tcp://host:port, or host:port)
    #[serde(default = "default_mqtt_broker_url")]
    pub mqtt_broker_url: String,

    /// Base client identifier; a unique suffix is appended at startup
    #[serde(default = "default_mqtt_client_id")]
    pub mqtt_client_id: String,

    /// Broker username (empty disables authentication)
    #[serde(default)]
    pub mqtt_username: String,

    /// Broker password
    #[serde(default)]
    pub mqtt_password: String,

    /// Topic filter for inbound device status messages
    #[serde(default = "default_mqtt_status_topic")]
    pub mqtt_status_topic: String,

    /// Keep-alive interval in seconds
    #[serde(default = "default_mqtt_keep_alive_secs")]
    pub mqtt_keep_alive_secs: u64,

    /// Wait between reconnect attempts in seconds
    #[serde(default = "default_mqtt_reconnect_secs")]
    pub mqtt_reconnect_secs: u64,

    /// Bounded wait for subscribe/publish calls in seconds
    #[serde(default = "default_mqtt_operation_timeout_secs")]
    pub mqtt_operation_timeout_secs: u64,

    /// Bounded wait for the first broker acknowledgment in seconds
    #[serde(default = "default_mqtt_connect_timeout_secs")]
    pub mqtt_connect_timeout_secs: u64,

    // PostgreSQL configuration
    /// PostgreSQL host
    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,

    /// PostgreSQL port
    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    /// PostgreSQL database name
    #[serde(default = "default_postgres_database")]
    pub postgres_database: String,

    /// PostgreSQL username
    #[serde(default = "default_postgres_username")]
    pub postgres_username: String,

    /// PostgreSQL password
    #[serde(default = "default_postgres_password")]
    pub postgres_password: String,

    /// Connection pool size
    #[serde(default = "default_postgres_pool_size")]
    pub postgres_pool_size: usize,

    // Redis configuration
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Directory cache entry lifetime in seconds
    #[serde(default = "default_directory_cache_ttl_secs")]
    pub directory_cache_ttl_secs: u64,

    // Directory API configuration
    /// Base URL of the device directory API
    #[serde(default = "default_directory_base_url")]
    pub directory_base_url: String,

    /// Directory API request timeout in seconds
    #[serde(default = "default_directory_timeout_secs")]
    pub directory_timeout_secs: u64,

    // Report configuration
    /// Recent status rows fetched per device for the group report
    #[serde(default = "default_report_history_limit")]
    pub report_history_limit: i64,
}

fn default_log_level() -> String {
    "info".to_string()
}

// HTTP defaults
fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    3000
}

// MQTT defaults
fn default_mqtt_broker_url() -> String {
    "tcp://localhost:1883".to_string()
}

fn default_mqtt_client_id() -> String {
    "fleetstat".to_string()
}

fn default_mqtt_status_topic() -> String {
    "devices/+/+/status".to_string()
}

fn default_mqtt_keep_alive_secs() -> u64 {
    30
}

fn default_mqtt_reconnect_secs() -> u64 {
    3
}

fn default_mqtt_operation_timeout_secs() -> u64 {
    5
}

fn default_mqtt_connect_timeout_secs() -> u64 {
    10
}

// PostgreSQL defaults
fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_database() -> String {
    "fleetstat".to_string()
}

fn default_postgres_username() -> String {
    "fleetstat".to_string()
}

fn default_postgres_password() -> String {
    "fleetstat".to_string()
}

fn default_postgres_pool_size() -> usize {
    5
}

// Redis defaults
fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_directory_cache_ttl_secs() -> u64 {
    86_400
}

// Directory API defaults
fn default_directory_base_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_directory_timeout_secs() -> u64 {
    10
}

// Report defaults
fn default_report_history_limit() -> i64 {
    50
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("FLEETSTAT"))
            .build()?
            .try_deserialize()
    }
}
