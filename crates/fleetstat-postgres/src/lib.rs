pub mod client;
pub mod migrations;
pub mod status_repository;

pub use client::{PostgresClient, PostgresConfig};
pub use migrations::run_migrations;
pub use status_repository::PostgresStatusRepository;
