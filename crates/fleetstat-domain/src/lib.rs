pub mod directory;
pub mod directory_service;
pub mod error;
pub mod ingest_service;
pub mod query_service;
pub mod report_service;
pub mod repository;
pub mod status;
pub mod topic;

pub use directory::DirectoryEntry;
pub use directory_service::{CachedDirectoryService, DIRECTORY_CACHE_KEY};
pub use error::{DomainError, DomainResult};
pub use ingest_service::StatusIngestService;
pub use query_service::StatusQueryService;
pub use report_service::{GroupReportService, DEFAULT_HISTORY_LIMIT};
pub use repository::{DirectoryCacheStore, DirectoryFetcher, DirectoryProvider, StatusRepository};
pub use status::{DeviceHistory, GroupReport, NewStatusRecord, StatusRecord, StatusSample};
pub use topic::{parse_status_topic, StatusTopic};
