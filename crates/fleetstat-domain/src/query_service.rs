use crate::error::{DomainError, DomainResult};
use crate::repository::StatusRepository;
use crate::status::StatusRecord;
use std::sync::Arc;
use tracing::debug;

/// Thin read service for direct status lookups consumed by HTTP collaborators.
pub struct StatusQueryService {
    repository: Arc<dyn StatusRepository>,
}

impl StatusQueryService {
    pub fn new(repository: Arc<dyn StatusRepository>) -> Self {
        Self { repository }
    }

    /// All persisted status records
    pub async fn all_statuses(&self) -> DomainResult<Vec<StatusRecord>> {
        self.repository.find_all().await
    }

    /// Most recent status for one device; `StatusNotFound` when none exists
    pub async fn latest_status(&self, device_id: &str) -> DomainResult<StatusRecord> {
        debug!(device_id = %device_id, "looking up latest status");

        self.repository
            .find_latest_by_device(device_id)
            .await?
            .ok_or_else(|| DomainError::StatusNotFound(device_id.to_string()))
    }

    /// Full history for one device, most recent first; `StatusNotFound`
    /// when the device has never reported
    pub async fn status_history(&self, device_id: &str) -> DomainResult<Vec<StatusRecord>> {
        debug!(device_id = %device_id, "looking up status history");

        let history = self.repository.find_history_by_device(device_id).await?;

        if history.is_empty() {
            return Err(DomainError::StatusNotFound(device_id.to_string()));
        }

        Ok(history)
    }
}
