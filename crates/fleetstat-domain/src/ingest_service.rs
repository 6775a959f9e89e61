use crate::repository::StatusRepository;
use crate::status::NewStatusRecord;
use crate::topic::parse_status_topic;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Ingestion pipeline: turns inbound status messages into persisted records.
///
/// There is no synchronous caller to report to — malformed topics are
/// discarded with a logged warning and persistence failures are logged and
/// dropped. Safe to run concurrently with itself; each call performs one
/// independent insert.
pub struct StatusIngestService {
    repository: Arc<dyn StatusRepository>,
}

impl StatusIngestService {
    pub fn new(repository: Arc<dyn StatusRepository>) -> Self {
        Self { repository }
    }

    /// Handle one inbound status message.
    ///
    /// The payload is treated as an opaque status string; no schema
    /// validation is applied.
    pub async fn handle_status_message(&self, topic: &str, payload: &[u8], retained: bool) {
        let parsed = match parse_status_topic(topic) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(topic = %topic, error = %e, "discarding message with malformed topic");
                return;
            }
        };

        let status = String::from_utf8_lossy(payload).to_string();

        debug!(
            group_id = %parsed.group_id,
            device_id = %parsed.device_id,
            status = %status,
            retained,
            "ingesting status message"
        );

        let record = NewStatusRecord {
            group_id: parsed.group_id,
            device_id: parsed.device_id.clone(),
            status,
        };

        if let Err(e) = self.repository.insert_status(record).await {
            error!(device_id = %parsed.device_id, error = %e, "failed to persist status record");
        }
    }
}
