use async_trait::async_trait;
use fleetstat_domain::StatusIngestService;
use std::sync::Arc;

/// Handler for messages delivered on a subscribed topic filter.
///
/// Deliveries are spawned per message, so implementations must be safe to
/// run concurrently with themselves.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, topic: &str, payload: &[u8], retained: bool);
}

/// Feeds inbound status messages into the ingestion pipeline.
pub struct StatusMessageHandler {
    ingest: Arc<StatusIngestService>,
}

impl StatusMessageHandler {
    pub fn new(ingest: Arc<StatusIngestService>) -> Self {
        Self { ingest }
    }
}

#[async_trait]
impl MessageHandler for StatusMessageHandler {
    async fn handle(&self, topic: &str, payload: &[u8], retained: bool) {
        self.ingest
            .handle_status_message(topic, payload, retained)
            .await;
    }
}
