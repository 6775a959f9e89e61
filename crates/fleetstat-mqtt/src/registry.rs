use crate::handler::MessageHandler;
use std::sync::{Arc, Mutex};

/// One registered subscription: a topic filter and the handler that
/// receives matching messages.
#[derive(Clone)]
pub struct SubscriptionEntry {
    pub topic_filter: String,
    pub handler: Arc<dyn MessageHandler>,
}

/// Source of truth for active subscriptions, used to restore them after a
/// reconnect. Entries are never removed — there is no unsubscribe path.
///
/// The lock is held only for reads/writes of the list, never across a
/// network call: resubscription snapshots under the lock and subscribes
/// after release.
#[derive(Default)]
pub struct SubscriptionRegistry {
    entries: Mutex<Vec<SubscriptionEntry>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscription. Called before the transport-level
    /// subscribe so a resubscribe always has a handler to use.
    pub fn register(&self, topic_filter: &str, handler: Arc<dyn MessageHandler>) {
        let mut entries = self.entries.lock().expect("subscription registry poisoned");
        entries.push(SubscriptionEntry {
            topic_filter: topic_filter.to_string(),
            handler,
        });
    }

    /// Atomic snapshot of every registered entry.
    pub fn snapshot(&self) -> Vec<SubscriptionEntry> {
        self.entries
            .lock()
            .expect("subscription registry poisoned")
            .clone()
    }

    /// Entries whose topic filter matches the given concrete topic, using
    /// the transport's single-level `+` wildcard semantics.
    pub fn matching(&self, topic: &str) -> Vec<SubscriptionEntry> {
        self.snapshot()
            .into_iter()
            .filter(|entry| rumqttc::matches(topic, &entry.topic_filter))
            .collect()
    }
}
