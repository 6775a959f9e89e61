use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted status event for one device.
///
/// Records are immutable once written; `created_at` is assigned by the
/// record store at insert time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub group_id: String,
    pub device_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Insert shape for a status record. The store assigns the timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStatusRecord {
    pub group_id: String,
    pub device_id: String,
    pub status: String,
}

/// One history point inside a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSample {
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<StatusRecord> for StatusSample {
    fn from(record: StatusRecord) -> Self {
        StatusSample {
            status: record.status,
            created_at: record.created_at,
        }
    }
}

/// Bounded, most-recent-first history for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceHistory {
    pub device_id: String,
    pub history: Vec<StatusSample>,
}

/// Report entry for one group, devices in first-seen history order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupReport {
    pub group_id: String,
    pub group_name: String,
    pub devices: Vec<DeviceHistory>,
}
