use crate::error::DomainResult;
use crate::repository::{DirectoryProvider, StatusRepository};
use crate::status::{DeviceHistory, GroupReport, StatusSample};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Per-device history bound applied inside the ranked store query.
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// Report aggregator: joins the directory snapshot with a bounded, ranked
/// history query and emits a grouped, order-preserving report.
///
/// Ordering contract:
/// - Groups appear in first-seen order of `group_id` while scanning the
///   directory snapshot, deterministic for a given snapshot.
/// - Devices within a group appear in first-seen order while scanning the
///   history rows; each device's history is most recent first.
/// - Devices with zero history and groups with zero devices are omitted.
/// - A duplicate `device_id` in the snapshot resolves to the last entry
///   scanned (documented, not defended against).
pub struct GroupReportService {
    directory: Arc<dyn DirectoryProvider>,
    repository: Arc<dyn StatusRepository>,
    history_limit: i64,
}

impl GroupReportService {
    pub fn new(
        directory: Arc<dyn DirectoryProvider>,
        repository: Arc<dyn StatusRepository>,
        history_limit: i64,
    ) -> Self {
        Self {
            directory,
            repository,
            history_limit,
        }
    }

    pub async fn group_report(&self) -> DomainResult<Vec<GroupReport>> {
        // 1. Directory snapshot via the cache-aside provider
        let entries = self.directory.get_directory().await?;
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        // 2. Device list in snapshot order, device lookup (last entry wins),
        //    and group visitation order (first-seen while scanning)
        let mut device_ids = Vec::with_capacity(entries.len());
        let mut entry_by_device = HashMap::new();
        let mut group_names = HashMap::new();
        let mut group_order = Vec::new();
        for entry in &entries {
            device_ids.push(entry.device_id.clone());
            entry_by_device.insert(entry.device_id.clone(), entry.clone());
            if !group_names.contains_key(&entry.group_id) {
                group_order.push(entry.group_id.clone());
            }
            group_names.insert(entry.group_id.clone(), entry.group_name.clone());
        }

        // 3. One ranked/windowed query: the most recent N records per device
        let records = self
            .repository
            .find_recent_per_device(&device_ids, self.history_limit)
            .await?;

        debug!(
            device_count = device_ids.len(),
            record_count = records.len(),
            "aggregating group report"
        );

        // 4. Group records by group then device, preserving the store's
        //    per-device recency order
        let mut devices_by_group: HashMap<String, Vec<DeviceHistory>> = HashMap::new();
        let mut device_slot: HashMap<String, usize> = HashMap::new();
        for record in records {
            let Some(entry) = entry_by_device.get(&record.device_id) else {
                continue;
            };

            let devices = devices_by_group.entry(entry.group_id.clone()).or_default();

            let slot_key = format!("{}::{}", entry.group_id, record.device_id);
            let slot = match device_slot.get(&slot_key) {
                Some(&slot) => slot,
                None => {
                    devices.push(DeviceHistory {
                        device_id: record.device_id.clone(),
                        history: Vec::new(),
                    });
                    device_slot.insert(slot_key, devices.len() - 1);
                    devices.len() - 1
                }
            };

            devices[slot].history.push(StatusSample {
                status: record.status,
                created_at: record.created_at,
            });
        }

        // 5. Emit groups strictly in visitation order, skipping empty groups
        let mut report = Vec::with_capacity(group_order.len());
        for group_id in group_order {
            if let Some(devices) = devices_by_group.remove(&group_id) {
                report.push(GroupReport {
                    group_name: group_names[&group_id].clone(),
                    group_id,
                    devices,
                });
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::DirectoryEntry;
    use crate::repository::{MockDirectoryProvider, MockStatusRepository};
    use crate::status::StatusRecord;
    use crate::DomainError;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    fn entry(device_id: &str, group_id: &str, group_name: &str) -> DirectoryEntry {
        DirectoryEntry {
            device_id: device_id.to_string(),
            group_id: group_id.to_string(),
            group_name: group_name.to_string(),
        }
    }

    fn record(device_id: &str, group_id: &str, status: &str, age_secs: i64) -> StatusRecord {
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        StatusRecord {
            group_id: group_id.to_string(),
            device_id: device_id.to_string(),
            status: status.to_string(),
            created_at: base - ChronoDuration::seconds(age_secs),
        }
    }

    fn service_with(
        directory: Vec<DirectoryEntry>,
        records: Vec<StatusRecord>,
    ) -> GroupReportService {
        let mut mock_directory = MockDirectoryProvider::new();
        mock_directory
            .expect_get_directory()
            .returning(move || Ok(directory.clone()));

        let mut mock_repo = MockStatusRepository::new();
        mock_repo
            .expect_find_recent_per_device()
            .returning(move |_, _| Ok(records.clone()));

        GroupReportService::new(
            Arc::new(mock_directory),
            Arc::new(mock_repo),
            DEFAULT_HISTORY_LIMIT,
        )
    }

    #[tokio::test]
    async fn test_empty_snapshot_yields_empty_report() {
        let mut mock_directory = MockDirectoryProvider::new();
        mock_directory
            .expect_get_directory()
            .times(1)
            .return_once(|| Ok(Vec::new()));

        // The store must not be queried for an empty device set
        let mut mock_repo = MockStatusRepository::new();
        mock_repo.expect_find_recent_per_device().times(0);

        let service = GroupReportService::new(
            Arc::new(mock_directory),
            Arc::new(mock_repo),
            DEFAULT_HISTORY_LIMIT,
        );

        let report = service.group_report().await.unwrap();
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_groups_with_no_history_are_omitted() {
        // Directory scan order: A, B, A — history only for a device in B
        let directory = vec![
            entry("dev-a1", "A", "Annex"),
            entry("dev-b1", "B", "Barn"),
            entry("dev-a2", "A", "Annex"),
        ];
        let records = vec![record("dev-b1", "B", "RUNNING", 0)];

        let service = service_with(directory, records);
        let report = service.group_report().await.unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(report[0].group_id, "B");
        assert_eq!(report[0].devices.len(), 1);
        assert_eq!(report[0].devices[0].device_id, "dev-b1");
    }

    #[tokio::test]
    async fn test_report_scenario_one_empty_device() {
        // dev1 in G1 has no records; dev2 in G2 has two
        let directory = vec![entry("dev1", "G1", "North"), entry("dev2", "G2", "South")];
        let records = vec![
            record("dev2", "G2", "RUNNING", 0),
            record("dev2", "G2", "IDLE", 60),
        ];

        let service = service_with(directory, records);
        let report = service.group_report().await.unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(report[0].group_id, "G2");
        assert_eq!(report[0].group_name, "South");
        assert_eq!(report[0].devices.len(), 1);
        assert_eq!(report[0].devices[0].device_id, "dev2");
        assert_eq!(report[0].devices[0].history.len(), 2);
        assert_eq!(report[0].devices[0].history[0].status, "RUNNING");
        assert_eq!(report[0].devices[0].history[1].status, "IDLE");
    }

    #[tokio::test]
    async fn test_groups_emitted_in_directory_scan_order() {
        // Z first in scan order even though B sorts earlier
        let directory = vec![
            entry("dev-z", "Z", "Zeta"),
            entry("dev-b", "B", "Beta"),
        ];
        let records = vec![
            record("dev-b", "B", "IDLE", 0),
            record("dev-z", "Z", "RUNNING", 0),
        ];

        let service = service_with(directory, records);
        let report = service.group_report().await.unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].group_id, "Z");
        assert_eq!(report[1].group_id, "B");
    }

    #[tokio::test]
    async fn test_duplicate_device_resolves_to_last_directory_entry() {
        let directory = vec![
            entry("dev9", "G1", "North"),
            entry("dev9", "G2", "South"),
        ];
        let records = vec![record("dev9", "G2", "RUNNING", 0)];

        let service = service_with(directory, records);
        let report = service.group_report().await.unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(report[0].group_id, "G2");
        assert_eq!(report[0].devices[0].device_id, "dev9");
    }

    #[tokio::test]
    async fn test_devices_follow_first_seen_history_order() {
        let directory = vec![
            entry("dev1", "G1", "North"),
            entry("dev2", "G1", "North"),
            entry("dev3", "G1", "North"),
        ];
        // History rows arrive dev2 before dev1; dev3 has none
        let records = vec![
            record("dev2", "G1", "RUNNING", 0),
            record("dev2", "G1", "IDLE", 60),
            record("dev1", "G1", "FAULT", 30),
        ];

        let service = service_with(directory, records);
        let report = service.group_report().await.unwrap();

        assert_eq!(report.len(), 1);
        let devices = &report[0].devices;
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].device_id, "dev2");
        assert_eq!(devices[1].device_id, "dev1");
    }

    #[tokio::test]
    async fn test_report_is_idempotent() {
        let directory = vec![entry("dev1", "G1", "North"), entry("dev2", "G2", "South")];
        let records = vec![
            record("dev1", "G1", "IDLE", 10),
            record("dev2", "G2", "RUNNING", 0),
        ];

        let service = service_with(directory, records);
        let first = service.group_report().await.unwrap();
        let second = service.group_report().await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_directory_error_propagates() {
        let mut mock_directory = MockDirectoryProvider::new();
        mock_directory
            .expect_get_directory()
            .times(1)
            .return_once(|| Err(DomainError::DirectoryFetchFailed("api down".to_string())));

        let mut mock_repo = MockStatusRepository::new();
        mock_repo.expect_find_recent_per_device().times(0);

        let service = GroupReportService::new(
            Arc::new(mock_directory),
            Arc::new(mock_repo),
            DEFAULT_HISTORY_LIMIT,
        );

        let result = service.group_report().await;
        assert!(matches!(result, Err(DomainError::DirectoryFetchFailed(_))));
    }

    #[tokio::test]
    async fn test_history_limit_is_passed_to_the_store() {
        let directory = vec![entry("dev1", "G1", "North")];

        let mut mock_directory = MockDirectoryProvider::new();
        mock_directory
            .expect_get_directory()
            .return_once(move || Ok(directory));

        let mut mock_repo = MockStatusRepository::new();
        mock_repo
            .expect_find_recent_per_device()
            .withf(|device_ids: &[String], limit: &i64| {
                device_ids == ["dev1".to_string()] && *limit == 25
            })
            .times(1)
            .returning(|_, _| Ok(Vec::new()));

        let service =
            GroupReportService::new(Arc::new(mock_directory), Arc::new(mock_repo), 25);

        let report = service.group_report().await.unwrap();
        assert!(report.is_empty());
    }
}
