use serde::{Deserialize, Serialize};

/// One row of the external device directory: which group a device belongs
/// to and the group's display name.
///
/// The directory is sourced wholly from the external collaborator; it is
/// cached and replaced as a whole snapshot, never mutated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub device_id: String,
    pub group_id: String,
    pub group_name: String,
}
