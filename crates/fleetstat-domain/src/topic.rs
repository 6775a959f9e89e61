use crate::error::{DomainError, DomainResult};

/// Parsed status topic containing group and device IDs
#[derive(Debug, Clone, PartialEq)]
pub struct StatusTopic {
    pub group_id: String,
    pub device_id: String,
}

/// Parse a status topic in the format `{namespace}/{group_id}/{device_id}/status`
///
/// At least four `/`-separated segments are required; segment 1 is the
/// group ID and segment 2 is the device ID. Trailing segments are
/// structural and not further parsed.
///
/// # Examples
/// ```
/// use fleetstat_domain::topic::parse_status_topic;
///
/// let parsed = parse_status_topic("devices/bldg-7/washer-42/status").unwrap();
/// assert_eq!(parsed.group_id, "bldg-7");
/// assert_eq!(parsed.device_id, "washer-42");
/// ```
pub fn parse_status_topic(topic: &str) -> DomainResult<StatusTopic> {
    let parts: Vec<&str> = topic.split('/').collect();

    if parts.len() < 4 {
        return Err(DomainError::InvalidStatusTopic(format!(
            "Invalid topic format '{}': expected '{{namespace}}/{{group_id}}/{{device_id}}/status'",
            topic
        )));
    }

    let group_id = parts[1].trim();
    let device_id = parts[2].trim();

    if group_id.is_empty() {
        return Err(DomainError::InvalidStatusTopic(
            "Group ID cannot be empty in topic".to_string(),
        ));
    }

    if device_id.is_empty() {
        return Err(DomainError::InvalidStatusTopic(
            "Device ID cannot be empty in topic".to_string(),
        ));
    }

    Ok(StatusTopic {
        group_id: group_id.to_string(),
        device_id: device_id.to_string(),
    })
}
