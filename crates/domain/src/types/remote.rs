//! Wire DTOs for the remote attendance store
//!
//! Field names match the existing remote `attendance` table.

use serde::{Deserialize, Serialize};

/// Row inserted on punch-in. `punch_out_time` stays null until the matching
/// punch-out is mirrored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAttendanceRecord {
    pub employee_id: String,
    pub punch_in_time: Option<String>,
    pub punch_out_time: Option<String>,
    pub image_url: Option<String>,
    pub punch_out_image_url: Option<String>,
    pub is_synced: bool,
}

/// Patch applied to the open remote row on punch-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunchOutUpdate {
    pub punch_out_time: String,
    pub punch_out_image_url: Option<String>,
    pub is_synced: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_record_serializes_snake_case_fields() {
        let record = RemoteAttendanceRecord {
            employee_id: "emp-1".into(),
            punch_in_time: Some("2026-08-30T09:00:00.000+05:30".into()),
            punch_out_time: None,
            image_url: None,
            punch_out_image_url: None,
            is_synced: true,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["employee_id"], "emp-1");
        assert!(json["punch_out_time"].is_null());
        assert_eq!(json["is_synced"], true);
    }
}
