use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Denormalized per-attendee summary kept alongside attendance records.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeProfile {
    pub contact_email: String,
    pub name: Option<String>,
    pub major: Option<String>,
    pub grade_level: Option<String>,
    pub phone: Option<String>,
    pub registration_count: i32,
    pub last_event_id: Option<String>,
    pub last_registered_at: DateTime<Utc>,
}
