use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Read-only view of an event as the attendance registry sees it.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EventConfig {
    pub id: String,
    pub host_id: String,
    pub title: String,
    pub published: bool,
    pub attendance_enabled: bool,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub capacity: Option<i32>,
    pub waitlist_enabled: bool,
    pub waitlist_max_size: Option<i32>,
    pub created_at: DateTime<Utc>,
}

pub struct NewEventParams {
    pub id: String,
    pub host_id: String,
    pub title: String,
    pub published: bool,
    pub attendance_enabled: bool,
    pub password_hash: Option<String>,
    pub capacity: Option<i32>,
    pub waitlist_enabled: bool,
    pub waitlist_max_size: Option<i32>,
}

impl EventConfig {
    pub fn new(params: NewEventParams) -> Self {
        Self {
            id: params.id,
            host_id: params.host_id,
            title: params.title,
            published: params.published,
            attendance_enabled: params.attendance_enabled,
            password_hash: params.password_hash,
            capacity: params.capacity,
            waitlist_enabled: params.waitlist_enabled,
            waitlist_max_size: params.waitlist_max_size,
            created_at: Utc::now(),
        }
    }

    pub fn password_required(&self) -> bool {
        self.password_hash.is_some()
    }
}
