use crate::domain::models::attendance::{AttendanceSource, Attendee};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAttendanceRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub contact_email: String,
    pub major: Option<String>,
    pub grade_level: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

impl RegisterAttendanceRequest {
    pub fn into_parts(self) -> (Attendee, Option<String>) {
        let attendee = Attendee {
            name: self.name,
            contact_email: self.contact_email,
            major: self.major,
            grade_level: self.grade_level,
            phone: self.phone,
        };
        (attendee, self.password)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRegisterRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub contact_email: String,
    pub major: Option<String>,
    pub grade_level: Option<String>,
    pub phone: Option<String>,
    pub source: Option<AttendanceSource>,
}

impl AdminRegisterRequest {
    pub fn into_parts(self) -> (Attendee, AttendanceSource) {
        let attendee = Attendee {
            name: self.name,
            contact_email: self.contact_email,
            major: self.major,
            grade_level: self.grade_level,
            phone: self.phone,
        };
        (attendee, self.source.unwrap_or(AttendanceSource::Admin))
    }
}

#[derive(Deserialize)]
pub struct EmailQuery {
    #[serde(default)]
    pub email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub check_in_code: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertEventRequest {
    pub host_id: String,
    pub title: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default = "default_true")]
    pub attendance_enabled: bool,
    /// Plaintext; hashed before it is stored. Absent or empty means no password.
    pub password: Option<String>,
    pub capacity: Option<i32>,
    #[serde(default)]
    pub waitlist_enabled: bool,
    pub waitlist_max_size: Option<i32>,
}

fn default_true() -> bool {
    true
}
