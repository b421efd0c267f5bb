use crate::domain::models::{
    attendance::{AttendanceRecord, AttendanceStatus, AttendanceSummary, CancelOutcome},
    event::EventConfig,
};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub attendance_id: String,
    pub status: AttendanceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waitlist_position: Option<i32>,
    pub check_in_code: String,
}

impl From<AttendanceRecord> for RegistrationResponse {
    fn from(record: AttendanceRecord) -> Self {
        Self {
            attendance_id: record.id,
            status: record.status,
            waitlist_position: record.waitlist_position,
            check_in_code: record.check_in_code,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotedAttendee {
    pub attendance_id: String,
    pub name: Option<String>,
    pub contact_email: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promoted: Option<PromotedAttendee>,
}

impl From<CancelOutcome> for CancellationResponse {
    fn from(outcome: CancelOutcome) -> Self {
        let message = outcome.message();
        Self {
            message,
            promoted: outcome.promoted.map(|p| PromotedAttendee {
                attendance_id: p.id,
                name: p.attendee.name,
                contact_email: p.attendee.contact_email,
            }),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostEventSummary {
    #[serde(flatten)]
    pub event: EventConfig,
    pub password_required: bool,
    pub attendance: AttendanceSummary,
}
