use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use rand::{distributions::Alphanumeric, Rng};
use std::fmt;
use thiserror::Error;

const CHECK_IN_CODE_LEN: usize = 16;

#[derive(Debug, Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Confirmed,
    Waitlisted,
    Attended,
    Cancelled,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Confirmed => "confirmed",
            AttendanceStatus::Waitlisted => "waitlisted",
            AttendanceStatus::Attended => "attended",
            AttendanceStatus::Cancelled => "cancelled",
        }
    }

    /// Confirmed and attended records both hold a seat.
    pub fn holds_seat(&self) -> bool {
        matches!(self, AttendanceStatus::Confirmed | AttendanceStatus::Attended)
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for AttendanceStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "confirmed" => Ok(AttendanceStatus::Confirmed),
            "waitlisted" => Ok(AttendanceStatus::Waitlisted),
            "attended" => Ok(AttendanceStatus::Attended),
            "cancelled" => Ok(AttendanceStatus::Cancelled),
            _ => Err(UnknownVariant { kind: "attendance status", value }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceSource {
    #[default]
    Website,
    Admin,
    Import,
}

impl AttendanceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceSource::Website => "website",
            AttendanceSource::Admin => "admin",
            AttendanceSource::Import => "import",
        }
    }
}

impl TryFrom<String> for AttendanceSource {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "website" => Ok(AttendanceSource::Website),
            "admin" => Ok(AttendanceSource::Admin),
            "import" => Ok(AttendanceSource::Import),
            _ => Err(UnknownVariant { kind: "attendance source", value }),
        }
    }
}

/// Who is attending. `contact_email` is the normalized identity of the attendee.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub name: Option<String>,
    pub contact_email: String,
    pub major: Option<String>,
    pub grade_level: Option<String>,
    pub phone: Option<String>,
}

impl Attendee {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.contact_email)
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub event_id: String,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub attendee: Attendee,
    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
    pub registered_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub attended_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waitlist_position: Option<i32>,
    #[sqlx(try_from = "String")]
    pub source: AttendanceSource,
    pub check_in_code: String,
}

pub struct NewAttendanceParams {
    pub event_id: String,
    pub attendee: Attendee,
    pub source: AttendanceSource,
    /// `None` admits as confirmed, `Some(p)` joins the waitlist at position `p`.
    pub waitlist_position: Option<i32>,
}

impl AttendanceRecord {
    pub fn new(params: NewAttendanceParams) -> Self {
        let now = Utc::now();

        let check_in_code: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(CHECK_IN_CODE_LEN)
            .map(char::from)
            .collect();

        let (status, confirmed_at) = match params.waitlist_position {
            Some(_) => (AttendanceStatus::Waitlisted, None),
            None => (AttendanceStatus::Confirmed, Some(now)),
        };

        Self {
            id: Uuid::new_v4().to_string(),
            event_id: params.event_id,
            attendee: params.attendee,
            status,
            registered_at: now,
            confirmed_at,
            attended_at: None,
            cancelled_at: None,
            waitlist_position: params.waitlist_position,
            source: params.source,
            check_in_code,
        }
    }
}

/// Live counts for one event. Cancelled records never contribute.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub confirmed_count: i64,
    pub waitlist_count: i64,
    pub attended_count: i64,
}

impl AttendanceStats {
    pub fn seats_taken(&self) -> i64 {
        self.confirmed_count + self.attended_count
    }
}

/// Result of a cancellation: the cancelled record and whoever moved off the waitlist.
#[derive(Debug, Clone)]
pub struct CancelOutcome {
    pub cancelled: AttendanceRecord,
    pub promoted: Option<AttendanceRecord>,
}

impl CancelOutcome {
    pub fn message(&self) -> String {
        match &self.promoted {
            Some(promoted) => format!(
                "Registration cancelled. {} was promoted from the waitlist.",
                promoted.attendee.display_name()
            ),
            None => "Registration cancelled.".to_string(),
        }
    }
}

/// Stats plus the capacity they are measured against.
#[derive(Debug, Serialize, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    #[serde(flatten)]
    pub stats: AttendanceStats,
    pub capacity: Option<i32>,
    pub spots_remaining: Option<i64>,
}

impl AttendanceSummary {
    pub fn new(stats: AttendanceStats, capacity: Option<i32>) -> Self {
        let spots_remaining = capacity.map(|cap| (i64::from(cap) - stats.seats_taken()).max(0));
        Self { stats, capacity, spots_remaining }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attendee() -> Attendee {
        Attendee {
            name: None,
            contact_email: "wolverine@umich.edu".into(),
            major: None,
            grade_level: None,
            phone: None,
        }
    }

    #[test]
    fn new_record_is_confirmed_without_position() {
        let record = AttendanceRecord::new(NewAttendanceParams {
            event_id: "ev".into(),
            attendee: attendee(),
            source: AttendanceSource::Website,
            waitlist_position: None,
        });
        assert_eq!(record.status, AttendanceStatus::Confirmed);
        assert!(record.confirmed_at.is_some());
        assert_eq!(record.check_in_code.len(), CHECK_IN_CODE_LEN);
    }

    #[test]
    fn new_waitlisted_record_has_no_confirmation() {
        let record = AttendanceRecord::new(NewAttendanceParams {
            event_id: "ev".into(),
            attendee: attendee(),
            source: AttendanceSource::Import,
            waitlist_position: Some(3),
        });
        assert_eq!(record.status, AttendanceStatus::Waitlisted);
        assert_eq!(record.waitlist_position, Some(3));
        assert!(record.confirmed_at.is_none());
    }

    #[test]
    fn status_text_is_rejected_when_unknown() {
        assert_eq!(AttendanceStatus::try_from("attended".to_string()).unwrap(), AttendanceStatus::Attended);
        assert!(AttendanceStatus::try_from("CONFIRMED".to_string()).is_err());
        assert!(AttendanceSource::try_from("kiosk".to_string()).is_err());
    }

    #[test]
    fn summary_never_reports_negative_spots() {
        let stats = AttendanceStats { confirmed_count: 4, waitlist_count: 2, attended_count: 1 };
        assert_eq!(AttendanceSummary::new(stats, Some(3)).spots_remaining, Some(0));
        assert_eq!(AttendanceSummary::new(stats, Some(10)).spots_remaining, Some(5));
        assert_eq!(AttendanceSummary::new(stats, None).spots_remaining, None);
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let mut a = attendee();
        assert_eq!(a.display_name(), "wolverine@umich.edu");
        a.name = Some("Wolverine".into());
        assert_eq!(a.display_name(), "Wolverine");
    }
}
