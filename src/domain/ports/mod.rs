use crate::domain::models::{
    attendance::{AttendanceRecord, AttendanceSource, AttendanceStats, Attendee, CancelOutcome},
    event::EventConfig,
    profile::AttendeeProfile,
};
use crate::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<EventConfig>, AppError>;
    async fn list_by_host(&self, host_id: &str) -> Result<Vec<EventConfig>, AppError>;
    async fn upsert(&self, event: &EventConfig) -> Result<EventConfig, AppError>;
}

/// Attendance storage. The mutating operations each run as one transaction
/// serialized per event; counts are recomputed inside that transaction.
#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    async fn register(&self, event: &EventConfig, attendee: &Attendee, source: AttendanceSource) -> Result<AttendanceRecord, AppError>;
    async fn cancel(&self, event: &EventConfig, contact_email: &str) -> Result<CancelOutcome, AppError>;
    async fn check_in(&self, event_id: &str, check_in_code: &str) -> Result<AttendanceRecord, AppError>;

    async fn find_active(&self, event_id: &str, contact_email: &str) -> Result<Option<AttendanceRecord>, AppError>;
    async fn stats(&self, event_id: &str) -> Result<AttendanceStats, AppError>;
    async fn list_for_host(&self, host_id: &str) -> Result<Vec<AttendanceRecord>, AppError>;
    async fn list_waitlist(&self, event_id: &str) -> Result<Vec<AttendanceRecord>, AppError>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn record_registration(&self, record: &AttendanceRecord) -> Result<(), AppError>;
    async fn find_by_email(&self, contact_email: &str) -> Result<Option<AttendeeProfile>, AppError>;
}

pub trait PasswordVerifier: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, AppError>;
    fn verify(&self, password: &str, hash: &str) -> bool;
}
