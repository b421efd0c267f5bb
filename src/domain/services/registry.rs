use std::sync::Arc;
use crate::domain::{
    models::{
        attendance::{AttendanceRecord, AttendanceSource, AttendanceSummary, Attendee, CancelOutcome},
        event::EventConfig,
    },
    ports::{AttendanceRepository, EventRepository, PasswordVerifier, ProfileRepository},
    services::{email_policy::EmailPolicy, retry::RetryPolicy},
};
use crate::error::AppError;
use tracing::{info, warn};

enum PasswordGate<'a> {
    Enforce(Option<&'a str>),
    Bypass,
}

/// Owns the attendance lifecycle of events: admission, cancellation with
/// waitlist promotion, check-in and the read-side queries.
pub struct AttendanceRegistry {
    events: Arc<dyn EventRepository>,
    attendance: Arc<dyn AttendanceRepository>,
    profiles: Arc<dyn ProfileRepository>,
    passwords: Arc<dyn PasswordVerifier>,
    email_policy: EmailPolicy,
    retry: RetryPolicy,
}

impl AttendanceRegistry {
    pub fn new(
        events: Arc<dyn EventRepository>,
        attendance: Arc<dyn AttendanceRepository>,
        profiles: Arc<dyn ProfileRepository>,
        passwords: Arc<dyn PasswordVerifier>,
        email_policy: EmailPolicy,
        retry: RetryPolicy,
    ) -> Self {
        Self { events, attendance, profiles, passwords, email_policy, retry }
    }

    /// Public registration. Enforces the event password when one is set.
    pub async fn register(
        &self,
        event_id: &str,
        attendee: Attendee,
        password: Option<&str>,
    ) -> Result<AttendanceRecord, AppError> {
        self.admit(event_id, attendee, PasswordGate::Enforce(password), AttendanceSource::Website).await
    }

    /// Registration made by staff on behalf of an attendee.
    pub async fn register_on_behalf(
        &self,
        event_id: &str,
        attendee: Attendee,
        source: AttendanceSource,
    ) -> Result<AttendanceRecord, AppError> {
        self.admit(event_id, attendee, PasswordGate::Bypass, source).await
    }

    async fn admit(
        &self,
        event_id: &str,
        attendee: Attendee,
        gate: PasswordGate<'_>,
        source: AttendanceSource,
    ) -> Result<AttendanceRecord, AppError> {
        let event = self.events.find_by_id(event_id).await?
            .filter(|e| e.published)
            .ok_or(AppError::EventNotFound)?;

        if !event.attendance_enabled {
            return Err(AppError::RegistrationDisabled);
        }

        if let PasswordGate::Enforce(supplied) = gate {
            self.check_password(&event, supplied)?;
        }

        let contact_email = self.email_policy.validate(&attendee.contact_email)?;
        let attendee = sanitize(Attendee { contact_email, ..attendee });

        let record = self.retry
            .run("register", || self.attendance.register(&event, &attendee, source))
            .await?;

        info!(
            event_id = %event.id,
            attendance_id = %record.id,
            status = %record.status,
            waitlist_position = ?record.waitlist_position,
            "attendance registered"
        );

        if let Err(e) = self.profiles.record_registration(&record).await {
            warn!(attendance_id = %record.id, error = %e, "failed to update attendee profile");
        }

        Ok(record)
    }

    fn check_password(&self, event: &EventConfig, supplied: Option<&str>) -> Result<(), AppError> {
        let Some(hash) = event.password_hash.as_deref() else {
            return Ok(());
        };

        match supplied.filter(|p| !p.is_empty()) {
            None => Err(AppError::PasswordRequired),
            Some(password) if self.passwords.verify(password, hash) => Ok(()),
            Some(_) => Err(AppError::PasswordInvalid),
        }
    }

    pub async fn cancel(&self, event_id: &str, contact_email: &str) -> Result<CancelOutcome, AppError> {
        let event = self.events.find_by_id(event_id).await?
            .ok_or(AppError::EventNotFound)?;

        let email = EmailPolicy::normalize(contact_email);
        if email.is_empty() {
            return Err(AppError::RegistrationNotFound);
        }

        let outcome = self.retry
            .run("cancel", || self.attendance.cancel(&event, &email))
            .await?;

        info!(
            event_id = %event.id,
            attendance_id = %outcome.cancelled.id,
            promoted = ?outcome.promoted.as_ref().map(|p| p.id.as_str()),
            "attendance cancelled"
        );

        Ok(outcome)
    }

    pub async fn check_in(&self, event_id: &str, check_in_code: &str) -> Result<AttendanceRecord, AppError> {
        let code = check_in_code.trim();
        if code.is_empty() {
            return Err(AppError::Validation("checkInCode is required".into()));
        }

        self.events.find_by_id(event_id).await?
            .ok_or(AppError::EventNotFound)?;

        let record = self.retry
            .run("check_in", || self.attendance.check_in(event_id, code))
            .await?;

        info!(event_id, attendance_id = %record.id, "attendee checked in");
        Ok(record)
    }

    pub async fn get_registration(&self, event_id: &str, contact_email: &str) -> Result<AttendanceRecord, AppError> {
        let email = EmailPolicy::normalize(contact_email);
        self.attendance.find_active(event_id, &email).await?
            .ok_or(AppError::RegistrationNotFound)
    }

    pub async fn get_stats(&self, event_id: &str) -> Result<AttendanceSummary, AppError> {
        let event = self.events.find_by_id(event_id).await?
            .ok_or(AppError::EventNotFound)?;

        let stats = self.attendance.stats(&event.id).await?;
        Ok(AttendanceSummary::new(stats, event.capacity))
    }

    pub async fn waitlist(&self, event_id: &str) -> Result<Vec<AttendanceRecord>, AppError> {
        self.events.find_by_id(event_id).await?
            .ok_or(AppError::EventNotFound)?;

        self.attendance.list_waitlist(event_id).await
    }

    /// Every event a host owns, paired with its live attendance summary.
    pub async fn host_events(&self, host_id: &str) -> Result<Vec<(EventConfig, AttendanceSummary)>, AppError> {
        let events = self.events.list_by_host(host_id).await?;

        let mut summaries = Vec::with_capacity(events.len());
        for event in events {
            let stats = self.attendance.stats(&event.id).await?;
            let summary = AttendanceSummary::new(stats, event.capacity);
            summaries.push((event, summary));
        }
        Ok(summaries)
    }

    pub async fn list_for_host(&self, host_id: &str) -> Result<Vec<AttendanceRecord>, AppError> {
        self.attendance.list_for_host(host_id).await
    }
}

fn clean(field: Option<String>) -> Option<String> {
    field
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn sanitize(attendee: Attendee) -> Attendee {
    Attendee {
        name: clean(attendee.name),
        contact_email: attendee.contact_email,
        major: clean(attendee.major),
        grade_level: clean(attendee.grade_level),
        phone: clean(attendee.phone),
    }
}
