use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

// 5 = SQLITE_BUSY, 6 = SQLITE_LOCKED, 262 = SQLITE_LOCKED_SHAREDCACHE, 517 = SQLITE_BUSY_SNAPSHOT
// 40001 = serialization_failure, 40P01 = deadlock_detected, 55P03 = lock_not_available
const TRANSIENT_CODES: &[&str] = &["5", "6", "262", "517", "40001", "40P01", "55P03"];

// 2067 = SQLite Unique Constraint, 23505 = PostgreSQL Unique Violation
const UNIQUE_VIOLATION_CODES: &[&str] = &["2067", "23505"];

// Partial unique index over active (event_id, contact_email). SQLite reports
// the columns instead of the index name.
const ACTIVE_EMAIL_INDEX: &str = "idx_attendance_active_email";
const ACTIVE_EMAIL_COLUMNS: &str = "attendance.event_id, attendance.contact_email";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Event not found")]
    EventNotFound,
    #[error("Registration is not open for this event")]
    RegistrationDisabled,
    #[error("This event requires a password")]
    PasswordRequired,
    #[error("Incorrect event password")]
    PasswordInvalid,
    #[error("Email must be an address at {0}")]
    InvalidEmailDomain(String),
    #[error("This email is already registered for the event")]
    AlreadyRegistered,
    #[error("Event is at capacity")]
    EventFull,
    #[error("Event and waitlist are full")]
    WaitlistFull,
    #[error("Registration not found")]
    RegistrationNotFound,
    #[error("Attendee profile not found")]
    ProfileNotFound,
    #[error("Attendee has already checked in")]
    AlreadyCheckedIn,
    #[error("Event is busy, please try again")]
    Busy,
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) | AppError::InternalWithMsg(_) => "internal",
            AppError::EventNotFound => "event_not_found",
            AppError::RegistrationDisabled => "registration_disabled",
            AppError::PasswordRequired => "password_required",
            AppError::PasswordInvalid => "password_invalid",
            AppError::InvalidEmailDomain(_) => "invalid_email_domain",
            AppError::AlreadyRegistered => "already_registered",
            AppError::EventFull => "event_full",
            AppError::WaitlistFull => "waitlist_full",
            AppError::RegistrationNotFound => "registration_not_found",
            AppError::ProfileNotFound => "profile_not_found",
            AppError::AlreadyCheckedIn => "already_checked_in",
            AppError::Busy => "busy",
            AppError::Validation(_) | AppError::InvalidBody(_) => "validation",
            AppError::Unauthorized => "unauthorized",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::InternalWithMsg(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::EventNotFound | AppError::RegistrationNotFound | AppError::ProfileNotFound => StatusCode::NOT_FOUND,
            AppError::PasswordRequired | AppError::PasswordInvalid | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::AlreadyRegistered | AppError::AlreadyCheckedIn => StatusCode::CONFLICT,
            AppError::Busy => StatusCode::SERVICE_UNAVAILABLE,
            AppError::RegistrationDisabled
            | AppError::InvalidEmailDomain(_)
            | AppError::EventFull
            | AppError::WaitlistFull
            | AppError::Validation(_)
            | AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Contention on the per-event serialization boundary that is worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Busy => true,
            AppError::Database(sqlx::Error::PoolTimedOut) => true,
            AppError::Database(e) => e
                .as_database_error()
                .and_then(|db_err| db_err.code())
                .is_some_and(|code| TRANSIENT_CODES.iter().any(|c| code == *c)),
            _ => false,
        }
    }
}

/// True only when the insert collided with an existing active registration
/// for the same email. Other unique constraints stay database errors.
pub fn is_duplicate_registration(e: &sqlx::Error) -> bool {
    let Some(db_err) = e.as_database_error() else {
        return false;
    };

    let unique = db_err.code()
        .is_some_and(|code| UNIQUE_VIOLATION_CODES.iter().any(|c| code == *c));

    unique && (db_err.constraint() == Some(ACTIVE_EMAIL_INDEX) || db_err.message().contains(ACTIVE_EMAIL_COLUMNS))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Database(e) => {
                error!("Database error: {:?}", e);
                "Internal server error".to_string()
            }
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                "Internal error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message,
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_rejections_are_client_errors() {
        for err in [
            AppError::RegistrationDisabled,
            AppError::InvalidEmailDomain("umich.edu".into()),
            AppError::EventFull,
            AppError::WaitlistFull,
        ] {
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{}", err.code());
            assert!(!err.is_transient());
        }
        assert_eq!(AppError::PasswordInvalid.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::EventNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Validation("x".into()).code(), "validation");
    }

    #[test]
    fn internal_failures_hide_details() {
        let err = AppError::InternalWithMsg("argon2 exploded".into());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "internal");
    }

    #[test]
    fn pool_timeouts_are_retried() {
        assert!(AppError::Database(sqlx::Error::PoolTimedOut).is_transient());
        assert!(!AppError::Database(sqlx::Error::RowNotFound).is_transient());
    }
}
