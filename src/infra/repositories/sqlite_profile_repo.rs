use crate::domain::{
    models::{attendance::AttendanceRecord, profile::AttendeeProfile},
    ports::ProfileRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteProfileRepo {
    pool: SqlitePool,
}

impl SqliteProfileRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for SqliteProfileRepo {
    async fn record_registration(&self, record: &AttendanceRecord) -> Result<(), AppError> {
        let attendee = &record.attendee;
        sqlx::query(
            r#"INSERT INTO attendee_profiles (
                contact_email, name, major, grade_level, phone,
                registration_count, last_event_id, last_registered_at
            ) VALUES (?, ?, ?, ?, ?, 1, ?, ?)
            ON CONFLICT(contact_email) DO UPDATE SET
                name = COALESCE(excluded.name, attendee_profiles.name),
                major = COALESCE(excluded.major, attendee_profiles.major),
                grade_level = COALESCE(excluded.grade_level, attendee_profiles.grade_level),
                phone = COALESCE(excluded.phone, attendee_profiles.phone),
                registration_count = attendee_profiles.registration_count + 1,
                last_event_id = excluded.last_event_id,
                last_registered_at = excluded.last_registered_at"#
        )
            .bind(&attendee.contact_email)
            .bind(&attendee.name)
            .bind(&attendee.major)
            .bind(&attendee.grade_level)
            .bind(&attendee.phone)
            .bind(&record.event_id)
            .bind(record.registered_at)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn find_by_email(&self, contact_email: &str) -> Result<Option<AttendeeProfile>, AppError> {
        sqlx::query_as::<_, AttendeeProfile>(
            "SELECT * FROM attendee_profiles WHERE contact_email = ?",
        )
            .bind(contact_email)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
