use crate::domain::{
    models::{
        attendance::{
            AttendanceRecord, AttendanceSource, AttendanceStats, AttendanceStatus, Attendee,
            CancelOutcome, NewAttendanceParams,
        },
        event::EventConfig,
    },
    ports::AttendanceRepository,
    services::admission,
};
use crate::error::{is_duplicate_registration, AppError};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqliteConnection, SqlitePool};

pub struct SqliteAttendanceRepo {
    pool: SqlitePool,
}

impl SqliteAttendanceRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Takes the per-event write lock. Must be the first statement of the transaction
/// so SQLite acquires the write lock before any count is read.
async fn lock_event(conn: &mut SqliteConnection, event_id: &str) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO attendance_event_locks (event_id, version, updated_at) VALUES (?, 1, ?)
         ON CONFLICT(event_id) DO UPDATE SET version = attendance_event_locks.version + 1, updated_at = excluded.updated_at"
    )
        .bind(event_id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .map_err(AppError::Database)?;
    Ok(())
}

async fn count_stats(conn: &mut SqliteConnection, event_id: &str) -> Result<AttendanceStats, AppError> {
    let row = sqlx::query(
        "SELECT
            COALESCE(SUM(CASE WHEN status = 'confirmed' THEN 1 ELSE 0 END), 0) AS confirmed_count,
            COALESCE(SUM(CASE WHEN status = 'waitlisted' THEN 1 ELSE 0 END), 0) AS waitlist_count,
            COALESCE(SUM(CASE WHEN status = 'attended' THEN 1 ELSE 0 END), 0) AS attended_count
         FROM attendance WHERE event_id = ?"
    )
        .bind(event_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(AppError::Database)?;

    Ok(AttendanceStats {
        confirmed_count: row.get::<i64, _>("confirmed_count"),
        waitlist_count: row.get::<i64, _>("waitlist_count"),
        attended_count: row.get::<i64, _>("attended_count"),
    })
}

async fn find_active_in(conn: &mut SqliteConnection, event_id: &str, contact_email: &str) -> Result<Option<AttendanceRecord>, AppError> {
    sqlx::query_as::<_, AttendanceRecord>(
        "SELECT * FROM attendance WHERE event_id = ? AND contact_email = ? AND status <> 'cancelled'"
    )
        .bind(event_id)
        .bind(contact_email)
        .fetch_optional(&mut *conn)
        .await
        .map_err(AppError::Database)
}

/// Shifts every waitlisted record above `position` down by one.
async fn close_waitlist_gap(conn: &mut SqliteConnection, event_id: &str, position: i32) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE attendance SET waitlist_position = waitlist_position - 1
         WHERE event_id = ? AND status = 'waitlisted' AND waitlist_position > ?"
    )
        .bind(event_id)
        .bind(position)
        .execute(&mut *conn)
        .await
        .map_err(AppError::Database)?;
    Ok(())
}

async fn promote_head(conn: &mut SqliteConnection, event_id: &str) -> Result<Option<AttendanceRecord>, AppError> {
    let head = sqlx::query_as::<_, AttendanceRecord>(
        "SELECT * FROM attendance WHERE event_id = ? AND status = 'waitlisted'
         ORDER BY waitlist_position ASC LIMIT 1"
    )
        .bind(event_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(AppError::Database)?;

    let Some(head) = head else {
        return Ok(None);
    };

    let promoted = sqlx::query_as::<_, AttendanceRecord>(
        "UPDATE attendance SET status = 'confirmed', confirmed_at = ?, waitlist_position = NULL
         WHERE id = ? RETURNING *"
    )
        .bind(Utc::now())
        .bind(&head.id)
        .fetch_one(&mut *conn)
        .await
        .map_err(AppError::Database)?;

    if let Some(position) = head.waitlist_position {
        close_waitlist_gap(conn, event_id, position).await?;
    }

    Ok(Some(promoted))
}

#[async_trait]
impl AttendanceRepository for SqliteAttendanceRepo {
    async fn register(&self, event: &EventConfig, attendee: &Attendee, source: AttendanceSource) -> Result<AttendanceRecord, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        lock_event(&mut tx, &event.id).await?;

        if find_active_in(&mut tx, &event.id, &attendee.contact_email).await?.is_some() {
            return Err(AppError::AlreadyRegistered);
        }

        let stats = count_stats(&mut tx, &event.id).await?;
        let admission = admission::decide(event, &stats)?;

        let record = AttendanceRecord::new(NewAttendanceParams {
            event_id: event.id.clone(),
            attendee: attendee.clone(),
            source,
            waitlist_position: admission.waitlist_position(),
        });

        let created = sqlx::query_as::<_, AttendanceRecord>(
            "INSERT INTO attendance (id, event_id, name, contact_email, major, grade_level, phone, status, registered_at, confirmed_at, attended_at, cancelled_at, waitlist_position, source, check_in_code)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&record.id).bind(&record.event_id)
            .bind(&record.attendee.name).bind(&record.attendee.contact_email).bind(&record.attendee.major)
            .bind(&record.attendee.grade_level).bind(&record.attendee.phone)
            .bind(record.status.as_str()).bind(record.registered_at).bind(record.confirmed_at)
            .bind(record.attended_at).bind(record.cancelled_at).bind(record.waitlist_position)
            .bind(record.source.as_str()).bind(&record.check_in_code)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| if is_duplicate_registration(&e) { AppError::AlreadyRegistered } else { AppError::Database(e) })?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn cancel(&self, event: &EventConfig, contact_email: &str) -> Result<CancelOutcome, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        lock_event(&mut tx, &event.id).await?;

        let record = find_active_in(&mut tx, &event.id, contact_email).await?
            .ok_or(AppError::RegistrationNotFound)?;

        if record.status == AttendanceStatus::Attended {
            return Err(AppError::AlreadyCheckedIn);
        }

        let cancelled = sqlx::query_as::<_, AttendanceRecord>(
            "UPDATE attendance SET status = 'cancelled', cancelled_at = ?, waitlist_position = NULL
             WHERE id = ? RETURNING *"
        )
            .bind(Utc::now())
            .bind(&record.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        if let Some(position) = record.waitlist_position {
            close_waitlist_gap(&mut tx, &event.id, position).await?;
        }

        let stats = count_stats(&mut tx, &event.id).await?;
        let promoted = if admission::should_promote(event, record.status, &stats) {
            promote_head(&mut tx, &event.id).await?
        } else {
            None
        };

        tx.commit().await.map_err(AppError::Database)?;
        Ok(CancelOutcome { cancelled, promoted })
    }

    async fn check_in(&self, event_id: &str, check_in_code: &str) -> Result<AttendanceRecord, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        lock_event(&mut tx, event_id).await?;

        let record = sqlx::query_as::<_, AttendanceRecord>(
            "SELECT * FROM attendance WHERE event_id = ? AND check_in_code = ? AND status <> 'cancelled'"
        )
            .bind(event_id)
            .bind(check_in_code)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::RegistrationNotFound)?;

        match record.status {
            AttendanceStatus::Attended => return Err(AppError::AlreadyCheckedIn),
            AttendanceStatus::Waitlisted => {
                return Err(AppError::Validation("Waitlisted registrations cannot check in".into()));
            }
            AttendanceStatus::Confirmed | AttendanceStatus::Cancelled => {}
        }

        let attended = sqlx::query_as::<_, AttendanceRecord>(
            "UPDATE attendance SET status = 'attended', attended_at = ? WHERE id = ? RETURNING *"
        )
            .bind(Utc::now())
            .bind(&record.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(attended)
    }

    async fn find_active(&self, event_id: &str, contact_email: &str) -> Result<Option<AttendanceRecord>, AppError> {
        let mut conn = self.pool.acquire().await.map_err(AppError::Database)?;
        find_active_in(&mut conn, event_id, contact_email).await
    }

    async fn stats(&self, event_id: &str) -> Result<AttendanceStats, AppError> {
        let mut conn = self.pool.acquire().await.map_err(AppError::Database)?;
        count_stats(&mut conn, event_id).await
    }

    async fn list_for_host(&self, host_id: &str) -> Result<Vec<AttendanceRecord>, AppError> {
        sqlx::query_as::<_, AttendanceRecord>(
            "SELECT a.* FROM attendance a
             JOIN events e ON e.id = a.event_id
             WHERE e.host_id = ? AND a.status <> 'cancelled'
             ORDER BY a.event_id,
                      CASE a.status WHEN 'confirmed' THEN 0 WHEN 'attended' THEN 1 ELSE 2 END,
                      a.waitlist_position, a.registered_at"
        )
            .bind(host_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_waitlist(&self, event_id: &str) -> Result<Vec<AttendanceRecord>, AppError> {
        sqlx::query_as::<_, AttendanceRecord>(
            "SELECT * FROM attendance WHERE event_id = ? AND status = 'waitlisted' ORDER BY waitlist_position ASC"
        )
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
