use crate::domain::{models::event::EventConfig, ports::EventRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresEventRepo {
    pool: PgPool,
}

impl PostgresEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PostgresEventRepo {
    async fn find_by_id(&self, id: &str) -> Result<Option<EventConfig>, AppError> {
        sqlx::query_as::<_, EventConfig>(
            "SELECT * FROM events WHERE id = $1",
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_host(&self, host_id: &str) -> Result<Vec<EventConfig>, AppError> {
        sqlx::query_as::<_, EventConfig>(
            "SELECT * FROM events WHERE host_id = $1 ORDER BY created_at ASC",
        )
            .bind(host_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn upsert(&self, event: &EventConfig) -> Result<EventConfig, AppError> {
        sqlx::query_as::<_, EventConfig>(
            r#"INSERT INTO events (
                id, host_id, title, published, attendance_enabled, password_hash,
                capacity, waitlist_enabled, waitlist_max_size, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT(id) DO UPDATE SET
                host_id = excluded.host_id,
                title = excluded.title,
                published = excluded.published,
                attendance_enabled = excluded.attendance_enabled,
                password_hash = excluded.password_hash,
                capacity = excluded.capacity,
                waitlist_enabled = excluded.waitlist_enabled,
                waitlist_max_size = excluded.waitlist_max_size
            RETURNING *"#
        )
            .bind(&event.id)
            .bind(&event.host_id)
            .bind(&event.title)
            .bind(event.published)
            .bind(event.attendance_enabled)
            .bind(&event.password_hash)
            .bind(event.capacity)
            .bind(event.waitlist_enabled)
            .bind(event.waitlist_max_size)
            .bind(event.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
