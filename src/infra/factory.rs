use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::state::AppState;
use crate::domain::ports::{AttendanceRepository, EventRepository, ProfileRepository};
use crate::domain::services::{email_policy::EmailPolicy, registry::AttendanceRegistry, retry::RetryPolicy};
use crate::infra::password::Argon2PasswordVerifier;
use crate::infra::repositories::{
    postgres_attendance_repo::PostgresAttendanceRepo, postgres_event_repo::PostgresEventRepo,
    postgres_profile_repo::PostgresProfileRepo,
    sqlite_attendance_repo::SqliteAttendanceRepo, sqlite_event_repo::SqliteEventRepo,
    sqlite_profile_repo::SqliteProfileRepo,
};

pub fn retry_policy(config: &Config) -> RetryPolicy {
    RetryPolicy::new()
        .with_max_attempts(config.registration_max_attempts)
        .with_initial_delay(Duration::from_millis(config.registration_retry_base_ms))
}

pub fn assemble_state(
    config: &Config,
    event_repo: Arc<dyn EventRepository>,
    attendance_repo: Arc<dyn AttendanceRepository>,
    profile_repo: Arc<dyn ProfileRepository>,
) -> AppState {
    let password_verifier = Arc::new(Argon2PasswordVerifier);

    let registry = Arc::new(AttendanceRegistry::new(
        event_repo.clone(),
        attendance_repo,
        profile_repo.clone(),
        password_verifier.clone(),
        EmailPolicy::new(&config.allowed_email_domains),
        retry_policy(config),
    ));

    AppState {
        config: config.clone(),
        event_repo,
        profile_repo,
        password_verifier,
        registry,
    }
}

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        assemble_state(
            config,
            Arc::new(PostgresEventRepo::new(pool.clone())),
            Arc::new(PostgresAttendanceRepo::new(pool.clone())),
            Arc::new(PostgresProfileRepo::new(pool)),
        )
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true)
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

        assemble_state(
            config,
            Arc::new(SqliteEventRepo::new(pool.clone())),
            Arc::new(SqliteAttendanceRepo::new(pool.clone())),
            Arc::new(SqliteProfileRepo::new(pool)),
        )
    }
}

pub async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
