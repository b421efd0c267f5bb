use event_attendance::{
    api::router::create_router,
    state::AppState,
    config::Config,
    infra::{
        factory::{assemble_state, run_sqlite_migrations},
        repositories::{
            sqlite_attendance_repo::SqliteAttendanceRepo,
            sqlite_event_repo::SqliteEventRepo,
            sqlite_profile_repo::SqliteProfileRepo,
        },
    },
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, Response, header},
    Router,
};
use tower::ServiceExt;
use serde_json::{json, Value};

pub const ADMIN_TOKEN: &str = "test-admin-token";

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        run_sqlite_migrations(&pool).await;

        let config = Config {
            database_url: db_url,
            port: 0,
            allowed_email_domains: vec!["umich.edu".to_string()],
            admin_token: ADMIN_TOKEN.to_string(),
            registration_max_attempts: 5,
            registration_retry_base_ms: 5,
            log_dir: "./logs".to_string(),
        };

        let state = Arc::new(assemble_state(
            &config,
            Arc::new(SqliteEventRepo::new(pool.clone())),
            Arc::new(SqliteAttendanceRepo::new(pool.clone())),
            Arc::new(SqliteProfileRepo::new(pool.clone())),
        ));

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
        }
    }

    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>, admin: bool) -> Response<Body> {
        let token = admin.then_some(ADMIN_TOKEN);
        self.send_with_token(method, uri, body, token).await
    }

    pub async fn send_with_token(&self, method: &str, uri: &str, body: Option<Value>, token: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("X-Admin-Token", token);
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    /// Creates or replaces an event through the admin surface.
    pub async fn put_event(&self, event_id: &str, config: Value) -> Value {
        let mut payload = json!({
            "hostId": "host-1",
            "title": "Club Meeting",
            "published": true,
            "attendanceEnabled": true,
        });
        if let (Some(base), Some(extra)) = (payload.as_object_mut(), config.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }

        let res = self.send("PUT", &format!("/api/v1/admin/events/{}", event_id), Some(payload), true).await;
        assert!(res.status().is_success(), "event upsert failed: {}", res.status());
        parse_body(res).await
    }

    pub async fn register(&self, event_id: &str, email: &str) -> Response<Body> {
        self.send(
            "POST",
            &format!("/api/v1/events/{}/attendance", event_id),
            Some(json!({ "name": email.split('@').next().unwrap_or(email), "contactEmail": email })),
            false,
        ).await
    }

    pub async fn cancel(&self, event_id: &str, email: &str) -> Response<Body> {
        self.send("DELETE", &format!("/api/v1/events/{}/attendance?email={}", event_id, email), None, false).await
    }

    pub async fn stats(&self, event_id: &str) -> Value {
        let res = self.send("GET", &format!("/api/v1/events/{}/attendance/stats", event_id), None, false).await;
        parse_body(res).await
    }

    pub async fn waitlist(&self, event_id: &str) -> Vec<Value> {
        let res = self.send("GET", &format!("/api/v1/admin/events/{}/waitlist", event_id), None, true).await;
        parse_body(res).await.as_array().cloned().unwrap_or_default()
    }
}

#[allow(dead_code)]
pub async fn parse_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
