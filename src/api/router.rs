use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{admin, attendance, health, host};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Public attendance flow
        .route(
            "/api/v1/events/{event_id}/attendance",
            post(attendance::register).get(attendance::get_registration).delete(attendance::cancel_registration),
        )
        .route("/api/v1/events/{event_id}/attendance/stats", get(attendance::get_stats))
        .route("/api/v1/events/{event_id}/attendance/check-in", post(attendance::check_in))

        // Admin
        .route("/api/v1/admin/events/{event_id}", put(admin::upsert_event))
        .route("/api/v1/admin/events/{event_id}/attendance", post(admin::register_attendee))
        .route("/api/v1/admin/events/{event_id}/waitlist", get(admin::list_waitlist))
        .route("/api/v1/admin/profiles/{email}", get(admin::get_profile))

        // Host
        .route("/api/v1/hosts/{host_id}/attendance", get(host::list_attendance))
        .route("/api/v1/hosts/{host_id}/events", get(host::list_events))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        event_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
