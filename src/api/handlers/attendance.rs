use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::{
    requests::{CheckInRequest, EmailQuery, RegisterAttendanceRequest},
    responses::{CancellationResponse, RegistrationResponse},
};
use crate::api::extractors::json::AppJson;
use crate::state::AppState;
use crate::error::AppError;
use std::sync::Arc;
use tracing::Span;

pub async fn register(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    AppJson(payload): AppJson<RegisterAttendanceRequest>,
) -> Result<impl IntoResponse, AppError> {
    Span::current().record("event_id", event_id.as_str());

    let (attendee, password) = payload.into_parts();
    let record = state.registry
        .register(&event_id, attendee, password.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(RegistrationResponse::from(record))))
}

pub async fn get_registration(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    Query(query): Query<EmailQuery>,
) -> Result<impl IntoResponse, AppError> {
    Span::current().record("event_id", event_id.as_str());

    let record = state.registry.get_registration(&event_id, &query.email).await?;
    Ok(Json(record))
}

pub async fn cancel_registration(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    Query(query): Query<EmailQuery>,
) -> Result<impl IntoResponse, AppError> {
    Span::current().record("event_id", event_id.as_str());

    let outcome = state.registry.cancel(&event_id, &query.email).await?;
    Ok(Json(CancellationResponse::from(outcome)))
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let summary = state.registry.get_stats(&event_id).await?;
    Ok(Json(summary))
}

pub async fn check_in(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    AppJson(payload): AppJson<CheckInRequest>,
) -> Result<impl IntoResponse, AppError> {
    Span::current().record("event_id", event_id.as_str());

    let record = state.registry.check_in(&event_id, &payload.check_in_code).await?;
    Ok(Json(record))
}
