use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::{
    requests::{AdminRegisterRequest, UpsertEventRequest},
    responses::RegistrationResponse,
};
use crate::api::extractors::{admin::AdminAccess, json::AppJson};
use crate::domain::models::event::{EventConfig, NewEventParams};
use crate::domain::services::email_policy::EmailPolicy;
use crate::state::AppState;
use crate::error::AppError;
use std::sync::Arc;
use tracing::{info, Span};

pub async fn upsert_event(
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    Path(event_id): Path<String>,
    AppJson(payload): AppJson<UpsertEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    Span::current().record("event_id", event_id.as_str());

    if payload.host_id.trim().is_empty() {
        return Err(AppError::Validation("hostId is required".into()));
    }
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".into()));
    }
    if payload.capacity.is_some_and(|c| c < 0) {
        return Err(AppError::Validation("capacity must not be negative".into()));
    }
    if payload.waitlist_max_size.is_some_and(|m| m < 0) {
        return Err(AppError::Validation("waitlistMaxSize must not be negative".into()));
    }

    let password_hash = match payload.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => Some(state.password_verifier.hash(password)?),
        None => None,
    };

    let event = EventConfig::new(NewEventParams {
        id: event_id,
        host_id: payload.host_id.trim().to_string(),
        title: payload.title.trim().to_string(),
        published: payload.published,
        attendance_enabled: payload.attendance_enabled,
        password_hash,
        capacity: payload.capacity,
        waitlist_enabled: payload.waitlist_enabled,
        waitlist_max_size: payload.waitlist_max_size,
    });

    let saved = state.event_repo.upsert(&event).await?;
    info!(event_id = %saved.id, host_id = %saved.host_id, "event configuration saved");

    Ok(Json(saved))
}

pub async fn register_attendee(
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    Path(event_id): Path<String>,
    AppJson(payload): AppJson<AdminRegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    Span::current().record("event_id", event_id.as_str());

    let (attendee, source) = payload.into_parts();
    let record = state.registry
        .register_on_behalf(&event_id, attendee, source)
        .await?;

    Ok((StatusCode::CREATED, Json(RegistrationResponse::from(record))))
}

pub async fn list_waitlist(
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let waitlist = state.registry.waitlist(&event_id).await?;
    Ok(Json(waitlist))
}

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.profile_repo
        .find_by_email(&EmailPolicy::normalize(&email))
        .await?
        .ok_or(AppError::ProfileNotFound)?;

    Ok(Json(profile))
}
