use axum::{extract::{Path, State}, response::IntoResponse, Json};
use crate::api::dtos::responses::HostEventSummary;
use crate::api::extractors::admin::AdminAccess;
use crate::state::AppState;
use crate::error::AppError;
use std::sync::Arc;

pub async fn list_attendance(
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    Path(host_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let records = state.registry.list_for_host(&host_id).await?;
    Ok(Json(records))
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    Path(host_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let summaries: Vec<HostEventSummary> = state.registry
        .host_events(&host_id)
        .await?
        .into_iter()
        .map(|(event, attendance)| HostEventSummary {
            password_required: event.password_required(),
            attendance,
            event,
        })
        .collect();

    Ok(Json(summaries))
}
