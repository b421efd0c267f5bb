use axum::{
    extract::{FromRequestParts, FromRef},
    http::request::Parts,
};
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::warn;

pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

/// Guards the admin and host surface with the shared admin token.
pub struct AdminAccess;

impl<S> FromRequestParts<S> for AdminAccess
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let supplied = parts.headers.get(ADMIN_TOKEN_HEADER)
            .ok_or(AppError::Unauthorized)?
            .to_str()
            .map_err(|_| AppError::Unauthorized)?;

        if !constant_time_eq::constant_time_eq(supplied.as_bytes(), app_state.config.admin_token.as_bytes()) {
            warn!("rejected admin request with invalid token");
            return Err(AppError::Unauthorized);
        }

        Ok(AdminAccess)
    }
}
