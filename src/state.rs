use std::sync::Arc;
use crate::domain::ports::{EventRepository, PasswordVerifier, ProfileRepository};
use crate::domain::services::registry::AttendanceRegistry;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub event_repo: Arc<dyn EventRepository>,
    pub profile_repo: Arc<dyn ProfileRepository>,
    pub password_verifier: Arc<dyn PasswordVerifier>,
    pub registry: Arc<AttendanceRegistry>,
}
