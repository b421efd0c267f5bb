pub mod sqlite_attendance_repo;
pub mod sqlite_event_repo;
pub mod sqlite_profile_repo;

pub mod postgres_attendance_repo;
pub mod postgres_event_repo;
pub mod postgres_profile_repo;
