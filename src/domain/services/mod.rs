pub mod admission;
pub mod email_policy;
pub mod registry;
pub mod retry;
