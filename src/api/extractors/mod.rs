pub mod admin;
pub mod json;
