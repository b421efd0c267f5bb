pub mod factory;
pub mod password;
pub mod repositories;
