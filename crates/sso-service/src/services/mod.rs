pub mod auth_service;
pub mod role_policy;

pub use auth_service::AuthService;
