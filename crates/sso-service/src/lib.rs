//! SSO service library.
//!
//! Credential-based authentication and role management over gRPC:
//! bcrypt password hashing, HS256 tokens signed per application, and a
//! closed set of user roles.

pub mod config;
pub mod crypto;
pub mod errors;
pub mod grpc;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod services;
