//! Integration tests for the SSO service
//!
//! This is the top-level integration test harness that Cargo discovers.
//! Test modules are organized in the integration/ subdirectory.

#[path = "integration/auth_flow_tests.rs"]
mod auth_flow_tests;

#[path = "integration/validation_tests.rs"]
mod validation_tests;

#[path = "integration/error_mapping_tests.rs"]
mod error_mapping_tests;

#[path = "integration/postgres_storage_tests.rs"]
mod postgres_storage_tests;
