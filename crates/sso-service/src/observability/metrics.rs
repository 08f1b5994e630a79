//! Metrics definitions for the SSO service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `sso_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! - `operation`: the five Auth Service operations
//! - `status`: `success` or an [`ErrorCategory`](super::ErrorCategory) label
//! - `reason`: `user_not_found`, `invalid_credentials`, `app_not_found`, `error`
//! - `role`: `user`, `organizer`

use metrics::{counter, histogram};
use std::time::Duration;

/// Record an Auth Service call.
///
/// Metric: `sso_operations_total`, `sso_operation_duration_seconds`
/// Labels: `operation`, `status`
pub fn record_operation(operation: &'static str, status: &'static str, duration: Duration) {
    histogram!("sso_operation_duration_seconds", "operation" => operation, "status" => status)
        .record(duration.as_secs_f64());

    counter!("sso_operations_total", "operation" => operation, "status" => status).increment(1);
}

/// Record a failed login.
///
/// Metric: `sso_login_failures_total`
/// Labels: `reason`
pub fn record_login_failure(reason: &'static str) {
    counter!("sso_login_failures_total", "reason" => reason).increment(1);
}

/// Record a successful registration.
///
/// Metric: `sso_users_registered_total`
/// Labels: `role`
pub fn record_user_registered(role: &'static str) {
    counter!("sso_users_registered_total", "role" => role).increment(1);
}
