//! Role validation rules.
//!
//! Registration and role assignment use different rules: a new account can
//! never ask for `admin`, while an explicit role change may set it.

use crate::errors::SsoError;
use crate::models::Role;

/// Resolve the role requested at registration.
///
/// Empty means [`Role::User`]. Only `user` and `organizer` are accepted.
pub fn normalize_registration_role(requested: &str) -> Result<Role, SsoError> {
    if requested.is_empty() {
        return Ok(Role::User);
    }

    match requested.parse::<Role>()? {
        role @ (Role::User | Role::Organizer) => Ok(role),
        Role::Admin => Err(SsoError::InvalidRole(requested.to_string())),
    }
}

/// Validate a role for assignment to an existing user. Any known role is allowed.
pub fn validate_assigned_role(role: &str) -> Result<Role, SsoError> {
    role.parse::<Role>()
}
