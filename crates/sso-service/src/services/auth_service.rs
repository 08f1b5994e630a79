//! Auth Service: registration, login and role management.
//!
//! Each operation classifies every collaborator failure into an
//! [`SsoError`] kind and returns it wrapped in an [`OpError`] naming the
//! operation. Storage errors never reach callers unclassified.

use crate::crypto::{self, CredentialHasher};
use crate::errors::{OpError, SsoError, StorageError};
use crate::models::{Role, User};
use crate::observability::{hash_for_correlation, metrics, ErrorCategory};
use crate::repositories::Storage;
use crate::services::role_policy;
use secrecy::SecretString;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::instrument;

pub const OP_REGISTER: &str = "AuthService::register";
pub const OP_LOGIN: &str = "AuthService::login";
pub const OP_GET_USER_ROLE: &str = "AuthService::get_user_role";
pub const OP_UPDATE_ROLE: &str = "AuthService::update_role";
pub const OP_LIST_USERS: &str = "AuthService::list_users";

/// Stateless across calls; safe to share behind an `Arc`.
pub struct AuthService {
    storage: Arc<dyn Storage>,
    hasher: CredentialHasher,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(storage: Arc<dyn Storage>, hasher: CredentialHasher, token_ttl: Duration) -> Self {
        Self {
            storage,
            hasher,
            token_ttl,
        }
    }

    /// Register a user and return the new id.
    ///
    /// The role is checked before anything else, so an invalid role never
    /// costs a hash or touches storage.
    #[instrument(skip_all, fields(op = OP_REGISTER, email_hash = %hash_for_correlation(email)))]
    pub async fn register(
        &self,
        email: &str,
        password: &SecretString,
        role: &str,
    ) -> Result<i64, OpError> {
        let start = Instant::now();
        let result = self.register_inner(email, password, role).await;
        finish(OP_REGISTER, start, result)
    }

    async fn register_inner(
        &self,
        email: &str,
        password: &SecretString,
        role: &str,
    ) -> Result<i64, SsoError> {
        let role = role_policy::normalize_registration_role(role).inspect_err(|_| {
            tracing::warn!(target: "sso.services.auth", "Registration rejected: invalid role");
        })?;

        let pass_hash = self.hasher.hash(password).await.inspect_err(|e| {
            tracing::error!(target: "sso.services.auth", error = %e, "Failed to hash password");
        })?;

        let user_id = self
            .storage
            .save_user(email, &pass_hash, role)
            .await
            .map_err(|e| match e {
                StorageError::AlreadyExists => {
                    tracing::warn!(target: "sso.services.auth", "User already exists");
                    SsoError::UserExists
                }
                other => {
                    tracing::error!(target: "sso.services.auth", error = %other, "Failed to save user");
                    SsoError::from(other)
                }
            })?;

        metrics::record_user_registered(role.as_str());
        tracing::info!(
            target: "sso.services.auth",
            user_id = user_id,
            role = %role,
            "User registered"
        );

        Ok(user_id)
    }

    /// Verify credentials and issue a token signed for `app_id`.
    ///
    /// Unknown email is `UserNotFound` and a wrong password is
    /// `InvalidCredentials`. The first is logged at WARN, the second at INFO.
    #[instrument(skip_all, fields(op = OP_LOGIN, email_hash = %hash_for_correlation(email), app_id = app_id))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
        app_id: i32,
    ) -> Result<String, OpError> {
        let start = Instant::now();
        let result = self.login_inner(email, password, app_id).await;
        finish(OP_LOGIN, start, result)
    }

    async fn login_inner(
        &self,
        email: &str,
        password: &SecretString,
        app_id: i32,
    ) -> Result<String, SsoError> {
        let user = self.storage.user(email).await.map_err(|e| match e {
            StorageError::NotFound => {
                tracing::warn!(target: "sso.services.auth", "User not found");
                metrics::record_login_failure("user_not_found");
                SsoError::UserNotFound
            }
            other => {
                tracing::error!(target: "sso.services.auth", error = %other, "Failed to get user");
                metrics::record_login_failure("error");
                SsoError::from(other)
            }
        })?;

        let matched = self
            .hasher
            .verify(password, &user.pass_hash)
            .await
            .inspect_err(|e| {
                tracing::error!(target: "sso.services.auth", error = %e, "Failed to verify password");
                metrics::record_login_failure("error");
            })?;

        if !matched {
            tracing::info!(target: "sso.services.auth", user_id = user.id, "Invalid credentials");
            metrics::record_login_failure("invalid_credentials");
            return Err(SsoError::InvalidCredentials);
        }

        let app = self.storage.app(app_id).await.map_err(|e| match e {
            StorageError::NotFound => {
                tracing::warn!(target: "sso.services.auth", "App not found");
                metrics::record_login_failure("app_not_found");
                SsoError::AppNotFound
            }
            other => {
                tracing::error!(target: "sso.services.auth", error = %other, "Failed to get app");
                metrics::record_login_failure("error");
                SsoError::from(other)
            }
        })?;

        let token = crypto::issue_token(&user, &app, self.token_ttl).inspect_err(|e| {
            tracing::error!(target: "sso.services.auth", error = %e, "Failed to generate token");
            metrics::record_login_failure("error");
        })?;

        tracing::info!(
            target: "sso.services.auth",
            user_id = user.id,
            "User logged in successfully"
        );

        Ok(token)
    }

    #[instrument(skip_all, fields(op = OP_GET_USER_ROLE, user_id = user_id))]
    pub async fn get_user_role(&self, user_id: i64) -> Result<Role, OpError> {
        let start = Instant::now();
        let result = self.storage.get_user_role(user_id).await.map_err(|e| {
            log_storage_error(&e, "Failed to get user role");
            SsoError::from(e)
        });
        finish(OP_GET_USER_ROLE, start, result)
    }

    /// Assign a role. Any known role, including `admin`, may be set.
    ///
    /// An invalid role is rejected before storage is touched.
    #[instrument(skip_all, fields(op = OP_UPDATE_ROLE, user_id = user_id))]
    pub async fn update_role(&self, user_id: i64, role: &str) -> Result<(), OpError> {
        let start = Instant::now();
        let result = self.update_role_inner(user_id, role).await;
        finish(OP_UPDATE_ROLE, start, result)
    }

    async fn update_role_inner(&self, user_id: i64, role: &str) -> Result<(), SsoError> {
        let role = role_policy::validate_assigned_role(role).inspect_err(|_| {
            tracing::warn!(target: "sso.services.auth", "Role update rejected: invalid role");
        })?;

        self.storage
            .update_role(user_id, role)
            .await
            .map_err(|e| {
                log_storage_error(&e, "Failed to update user role");
                SsoError::from(e)
            })?;

        tracing::info!(target: "sso.services.auth", role = %role, "User role updated");
        Ok(())
    }

    /// All users in storage order. No users is an empty vec, not an error.
    #[instrument(skip_all, fields(op = OP_LIST_USERS))]
    pub async fn list_users(&self) -> Result<Vec<User>, OpError> {
        let start = Instant::now();
        let result = self.storage.list_users().await.map_err(|e| {
            log_storage_error(&e, "Failed to list users");
            SsoError::from(e)
        });
        finish(OP_LIST_USERS, start, result)
    }
}

/// Record the outcome and attach the operation name to any error.
fn finish<T>(op: &'static str, start: Instant, result: Result<T, SsoError>) -> Result<T, OpError> {
    let status = match &result {
        Ok(_) => "success",
        Err(e) => ErrorCategory::from(e).as_str(),
    };
    metrics::record_operation(op, status, start.elapsed());
    result.map_err(|e| OpError::new(op, e))
}

fn log_storage_error(err: &StorageError, message: &'static str) {
    match err {
        StorageError::NotFound => {
            tracing::warn!(target: "sso.services.auth", "User not found");
        }
        other => {
            tracing::error!(target: "sso.services.auth", error = %other, "{}", message);
        }
    }
}
