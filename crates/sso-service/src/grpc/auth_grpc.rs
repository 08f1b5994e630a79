//! gRPC adapter for the Auth service.
//!
//! Implements `sso.Auth` from `proto/sso.proto`. Requests are validated here
//! before the Auth Service is called; errors are mapped to status codes
//! with [`SsoError::to_status`](crate::errors::SsoError::to_status), which
//! never forwards internal error text.
//!
//! # Security
//!
//! - Passwords are wrapped in `SecretString` as soon as they are decoded
//! - Emails are only logged hashed
//! - Password hashes are never part of a response

use crate::crypto::MAX_PASSWORD_BYTES;
use crate::errors::OpError;
use crate::services::AuthService;
use proto_gen::sso::{
    auth_server::Auth, GetUserRoleRequest, GetUserRoleResponse, ListUsersRequest,
    ListUsersResponse, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
    UpdateUserRoleRequest, UpdateUserRoleResponse, User as UserMessage,
};
use secrecy::SecretString;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::instrument;

/// gRPC front end over a shared [`AuthService`].
pub struct AuthGrpcService {
    service: Arc<AuthService>,
}

impl AuthGrpcService {
    pub fn new(service: Arc<AuthService>) -> Self {
        Self { service }
    }

    #[expect(
        clippy::result_large_err,
        reason = "Status is the standard gRPC error type"
    )]
    fn validate_email(email: &str) -> Result<(), Status> {
        if email.is_empty() {
            return Err(Status::invalid_argument("email is required"));
        }
        Ok(())
    }

    #[expect(
        clippy::result_large_err,
        reason = "Status is the standard gRPC error type"
    )]
    fn validate_password(password: &str) -> Result<(), Status> {
        if password.is_empty() {
            return Err(Status::invalid_argument("password is required"));
        }
        Ok(())
    }

    /// Registration also caps the length, since bcrypt would silently
    /// truncate anything past 72 bytes.
    #[expect(
        clippy::result_large_err,
        reason = "Status is the standard gRPC error type"
    )]
    fn validate_new_password(password: &str) -> Result<(), Status> {
        Self::validate_password(password)?;
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(Status::invalid_argument(format!(
                "password must be at most {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }
        Ok(())
    }

    #[expect(
        clippy::result_large_err,
        reason = "Status is the standard gRPC error type"
    )]
    fn validate_user_id(user_id: i64) -> Result<(), Status> {
        if user_id <= 0 {
            return Err(Status::invalid_argument("user_id must be positive"));
        }
        Ok(())
    }

    fn map_error(err: &OpError, internal_message: &str) -> Status {
        let status = err.kind().to_status(internal_message);
        if status.code() == tonic::Code::Internal {
            tracing::error!(target: "sso.grpc.auth", error = %err, "Request failed");
        } else {
            tracing::debug!(target: "sso.grpc.auth", error = %err, code = ?status.code(), "Request rejected");
        }
        status
    }
}

#[tonic::async_trait]
impl Auth for AuthGrpcService {
    #[instrument(skip_all, fields(rpc = "Register"))]
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<RegisterResponse>, Status> {
        let req = request.into_inner();

        Self::validate_email(&req.email)?;
        Self::validate_new_password(&req.password)?;

        let password = SecretString::from(req.password);
        let user_id = self
            .service
            .register(&req.email, &password, &req.role)
            .await
            .map_err(|e| Self::map_error(&e, "failed to register"))?;

        Ok(Response::new(RegisterResponse { user_id }))
    }

    #[instrument(skip_all, fields(rpc = "Login", app_id = request.get_ref().app_id))]
    async fn login(&self, request: Request<LoginRequest>) -> Result<Response<LoginResponse>, Status> {
        let req = request.into_inner();

        Self::validate_email(&req.email)?;
        Self::validate_password(&req.password)?;
        if req.app_id == 0 {
            return Err(Status::invalid_argument("app_id is required"));
        }

        let password = SecretString::from(req.password);
        let token = self
            .service
            .login(&req.email, &password, req.app_id)
            .await
            .map_err(|e| Self::map_error(&e, "failed to login"))?;

        Ok(Response::new(LoginResponse { token }))
    }

    #[instrument(skip_all, fields(rpc = "GetUserRole", user_id = request.get_ref().user_id))]
    async fn get_user_role(
        &self,
        request: Request<GetUserRoleRequest>,
    ) -> Result<Response<GetUserRoleResponse>, Status> {
        let req = request.into_inner();

        Self::validate_user_id(req.user_id)?;

        let role = self
            .service
            .get_user_role(req.user_id)
            .await
            .map_err(|e| Self::map_error(&e, "failed to get user role"))?;

        Ok(Response::new(GetUserRoleResponse {
            role: role.as_str().to_string(),
        }))
    }

    #[instrument(skip_all, fields(rpc = "UpdateRole", user_id = request.get_ref().user_id))]
    async fn update_role(
        &self,
        request: Request<UpdateUserRoleRequest>,
    ) -> Result<Response<UpdateUserRoleResponse>, Status> {
        let req = request.into_inner();

        Self::validate_user_id(req.user_id)?;
        if req.role.is_empty() {
            return Err(Status::invalid_argument("role is required"));
        }

        self.service
            .update_role(req.user_id, &req.role)
            .await
            .map_err(|e| Self::map_error(&e, "failed to update user role"))?;

        Ok(Response::new(UpdateUserRoleResponse {}))
    }

    #[instrument(skip_all, fields(rpc = "ListUsers"))]
    async fn list_users(
        &self,
        _request: Request<ListUsersRequest>,
    ) -> Result<Response<ListUsersResponse>, Status> {
        let users = self
            .service
            .list_users()
            .await
            .map_err(|e| Self::map_error(&e, "failed to list users"))?;

        let users = users
            .into_iter()
            .map(|u| UserMessage {
                id: u.id,
                email: u.email,
                role: u.role.as_str().to_string(),
            })
            .collect();

        Ok(Response::new(ListUsersResponse { users }))
    }
}
