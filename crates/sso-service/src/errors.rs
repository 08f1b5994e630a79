//! Error types for the SSO service.
//!
//! `SsoError` is the error-kind taxonomy every Auth Service operation reports.
//! `OpError` attaches the operation name without hiding the kind, and
//! `StorageError` is what storage backends return.

use thiserror::Error;
use tonic::{Code, Status};

/// Postgres SQLSTATE for unique constraint violations.
const PG_UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum SsoError {
    #[error("User not found")]
    UserNotFound,

    #[error("User already exists")]
    UserExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("App not found")]
    AppNotFound,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SsoError {
    /// gRPC status code for this error kind.
    ///
    /// Anything that is not a caller mistake is `Internal`.
    pub fn code(&self) -> Code {
        match self {
            SsoError::InvalidCredentials => Code::Unauthenticated,
            SsoError::UserExists => Code::AlreadyExists,
            SsoError::UserNotFound => Code::NotFound,
            SsoError::InvalidRole(_) | SsoError::InvalidArgument(_) => Code::InvalidArgument,
            SsoError::AppNotFound
            | SsoError::InvalidToken(_)
            | SsoError::TokenGeneration(_)
            | SsoError::Crypto(_)
            | SsoError::Database(_)
            | SsoError::Internal(_) => Code::Internal,
        }
    }

    /// Build the outbound status.
    ///
    /// Internal errors carry `internal_message` instead of their own text so
    /// that database or crypto details never reach the caller.
    pub fn to_status(&self, internal_message: &str) -> Status {
        match self.code() {
            Code::Internal => Status::internal(internal_message),
            Code::InvalidArgument => match self {
                SsoError::InvalidRole(role) => {
                    Status::invalid_argument(format!("invalid role: {}", role))
                }
                SsoError::InvalidArgument(reason) => Status::invalid_argument(reason.clone()),
                _ => Status::invalid_argument("invalid argument"),
            },
            Code::Unauthenticated => Status::unauthenticated("invalid email or password"),
            Code::AlreadyExists => Status::already_exists("user already exists"),
            Code::NotFound => Status::not_found("user not found"),
            code => Status::new(code, internal_message),
        }
    }
}

/// An `SsoError` tagged with the Auth Service operation that produced it.
///
/// The kind stays reachable through [`OpError::kind`] and `source()`, so
/// callers never need to parse the message.
#[derive(Debug, Error)]
#[error("{op}: {kind}")]
pub struct OpError {
    op: &'static str,
    #[source]
    kind: SsoError,
}

impl OpError {
    pub fn new(op: &'static str, kind: SsoError) -> Self {
        Self { op, kind }
    }

    pub fn op(&self) -> &'static str {
        self.op
    }

    pub fn kind(&self) -> &SsoError {
        &self.kind
    }

    pub fn into_kind(self) -> SsoError {
        self.kind
    }
}

/// Errors returned by storage backends.
///
/// `NotFound` and `AlreadyExists` are the two conditions the service
/// depends on; everything else is opaque.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record not found")]
    NotFound,

    #[error("record already exists")]
    AlreadyExists,

    #[error("storage failure: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StorageError::NotFound,
            sqlx::Error::Database(db_err)
                if db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION) =>
            {
                StorageError::AlreadyExists
            }
            _ => StorageError::Database(err.to_string()),
        }
    }
}

impl From<StorageError> for SsoError {
    /// User-centric default. App lookups map `NotFound` to `AppNotFound`
    /// themselves.
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => SsoError::UserNotFound,
            StorageError::AlreadyExists => SsoError::UserExists,
            StorageError::Database(msg) => SsoError::Database(msg),
        }
    }
}
