//! Storage gateway for users and applications.
//!
//! The Auth Service only sees the [`Storage`] trait. Two implementations:
//! - [`postgres::PgStorage`]: sqlx over Postgres
//! - [`memory::InMemoryStorage`]: in-process, for tests and harnesses

pub mod memory;
pub mod postgres;

pub use crate::errors::StorageError;
pub use memory::InMemoryStorage;
pub use postgres::PgStorage;

use crate::models::{App, Role, User};
use async_trait::async_trait;

/// User and application persistence.
///
/// Implementations must report a missing record as `StorageError::NotFound`
/// and an email collision as `StorageError::AlreadyExists`. Email
/// uniqueness has to hold under concurrent `save_user` calls.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Insert a user and return the assigned id.
    async fn save_user(&self, email: &str, pass_hash: &[u8], role: Role)
        -> Result<i64, StorageError>;

    /// Look a user up by exact email.
    async fn user(&self, email: &str) -> Result<User, StorageError>;

    async fn user_by_id(&self, id: i64) -> Result<User, StorageError>;

    async fn get_user_role(&self, id: i64) -> Result<Role, StorageError>;

    /// Set a user's role. Unknown id is `NotFound`.
    async fn update_role(&self, id: i64, role: Role) -> Result<(), StorageError>;

    /// All users in storage order (ascending id for the bundled backends).
    async fn list_users(&self) -> Result<Vec<User>, StorageError>;

    async fn app(&self, app_id: i32) -> Result<App, StorageError>;
}
