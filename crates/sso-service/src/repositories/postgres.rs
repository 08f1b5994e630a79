//! Postgres storage backend.
//!
//! Email uniqueness is the `users_email_unique` constraint; a violation
//! (SQLSTATE 23505) comes back as `StorageError::AlreadyExists`.

use super::{Storage, StorageError};
use crate::models::{App, Role, User};
use async_trait::async_trait;
use secrecy::SecretString;
use sqlx::PgPool;
use tracing::instrument;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    pass_hash: Vec<u8>,
    role: String,
}

impl TryFrom<UserRow> for User {
    type Error = StorageError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = parse_stored_role(&row.role)?;
        Ok(User {
            id: row.id,
            email: row.email,
            pass_hash: row.pass_hash,
            role,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AppRow {
    id: i32,
    name: String,
    secret: String,
}

impl From<AppRow> for App {
    fn from(row: AppRow) -> Self {
        App {
            id: row.id,
            name: row.name,
            secret: SecretString::from(row.secret),
        }
    }
}

/// The schema constrains roles, so an unknown value means corrupt data.
fn parse_stored_role(value: &str) -> Result<Role, StorageError> {
    value
        .parse::<Role>()
        .map_err(|_| StorageError::Database(format!("Unknown role stored: {}", value)))
}

/// sqlx-backed storage over a shared pool.
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Storage for PgStorage {
    #[instrument(skip_all)]
    async fn save_user(
        &self,
        email: &str,
        pass_hash: &[u8],
        role: Role,
    ) -> Result<i64, StorageError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO users (email, pass_hash, role)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(email)
        .bind(pass_hash)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if let StorageError::Database(msg) = &err {
                tracing::error!(target: "sso.repository.postgres", error = %msg, "Failed to insert user");
            }
            err
        })?;

        Ok(id)
    }

    #[instrument(skip_all)]
    async fn user(&self, email: &str) -> Result<User, StorageError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, pass_hash, role
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        User::try_from(row)
    }

    #[instrument(skip_all, fields(user_id = id))]
    async fn user_by_id(&self, id: i64) -> Result<User, StorageError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, pass_hash, role
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        User::try_from(row)
    }

    #[instrument(skip_all, fields(user_id = id))]
    async fn get_user_role(&self, id: i64) -> Result<Role, StorageError> {
        let (role,): (String,) = sqlx::query_as("SELECT role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::NotFound)?;

        parse_stored_role(&role)
    }

    #[instrument(skip_all, fields(user_id = id, role = %role))]
    async fn update_role(&self, id: i64, role: Role) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
            .bind(role.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    #[instrument(skip_all)]
    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, pass_hash, role
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    #[instrument(skip_all, fields(app_id = app_id))]
    async fn app(&self, app_id: i32) -> Result<App, StorageError> {
        let row = sqlx::query_as::<_, AppRow>("SELECT id, name, secret FROM apps WHERE id = $1")
            .bind(app_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::NotFound)?;

        Ok(App::from(row))
    }
}
