//! Postgres storage tests.
//!
//! Need a disposable database (`DATABASE_URL`); run with
//! `cargo test -- --ignored`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use proto_gen::sso::UpdateUserRoleRequest;
use sqlx::PgPool;
use sso_service::models::Role;
use sso_service::repositories::{PgStorage, Storage, StorageError};
use sso_test_utils::*;
use tonic::Code;

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a Postgres database"]
async fn test_pg_save_and_lookup(pool: PgPool) -> Result<(), anyhow::Error> {
    let storage = PgStorage::new(pool);

    let id = storage.save_user("a@x.com", b"hash", Role::Organizer).await?;

    let user = storage.user("a@x.com").await?;
    assert_eq!(user.id, id);
    assert_eq!(user.pass_hash, b"hash".to_vec());
    assert_eq!(user.role, Role::Organizer);
    assert_eq!(storage.user_by_id(id).await?.email, "a@x.com");
    assert_eq!(storage.get_user_role(id).await?, Role::Organizer);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a Postgres database"]
async fn test_pg_duplicate_email_already_exists(pool: PgPool) -> Result<(), anyhow::Error> {
    let storage = PgStorage::new(pool);
    storage.save_user("a@x.com", b"hash", Role::User).await?;

    let result = storage.save_user("a@x.com", b"other", Role::User).await;

    assert!(matches!(result, Err(StorageError::AlreadyExists)));
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a Postgres database"]
async fn test_pg_missing_records_not_found(pool: PgPool) -> Result<(), anyhow::Error> {
    let storage = PgStorage::new(pool);

    assert!(matches!(storage.user("nobody@x.com").await, Err(StorageError::NotFound)));
    assert!(matches!(storage.get_user_role(99).await, Err(StorageError::NotFound)));
    assert!(matches!(
        storage.update_role(99, Role::Admin).await,
        Err(StorageError::NotFound)
    ));
    assert!(matches!(storage.app(99).await, Err(StorageError::NotFound)));
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a Postgres database"]
async fn test_pg_list_users_ordered_by_id(pool: PgPool) -> Result<(), anyhow::Error> {
    let storage = PgStorage::new(pool);
    assert!(storage.list_users().await?.is_empty());

    let first = storage.save_user("b@x.com", b"h", Role::User).await?;
    let second = storage.save_user("a@x.com", b"h", Role::Organizer).await?;
    storage.update_role(first, Role::Admin).await?;

    let users = storage.list_users().await?;
    let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![first, second]);
    assert_eq!(users.first().map(|u| u.role), Some(Role::Admin));
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a Postgres database"]
async fn test_pg_grpc_round_trip(pool: PgPool) -> Result<(), anyhow::Error> {
    let server = TestSsoServer::spawn_with_pool(pool).await?;
    let mut client = server.client().await?;

    let user_id = register_user(&mut client, TEST_EMAIL_ALICE, TEST_PASSWORD, "").await?;
    client
        .update_role(UpdateUserRoleRequest {
            user_id,
            role: "admin".to_string(),
        })
        .await?;

    let token = login(&mut client, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;
    token
        .assert_valid_jwt()
        .assert_role("admin")
        .assert_for_subject(user_id)
        .assert_signed_with(&test_app_secret());

    let status = register_user(&mut client, TEST_EMAIL_ALICE, TEST_PASSWORD, "")
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::AlreadyExists);
    Ok(())
}
