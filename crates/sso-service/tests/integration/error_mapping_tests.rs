//! Internal failures must surface as Internal with a generic message.
//!
//! Uses storage that fails every call, standing in for a database outage.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use proto_gen::sso::{GetUserRoleRequest, ListUsersRequest, UpdateUserRoleRequest};
use sso_service::repositories::InMemoryStorage;
use sso_test_utils::*;
use std::sync::Arc;
use tonic::Code;

async fn failing_server() -> Result<TestSsoServer, anyhow::Error> {
    TestSsoServer::spawn_with_storage(Arc::new(InMemoryStorage::failing())).await
}

fn assert_generic_internal(status: &tonic::Status, message: &str) {
    assert_eq!(status.code(), Code::Internal);
    assert_eq!(status.message(), message);
    assert!(
        !status.message().contains("storage"),
        "internal error text leaked: {}",
        status.message()
    );
}

#[tokio::test]
async fn test_storage_outage_register_internal() -> Result<(), anyhow::Error> {
    let server = failing_server().await?;
    let mut client = server.client().await?;

    let status = register_user(&mut client, TEST_EMAIL_ALICE, TEST_PASSWORD, "")
        .await
        .unwrap_err();

    assert_generic_internal(&status, "failed to register");
    Ok(())
}

#[tokio::test]
async fn test_storage_outage_login_internal() -> Result<(), anyhow::Error> {
    let server = failing_server().await?;
    let mut client = server.client().await?;

    let status = login(&mut client, TEST_EMAIL_ALICE, TEST_PASSWORD)
        .await
        .unwrap_err();

    assert_generic_internal(&status, "failed to login");
    Ok(())
}

#[tokio::test]
async fn test_storage_outage_role_operations_internal() -> Result<(), anyhow::Error> {
    let server = failing_server().await?;
    let mut client = server.client().await?;

    let status = client
        .get_user_role(GetUserRoleRequest { user_id: 1 })
        .await
        .unwrap_err();
    assert_generic_internal(&status, "failed to get user role");

    let status = client
        .update_role(UpdateUserRoleRequest {
            user_id: 1,
            role: "admin".to_string(),
        })
        .await
        .unwrap_err();
    assert_generic_internal(&status, "failed to update user role");

    let status = client.list_users(ListUsersRequest {}).await.unwrap_err();
    assert_generic_internal(&status, "failed to list users");
    Ok(())
}

/// Login for an app that does not exist is a server-side problem, not a
/// caller credential problem.
#[tokio::test]
async fn test_login_unknown_app_internal() -> Result<(), anyhow::Error> {
    let server = TestSsoServer::spawn().await?;
    let mut client = server.client().await?;
    register_user(&mut client, TEST_EMAIL_ALICE, TEST_PASSWORD, "").await?;

    let status = client
        .login(proto_gen::sso::LoginRequest {
            email: TEST_EMAIL_ALICE.to_string(),
            password: TEST_PASSWORD.to_string(),
            app_id: 999,
        })
        .await
        .unwrap_err();

    assert_generic_internal(&status, "failed to login");
    Ok(())
}
