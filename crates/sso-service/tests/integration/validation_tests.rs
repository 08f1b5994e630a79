//! Boundary validation tests.
//!
//! Malformed requests must be rejected with InvalidArgument before any
//! storage access; the in-memory storage call counters prove it.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use proto_gen::sso::{GetUserRoleRequest, LoginRequest, RegisterRequest, UpdateUserRoleRequest};
use sso_test_utils::*;
use tonic::Code;

#[tokio::test]
async fn test_register_missing_fields_rejected_without_storage() -> Result<(), anyhow::Error> {
    let server = TestSsoServer::spawn().await?;
    let mut client = server.client().await?;

    for (email, password) in [("", TEST_PASSWORD), (TEST_EMAIL_ALICE, "")] {
        let status = client
            .register(RegisterRequest {
                email: email.to_string(),
                password: password.to_string(),
                role: String::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
    }

    assert_eq!(server.storage().call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_register_password_over_72_bytes_rejected() -> Result<(), anyhow::Error> {
    let server = TestSsoServer::spawn().await?;
    let mut client = server.client().await?;

    let status = register_user(&mut client, TEST_EMAIL_ALICE, &"x".repeat(73), "")
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(server.storage().call_count(), 0);
    Ok(())
}

/// Self-service admin registration is never allowed.
#[tokio::test]
async fn test_register_admin_role_invalid_argument() -> Result<(), anyhow::Error> {
    let server = TestSsoServer::spawn().await?;
    let mut client = server.client().await?;

    let status = register_user(&mut client, TEST_EMAIL_ALICE, TEST_PASSWORD, "admin")
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(server.storage().mutation_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_register_unknown_role_invalid_argument() -> Result<(), anyhow::Error> {
    let server = TestSsoServer::spawn().await?;
    let mut client = server.client().await?;

    let status = register_user(&mut client, TEST_EMAIL_ALICE, TEST_PASSWORD, "superuser")
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(server.storage().call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_login_missing_fields_rejected_without_storage() -> Result<(), anyhow::Error> {
    let server = TestSsoServer::spawn().await?;
    let mut client = server.client().await?;

    let cases = [
        ("", TEST_PASSWORD, TEST_APP_ID),
        (TEST_EMAIL_ALICE, "", TEST_APP_ID),
        (TEST_EMAIL_ALICE, TEST_PASSWORD, 0),
    ];
    for (email, password, app_id) in cases {
        let status = client
            .login(LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
                app_id,
            })
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
    }

    assert_eq!(server.storage().call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_user_id_zero_rejected_without_storage() -> Result<(), anyhow::Error> {
    let server = TestSsoServer::spawn().await?;
    let mut client = server.client().await?;

    let status = client
        .get_user_role(GetUserRoleRequest { user_id: 0 })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    let status = client
        .update_role(UpdateUserRoleRequest {
            user_id: 0,
            role: "user".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    assert_eq!(server.storage().call_count(), 0);
    Ok(())
}

/// An unknown role on UpdateRole fails and leaves storage untouched.
#[tokio::test]
async fn test_update_role_superuser_no_mutation() -> Result<(), anyhow::Error> {
    let server = TestSsoServer::spawn().await?;
    let mut client = server.client().await?;
    let user_id = register_user(&mut client, TEST_EMAIL_ALICE, TEST_PASSWORD, "").await?;
    let mutations_before = server.storage().mutation_count();

    let status = client
        .update_role(UpdateUserRoleRequest {
            user_id,
            role: "superuser".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(server.storage().mutation_count(), mutations_before);

    let role = client
        .get_user_role(GetUserRoleRequest { user_id })
        .await?
        .into_inner()
        .role;
    assert_eq!(role, "user");
    Ok(())
}
