//! E2E tests for registration, login and role management over gRPC.
//!
//! ## Test Naming
//!
//! Tests follow the convention: `test_<feature>_<scenario>_<expected_result>`

#![allow(clippy::unwrap_used, clippy::expect_used)]

use proto_gen::sso::{GetUserRoleRequest, ListUsersRequest, UpdateUserRoleRequest};
use sso_test_utils::*;
use tonic::Code;

// ============================================================================
// End-to-end scenario
// ============================================================================

/// Register, read the role, promote to admin, log in: the token carries the new role.
#[tokio::test]
async fn test_register_promote_login_token_has_admin_role() -> Result<(), anyhow::Error> {
    let server = TestSsoServer::spawn().await?;
    let mut client = server.client().await?;

    let user_id = register_user(&mut client, "a@x.com", "pw123", "").await?;
    assert_eq!(user_id, 1);

    let role = client
        .get_user_role(GetUserRoleRequest { user_id: 1 })
        .await?
        .into_inner()
        .role;
    assert_eq!(role, "user");

    client
        .update_role(UpdateUserRoleRequest {
            user_id: 1,
            role: "admin".to_string(),
        })
        .await?;

    let role = client
        .get_user_role(GetUserRoleRequest { user_id: 1 })
        .await?
        .into_inner()
        .role;
    assert_eq!(role, "admin");

    let token = login(&mut client, "a@x.com", "pw123").await?;
    assert!(!token.is_empty());
    token
        .assert_valid_jwt()
        .assert_role("admin")
        .assert_for_subject(1)
        .assert_email("a@x.com")
        .assert_app_id(TEST_APP_ID)
        .assert_expires_in(TEST_TOKEN_TTL.as_secs())
        .assert_signed_with(&test_app_secret());

    Ok(())
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_organizer_role_is_stored() -> Result<(), anyhow::Error> {
    let server = TestSsoServer::spawn().await?;
    let mut client = server.client().await?;

    let user_id = register_user(&mut client, TEST_EMAIL_ALICE, TEST_PASSWORD, "organizer").await?;

    let role = client
        .get_user_role(GetUserRoleRequest { user_id })
        .await?
        .into_inner()
        .role;
    assert_eq!(role, "organizer");
    Ok(())
}

#[tokio::test]
async fn test_register_duplicate_email_already_exists() -> Result<(), anyhow::Error> {
    let server = TestSsoServer::spawn().await?;
    let mut client = server.client().await?;

    register_user(&mut client, TEST_EMAIL_ALICE, TEST_PASSWORD, "").await?;
    let status = register_user(&mut client, TEST_EMAIL_ALICE, "different", "")
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::AlreadyExists);
    Ok(())
}

/// Two concurrent registrations for one email: exactly one wins.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_register_concurrent_same_email_one_success() -> Result<(), anyhow::Error> {
    let server = TestSsoServer::spawn().await?;
    let mut first_client = server.client().await?;
    let mut second_client = server.client().await?;

    let (first, second) = tokio::join!(
        register_user(&mut first_client, TEST_EMAIL_BOB, TEST_PASSWORD, ""),
        register_user(&mut second_client, TEST_EMAIL_BOB, TEST_PASSWORD, ""),
    );

    let outcomes = [first.map_err(|s| s.code()), second.map_err(|s| s.code())];
    let successes = outcomes.iter().filter(|o| o.is_ok()).count();
    let conflicts = outcomes
        .iter()
        .filter(|o| matches!(o, Err(Code::AlreadyExists)))
        .count();

    assert_eq!(successes, 1, "exactly one registration should succeed");
    assert_eq!(conflicts, 1, "the other should be AlreadyExists");

    let users = first_client
        .list_users(ListUsersRequest {})
        .await?
        .into_inner()
        .users;
    assert_eq!(users.len(), 1);
    Ok(())
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_wrong_password_unauthenticated() -> Result<(), anyhow::Error> {
    let server = TestSsoServer::spawn().await?;
    let mut client = server.client().await?;
    register_user(&mut client, TEST_EMAIL_ALICE, TEST_PASSWORD, "").await?;

    let status = login(&mut client, TEST_EMAIL_ALICE, "wrong-password")
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::Unauthenticated);
    Ok(())
}

/// Unknown email and wrong password are distinguishable end to end.
#[tokio::test]
async fn test_login_unknown_email_not_found() -> Result<(), anyhow::Error> {
    let server = TestSsoServer::spawn().await?;
    let mut client = server.client().await?;

    let status = login(&mut client, "nobody@example.com", TEST_PASSWORD)
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::NotFound);
    Ok(())
}

#[tokio::test]
async fn test_login_token_for_default_role() -> Result<(), anyhow::Error> {
    let server = TestSsoServer::spawn().await?;
    let mut client = server.client().await?;
    let user_id = register_user(&mut client, TEST_EMAIL_ALICE, TEST_PASSWORD, "").await?;

    let token = login(&mut client, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;

    token
        .assert_valid_jwt()
        .assert_role("user")
        .assert_for_subject(user_id)
        .assert_signed_with(&test_app_secret());
    Ok(())
}

// ============================================================================
// Role management and listing
// ============================================================================

#[tokio::test]
async fn test_update_role_unknown_user_not_found() -> Result<(), anyhow::Error> {
    let server = TestSsoServer::spawn().await?;
    let mut client = server.client().await?;

    let status = client
        .update_role(UpdateUserRoleRequest {
            user_id: 42,
            role: "admin".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::NotFound);
    Ok(())
}

#[tokio::test]
async fn test_list_users_empty_returns_empty_sequence() -> Result<(), anyhow::Error> {
    let server = TestSsoServer::spawn().await?;
    let mut client = server.client().await?;

    let users = client.list_users(ListUsersRequest {}).await?.into_inner().users;

    assert!(users.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_list_users_returns_id_email_role() -> Result<(), anyhow::Error> {
    let server = TestSsoServer::spawn().await?;
    let mut client = server.client().await?;
    register_user(&mut client, TEST_EMAIL_ALICE, TEST_PASSWORD, "").await?;
    register_user(&mut client, TEST_EMAIL_BOB, TEST_PASSWORD, "organizer").await?;

    let users = client.list_users(ListUsersRequest {}).await?.into_inner().users;

    let summary: Vec<(i64, &str, &str)> = users
        .iter()
        .map(|u| (u.id, u.email.as_str(), u.role.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (1, TEST_EMAIL_ALICE, "user"),
            (2, TEST_EMAIL_BOB, "organizer"),
        ]
    );
    Ok(())
}
