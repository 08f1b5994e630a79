//! # SSO Test Utilities
//!
//! Shared test utilities for the SSO service.
//!
//! This crate provides:
//! - Fixed fixtures (test application, secrets, emails)
//! - Server test harness (`TestSsoServer` for end-to-end gRPC tests)
//! - Custom assertions (`TokenAssertions` trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sso_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let server = TestSsoServer::spawn().await?;
//!     let mut client = server.client().await?;
//!
//!     let token = login(&mut client, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;
//!     token.assert_valid_jwt()
//!          .assert_role("user")
//!          .assert_app_id(TEST_APP_ID);
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod server_harness;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;
pub use server_harness::*;
