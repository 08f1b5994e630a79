//! Custom test assertions for expressive tests
//!
//! Provides trait-based assertions for issued tokens.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use secrecy::SecretString;
use serde::Deserialize;

/// JWT header structure
#[derive(Debug, Deserialize)]
struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

/// JWT claims structure
#[derive(Debug, Deserialize)]
struct JwtClaims {
    pub sub: String,
    pub email: String,
    pub app_id: i32,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

fn decode_claims(token: &str) -> JwtClaims {
    let payload = token.split('.').nth(1).expect("JWT has no payload part");
    let payload = URL_SAFE_NO_PAD
        .decode(payload)
        .expect("Invalid JWT payload encoding");
    serde_json::from_slice(&payload).expect("Failed to parse JWT claims")
}

/// Custom assertions for issued tokens
///
/// # Example
/// ```rust,ignore
/// token
///     .assert_valid_jwt()
///     .assert_role("admin")
///     .assert_app_id(TEST_APP_ID)
///     .assert_signed_with(&test_app_secret());
/// ```
pub trait TokenAssertions {
    /// Assert that the token is a well-formed HS256 JWT with the expected claims
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert the `role` claim
    fn assert_role(&self, role: &str) -> &Self;

    /// Assert the `app_id` claim
    fn assert_app_id(&self, app_id: i32) -> &Self;

    /// Assert the `email` claim
    fn assert_email(&self, email: &str) -> &Self;

    /// Assert that the token is for the specified user id
    fn assert_for_subject(&self, user_id: i64) -> &Self;

    /// Assert that `exp - iat` equals exactly `seconds`
    fn assert_expires_in(&self, seconds: u64) -> &Self;

    /// Assert that the signature verifies with `secret`
    fn assert_signed_with(&self, secret: &SecretString) -> &Self;
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        let parts: Vec<_> = self.split('.').collect();
        assert_eq!(
            parts.len(),
            3,
            "JWT must have 3 parts (header.payload.signature), got {}",
            parts.len()
        );

        let header_bytes = URL_SAFE_NO_PAD
            .decode(parts[0])
            .expect("Failed to base64 decode JWT header");
        let header: JwtHeader =
            serde_json::from_slice(&header_bytes).expect("Failed to parse JWT header JSON");
        assert_eq!(header.alg, "HS256", "Expected HS256 algorithm");
        assert_eq!(header.typ, "JWT", "Expected JWT type");

        assert!(!parts[2].is_empty(), "JWT signature must not be empty");

        let claims = decode_claims(self);
        assert!(claims.exp > claims.iat, "exp must be after iat");

        self
    }

    fn assert_role(&self, role: &str) -> &Self {
        let claims = decode_claims(self);
        assert_eq!(claims.role, role, "Token has role '{}'", claims.role);
        self
    }

    fn assert_app_id(&self, app_id: i32) -> &Self {
        let claims = decode_claims(self);
        assert_eq!(claims.app_id, app_id, "Token issued for app {}", claims.app_id);
        self
    }

    fn assert_email(&self, email: &str) -> &Self {
        let claims = decode_claims(self);
        assert_eq!(claims.email, email, "Token email claim mismatch");
        self
    }

    fn assert_for_subject(&self, user_id: i64) -> &Self {
        let claims = decode_claims(self);
        assert_eq!(
            claims.sub,
            user_id.to_string(),
            "Token subject mismatch"
        );
        self
    }

    fn assert_expires_in(&self, seconds: u64) -> &Self {
        let claims = decode_claims(self);
        let lifetime = claims.exp - claims.iat;
        assert_eq!(
            lifetime,
            i64::try_from(seconds).expect("seconds fits in i64"),
            "Token lifetime is {}s, expected {}s",
            lifetime,
            seconds
        );
        self
    }

    fn assert_signed_with(&self, secret: &SecretString) -> &Self {
        let result = sso_service::crypto::verify_token(self, secret);
        assert!(
            result.is_ok(),
            "Token does not verify with the given secret: {:?}",
            result.err()
        );
        self
    }
}
