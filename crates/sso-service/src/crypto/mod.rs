//! Password hashing and token signing.
//!
//! - [`CredentialHasher`]: bcrypt hashing/verification, run on the blocking pool
//! - [`issue_token`] / [`verify_token`]: HS256 JWTs signed with the app secret

use crate::errors::SsoError;
use crate::models::{App, User};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::instrument;

/// bcrypt ignores everything after the 72nd byte.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Lowest cost the hasher accepts (bcrypt's own floor).
pub const MIN_HASHER_COST: u32 = 4;

/// Highest cost the hasher accepts (~800ms per hash at 14).
pub const MAX_HASHER_COST: u32 = 14;

/// Tokens larger than this are rejected before any parsing.
const MAX_JWT_SIZE_BYTES: usize = 4096;

/// Token signing algorithm. Fixed; there is no unsigned mode.
const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// Credential Hasher
// ============================================================================

/// bcrypt password hasher with a fixed cost factor.
#[derive(Debug, Clone, Copy)]
pub struct CredentialHasher {
    cost: u32,
}

impl CredentialHasher {
    /// Create a hasher.
    ///
    /// # Errors
    ///
    /// Returns `SsoError::Crypto` if `cost` is outside
    /// `MIN_HASHER_COST..=MAX_HASHER_COST`.
    pub fn new(cost: u32) -> Result<Self, SsoError> {
        if !(MIN_HASHER_COST..=MAX_HASHER_COST).contains(&cost) {
            return Err(SsoError::Crypto(format!(
                "Invalid bcrypt cost: {} (must be {}-{})",
                cost,
                MIN_HASHER_COST,
                MAX_HASHER_COST
            )));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with a fresh random salt.
    ///
    /// # Errors
    ///
    /// - `SsoError::InvalidArgument` if the password exceeds 72 bytes
    /// - `SsoError::Crypto` if bcrypt fails
    /// - `SsoError::Internal` if the blocking task is lost
    #[instrument(skip_all)]
    pub async fn hash(&self, password: &SecretString) -> Result<Vec<u8>, SsoError> {
        if password.expose_secret().len() > MAX_PASSWORD_BYTES {
            return Err(SsoError::InvalidArgument(format!(
                "password must be at most {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }

        let password = SecretString::from(password.expose_secret().to_owned());
        let cost = self.cost;

        tokio::task::spawn_blocking(move || {
            bcrypt::hash(password.expose_secret(), cost)
                .map(String::into_bytes)
                .map_err(|e| SsoError::Crypto(format!("Password hashing failed: {}", e)))
        })
        .await
        .map_err(|e| SsoError::Internal(format!("Hashing task failed: {}", e)))?
    }

    /// Check a password against a stored hash.
    ///
    /// A mismatch is `Ok(false)`. Passwords longer than 72 bytes never match,
    /// since bcrypt would only compare their prefix.
    ///
    /// # Errors
    ///
    /// - `SsoError::Crypto` if the stored hash is malformed
    /// - `SsoError::Internal` if the blocking task is lost
    #[instrument(skip_all)]
    pub async fn verify(&self, password: &SecretString, hash: &[u8]) -> Result<bool, SsoError> {
        if password.expose_secret().len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }

        let hash = std::str::from_utf8(hash)
            .map_err(|_| SsoError::Crypto("Stored password hash is not valid UTF-8".to_string()))?
            .to_owned();
        let password = SecretString::from(password.expose_secret().to_owned());

        tokio::task::spawn_blocking(move || {
            bcrypt::verify(password.expose_secret(), &hash)
                .map_err(|e| SsoError::Crypto(format!("Password verification failed: {}", e)))
        })
        .await
        .map_err(|e| SsoError::Internal(format!("Verification task failed: {}", e)))?
    }
}

// ============================================================================
// Token Issuer
// ============================================================================

/// Claims carried by an issued token.
///
/// `sub` is the user id in decimal. Debug redacts `sub` and `email`.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub email: String,
    pub app_id: i32,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

impl fmt::Debug for TokenClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenClaims")
            .field("sub", &"[REDACTED]")
            .field("email", &"[REDACTED]")
            .field("app_id", &self.app_id)
            .field("role", &self.role)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

/// Issue a token for `user` scoped to `app`, valid for `ttl` from now.
pub fn issue_token(user: &User, app: &App, ttl: Duration) -> Result<String, SsoError> {
    issue_token_at(user, app, ttl, chrono::Utc::now().timestamp())
}

/// Issue a token with an explicit issue time (unix seconds).
///
/// `exp` is exactly `now + ttl`.
///
/// # Errors
///
/// Returns `SsoError::TokenGeneration` if the TTL is under one second, the
/// app secret is empty, or signing fails.
#[instrument(skip_all, fields(app_id = app.id))]
pub fn issue_token_at(user: &User, app: &App, ttl: Duration, now: i64) -> Result<String, SsoError> {
    let ttl_seconds = i64::try_from(ttl.as_secs())
        .map_err(|_| SsoError::TokenGeneration("Token TTL is too large".to_string()))?;
    if ttl_seconds < 1 {
        return Err(SsoError::TokenGeneration(
            "Token TTL must be at least one second".to_string(),
        ));
    }

    let secret = app.secret.expose_secret();
    if secret.is_empty() {
        return Err(SsoError::TokenGeneration(
            "App signing secret is empty".to_string(),
        ));
    }

    let exp = now
        .checked_add(ttl_seconds)
        .ok_or_else(|| SsoError::TokenGeneration("Token expiry overflows".to_string()))?;

    let claims = TokenClaims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        app_id: app.id,
        role: user.role.as_str().to_string(),
        iat: now,
        exp,
    };

    let mut header = Header::new(TOKEN_ALGORITHM);
    header.typ = Some("JWT".to_string());

    encode(&header, &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| SsoError::TokenGeneration(format!("JWT signing operation failed: {}", e)))
}

/// Verify a token signed with `secret` and return its claims.
///
/// Pins HS256, applies no leeway and requires `exp` and `sub`.
///
/// # Errors
///
/// Returns `SsoError::InvalidToken` for oversized, malformed, expired or
/// wrongly signed tokens.
#[instrument(skip_all)]
pub fn verify_token(token: &str, secret: &SecretString) -> Result<TokenClaims, SsoError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "sso.crypto",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(SsoError::InvalidToken(
            "The token is invalid or expired".to_string(),
        ));
    }

    let secret = secret.expose_secret();
    if secret.is_empty() {
        return Err(SsoError::InvalidToken(
            "The token is invalid or expired".to_string(),
        ));
    }

    let mut validation = Validation::new(TOKEN_ALGORITHM);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(target: "sso.crypto", error = %e, "Token verification failed");
        SsoError::InvalidToken("The token is invalid or expired".to_string())
    })?;

    Ok(token_data.claims)
}
