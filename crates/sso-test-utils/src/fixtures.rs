//! Fixed test data for deterministic tests.

use secrecy::SecretString;
use sso_service::models::App;
use std::time::Duration;

// Application seeded into every test server
pub const TEST_APP_ID: i32 = 1;
pub const TEST_APP_NAME: &str = "test-app";
pub const TEST_APP_SECRET: &str = "test-app-secret-do-not-use-in-production";

/// bcrypt's minimum cost; keeps hashing fast in tests.
pub const TEST_BCRYPT_COST: u32 = 4;

pub const TEST_TOKEN_TTL: Duration = Duration::from_secs(3600);

// Users
pub const TEST_EMAIL_ALICE: &str = "alice@example.com";
pub const TEST_EMAIL_BOB: &str = "bob@example.com";
pub const TEST_PASSWORD: &str = "correct-horse-battery-staple";

/// The application seeded into test storage.
pub fn test_app() -> App {
    App {
        id: TEST_APP_ID,
        name: TEST_APP_NAME.to_string(),
        secret: SecretString::from(TEST_APP_SECRET.to_string()),
    }
}

/// `TEST_APP_SECRET` as a `SecretString`, for token verification.
pub fn test_app_secret() -> SecretString {
    SecretString::from(TEST_APP_SECRET.to_string())
}
