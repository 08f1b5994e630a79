//! Test server harness for end-to-end gRPC testing
//!
//! Provides `TestSsoServer` for spawning a real `sso.Auth` server on a
//! random local port.

use crate::fixtures::{test_app, TEST_APP_ID, TEST_BCRYPT_COST, TEST_TOKEN_TTL};
use proto_gen::sso::auth_client::AuthClient;
use proto_gen::sso::auth_server::AuthServer;
use proto_gen::sso::{LoginRequest, RegisterRequest};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sso_service::crypto::CredentialHasher;
use sso_service::grpc::AuthGrpcService;
use sso_service::repositories::{InMemoryStorage, PgStorage, Storage};
use sso_service::services::AuthService;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Channel;

/// Test harness for spawning the SSO gRPC server in E2E tests
///
/// The server stops when the harness is dropped.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_register() -> Result<()> {
///     let server = TestSsoServer::spawn().await?;
///     let mut client = server.client().await?;
///
///     let user_id = register_user(&mut client, "a@x.com", "pw", "").await?;
///     assert_eq!(user_id, 1);
///     Ok(())
/// }
/// ```
pub struct TestSsoServer {
    addr: SocketAddr,
    memory: Option<Arc<InMemoryStorage>>,
    shutdown: CancellationToken,
    _handle: JoinHandle<()>,
}

impl TestSsoServer {
    /// Spawn a server over fresh in-memory storage seeded with the test app.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_storage(Arc::new(InMemoryStorage::new().with_app(test_app()))).await
    }

    /// Spawn a server over the given in-memory storage.
    ///
    /// The storage stays reachable through [`TestSsoServer::storage`] for
    /// call-count assertions.
    pub async fn spawn_with_storage(storage: Arc<InMemoryStorage>) -> Result<Self, anyhow::Error> {
        let mut server = Self::start(Arc::clone(&storage) as Arc<dyn Storage>).await?;
        server.memory = Some(storage);
        Ok(server)
    }

    /// Spawn a server over Postgres (typically a pool from `#[sqlx::test]`).
    ///
    /// Inserts the test app first.
    pub async fn spawn_with_pool(pool: PgPool) -> Result<Self, anyhow::Error> {
        let app = test_app();
        sqlx::query("INSERT INTO apps (id, name, secret) VALUES ($1, $2, $3)")
            .bind(app.id)
            .bind(&app.name)
            .bind(app.secret.expose_secret())
            .execute(&pool)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to insert test app: {}", e))?;

        Self::start(Arc::new(PgStorage::new(pool))).await
    }

    async fn start(storage: Arc<dyn Storage>) -> Result<Self, anyhow::Error> {
        let hasher = CredentialHasher::new(TEST_BCRYPT_COST)
            .map_err(|e| anyhow::anyhow!("Failed to create hasher: {}", e))?;
        let service = Arc::new(AuthService::new(storage, hasher, TEST_TOKEN_TTL));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;
        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let shutdown = CancellationToken::new();
        let server_shutdown = shutdown.clone();

        let handle = tokio::spawn(async move {
            let result = tonic::transport::Server::builder()
                .timeout(Duration::from_secs(10))
                .add_service(AuthServer::new(AuthGrpcService::new(service)))
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                    server_shutdown.cancelled().await;
                })
                .await;
            if let Err(e) = result {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            memory: None,
            shutdown,
            _handle: handle,
        })
    }

    /// Connect a new client to the server.
    pub async fn client(&self) -> Result<AuthClient<Channel>, anyhow::Error> {
        AuthClient::connect(self.url())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to test server: {}", e))
    }

    /// In-memory storage behind the server.
    ///
    /// Panics if the server was spawned over Postgres.
    pub fn storage(&self) -> &InMemoryStorage {
        self.memory
            .as_deref()
            .expect("server was not spawned with in-memory storage")
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestSsoServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Register a user and return its id.
pub async fn register_user(
    client: &mut AuthClient<Channel>,
    email: &str,
    password: &str,
    role: &str,
) -> Result<i64, tonic::Status> {
    let response = client
        .register(RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            role: role.to_string(),
        })
        .await?;
    Ok(response.into_inner().user_id)
}

/// Log in to the test app and return the token.
pub async fn login(
    client: &mut AuthClient<Channel>,
    email: &str,
    password: &str,
) -> Result<String, tonic::Status> {
    let response = client
        .login(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            app_id: TEST_APP_ID,
        })
        .await?;
    Ok(response.into_inner().token)
}
