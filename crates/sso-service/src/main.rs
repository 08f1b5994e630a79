//! SSO Service
//!
//! gRPC authentication service: user registration, login with tokens signed
//! per application, and role management.
//!
//! # Servers
//!
//! - gRPC server for the `sso.Auth` service (default: 0.0.0.0:44044)
//! - HTTP server for health and metrics (default: 0.0.0.0:8081)
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment
//! 2. Initialize tracing (text for local/dev, JSON for prod)
//! 3. Install the Prometheus metrics recorder
//! 4. Connect the database pool and optionally run migrations
//! 5. Start the health server, then the gRPC server
//! 6. Wait for SIGINT/SIGTERM, drain the gRPC server, close the pool

use std::net::SocketAddr;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use proto_gen::sso::auth_server::AuthServer;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sso_service::config::{Config, Environment};
use sso_service::crypto::CredentialHasher;
use sso_service::grpc::AuthGrpcService;
use sso_service::observability::{health_router, HealthState};
use sso_service::repositories::PgStorage;
use sso_service::services::AuthService;
use tokio::signal;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config comes first: the log format depends on SSO_ENV.
    let config = Config::from_env()?;

    init_tracing(config.environment);

    info!(
        environment = config.environment.as_str(),
        grpc_bind_address = %config.grpc_bind_address,
        health_bind_address = %config.health_bind_address,
        token_ttl_seconds = config.token_ttl.as_secs(),
        grpc_timeout_seconds = config.grpc_timeout.as_secs(),
        bcrypt_cost = config.bcrypt_cost,
        "Configuration loaded successfully"
    );

    let prometheus_handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        error!(error = %e, "Failed to install Prometheus metrics recorder");
        format!("Failed to install Prometheus metrics recorder: {e}")
    })?;

    let health_state = Arc::new(HealthState::new());

    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(config.database_url.expose_secret())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to connect to database");
            e
        })?;
    info!("Database connection established");

    if config.run_migrations {
        sqlx::migrate!("../../migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to run migrations");
                e
            })?;
        info!("Migrations applied");
    }

    let hasher = CredentialHasher::new(config.bcrypt_cost)?;
    let storage = Arc::new(PgStorage::new(pool.clone()));
    let auth_service = Arc::new(AuthService::new(storage, hasher, config.token_ttl));

    let shutdown_token = CancellationToken::new();

    // Health server
    let health_addr: SocketAddr = config.health_bind_address.parse().map_err(|e| {
        error!(error = %e, addr = %config.health_bind_address, "Invalid health bind address");
        format!("Invalid health bind address: {e}")
    })?;
    let health_listener = tokio::net::TcpListener::bind(health_addr)
        .await
        .map_err(|e| {
            error!(error = %e, addr = %health_addr, "Failed to bind health server");
            format!("Failed to bind health server to {health_addr}: {e}")
        })?;

    let app = health_router(Arc::clone(&health_state), prometheus_handle);
    let health_shutdown_token = shutdown_token.child_token();
    let health_handle = tokio::spawn(async move {
        info!(addr = %health_addr, "Health server starting");
        let server = axum::serve(health_listener, app).with_graceful_shutdown(async move {
            health_shutdown_token.cancelled().await;
            info!("Health server shutting down");
        });
        if let Err(e) = server.await {
            error!(error = %e, "Health server failed");
        }
    });

    // gRPC server, bound before spawning so bind errors fail startup
    let grpc_addr: SocketAddr = config.grpc_bind_address.parse().map_err(|e| {
        error!(error = %e, addr = %config.grpc_bind_address, "Invalid gRPC bind address");
        format!("Invalid gRPC bind address: {e}")
    })?;
    let grpc_listener = tokio::net::TcpListener::bind(grpc_addr).await.map_err(|e| {
        error!(error = %e, addr = %grpc_addr, "Failed to bind gRPC server");
        format!("Failed to bind gRPC server to {grpc_addr}: {e}")
    })?;

    let grpc_shutdown_token = shutdown_token.child_token();
    let grpc_server = tonic::transport::Server::builder()
        .timeout(config.grpc_timeout)
        .layer(TraceLayer::new_for_grpc())
        .add_service(AuthServer::new(AuthGrpcService::new(auth_service)))
        .serve_with_incoming_shutdown(TcpListenerStream::new(grpc_listener), async move {
            grpc_shutdown_token.cancelled().await;
            info!("gRPC server shutting down");
        });

    let grpc_handle = tokio::spawn(async move {
        info!(addr = %grpc_addr, "gRPC server starting");
        if let Err(e) = grpc_server.await {
            error!(error = %e, "gRPC server failed");
        }
    });

    health_state.set_ready();
    info!("SSO service running - press Ctrl+C to shutdown");

    shutdown_signal().await;
    info!("Shutdown signal received, initiating graceful shutdown...");

    health_state.set_not_ready();
    shutdown_token.cancel();

    // In-flight calls finish or hit their deadline before the pool closes.
    if let Err(e) = grpc_handle.await {
        error!(error = %e, "gRPC server task failed");
    }
    if let Err(e) = health_handle.await {
        error!(error = %e, "Health server task failed");
    }

    pool.close().await;
    info!("SSO service shutdown complete");
    Ok(())
}

/// `local`/`dev`: human-readable at debug. `prod`: JSON at info.
/// `RUST_LOG` overrides the level in every environment.
fn init_tracing(environment: Environment) {
    let default_filter = match environment {
        Environment::Local | Environment::Dev => "sso=debug,sso_service=debug,tower_http=debug",
        Environment::Prod => "sso=info,sso_service=info,tower_http=info",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match environment {
        Environment::Local | Environment::Dev => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        Environment::Prod => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
