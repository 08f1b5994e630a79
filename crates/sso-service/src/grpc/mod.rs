//! gRPC transport for the SSO service.

pub mod auth_grpc;

pub use auth_grpc::AuthGrpcService;
