//! Generated Protocol Buffer code for the SSO RPC contract.
//!
//! This crate contains the compiled definitions of `proto/sso.proto`: the
//! request/response messages plus the tonic server trait and client used by
//! `sso-service` and its tests.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)] // Generated code has various doc formatting

// Re-export prost traits for convenience
pub use prost::Message;

pub mod sso {
    //! `sso.Auth` service and its messages
    include!("generated/sso.rs");
}
