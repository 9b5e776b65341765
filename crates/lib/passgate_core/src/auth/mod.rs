//! Authentication and token issuing.
//!
//! Provides the credential issuer, signing-secret resolution, the provider
//! registry and the directory capability that can be shared across
//! `passgate_api` and the server binary.

pub mod directory;
pub mod issuer;
pub mod password;
pub mod provider;
pub mod secret;

use thiserror::Error;

/// Authentication errors.
///
/// A rejected login is not an error: see
/// [`Authentication::Rejected`](crate::models::auth::Authentication::Rejected).
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Directory error: {0}")]
    Directory(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
