//! Authentication capabilities consumed by the sign-in handlers.
//!
//! [`Directory`] turns credentials or an OAuth profile into an identity
//! record; [`ProfileExchange`] is the OAuth authorization-code handshake. Both
//! are traits so storage and provider wire protocols stay outside this crate.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::AuthError;
use super::password::verify_password;
use super::provider::{Provider, ProviderConfig};
use crate::models::auth::{Authentication, IdentityRecord, OAuthProfile};

/// Rejection reason for a failed local sign-in.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials.";
/// Rejection reason for an OAuth profile with no matching user.
pub const USER_NOT_FOUND: &str = "User record not found.";

/// Looks up and verifies users.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Local sign-in with email and password.
    async fn authenticate(&self, email: &str, password: &str)
    -> Result<Authentication, AuthError>;

    /// Map a provider profile onto a known user.
    async fn authenticate_oauth(
        &self,
        provider: Provider,
        profile: &OAuthProfile,
    ) -> Result<Authentication, AuthError>;
}

/// Exchanges an authorization code for the provider's profile.
#[async_trait]
pub trait ProfileExchange: Send + Sync {
    async fn exchange(
        &self,
        provider: Provider,
        config: &ProviderConfig,
        code: &str,
    ) -> Result<OAuthProfile, AuthError>;
}

/// Exchange used when no OAuth client is wired in; every callback fails as an
/// upstream provider error.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredExchange;

#[async_trait]
impl ProfileExchange for UnconfiguredExchange {
    async fn exchange(
        &self,
        provider: Provider,
        _config: &ProviderConfig,
        _code: &str,
    ) -> Result<OAuthProfile, AuthError> {
        Err(AuthError::Provider(format!(
            "no OAuth exchange configured for {provider}"
        )))
    }
}

/// Read-only user store keyed by lowercase email.
///
/// Records are kept as raw storage objects, `hash` (bcrypt) and any legacy
/// `salt` included, and returned as-is on success.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    users: HashMap<String, IdentityRecord>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record; it must carry a string `email`.
    pub fn insert(&mut self, record: IdentityRecord) -> Result<(), AuthError> {
        let email = record
            .email()
            .ok_or_else(|| AuthError::Directory("user record without email".into()))?
            .to_lowercase();
        self.users.insert(email, record);
        Ok(())
    }

    pub fn from_records<I>(records: I) -> Result<Self, AuthError>
    where
        I: IntoIterator<Item = IdentityRecord>,
    {
        let mut directory = Self::new();
        for record in records {
            directory.insert(record)?;
        }
        Ok(directory)
    }

    /// Load a JSON array of user objects.
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AuthError::Directory(format!("read {}: {e}", path.display())))?;
        let values: Vec<Value> = serde_json::from_str(&raw)
            .map_err(|e| AuthError::Directory(format!("parse {}: {e}", path.display())))?;
        let records = values
            .into_iter()
            .map(IdentityRecord::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AuthError::Directory(format!("{}: {e}", path.display())))?;
        Self::from_records(records)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn find(&self, email: &str) -> Option<&IdentityRecord> {
        self.users.get(&email.to_lowercase())
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Authentication, AuthError> {
        let Some(record) = self.find(email) else {
            debug!(email, "local sign-in: unknown email");
            return Ok(Authentication::rejected(INVALID_CREDENTIALS));
        };
        let Some(hash) = record.get("hash").and_then(Value::as_str) else {
            debug!(email, "local sign-in: user has no password");
            return Ok(Authentication::rejected(INVALID_CREDENTIALS));
        };
        if !verify_password(password, hash)? {
            debug!(email, "local sign-in: wrong password");
            return Ok(Authentication::rejected(INVALID_CREDENTIALS));
        }
        Ok(Authentication::Verified(record.clone()))
    }

    async fn authenticate_oauth(
        &self,
        provider: Provider,
        profile: &OAuthProfile,
    ) -> Result<Authentication, AuthError> {
        match profile.email().and_then(|email| self.find(email)) {
            Some(record) => Ok(Authentication::Verified(record.clone())),
            None => {
                debug!(%provider, "OAuth sign-in: no user for profile");
                Ok(Authentication::rejected(USER_NOT_FOUND))
            }
        }
    }
}
