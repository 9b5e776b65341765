//! Credential issuer: signs identity records into JWTs and slides their expiry.
//!
//! Tokens are HS256 JWTs whose claims are the identity's public fields plus
//! `exp`. The issuer keeps no token store. Validity is a function of signature
//! and expiry only, so clearing a client's cookie does not invalidate a token
//! that was already handed out; it stays usable until `exp`.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use super::AuthError;
use crate::models::auth::{IdentityRecord, TokenClaims};

/// Token lifetime: 30 minutes.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 30 * 60;

/// Longest accepted token lifetime: ten years.
pub const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Outcome of a sliding refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    /// A freshly signed token that replaces the client's current one.
    Reissued(String),
    /// Nothing to do: no token, or the token has already expired.
    Unchanged,
}

/// Signs and verifies session tokens with the process-wide secret.
#[derive(Clone)]
pub struct CredentialIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for CredentialIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialIssuer")
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish_non_exhaustive()
    }
}

impl CredentialIssuer {
    /// Build an issuer. An empty secret or a lifetime outside
    /// `1..=MAX_TOKEN_TTL_SECS` seconds fails with [`AuthError::Signing`].
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Signing("signing secret is not configured".into()));
        }
        if ttl <= Duration::zero() || ttl > Duration::seconds(MAX_TOKEN_TTL_SECS) {
            return Err(AuthError::Signing(format!(
                "token lifetime must be between 1s and {MAX_TOKEN_TTL_SECS}s, got {}s",
                ttl.num_seconds()
            )));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        })
    }

    /// Issuer with the default 30 minute lifetime.
    pub fn with_default_ttl(secret: &[u8]) -> Result<Self, AuthError> {
        Self::new(secret, Duration::seconds(DEFAULT_TOKEN_TTL_SECS))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign the identity's public fields with `exp = now + ttl`.
    ///
    /// `salt` and `hash` are stripped even when the caller passed a raw
    /// storage record.
    pub fn issue(&self, identity: &IdentityRecord) -> Result<String, AuthError> {
        self.issue_at(identity, Utc::now())
    }

    fn issue_at(&self, identity: &IdentityRecord, now: DateTime<Utc>) -> Result<String, AuthError> {
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Signing("token expiry out of range".into()))?;
        let claims = TokenClaims {
            exp: exp.timestamp(),
            fields: identity.public_fields(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(format!("jwt encode: {e}")))
    }

    /// Sliding refresh over already-verified claims.
    ///
    /// While `now < exp` a new token is signed from the same fields with a
    /// fresh lifetime. An expired or missing token is left alone; the caller
    /// must not resurrect it.
    pub fn refresh(&self, claims: Option<&TokenClaims>) -> Result<Refresh, AuthError> {
        self.refresh_at(claims, Utc::now())
    }

    fn refresh_at(
        &self,
        claims: Option<&TokenClaims>,
        now: DateTime<Utc>,
    ) -> Result<Refresh, AuthError> {
        let Some(claims) = claims else {
            return Ok(Refresh::Unchanged);
        };
        if claims.is_expired_at(now.timestamp()) {
            debug!(exp = claims.exp, "token expired, not refreshing");
            return Ok(Refresh::Unchanged);
        }
        let token = self.issue_at(&claims.identity(), now)?;
        Ok(Refresh::Reissued(token))
    }

    /// Verify signature and expiry (no leeway), returning the claims.
    ///
    /// Identity fields such as `aud` are carried as data, not checked.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;
        decode::<TokenClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::TokenError(format!("jwt decode: {e}")))
    }
}
