//! Authentication domain models.
//!
//! These are internal domain models, distinct from the request/response types
//! of the HTTP layer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::AuthError;

/// Password-derived fields that must never be signed into a token.
pub const SECRET_FIELDS: [&str; 2] = ["salt", "hash"];

/// Claim owned by the issuer; an identity's own value is discarded.
pub const EXPIRY_CLAIM: &str = "exp";

/// Verified user attributes handed to the issuer.
///
/// Storage-layer objects are converted explicitly, either with
/// [`IdentityRecord::from_serialize`] or `TryFrom<Value>`. The record may still
/// carry `salt`/`hash`; [`IdentityRecord::public_fields`] is the only view
/// that reaches a token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityRecord(Map<String, Value>);

impl IdentityRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style field setter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Convert any serializable storage object into an identity record.
    ///
    /// Fails with [`AuthError::Signing`] when the value cannot be serialized
    /// or does not serialize to a JSON object.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, AuthError> {
        let value = serde_json::to_value(value)
            .map_err(|e| AuthError::Signing(format!("identity serialize: {e}")))?;
        Self::try_from(value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn email(&self) -> Option<&str> {
        self.get("email").and_then(Value::as_str)
    }

    /// Shallow copy of the record without the secret fields or `exp`.
    pub fn public_fields(&self) -> Map<String, Value> {
        let mut fields = self.0.clone();
        for key in SECRET_FIELDS {
            fields.remove(key);
        }
        fields.remove(EXPIRY_CLAIM);
        fields
    }
}

impl From<Map<String, Value>> for IdentityRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for IdentityRecord {
    type Error = AuthError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(AuthError::Signing(format!(
                "identity must be an object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// JWT claims: the identity's public fields plus the expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Expiry (unix timestamp, seconds).
    pub exp: i64,
    /// Identity fields, flattened next to `exp`.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl TokenClaims {
    /// Identity record carried by these claims, without `exp`.
    pub fn identity(&self) -> IdentityRecord {
        let mut fields = self.fields.clone();
        fields.remove(EXPIRY_CLAIM);
        IdentityRecord(fields)
    }

    /// Whether the claims have expired at `now` (unix seconds).
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}

/// Outcome of an authentication attempt.
///
/// `Rejected` is an expected result (bad password, unknown OAuth identity) and
/// maps to 401; hard failures travel as `Err(AuthError)` instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Authentication {
    Verified(IdentityRecord),
    Rejected { reason: String },
}

impl Authentication {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

/// Tokens handed back by an OAuth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Result of an OAuth exchange: the grant plus the provider's raw profile.
#[derive(Debug, Clone, PartialEq)]
pub struct OAuthProfile {
    pub grant: OAuthGrant,
    pub profile: Value,
}

impl OAuthProfile {
    pub fn email(&self) -> Option<&str> {
        self.profile.get("email").and_then(Value::as_str)
    }
}
