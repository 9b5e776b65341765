//! Process-wide signing secret resolution.

use std::path::{Path, PathBuf};

use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::info;

use super::AuthError;

/// Length of a generated secret.
const GENERATED_SECRET_LEN: usize = 64;

/// Resolve the JWT secret: env var `JWT_SECRET` → `AUTH_SECRET` → persisted file.
pub fn resolve_signing_secret() -> Result<String, AuthError> {
    for var in ["JWT_SECRET", "AUTH_SECRET"] {
        if let Ok(secret) = std::env::var(var)
            && !secret.is_empty()
        {
            return Ok(secret);
        }
    }
    load_or_generate_secret(&secret_path())
}

/// Read the secret persisted at `path`, generating and writing one if the file
/// is missing or blank.
pub fn load_or_generate_secret(path: &Path) -> Result<String, AuthError> {
    if let Ok(existing) = std::fs::read_to_string(path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_SECRET_LEN)
        .map(char::from)
        .collect();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AuthError::Config(format!("create {}: {e}", parent.display())))?;
    }
    std::fs::write(path, &secret)
        .map_err(|e| AuthError::Config(format!("write {}: {e}", path.display())))?;
    info!(path = %path.display(), "generated new JWT secret");
    Ok(secret)
}

/// Path to the persisted JWT secret file.
fn secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("passgate")
        .join("jwt-secret")
}
