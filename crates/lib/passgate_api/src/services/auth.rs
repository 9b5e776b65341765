//! Sign-in service — turns an authentication outcome into a signed token.

use passgate_core::auth::directory::INVALID_CREDENTIALS;
use passgate_core::auth::provider::{Provider, ProviderConfig};
use passgate_core::models::auth::Authentication;
use tracing::{debug, info};

use crate::AppState;
use crate::error::{AppError, AppResult};

/// Local sign-in with email and password. Missing credentials are rejected
/// the same way as wrong ones.
pub async fn local_sign_in(state: &AppState, email: &str, password: &str) -> AppResult<String> {
    if email.is_empty() || password.is_empty() {
        debug!("local sign-in without credentials");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }
    let outcome = state.directory.authenticate(email, password).await?;
    let token = token_for(state, outcome)?;
    info!(email, "local sign-in succeeded");
    Ok(token)
}

/// Complete an OAuth callback: exchange the code, map the profile onto a user,
/// sign a token.
pub async fn oauth_sign_in(
    state: &AppState,
    provider: Provider,
    config: &ProviderConfig,
    code: &str,
) -> AppResult<String> {
    let profile = state.exchange.exchange(provider, config, code).await?;
    debug!(%provider, profile = %profile.profile, "received OAuth profile");
    let outcome = state.directory.authenticate_oauth(provider, &profile).await?;
    let token = token_for(state, outcome)?;
    info!(%provider, "OAuth sign-in succeeded");
    Ok(token)
}

fn token_for(state: &AppState, outcome: Authentication) -> AppResult<String> {
    match outcome {
        Authentication::Verified(identity) => Ok(state.issuer.issue(&identity)?),
        Authentication::Rejected { reason } => Err(AppError::Unauthorized(reason)),
    }
}
