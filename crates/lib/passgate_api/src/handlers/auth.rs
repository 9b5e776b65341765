//! Local sign-in and session request handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{Extensions, StatusCode};
use axum_extra::extract::cookie::CookieJar;
use passgate_core::models::auth::TokenClaims;
use passgate_core::auth::directory::INVALID_CREDENTIALS;
use tracing::{debug, info};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::LoginRequest;
use crate::services::auth;
use crate::services::cookies::clear_token_cookie;

/// `POST /auth/local` — authenticate with email + password; the signed token
/// is the plain-text response body. An unreadable body counts as invalid
/// credentials.
pub async fn local_handler(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<String> {
    let Json(body) = body.map_err(|rejection| {
        debug!(%rejection, "unreadable sign-in body");
        AppError::Unauthorized(INVALID_CREDENTIALS.into())
    })?;
    auth::local_sign_in(&state, &body.email, &body.password).await
}

/// `GET|POST /auth/logout` — clear the `token` cookie.
///
/// There is no server-side revocation: a token copied before logout keeps
/// verifying until its `exp`.
pub async fn logout_handler(
    State(state): State<AppState>,
    extensions: Extensions,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    let email = extensions
        .get::<AuthenticatedUser>()
        .and_then(|user| user.0.identity().email().map(str::to_string));
    info!(email = email.as_deref().unwrap_or("-"), "logout");
    (jar.add(clear_token_cookie(state.config.cookie_secure)), StatusCode::OK)
}

/// `GET /auth/me` — claims of the authenticated request. Requires authentication.
pub async fn me_handler(
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> Json<TokenClaims> {
    Json(user.0)
}
