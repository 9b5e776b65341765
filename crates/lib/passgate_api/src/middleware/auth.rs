//! Authentication middleware — token extraction and JWT verification.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use passgate_core::models::auth::TokenClaims;
use tracing::debug;

use crate::AppState;
use crate::error::AppError;
use crate::services::cookies::TOKEN_COOKIE;

/// Key used to store verified `TokenClaims` in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub TokenClaims);

/// Axum middleware: reads the token from `Authorization: Bearer <token>` or the
/// `token` cookie, verifies it and injects `AuthenticatedUser` into request
/// extensions. Never rejects; a missing or invalid token just leaves the
/// request unauthenticated.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_token(request.headers()) {
        match state.issuer.verify(&token) {
            Ok(claims) => {
                request.extensions_mut().insert(AuthenticatedUser(claims));
            }
            Err(e) => debug!("ignoring unusable token: {e}"),
        }
    }
    next.run(request).await
}

/// Axum middleware: 401 unless `authenticate` attached a user.
pub async fn require_auth(request: Request, next: Next) -> Result<Response, AppError> {
    if request.extensions().get::<AuthenticatedUser>().is_none() {
        return Err(AppError::Unauthorized("Missing or invalid token".into()));
    }
    Ok(next.run(request).await)
}

fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);
    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    })
}
