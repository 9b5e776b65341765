//! Sliding session refresh.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use passgate_core::auth::issuer::Refresh;
use tracing::{debug, warn};

use super::auth::AuthenticatedUser;
use crate::AppState;
use crate::services::cookies::{sets_token_cookie, token_cookie};

/// Axum middleware: while the request's token is unexpired, answer with a
/// freshly signed `token` cookie so the session slides forward.
///
/// Always runs the inner handler. When the handler itself sets or clears the
/// `token` cookie (sign-in, logout) its cookie is kept as-is. Refresh failures
/// are logged and otherwise ignored.
pub async fn sliding_refresh(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let claims = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|user| user.0.clone());

    let response = next.run(request).await;
    if claims.is_none() || sets_token_cookie(response.headers()) {
        return response;
    }

    match state.issuer.refresh(claims.as_ref()) {
        Ok(Refresh::Reissued(token)) => {
            debug!("sliding token expiry");
            let cookie = token_cookie(
                &token,
                state.issuer.ttl().num_seconds(),
                state.config.cookie_secure,
            );
            (CookieJar::new().add(cookie), response).into_response()
        }
        Ok(Refresh::Unchanged) => response,
        Err(e) => {
            warn!("sliding refresh failed: {e}");
            response
        }
    }
}
