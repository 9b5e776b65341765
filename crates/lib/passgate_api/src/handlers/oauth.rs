//! OAuth sign-in handler for Google, GitHub and Salesforce.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use passgate_core::auth::provider::Provider;
use tracing::debug;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::OAuthCallbackParams;
use crate::routes::POST_SIGN_IN_REDIRECT;
use crate::services::auth;
use crate::services::cookies::token_cookie;

/// `GET /auth/{provider}` and `GET /auth/{provider}/callback`.
///
/// Without a `code` the browser is sent to the provider's consent page. With
/// one, the code is exchanged, the profile matched against the directory and
/// the signed token set as the `token` cookie before redirecting to `/`.
pub async fn oauth_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<OAuthCallbackParams>,
    jar: CookieJar,
) -> AppResult<Response> {
    let provider = name
        .parse::<Provider>()
        .ok()
        .filter(|p| *p != Provider::Local)
        .ok_or_else(|| AppError::NotFound(format!("unknown provider '{name}'")))?;
    let config = state
        .providers
        .get(provider)
        .ok_or_else(|| AppError::NotFound(format!("provider '{provider}' is not configured")))?;

    if let Some(error) = params.error {
        debug!(%provider, error = %error, "provider denied sign-in");
        return Err(AppError::Unauthorized(
            params.error_description.unwrap_or(error),
        ));
    }

    let Some(code) = params.code else {
        debug!(%provider, "redirecting to provider consent page");
        return Ok(Redirect::to(config.authorization_url().as_str()).into_response());
    };

    let token = auth::oauth_sign_in(&state, provider, config, &code).await?;
    let cookie = token_cookie(
        &token,
        state.issuer.ttl().num_seconds(),
        state.config.cookie_secure,
    );
    Ok((jar.add(cookie), Redirect::to(POST_SIGN_IN_REDIRECT)).into_response())
}
