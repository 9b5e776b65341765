//! # passgate_api
//!
//! HTTP sign-in API for Passgate.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use passgate_core::auth::AuthError;
use passgate_core::auth::directory::{Directory, ProfileExchange};
use passgate_core::auth::issuer::CredentialIssuer;
use passgate_core::auth::provider::ProviderRegistry;
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{auth, oauth};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    /// Signs, verifies and slides session tokens.
    pub issuer: Arc<CredentialIssuer>,
    /// OAuth providers enabled at startup.
    pub providers: Arc<ProviderRegistry>,
    /// Local and OAuth user lookup.
    pub directory: Arc<dyn Directory>,
    /// OAuth authorization-code exchange.
    pub exchange: Arc<dyn ProfileExchange>,
}

impl AppState {
    /// Build the state, deriving the issuer from the configured secret and
    /// lifetime.
    pub fn new(
        config: ApiConfig,
        providers: ProviderRegistry,
        directory: Arc<dyn Directory>,
        exchange: Arc<dyn ProfileExchange>,
    ) -> Result<Self, AuthError> {
        let ttl = chrono::Duration::try_seconds(config.token_ttl_secs).ok_or_else(|| {
            AuthError::Config(format!("token lifetime {}s is out of range", config.token_ttl_secs))
        })?;
        let issuer = CredentialIssuer::new(config.jwt_secret.as_bytes(), ttl)?;
        Ok(Self {
            config,
            issuer: Arc::new(issuer),
            providers: Arc::new(providers),
            directory,
            exchange,
        })
    }
}

/// Builds the Axum router with all routes and shared state.
///
/// Every request passes through `authenticate` (attach verified claims) and
/// then `sliding_refresh` (slide an unexpired token's expiry).
pub fn router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::POST_AUTH_LOCAL, post(auth::local_handler))
        .route(
            routes::AUTH_LOGOUT,
            get(auth::logout_handler).post(auth::logout_handler),
        )
        .route(routes::GET_AUTH_PROVIDER, get(oauth::oauth_handler))
        .route(routes::GET_AUTH_PROVIDER_CALLBACK, get(oauth::oauth_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route(routes::GET_AUTH_ME, get(auth::me_handler))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::refresh::sliding_refresh,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
