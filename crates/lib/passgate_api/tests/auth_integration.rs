//! Integration test — build the router over an in-memory directory and drive the
//! sign-in, sliding refresh and logout flows end to end.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use axum_extra::extract::cookie::Cookie;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use passgate_api::{AppState, config::ApiConfig};
use passgate_core::auth::AuthError;
use passgate_core::auth::directory::{InMemoryDirectory, ProfileExchange};
use passgate_core::auth::provider::{Provider, ProviderConfig, ProviderRegistry};
use passgate_core::models::auth::{IdentityRecord, OAuthGrant, OAuthProfile};
use serde_json::{Map, Value, json};
use tower::ServiceExt;

const SECRET: &str = "integration-secret";
const TTL: i64 = 1800;

/// Exchange stub keyed by the authorization code.
struct FakeExchange;

#[async_trait]
impl ProfileExchange for FakeExchange {
    async fn exchange(
        &self,
        _provider: Provider,
        _config: &ProviderConfig,
        code: &str,
    ) -> Result<OAuthProfile, AuthError> {
        let email = match code {
            "known" => "ada@example.com",
            "stranger" => "nobody@example.com",
            _ => return Err(AuthError::Provider("token endpoint unreachable".into())),
        };
        Ok(OAuthProfile {
            grant: OAuthGrant {
                access_token: "at".into(),
                refresh_token: Some("rt".into()),
            },
            profile: json!({"id": "g-1", "email": email}),
        })
    }
}

fn app() -> Router {
    let hash = bcrypt::hash("correct horse", 4).expect("bcrypt hash");
    let directory = InMemoryDirectory::from_records([IdentityRecord::new()
        .with("_id", "u-1")
        .with("email", "ada@example.com")
        .with("roles", json!(["admin"]))
        .with("hash", hash)
        .with("salt", "legacy-salt")])
    .expect("directory");

    let mut providers = ProviderRegistry::new();
    providers.register(
        Provider::Google,
        ProviderConfig::with_defaults(
            Provider::Google,
            "g-id",
            "g-secret",
            "http://localhost:7000/auth/google/callback",
        )
        .expect("google config"),
    );

    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        jwt_secret: SECRET.into(),
        token_ttl_secs: TTL,
        cookie_secure: false,
        users_file: None,
    };
    let state = AppState::new(config, providers, Arc::new(directory), Arc::new(FakeExchange))
        .expect("app state");
    passgate_api::router(state)
}

fn claims_of(token: &str) -> Map<String, Value> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    decode::<Map<String, Value>>(token, &DecodingKey::from_secret(SECRET.as_bytes()), &validation)
        .expect("decode token")
        .claims
}

fn mint(exp: i64) -> String {
    encode(
        &Header::default(),
        &json!({"email": "ada@example.com", "roles": ["admin"], "exp": exp}),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("encode token")
}

fn token_cookie(resp: &Response) -> Option<Cookie<'static>> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| Cookie::parse(v.to_string()).ok())
        .find(|c| c.name() == "token")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_cookie(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap()
}

fn login(email: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/auth/local")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"email": email, "password": password}).to_string(),
        ))
        .unwrap()
}

async fn body_text(resp: Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

async fn body_json(resp: Response) -> Value {
    serde_json::from_str(&body_text(resp).await).expect("parse JSON")
}

fn assert_near(actual: i64, expected: i64) {
    assert!(
        (actual - expected).abs() <= 5,
        "exp {actual} not within 5s of {expected}"
    );
}

#[tokio::test]
async fn local_sign_in_returns_token_without_secrets() {
    let resp = app()
        .oneshot(login("ada@example.com", "correct horse"))
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::OK);

    let token = body_text(resp).await;
    let claims = claims_of(&token);

    assert!(!claims.contains_key("salt"), "salt leaked: {claims:?}");
    assert!(!claims.contains_key("hash"), "hash leaked: {claims:?}");
    assert_eq!(claims["email"], "ada@example.com");
    assert_eq!(claims["_id"], "u-1");
    assert_eq!(claims["roles"], json!(["admin"]));
    assert_near(claims["exp"].as_i64().unwrap(), Utc::now().timestamp() + TTL);
}

#[tokio::test]
async fn local_sign_in_with_wrong_password_is_401() {
    let resp = app()
        .oneshot(login("ada@example.com", "battery staple"))
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(resp).await;
    assert_eq!(json["error"], "unauthorized");
    assert_eq!(json["message"], "Invalid credentials.");
}

#[tokio::test]
async fn local_sign_in_with_empty_fields_is_401() {
    let resp = app().oneshot(login("", "")).await.expect("request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(resp).await;
    assert_eq!(json["message"], "Invalid credentials.");
}

#[tokio::test]
async fn local_sign_in_with_missing_or_unreadable_body_is_401() {
    for body in [r#"{"email": "ada@example.com"}"#, "{}", "not json"] {
        let req = Request::builder()
            .method("POST")
            .uri("/auth/local")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let resp = app().oneshot(req).await.expect("request");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "body: {body}");

        let json = body_json(resp).await;
        assert_eq!(json["error"], "unauthorized");
        assert_eq!(json["message"], "Invalid credentials.");
    }
}

#[tokio::test]
async fn oauth_without_code_redirects_to_consent_page() {
    let resp = app().oneshot(get("/auth/google")).await.expect("request");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let location = resp.headers()[header::LOCATION].to_str().unwrap();
    assert!(
        location.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"),
        "unexpected location: {location}"
    );
    assert!(location.contains("client_id=g-id"));
    assert!(location.contains("response_type=code"));
    assert!(token_cookie(&resp).is_none());
}

#[tokio::test]
async fn oauth_callback_sets_cookie_and_redirects_home() {
    let resp = app()
        .oneshot(get("/auth/google/callback?code=known"))
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/");

    let cookie = token_cookie(&resp).expect("token cookie");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.path(), Some("/"));

    let claims = claims_of(cookie.value());
    assert_eq!(claims["email"], "ada@example.com");
    assert!(!claims.contains_key("hash"));
    assert!(!claims.contains_key("salt"));
}

#[tokio::test]
async fn oauth_profile_without_user_is_401() {
    let resp = app()
        .oneshot(get("/auth/google/callback?code=stranger"))
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(token_cookie(&resp).is_none());

    let json = body_json(resp).await;
    assert_eq!(json["message"], "User record not found.");
}

#[tokio::test]
async fn oauth_denied_by_provider_is_401() {
    let resp = app()
        .oneshot(get("/auth/google/callback?error=access_denied"))
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn oauth_provider_failure_surfaces_as_502() {
    let resp = app()
        .oneshot(get("/auth/google/callback?code=boom"))
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let json = body_json(resp).await;
    assert_eq!(json["error"], "bad_gateway");
}

#[tokio::test]
async fn unknown_or_unconfigured_provider_is_404() {
    for uri in ["/auth/github", "/auth/twitter", "/auth/local/callback"] {
        let resp = app().oneshot(get(uri)).await.expect("request");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn sliding_refresh_extends_token_about_to_expire() {
    let now = Utc::now().timestamp();
    let token = mint(now + 10);

    let resp = app()
        .oneshot(get_with_cookie("/auth/me", &token))
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = token_cookie(&resp).expect("refreshed cookie");
    let refreshed = claims_of(cookie.value());
    let refreshed_exp = refreshed["exp"].as_i64().unwrap();
    assert!(refreshed_exp > now + 10);
    assert_near(refreshed_exp, now + TTL);
    assert_eq!(refreshed["email"], "ada@example.com");
    assert_eq!(refreshed["roles"], json!(["admin"]));
    assert_eq!(refreshed.len(), 3, "unexpected claims: {refreshed:?}");

    // The handler saw the request's own claims, not the refreshed ones.
    let me = body_json(resp).await;
    assert_eq!(me["exp"], now + 10);
}

#[tokio::test]
async fn sliding_refresh_applies_to_bearer_tokens() {
    let token = mint(Utc::now().timestamp() + 60);
    let req = Request::builder()
        .uri("/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let resp = app().oneshot(req).await.expect("request");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(token_cookie(&resp).is_some());
}

#[tokio::test]
async fn expired_token_is_not_refreshed() {
    let token = mint(Utc::now().timestamp() - 120);

    let resp = app()
        .oneshot(get_with_cookie("/auth/me", &token))
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(token_cookie(&resp).is_none());
}

#[tokio::test]
async fn unauthenticated_request_gets_no_cookie() {
    let resp = app().oneshot(get("/auth/me")).await.expect("request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(token_cookie(&resp).is_none());
}

#[tokio::test]
async fn logout_clears_cookie_but_token_stays_valid() {
    let token = mint(Utc::now().timestamp() + 600);

    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .header(header::COOKIE, format!("token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::OK);

    // Only the clearing cookie is sent; the sliding refresh stays out of it.
    let cookies: Vec<_> = resp.headers().get_all(header::SET_COOKIE).iter().collect();
    assert_eq!(cookies.len(), 1);
    let cleared = token_cookie(&resp).expect("cleared cookie");
    assert_eq!(cleared.value(), "");
    assert_eq!(cleared.max_age().map(|d| d.whole_seconds()), Some(0));

    // No revocation list: the old token keeps working until it expires.
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/auth/me")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::OK);
}
