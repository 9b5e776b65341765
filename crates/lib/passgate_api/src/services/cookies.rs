//! Cookie service — set/clear the httpOnly session cookie.

use axum::http::{HeaderMap, header::SET_COOKIE};
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Cookie name for the session token.
pub const TOKEN_COOKIE: &str = "token";

/// Build a httpOnly cookie carrying the session token.
pub fn token_cookie(token: &str, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE.to_string(), token.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::seconds(max_age_secs))
        .build()
}

/// Build an expired cookie to clear the session token client-side.
pub fn clear_token_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE.to_string(), String::new()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::ZERO)
        .build()
}

/// Whether a response already sets (or clears) the session cookie.
pub fn sets_token_cookie(headers: &HeaderMap) -> bool {
    let prefix = format!("{TOKEN_COOKIE}=");
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&prefix))
}
