//! Route paths.

pub const POST_AUTH_LOCAL: &str = "/auth/local";
pub const AUTH_LOGOUT: &str = "/auth/logout";
pub const GET_AUTH_ME: &str = "/auth/me";
pub const GET_AUTH_PROVIDER: &str = "/auth/{provider}";
pub const GET_AUTH_PROVIDER_CALLBACK: &str = "/auth/{provider}/callback";

/// Where a successful OAuth sign-in lands.
pub const POST_SIGN_IN_REDIRECT: &str = "/";
