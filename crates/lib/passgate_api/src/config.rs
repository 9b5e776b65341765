//! API server configuration.
//!
//! Filled in by the server binary from its CLI arguments, which fall back to
//! these environment variables:
//!
//! | Variable                     | Default                        |
//! |------------------------------|--------------------------------|
//! | `BIND_ADDR`                  | `127.0.0.1:7000`               |
//! | `JWT_SECRET` / `AUTH_SECRET` | generated & persisted to file  |
//! | `TOKEN_TTL_SECS`             | `1800`                         |
//! | `COOKIE_SECURE`              | `false`                        |
//! | `USERS_FILE`                 | none                           |

use std::path::PathBuf;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:7000").
    pub bind_addr: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub token_ttl_secs: i64,
    /// Mark the `token` cookie `Secure`.
    pub cookie_secure: bool,
    /// JSON file with the local user records.
    pub users_file: Option<PathBuf>,
}
