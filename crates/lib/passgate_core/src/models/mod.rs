//! Domain models shared by the issuer, the directory and the HTTP layer.

pub mod auth;
