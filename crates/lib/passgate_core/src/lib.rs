//! # passgate_core
//!
//! Core domain logic for Passgate: the identity model, the credential issuer
//! and the authentication capabilities it is fed by.

pub mod auth;
pub mod models;
