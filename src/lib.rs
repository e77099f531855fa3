//! Library definitions.
//!
//! Client-side sessions stored as Fernet tokens in a cookie: the session
//! layer, the token primitive, configuration, and a small demo server.

pub mod config;
pub mod core;
pub mod security;
pub mod web;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;
pub use config::{CookieConfiguration, Result, SameSite, SessionError, Settings};
pub use core::middleware::{
    JsonCodec, Session, SessionCodec, SessionData, SessionLayer, SessionMiddleware,
    SessionService, format_set_cookie, parse_cookie,
};
pub use security::crypto::Fernet;
pub use web::{route, serve};
