//! Test utilities and shared configuration.
//!
//! This module provides common helpers for unit tests, reducing duplication
//! across the codebase.

#[cfg(any(test, feature = "testing"))]
use crate::config::CookieConfiguration;
#[cfg(any(test, feature = "testing"))]
use crate::core::middleware::{SessionData, SessionMiddleware};
#[cfg(any(test, feature = "testing"))]
use crate::security::crypto::Fernet;
#[cfg(any(test, feature = "testing"))]
use http::Response;
#[cfg(any(test, feature = "testing"))]
use http::header::SET_COOKIE;

/// The default session used throughout the tests: `{"value": 0}`.
#[cfg(any(test, feature = "testing"))]
#[must_use]
pub fn value_default() -> SessionData {
    let mut data = SessionData::new();
    data.insert("value".to_string(), serde_json::Value::from(0));
    data
}

/// Creates a middleware for testing purposes.
///
/// This middleware has:
/// - A freshly generated Fernet key
/// - Default cookie attributes (`session`, one day)
/// - `{"value": 0}` as its default session
///
/// # Panics
///
/// Panics if the generated key is rejected, which would be a bug.
#[cfg(any(test, feature = "testing"))]
#[must_use]
pub fn create_test_middleware() -> SessionMiddleware {
    SessionMiddleware::new(&Fernet::generate_key(), CookieConfiguration::default())
        .expect("generated key is valid")
        .with_default_value(value_default())
}

/// Returns the `name=value` pair of the first `Set-Cookie` header, ready to be
/// sent back in a `Cookie` header.
#[cfg(any(test, feature = "testing"))]
#[must_use]
pub fn session_cookie<B>(res: &Response<B>) -> Option<String> {
    let set_cookie = res.headers().get(SET_COOKIE)?.to_str().ok()?;
    set_cookie.split(';').next().map(str::to_string)
}
