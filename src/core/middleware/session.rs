//! Session handle and cookie plumbing.
//!
//! The `Session` handle is placed in request extensions so handlers can read
//! and mutate the decoded session. The helpers below read the session cookie
//! from `Cookie` headers and build the matching `Set-Cookie` value.

use super::codec::SessionData;
use crate::config::{CookieConfiguration, Result, SessionError};
use http::HeaderMap;
use http::header::COOKIE;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared handle to the session of the current request.
#[derive(Debug, Clone, Default)]
pub struct Session {
    data: Arc<Mutex<SessionData>>,
}

impl Session {
    #[must_use]
    pub fn new(data: SessionData) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the value under `key` deserialized as `T`.
    ///
    /// Yields `None` both when the key is absent and when the stored value
    /// does not deserialize as `T`.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.lock().get(key).cloned()?;
        serde_json::from_value(value).ok()
    }

    #[must_use]
    pub fn get_value(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// Stores `value` under `key`, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Codec` if `value` cannot be converted to JSON.
    pub fn insert<T: Serialize>(&self, key: impl Into<String>, value: T) -> Result<Option<Value>> {
        let value = serde_json::to_value(value).map_err(|e| SessionError::Codec(e.to_string()))?;
        Ok(self.lock().insert(key.into(), value))
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.lock().remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> SessionData {
        self.lock().clone()
    }

    /// Replaces the whole session, returning the old contents.
    pub fn replace(&self, data: SessionData) -> SessionData {
        std::mem::replace(&mut *self.lock(), data)
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Extracts the value of cookie `name` from all `Cookie` headers.
///
/// When the name occurs more than once the last occurrence wins. Headers are
/// decoded lossily, so a non-ASCII byte only spoils the chunk it sits in.
#[must_use]
pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let mut found = None;
    for header in headers.get_all(COOKIE) {
        let cookies = String::from_utf8_lossy(header.as_bytes());
        for chunk in cookies.split(';') {
            let (key, value) = chunk.split_once('=').unwrap_or(("", chunk));
            if key.trim() == name {
                found = Some(unquote(value.trim()).to_string());
            }
        }
    }
    found
}

/// Builds the `Set-Cookie` header value for the session cookie.
#[must_use]
pub fn format_set_cookie(config: &CookieConfiguration, value: &str) -> String {
    let http_only_flag = if config.http_only { "; HttpOnly" } else { "" };
    let secure_flag = if config.secure { "; Secure" } else { "" };
    let domain = config
        .domain
        .as_deref()
        .map(|d| format!("; Domain={d}"))
        .unwrap_or_default();
    format!(
        "{}={value}{http_only_flag}{secure_flag}; SameSite={}; Path={}{domain}; Max-Age={}",
        config.name, config.same_site, config.path, config.max_age
    )
}
