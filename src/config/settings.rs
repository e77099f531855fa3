//! Configuration settings.
//!
//! Defines the `CookieConfiguration` attached to every session cookie and the
//! `Settings` struct loaded from environment variables.

use super::error::{Result, SessionError};
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

/// Duration in whole seconds.
pub type Seconds = u64;

/// `SameSite` attribute of the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl FromStr for SameSite {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lax" => Ok(Self::Lax),
            "none" => Ok(Self::None),
            other => Err(SessionError::Config(format!(
                "same_site must be one of strict, lax, none (got {other:?})"
            ))),
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        };
        f.write_str(s)
    }
}

/// Attributes of the session cookie.
///
/// `max_age` also bounds the age of the token inside the cookie: tokens older
/// than `max_age` seconds are rejected even if the browser still sends them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieConfiguration {
    /// Cookie name.
    pub name: String,
    /// Cookie lifetime and token TTL.
    pub max_age: Seconds,
    /// `SameSite` attribute.
    pub same_site: SameSite,
    /// Optional `Domain` attribute.
    pub domain: Option<String>,
    /// `Path` attribute.
    pub path: String,
    /// Whether to set `HttpOnly`.
    pub http_only: bool,
    /// Whether to set `Secure`.
    pub secure: bool,
}

impl Default for CookieConfiguration {
    fn default() -> Self {
        Self {
            name: "session".to_string(),
            max_age: 24 * 60 * 60,
            same_site: SameSite::Lax,
            domain: None,
            path: "/".to_string(),
            http_only: true,
            secure: false,
        }
    }
}

impl CookieConfiguration {
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub const fn with_max_age(mut self, max_age: Seconds) -> Self {
        self.max_age = max_age;
        self
    }

    #[must_use]
    pub const fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub const fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    #[must_use]
    pub const fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }
}

fn get_env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn get_env_or(key: &str, default: &str) -> String {
    get_env_opt(key).unwrap_or_else(|| default.to_string())
}

fn get_env_bool_or(key: &str, default: bool) -> Result<bool> {
    let Some(value) = get_env_opt(key) else {
        return Ok(default);
    };
    match value.to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(SessionError::Config(format!(
            "{key} must be a boolean (got {value:?})"
        ))),
    }
}

fn get_env_parsed_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    get_env_opt(key).map_or(Ok(default), |value| {
        value
            .parse()
            .map_err(|_| SessionError::Config(format!("{key} has an invalid value: {value:?}")))
    })
}

/// Server configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Address the demo server listens on.
    pub listen_addr: SocketAddr,
    /// Fernet key used to encrypt session cookies. A fresh key is generated
    /// at startup when unset.
    pub session_secret: Option<String>,
    /// Session cookie attributes.
    pub cookie: CookieConfiguration,
    /// Maximum number of connections served at once.
    pub concurrency_limit: usize,
    /// Logging format: "json" or "pretty".
    pub log_format: String,
}

impl Settings {
    /// Loads configuration from environment variables.
    ///
    /// Recognised variables: `LISTEN_ADDR`, `SESSION_SECRET`,
    /// `SESSION_COOKIE_NAME`, `SESSION_MAX_AGE`, `SESSION_SAME_SITE`,
    /// `SESSION_DOMAIN`, `SESSION_PATH`, `SESSION_HTTP_ONLY`,
    /// `SESSION_SECURE`, `CONCURRENCY_LIMIT` and `LOG_FORMAT`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Config` if a variable is set to a value that
    /// cannot be parsed.
    pub fn from_env() -> Result<Arc<Self>> {
        let defaults = CookieConfiguration::default();

        let listen_addr: SocketAddr = get_env_or("LISTEN_ADDR", "127.0.0.1:8000")
            .parse()
            .map_err(|_| {
                SessionError::Config("LISTEN_ADDR must be a valid socket address".into())
            })?;
        let same_site = get_env_opt("SESSION_SAME_SITE")
            .map_or(Ok(defaults.same_site), |s| s.parse())?;

        let cookie = CookieConfiguration {
            name: get_env_or("SESSION_COOKIE_NAME", &defaults.name),
            max_age: get_env_parsed_or("SESSION_MAX_AGE", defaults.max_age)?,
            same_site,
            domain: get_env_opt("SESSION_DOMAIN"),
            path: get_env_or("SESSION_PATH", &defaults.path),
            http_only: get_env_bool_or("SESSION_HTTP_ONLY", defaults.http_only)?,
            secure: get_env_bool_or("SESSION_SECURE", defaults.secure)?,
        };

        Ok(Arc::new(Self {
            listen_addr,
            session_secret: get_env_opt("SESSION_SECRET"),
            cookie,
            concurrency_limit: get_env_parsed_or("CONCURRENCY_LIMIT", 1024)?,
            log_format: get_env_or("LOG_FORMAT", "json"),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const SESSION_VARS: [&str; 11] = [
        "LISTEN_ADDR",
        "SESSION_SECRET",
        "SESSION_COOKIE_NAME",
        "SESSION_MAX_AGE",
        "SESSION_SAME_SITE",
        "SESSION_DOMAIN",
        "SESSION_PATH",
        "SESSION_HTTP_ONLY",
        "SESSION_SECURE",
        "CONCURRENCY_LIMIT",
        "LOG_FORMAT",
    ];

    fn clear_session_vars() {
        for key in SESSION_VARS {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    #[test]
    fn test_same_site_parsing() {
        assert_eq!("strict".parse::<SameSite>().unwrap(), SameSite::Strict);
        assert_eq!("LAX".parse::<SameSite>().unwrap(), SameSite::Lax);
        assert_eq!("None".parse::<SameSite>().unwrap(), SameSite::None);
        assert!("sometimes".parse::<SameSite>().is_err());
    }

    #[test]
    fn test_same_site_display() {
        assert_eq!(SameSite::Strict.to_string(), "Strict");
        assert_eq!(SameSite::Lax.to_string(), "Lax");
        assert_eq!(SameSite::None.to_string(), "None");
    }

    #[test]
    fn test_cookie_configuration_defaults() {
        let config = CookieConfiguration::default();
        assert_eq!(config.name, "session");
        assert_eq!(config.max_age, 86_400);
        assert_eq!(config.same_site, SameSite::Lax);
        assert_eq!(config.domain, None);
        assert_eq!(config.path, "/");
        assert!(config.http_only);
        assert!(!config.secure);
    }

    #[test]
    fn test_cookie_configuration_builders() {
        let config = CookieConfiguration::default()
            .with_name("sid")
            .with_max_age(60)
            .with_same_site(SameSite::Strict)
            .with_domain("example.com")
            .with_path("/app")
            .with_http_only(false)
            .with_secure(true);

        assert_eq!(config.name, "sid");
        assert_eq!(config.max_age, 60);
        assert_eq!(config.same_site, SameSite::Strict);
        assert_eq!(config.domain.as_deref(), Some("example.com"));
        assert_eq!(config.path, "/app");
        assert!(!config.http_only);
        assert!(config.secure);
    }

    #[test]
    fn test_helpers_defaults() {
        let _guard = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        unsafe {
            env::remove_var("TEST_MISSING_VAR");
        }
        assert_eq!(get_env_or("TEST_MISSING_VAR", "default"), "default");
        assert_eq!(get_env_opt("TEST_MISSING_VAR"), None);
        assert!(get_env_bool_or("TEST_MISSING_VAR", true).unwrap());
        assert_eq!(get_env_parsed_or("TEST_MISSING_VAR", 7u64).unwrap(), 7);
    }

    #[test]
    fn test_helpers_parsing() {
        let _guard = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        unsafe {
            env::set_var("TEST_S1", "123");
            assert_eq!(get_env_parsed_or("TEST_S1", 0u64).unwrap(), 123);

            env::set_var("TEST_S2", "abc");
            assert!(get_env_parsed_or("TEST_S2", 0u64).is_err());

            env::set_var("TEST_S3", "TRUE");
            assert!(get_env_bool_or("TEST_S3", false).unwrap());

            env::set_var("TEST_S3", "0");
            assert!(!get_env_bool_or("TEST_S3", true).unwrap());

            env::set_var("TEST_S3", "maybe");
            assert!(get_env_bool_or("TEST_S3", true).is_err());

            env::set_var("TEST_S4", "");
            assert_eq!(get_env_opt("TEST_S4"), None);
        }
    }

    #[test]
    fn test_settings_from_env_defaults() {
        let _guard = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        clear_session_vars();

        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.listen_addr.port(), 8000);
        assert_eq!(settings.session_secret, None);
        assert_eq!(settings.cookie, CookieConfiguration::default());
        assert_eq!(settings.concurrency_limit, 1024);
        assert_eq!(settings.log_format, "json");
    }

    #[test]
    fn test_settings_from_env_overrides() {
        let _guard = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        clear_session_vars();
        unsafe {
            env::set_var("LISTEN_ADDR", "0.0.0.0:9090");
            env::set_var("SESSION_SECRET", "k");
            env::set_var("SESSION_COOKIE_NAME", "sid");
            env::set_var("SESSION_MAX_AGE", "120");
            env::set_var("SESSION_SAME_SITE", "strict");
            env::set_var("SESSION_DOMAIN", "example.org");
            env::set_var("SESSION_PATH", "/api");
            env::set_var("SESSION_HTTP_ONLY", "false");
            env::set_var("SESSION_SECURE", "1");
            env::set_var("CONCURRENCY_LIMIT", "8");
            env::set_var("LOG_FORMAT", "pretty");
        }

        let settings = Settings::from_env().unwrap();
        clear_session_vars();

        assert_eq!(settings.listen_addr.port(), 9090);
        assert_eq!(settings.session_secret.as_deref(), Some("k"));
        assert_eq!(settings.cookie.name, "sid");
        assert_eq!(settings.cookie.max_age, 120);
        assert_eq!(settings.cookie.same_site, SameSite::Strict);
        assert_eq!(settings.cookie.domain.as_deref(), Some("example.org"));
        assert_eq!(settings.cookie.path, "/api");
        assert!(!settings.cookie.http_only);
        assert!(settings.cookie.secure);
        assert_eq!(settings.concurrency_limit, 8);
        assert_eq!(settings.log_format, "pretty");
    }

    #[test]
    fn test_settings_from_env_rejects_invalid_values() {
        let _guard = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        clear_session_vars();

        unsafe {
            env::set_var("SESSION_SAME_SITE", "sometimes");
        }
        assert!(matches!(
            Settings::from_env(),
            Err(SessionError::Config(_))
        ));

        clear_session_vars();
        unsafe {
            env::set_var("LISTEN_ADDR", "not-an-address");
        }
        assert!(matches!(
            Settings::from_env(),
            Err(SessionError::Config(_))
        ));
        clear_session_vars();
    }
}
