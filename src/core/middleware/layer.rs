//! Session middleware.
//!
//! Loads the session from the request cookie before the inner service runs
//! and writes it back as a fresh Fernet token on every response.

use super::codec::{JsonCodec, SessionCodec, SessionData};
use super::session::{Session, format_set_cookie, parse_cookie};
use crate::config::{CookieConfiguration, Result};
use crate::security::crypto::Fernet;
use http::header::SET_COOKIE;
use http::{HeaderMap, HeaderValue, Request, Response};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{debug, error};

/// Encrypts, signs and decodes the session cookie.
pub struct SessionMiddleware {
    cookie: CookieConfiguration,
    default_value: SessionData,
    codec: Arc<dyn SessionCodec>,
    fernet: Fernet,
}

impl fmt::Debug for SessionMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionMiddleware")
            .field("cookie", &self.cookie)
            .field("default_value", &self.default_value)
            .finish_non_exhaustive()
    }
}

impl SessionMiddleware {
    /// Creates a middleware using `secret_key` (a Fernet key) and the JSON codec.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidKey` if `secret_key` is not a valid Fernet key.
    pub fn new(secret_key: &str, cookie: CookieConfiguration) -> Result<Self> {
        Ok(Self {
            cookie,
            default_value: SessionData::new(),
            codec: Arc::new(JsonCodec),
            fernet: Fernet::new(secret_key)?,
        })
    }

    /// Session used when the request carries no valid session cookie.
    #[must_use]
    pub fn with_default_value(mut self, default_value: SessionData) -> Self {
        self.default_value = default_value;
        self
    }

    #[must_use]
    pub fn with_codec(mut self, codec: impl SessionCodec + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    #[must_use]
    pub const fn cookie(&self) -> &CookieConfiguration {
        &self.cookie
    }

    /// Decodes the session carried by the request headers.
    ///
    /// Falls back to a copy of the default value when the cookie is missing,
    /// expired, tampered with or undecodable.
    #[must_use]
    pub fn load(&self, headers: &HeaderMap) -> SessionData {
        let Some(token) = parse_cookie(headers, &self.cookie.name) else {
            return self.default_value.clone();
        };

        let decoded = self
            .fernet
            .decrypt(&token, Some(self.cookie.max_age))
            .and_then(|plaintext| self.codec.decode(&plaintext));

        match decoded {
            Ok(data) => data,
            Err(e) => {
                debug!(cookie = %self.cookie.name, error = %e, "Rejected session cookie");
                self.default_value.clone()
            }
        }
    }

    /// Encodes and encrypts the session into a cookie value.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Codec` if the codec cannot encode `data`.
    pub fn dump(&self, data: &SessionData) -> Result<String> {
        let plaintext = self.codec.encode(data)?;
        Ok(self.fernet.encrypt(&plaintext))
    }

    /// Builds the complete `Set-Cookie` header for `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the cookie is not a valid header value.
    pub fn set_cookie_header(&self, data: &SessionData) -> Result<HeaderValue> {
        let token = self.dump(data)?;
        let cookie = format_set_cookie(&self.cookie, &token);
        Ok(HeaderValue::from_str(&cookie)?)
    }

    /// Appends the session cookie to a response. Failures are logged and the
    /// response is left without a session cookie.
    pub fn store(&self, session: &Session, headers: &mut HeaderMap) {
        match self.set_cookie_header(&session.snapshot()) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(e) => error!(cookie = %self.cookie.name, error = %e, "Failed to store session"),
        }
    }
}

/// `tower` layer wrapping services with [`SessionService`].
#[derive(Debug, Clone)]
pub struct SessionLayer {
    middleware: Arc<SessionMiddleware>,
}

impl SessionLayer {
    #[must_use]
    pub fn new(middleware: SessionMiddleware) -> Self {
        Self {
            middleware: Arc::new(middleware),
        }
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionService {
            inner,
            middleware: Arc::clone(&self.middleware),
        }
    }
}

/// Service inserting a [`Session`] into request extensions and persisting it
/// into the response cookie.
#[derive(Debug, Clone)]
pub struct SessionService<S> {
    inner: S,
    middleware: Arc<SessionMiddleware>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for SessionService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future =
        Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let session = Session::new(self.middleware.load(req.headers()));
        req.extensions_mut().insert(session.clone());

        let middleware = Arc::clone(&self.middleware);
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let mut res = inner.call(req).await?;
            middleware.store(&session, res.headers_mut());
            Ok(res)
        })
    }
}
