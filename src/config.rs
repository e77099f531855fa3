//! Configuration management.
//!
//! Cookie attributes for the session cookie, plus the server settings loaded
//! from environment variables using dotenvy.

mod error;
mod settings;

pub use error::{Result, SessionError};
pub use settings::{CookieConfiguration, SameSite, Seconds, Settings};
