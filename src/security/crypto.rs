//! Cryptographic utilities.
//!
//! Provides the Fernet token format used to encrypt and sign session cookies.

pub mod fernet;
pub use fernet::Fernet;
