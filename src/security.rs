//! Security modules.
//!
//! Provides the cryptographic primitives behind the session cookie.

pub mod crypto;
