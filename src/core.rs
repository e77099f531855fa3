//! Core system components.
//!
//! Contains the session middleware and its request handling infrastructure.

pub mod middleware;
