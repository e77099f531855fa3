//! Web surface.
//!
//! The demo application and the hyper server that hosts it.

pub mod app;
pub mod server;

pub use app::route;
pub use server::serve;
