//! Middleware components.
//!
//! Includes the encrypted cookie session layer, the session handle and the
//! payload codecs.

mod codec;
mod layer;
mod session;

pub use codec::{JsonCodec, SessionCodec, SessionData};
pub use layer::{SessionLayer, SessionMiddleware, SessionService};
pub use session::{Session, format_set_cookie, parse_cookie};
