//! Strand Middleware Router
//!
//! An ordered list of `(path prefix, handler)` layers. Dispatch walks the
//! layers in registration order, handing each matching handler a `Next`
//! continuation:
//!
//! ```text
//! handle(req, res, done)
//!     → layer 0 matches? → handler(req, res, next)
//!                              next(None)      → layer 1 ...
//!                              next(Some(err)) → done(Some(err))
//!     → no layers left   → done(None)
//! ```

mod error;
mod handler;
mod matcher;
mod router;

pub use error::MiddlewareError;
pub use handler::{BaseUrl, Handler, Next, Routable, Shared};
pub use matcher::PathPrefixMatcher;
pub use router::{Layer, Router, RouterOptions};

/// Wrap a value for sharing across a dispatch chain.
pub fn shared<T>(value: T) -> Shared<T> {
    std::sync::Arc::new(parking_lot::Mutex::new(value))
}
