//! Strand Core
//!
//! Runs a middleware pipeline inside the page: navigations become synthetic
//! requests dispatched through a tree of mounted applications, and browser
//! history is kept in step.
//!
//! ```text
//! navigate(url)
//!     → Request/Response factory
//!     → same-host check ── other host → false
//!     → pushState / replaceState
//!     → root router → mounted handlers and sub-applications
//!     → done (default: load the document for real)
//! ```

mod application;
mod config;
mod error;
mod fields;
mod host;
mod middleware;
mod navigation;
mod request;
mod response;
mod settings;

pub use application::{AppRouter, Application, MountListener};
pub use config::Config;
pub use error::CoreError;
pub use fields::collect_fields;
pub use host::{BrowserHost, HostCall, MemoryHost};
pub use middleware::{DynHandler, Middleware};
pub use navigation::{NavigateOptions, Navigation, NavigationPhase};
pub use request::{Request, RequestInit};
pub use response::Response;
pub use settings::Settings;

// Re-export the router surface handlers are written against
pub use strand_router::{shared, BaseUrl, MiddlewareError, Next, Routable, Shared};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
