//! Strand DOM Interception
//!
//! Turns page events into navigations:
//! - click on `a[href]` → `GET href`
//! - submit on `form[action]` → `POST action` with the serialized fields
//! - `popstate` with a history state → `refresh()`
//!
//! When the application accepts the navigation the event's default action
//! and propagation are suppressed. Events already prevented by an earlier
//! listener are left alone.

mod config;
mod error;
mod event;
mod interceptor;

pub use config::InterceptConfig;
pub use error::DomError;
pub use event::{DomEvent, SyntheticEvent};
pub use interceptor::{CompletionHandler, Interceptor};

pub type Result<T> = std::result::Result<T, DomError>;
