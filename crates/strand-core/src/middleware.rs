//! Arguments accepted by [`Application::use_middleware`]
//!
//! [`Application::use_middleware`]: crate::Application::use_middleware

use std::fmt;
use std::sync::Arc;

use strand_router::{Handler, Next, Shared};

use crate::application::Application;
use crate::error::CoreError;
use crate::request::Request;
use crate::response::Response;
use crate::Result;

pub type DynHandler = Arc<dyn Handler<Request, Response>>;

/// One `use()` argument: a mount path, a handler, a sub-application, or an
/// arbitrarily nested list of those.
#[derive(Clone)]
pub enum Middleware {
    Path(String),
    Handler(DynHandler),
    App(Arc<Application>),
    List(Vec<Middleware>),
}

/// A flattened, registrable argument.
#[derive(Clone)]
pub(crate) enum Mounted {
    Handler(DynHandler),
    App(Arc<Application>),
}

impl Middleware {
    pub fn handler<F>(f: F) -> Self
    where
        F: Fn(Shared<Request>, Shared<Response>, Next) + Send + Sync + 'static,
    {
        Self::Handler(Arc::new(f))
    }

    pub fn list(items: impl IntoIterator<Item = Middleware>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Whether the first leaf, descending into non-empty lists, is a path.
    pub(crate) fn leads_with_path(&self) -> bool {
        match self {
            Self::Path(_) => true,
            Self::List(items) => items.first().map(Self::leads_with_path).unwrap_or(false),
            Self::Handler(_) | Self::App(_) => false,
        }
    }

    pub(crate) fn into_paths(self) -> Result<Vec<String>> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths)?;
        Ok(paths)
    }

    fn collect_paths(self, out: &mut Vec<String>) -> Result<()> {
        match self {
            Self::Path(path) => out.push(path),
            Self::List(items) => {
                for item in items {
                    item.collect_paths(out)?;
                }
            }
            Self::Handler(_) | Self::App(_) => {
                return Err(CoreError::InvalidArgument(
                    "mount paths cannot be mixed with middleware".to_string(),
                ))
            }
        }
        Ok(())
    }

    pub(crate) fn flatten_into(self, out: &mut Vec<Mounted>) -> Result<()> {
        match self {
            Self::Handler(handler) => out.push(Mounted::Handler(handler)),
            Self::App(app) => out.push(Mounted::App(app)),
            Self::List(items) => {
                for item in items {
                    item.flatten_into(out)?;
                }
            }
            Self::Path(path) => {
                return Err(CoreError::InvalidArgument(format!(
                    "expected middleware, got path {:?}",
                    path
                )))
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Handler(_) => f.write_str("Handler"),
            Self::App(app) => f.debug_tuple("App").field(&app.id()).finish(),
            Self::List(items) => f.debug_list().entries(items).finish(),
        }
    }
}

impl From<&str> for Middleware {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for Middleware {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl From<Arc<Application>> for Middleware {
    fn from(app: Arc<Application>) -> Self {
        Self::App(app)
    }
}

impl From<&Arc<Application>> for Middleware {
    fn from(app: &Arc<Application>) -> Self {
        Self::App(Arc::clone(app))
    }
}

impl From<DynHandler> for Middleware {
    fn from(handler: DynHandler) -> Self {
        Self::Handler(handler)
    }
}

impl From<Vec<Middleware>> for Middleware {
    fn from(items: Vec<Middleware>) -> Self {
        Self::List(items)
    }
}

/// Parses the request URL's query string into `Request::query`.
pub(crate) fn query() -> DynHandler {
    Arc::new(|req: Shared<Request>, _res: Shared<Response>, next: Next| {
        req.lock().parse_query();
        next(None);
    })
}

/// Marks the request and response as owned by `app` while it dispatches.
pub(crate) fn init(app: std::sync::Weak<Application>) -> DynHandler {
    Arc::new(move |req: Shared<Request>, res: Shared<Response>, next: Next| {
        req.lock().owner_slot().set(app.clone());
        res.lock().owner_slot().set(app.clone());
        next(None);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Middleware {
        Middleware::handler(|_req, _res, next: Next| next(None))
    }

    #[test]
    fn test_leading_path_detection() {
        assert!(Middleware::from("/admin").leads_with_path());
        assert!(Middleware::list(vec![Middleware::list(vec![Middleware::from("/a")])]).leads_with_path());
        assert!(!noop().leads_with_path());
        assert!(!Middleware::list(vec![noop(), "/a".into()]).leads_with_path());
        assert!(!Middleware::list(Vec::new()).leads_with_path());
    }

    #[test]
    fn test_flatten_nested_lists() {
        let args = Middleware::list(vec![
            noop(),
            Middleware::list(vec![noop(), Middleware::list(vec![noop()])]),
        ]);
        let mut out = Vec::new();
        args.flatten_into(&mut out).unwrap();
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_path_among_handlers_rejected() {
        let args = Middleware::list(vec![noop(), "/late".into()]);
        let mut out = Vec::new();
        assert!(matches!(
            args.flatten_into(&mut out),
            Err(CoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_path_lists() {
        let paths = Middleware::list(vec![Middleware::from("/a"), Middleware::list(vec![Middleware::from("/b")])])
            .into_paths()
            .unwrap();
        assert_eq!(paths, vec!["/a", "/b"]);

        assert!(Middleware::list(vec![Middleware::from("/a"), noop()]).into_paths().is_err());
    }
}
