//! Layer registration and dispatch.
//!
//! # Design Decisions
//! - Layers are appended only; registration order is dispatch order
//! - A dispatch works on a snapshot, so layers added mid-dispatch apply to
//!   the next request only
//! - The request path is never rewritten; layers match against the part of
//!   the path past the request's base URL
//! - `done` fires exactly once per dispatch
//! - The request is locked once, on entry; after that only the base URL
//!   slot is touched, so handlers may hold the request across `next`

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::MiddlewareError;
use crate::handler::{BaseUrl, Handler, Next, Routable, Shared};
use crate::matcher::PathPrefixMatcher;

#[derive(Debug, Clone, Copy, Default)]
pub struct RouterOptions {
    /// Compare prefixes byte for byte instead of ASCII case-insensitively
    pub case_sensitive: bool,
}

/// One registered handler.
pub struct Layer<Req, Res> {
    matcher: PathPrefixMatcher,
    handler: Arc<dyn Handler<Req, Res>>,
}

impl<Req, Res> Layer<Req, Res> {
    pub fn path(&self) -> &str {
        self.matcher.prefix()
    }
}

pub struct Router<Req, Res> {
    layers: RwLock<Vec<Arc<Layer<Req, Res>>>>,
    options: RouterOptions,
}

impl<Req, Res> Router<Req, Res>
where
    Req: Routable,
    Res: Send + 'static,
{
    pub fn new(options: RouterOptions) -> Self {
        Self {
            layers: RwLock::new(Vec::new()),
            options,
        }
    }

    pub fn options(&self) -> RouterOptions {
        self.options
    }

    /// Register `handler` under `path`.
    pub fn use_handler(&self, path: &str, handler: Arc<dyn Handler<Req, Res>>) -> &Self {
        let matcher = PathPrefixMatcher::new(path, self.options.case_sensitive);
        tracing::debug!(path = %matcher.prefix(), "Registered layer");

        self.layers.write().push(Arc::new(Layer { matcher, handler }));
        self
    }

    /// Number of registered layers
    pub fn len(&self) -> usize {
        self.layers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.read().is_empty()
    }

    /// Registered prefixes in dispatch order
    pub fn paths(&self) -> Vec<String> {
        self.layers
            .read()
            .iter()
            .map(|layer| layer.path().to_string())
            .collect()
    }

    /// Run `req`/`res` through every matching layer, then call `done`.
    pub fn handle(&self, req: Shared<Req>, res: Shared<Res>, done: Next) {
        let layers = self.layers.read().clone();
        let (path, slot) = {
            let req = req.lock();
            (req.path(), req.base_slot().clone())
        };
        let base = slot.get();

        let dispatch = Arc::new(Dispatch {
            layers,
            index: Mutex::new(0),
            req,
            res,
            path,
            slot,
            base,
            done: Mutex::new(Some(done)),
        });

        Dispatch::next(dispatch, None);
    }
}

struct Dispatch<Req, Res> {
    layers: Vec<Arc<Layer<Req, Res>>>,
    index: Mutex<usize>,
    req: Shared<Req>,
    res: Shared<Res>,
    /// Request path, fixed for the whole dispatch
    path: String,
    slot: BaseUrl,
    /// Base URL the router was entered with
    base: String,
    done: Mutex<Option<Next>>,
}

impl<Req, Res> Dispatch<Req, Res>
where
    Req: Routable,
    Res: Send + 'static,
{
    fn next(this: Arc<Self>, err: Option<MiddlewareError>) {
        this.slot.set(this.base.clone());

        if let Some(err) = err {
            return this.finish(Some(err));
        }

        loop {
            let layer = {
                let mut index = this.index.lock();
                match this.layers.get(*index) {
                    Some(layer) => {
                        *index += 1;
                        Arc::clone(layer)
                    }
                    None => break,
                }
            };

            let relative = relative_path(&this.path, &this.base);
            let Some(consumed) = layer.matcher.match_len(relative) else {
                continue;
            };

            let base = format!("{}{}", this.base, &relative[..consumed]);
            tracing::trace!(layer = %layer.path(), base = %base, "Dispatching to layer");
            this.slot.set(base);

            let req = Arc::clone(&this.req);
            let res = Arc::clone(&this.res);
            let resume = Arc::clone(&this);
            layer
                .handler
                .call(req, res, Box::new(move |err| Dispatch::next(resume, err)));
            return;
        }

        this.finish(None);
    }

    fn finish(&self, err: Option<MiddlewareError>) {
        let done = self.done.lock().take();
        match done {
            Some(done) => done(err),
            None => tracing::warn!("Continuation called after the chain completed"),
        }
    }
}

/// Path left over once `base` has been consumed, always starting with `/`.
fn relative_path<'a>(path: &'a str, base: &str) -> &'a str {
    if base.is_empty() {
        return path;
    }

    match path.get(..base.len()) {
        Some(head) if head.eq_ignore_ascii_case(base) => {
            let rest = &path[base.len()..];
            if rest.is_empty() {
                "/"
            } else {
                rest
            }
        }
        _ => path,
    }
}
