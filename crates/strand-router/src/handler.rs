//! Handler and continuation types

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::MiddlewareError;

/// A request or response threaded through a chain.
pub type Shared<T> = Arc<Mutex<T>>;

/// Continuation handed to every handler. `None` passes control onward,
/// `Some(err)` skips to the end of the chain.
///
/// The router does not lock the request or response once dispatch has
/// started, so a handler may keep its guard alive across `next`. Later
/// layers run inside `next` though, and any of them locking the same
/// value will block until that guard is dropped.
pub type Next = Box<dyn FnOnce(Option<MiddlewareError>) + Send>;

/// Prefix consumed by enclosing layers.
///
/// Lives in its own slot so the router can move it while a handler holds
/// the request. Clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct BaseUrl(Arc<Mutex<String>>);

impl BaseUrl {
    pub fn get(&self) -> String {
        self.0.lock().clone()
    }

    pub fn set(&self, base: String) {
        *self.0.lock() = base;
    }
}

/// What the router needs to know about a request to match layers.
pub trait Routable: Send + 'static {
    /// Full pathname of the request URL. Read once per dispatch.
    fn path(&self) -> String;

    fn base_slot(&self) -> &BaseUrl;

    fn base_url(&self) -> String {
        self.base_slot().get()
    }
}

/// A middleware function.
///
/// A handler may call `next` right away or hold on to it and call it later;
/// it must call it at most once.
pub trait Handler<Req, Res>: Send + Sync {
    fn call(&self, req: Shared<Req>, res: Shared<Res>, next: Next);
}

impl<Req, Res, F> Handler<Req, Res> for F
where
    F: Fn(Shared<Req>, Shared<Res>, Next) + Send + Sync,
{
    fn call(&self, req: Shared<Req>, res: Shared<Res>, next: Next) {
        self(req, res, next)
    }
}
