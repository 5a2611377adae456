//! Application: settings, router and mounting
//!
//! Every application owns its router exclusively. Mounting a
//! sub-application registers a wrapper in the parent's router that hands
//! the request/response to the child and, when the child's chain
//! completes, puts the ownership markers back the way they were.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use strand_router::{Next, Router, RouterOptions, Shared};
use uuid::Uuid;

use crate::config::Config;
use crate::error::CoreError;
use crate::host::BrowserHost;
use crate::middleware::{self, Middleware, Mounted};
use crate::request::{Request, RequestInit};
use crate::response::Response;
use crate::settings::Settings;
use crate::Result;

pub type AppRouter = Router<Request, Response>;

/// Observer called with the parent when an application is mounted.
pub type MountListener = Arc<dyn Fn(&Application) + Send + Sync>;

static GLOBAL: OnceLock<Arc<Application>> = OnceLock::new();

/// Ownership marker carried by a request or response. Kept outside their
/// locks so a mount wrapper can restore it while a handler holds either.
/// Clones share the slot.
#[derive(Debug, Clone, Default)]
pub(crate) struct OwnerSlot(Arc<Mutex<Weak<Application>>>);

impl OwnerSlot {
    pub(crate) fn new(owner: Weak<Application>) -> Self {
        Self(Arc::new(Mutex::new(owner)))
    }

    pub(crate) fn get(&self) -> Weak<Application> {
        self.0.lock().clone()
    }

    pub(crate) fn set(&self, owner: Weak<Application>) {
        *self.0.lock() = owner;
    }
}

pub struct Application {
    id: String,
    config: Config,
    settings: Settings,
    router: AppRouter,
    mount_path: RwLock<String>,
    /// Only used to compute `path()`
    parent: RwLock<Weak<Application>>,
    mount_listeners: RwLock<Vec<MountListener>>,
    host: Arc<dyn BrowserHost>,
    this: Weak<Application>,
}

impl Application {
    pub fn new(host: Arc<dyn BrowserHost>) -> Arc<Self> {
        Self::with_config(host, Config::default())
    }

    pub fn with_config(host: Arc<dyn BrowserHost>, config: Config) -> Arc<Self> {
        let app = Arc::new_cyclic(|this: &Weak<Application>| {
            let router = AppRouter::new(RouterOptions {
                case_sensitive: config.case_sensitive_routing,
            });
            router.use_handler("/", middleware::query());
            router.use_handler("/", middleware::init(this.clone()));

            Self {
                id: Uuid::new_v4().to_string(),
                config: config.clone(),
                settings: Settings::new(),
                router,
                mount_path: RwLock::new("/".to_string()),
                parent: RwLock::new(Weak::new()),
                mount_listeners: RwLock::new(Vec::new()),
                host,
                this: this.clone(),
            }
        });

        if app.config.publish_global && GLOBAL.set(Arc::clone(&app)).is_ok() {
            tracing::info!(app_id = %app.id, "Published root application");
        }

        app
    }

    /// The first application constructed with `publish_global` set.
    pub fn global() -> Option<Arc<Application>> {
        GLOBAL.get().cloned()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn host(&self) -> &Arc<dyn BrowserHost> {
        &self.host
    }

    pub fn router(&self) -> &AppRouter {
        &self.router
    }

    // === Settings ===

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.settings.get(key)
    }

    pub fn set(&self, key: &str, value: impl Into<Value>) -> &Self {
        self.settings.set(key, value);
        self
    }

    pub fn enable(&self, key: &str) -> &Self {
        self.settings.enable(key);
        self
    }

    pub fn disable(&self, key: &str) -> &Self {
        self.settings.disable(key);
        self
    }

    pub fn enabled(&self, key: &str) -> bool {
        self.settings.enabled(key)
    }

    pub fn disabled(&self, key: &str) -> bool {
        self.settings.disabled(key)
    }

    // === Mounting ===

    /// Prefix this application was mounted under, `/` if never mounted.
    pub fn mount_path(&self) -> String {
        self.mount_path.read().clone()
    }

    pub fn parent(&self) -> Option<Arc<Application>> {
        self.parent.read().upgrade()
    }

    /// Full mount path: every ancestor's mount path concatenated. The root
    /// contributes nothing.
    pub fn path(&self) -> String {
        match self.parent() {
            Some(parent) => format!("{}{}", parent.path(), self.mount_path()),
            None => String::new(),
        }
    }

    pub fn on_mount<F>(&self, listener: F) -> &Self
    where
        F: Fn(&Application) + Send + Sync + 'static,
    {
        self.mount_listeners.write().push(Arc::new(listener));
        self
    }

    /// Register middleware and sub-applications.
    ///
    /// A leading path argument (or list of paths) sets the mount prefix,
    /// otherwise everything is mounted at `/`. Nested lists are flattened.
    pub fn use_middleware<I>(&self, args: I) -> Result<&Self>
    where
        I: IntoIterator<Item = Middleware>,
    {
        let mut args: Vec<Middleware> = args.into_iter().collect();

        let paths = if args.first().map(Middleware::leads_with_path).unwrap_or(false) {
            args.remove(0).into_paths()?
        } else {
            vec!["/".to_string()]
        };

        let mut items = Vec::new();
        for arg in args {
            arg.flatten_into(&mut items)?;
        }

        if items.is_empty() {
            return Err(CoreError::InvalidArgument(
                "use() requires middleware functions".to_string(),
            ));
        }

        for item in items {
            match item {
                Mounted::Handler(handler) => {
                    for path in &paths {
                        self.router.use_handler(path, Arc::clone(&handler));
                    }
                }
                Mounted::App(sub) => self.mount_app(&paths, sub),
            }
        }

        Ok(self)
    }

    /// Register a single handler at `/`.
    pub fn use_fn<F>(&self, f: F) -> &Self
    where
        F: Fn(Shared<Request>, Shared<Response>, Next) + Send + Sync + 'static,
    {
        self.router.use_handler("/", Arc::new(f));
        self
    }

    /// Register a single handler under `path`.
    pub fn use_at<F>(&self, path: &str, f: F) -> &Self
    where
        F: Fn(Shared<Request>, Shared<Response>, Next) + Send + Sync + 'static,
    {
        self.router.use_handler(path, Arc::new(f));
        self
    }

    /// Mount `sub` under `path`.
    pub fn mount(&self, path: &str, sub: &Arc<Application>) -> &Self {
        self.mount_app(&[path.to_string()], Arc::clone(sub));
        self
    }

    fn mount_app(&self, paths: &[String], sub: Arc<Application>) {
        let Some(first) = paths.first() else {
            return;
        };

        tracing::debug!(app_id = %sub.id, path = %first, parent_id = %self.id, "Mounting application");
        *sub.mount_path.write() = first.clone();
        *sub.parent.write() = self.this.clone();

        for path in paths {
            let child = Arc::clone(&sub);
            self.router.use_handler(
                path,
                Arc::new(move |req: Shared<Request>, res: Shared<Response>, next: Next| {
                    let req_slot = req.lock().owner_slot().clone();
                    let res_slot = res.lock().owner_slot().clone();
                    let (req_owner, res_owner) = (req_slot.get(), res_slot.get());

                    child.handle(
                        req,
                        res,
                        Box::new(move |err| {
                            req_slot.set(req_owner);
                            res_slot.set(res_owner);
                            next(err);
                        }),
                    );
                }),
            );
        }

        sub.emit_mount(self);
    }

    fn emit_mount(&self, parent: &Application) {
        let listeners: Vec<MountListener> = self.mount_listeners.read().clone();
        for listener in listeners {
            listener(parent);
        }
    }

    // === Dispatch ===

    /// Run a request/response pair through this application's router.
    pub fn handle(&self, req: Shared<Request>, res: Shared<Response>, done: Next) {
        self.router.handle(req, res, done);
    }

    /// Build a request against the current document URL.
    pub fn create_request(&self, input: impl Into<RequestInit>) -> Result<Request> {
        let location = self.host.location()?;
        Request::create(input, &location)
    }

    /// Build a response whose `redirect` re-enters this application.
    pub fn create_response(&self) -> Response {
        Response::new(self.this.clone())
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("id", &self.id)
            .field("mount_path", &*self.mount_path.read())
            .field("layers", &self.router.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use strand_router::{shared, Routable};

    /// Built-in query and init layers
    const BUILTIN_LAYERS: usize = 2;

    fn host() -> Arc<MemoryHost> {
        Arc::new(MemoryHost::new("https://app.test/"))
    }

    fn app() -> Arc<Application> {
        Application::new(host())
    }

    type Log = Arc<Mutex<Vec<String>>>;

    fn recorder(log: &Log, label: &str) -> Middleware {
        let log = Arc::clone(log);
        let label = label.to_string();
        Middleware::handler(move |_req, _res, next: Next| {
            log.lock().push(label.clone());
            next(None);
        })
    }

    fn dispatch(app: &Arc<Application>, url: &str) -> (Shared<Request>, Option<String>) {
        let (req, _res, err) = dispatch_pair(app, url);
        (req, err)
    }

    fn dispatch_pair(
        app: &Arc<Application>,
        url: &str,
    ) -> (Shared<Request>, Shared<Response>, Option<String>) {
        let req = shared(app.create_request(url).unwrap());
        let res = shared(app.create_response());
        let outcome = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&outcome);

        app.handle(
            Arc::clone(&req),
            Arc::clone(&res),
            Box::new(move |err| *slot.lock() = Some(err.map(|e| e.to_string()))),
        );

        let err = outcome.lock().take().expect("dispatch should complete");
        (req, res, err)
    }

    #[test]
    fn test_new_application() {
        let app = app();
        assert_eq!(app.mount_path(), "/");
        assert!(app.parent().is_none());
        assert_eq!(app.path(), "");
        assert_eq!(app.router().len(), BUILTIN_LAYERS);
        assert_ne!(app.id(), Application::new(host()).id());
    }

    #[test]
    fn test_settings_accessors() {
        let app = app();
        app.set("title", "Strand").enable("cache");

        assert_eq!(app.get("title"), Some(Value::from("Strand")));
        assert!(app.enabled("cache"));
        app.disable("cache");
        assert!(app.disabled("cache"));
    }

    #[test]
    fn test_use_flattens_in_order_at_root() {
        let log: Log = Arc::default();
        let app = app();
        app.use_middleware(vec![Middleware::list(vec![
            recorder(&log, "fn1"),
            Middleware::list(vec![recorder(&log, "fn2"), recorder(&log, "fn3")]),
        ])])
        .unwrap();

        assert_eq!(app.router().len(), BUILTIN_LAYERS + 3);
        assert!(app.router().paths().iter().all(|p| p == "/"));

        dispatch(&app, "/anything");
        assert_eq!(*log.lock(), vec!["fn1", "fn2", "fn3"]);
    }

    #[test]
    fn test_use_with_leading_path() {
        let log: Log = Arc::default();
        let app = app();
        app.use_middleware(vec![
            Middleware::from("/admin"),
            recorder(&log, "fn1"),
            recorder(&log, "fn2"),
        ])
        .unwrap();

        assert_eq!(
            app.router().paths()[BUILTIN_LAYERS..],
            ["/admin".to_string(), "/admin".to_string()]
        );

        dispatch(&app, "/public");
        assert!(log.lock().is_empty());

        dispatch(&app, "/admin/users");
        assert_eq!(*log.lock(), vec!["fn1", "fn2"]);
    }

    #[test]
    fn test_use_with_path_list() {
        let log: Log = Arc::default();
        let app = app();
        app.use_middleware(vec![
            Middleware::list(vec![Middleware::from("/a"), Middleware::from("/b")]),
            recorder(&log, "shared"),
        ])
        .unwrap();

        dispatch(&app, "/b/1");
        dispatch(&app, "/c");
        dispatch(&app, "/a");
        assert_eq!(*log.lock(), vec!["shared", "shared"]);
    }

    #[test]
    fn test_use_rejects_empty() {
        let app = app();
        let err = app.use_middleware(vec![Middleware::from("/admin")]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));

        let err = app
            .use_middleware(vec![Middleware::list(Vec::new())])
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));

        assert_eq!(app.router().len(), BUILTIN_LAYERS);
    }

    #[test]
    fn test_mount_path_composition() {
        let root = app();
        let a = app();
        let b = app();
        let c = app();

        root.mount("/a", &a);
        a.mount("/b", &b);
        b.mount("/c", &c);

        assert_eq!(root.path(), "");
        assert_eq!(a.path(), "/a");
        assert_eq!(b.path(), "/a/b");
        assert_eq!(c.path(), "/a/b/c");
        assert_eq!(c.mount_path(), "/c");
        assert_eq!(c.parent().unwrap().id(), b.id());
    }

    #[test]
    fn test_mount_notification() {
        let root = app();
        let sub = app();
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        sub.on_mount(move |parent| *slot.lock() = Some(parent.id().to_string()));

        root.use_middleware(vec![Middleware::from("/blog"), Middleware::from(&sub)])
            .unwrap();

        assert_eq!(seen.lock().as_deref(), Some(root.id()));
        assert_eq!(sub.mount_path(), "/blog");
    }

    #[test]
    fn test_owner_restored_after_sub_application() {
        let root = app();
        let blog = app();
        let owners: Log = Arc::default();

        let log = Arc::clone(&owners);
        blog.use_at("/posts", move |req, res, next| {
            let req = req.lock();
            assert_eq!(req.path(), "/blog/posts/5");
            assert_eq!(res.lock().owner_id(), req.owner_id());
            log.lock().push(req.owner_id().unwrap());
            drop(req);
            next(None);
        });

        let log = Arc::clone(&owners);
        root.mount("/blog", &blog).use_fn(move |req, res, next| {
            log.lock().push(req.lock().owner_id().unwrap());
            log.lock().push(res.lock().owner_id().unwrap());
            next(None);
        });

        let (req, res, err) = dispatch_pair(&root, "/blog/posts/5");
        assert!(err.is_none());
        assert_eq!(
            *owners.lock(),
            vec![blog.id().to_string(), root.id().to_string(), root.id().to_string()]
        );
        assert_eq!(req.lock().owner_id().as_deref(), Some(root.id()));
        assert_eq!(res.lock().owner_id().as_deref(), Some(root.id()));
        assert_eq!(req.lock().base_url(), "");
    }

    #[test]
    fn test_owner_restored_on_error_at_depth() {
        let root = app();
        let mid = app();
        let leaf = app();

        let inside = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&inside);
        leaf.use_fn(move |_req, res, next| {
            *slot.lock() = res.lock().owner_id();
            next(Some(strand_router::MiddlewareError::new("leaf failed")))
        });
        mid.mount("/leaf", &leaf);
        root.mount("/mid", &mid);

        let (req, res, err) = dispatch_pair(&root, "/mid/leaf/x");
        assert_eq!(err.as_deref(), Some("leaf failed"));
        assert_eq!(inside.lock().as_deref(), Some(leaf.id()));
        assert_eq!(req.lock().owner_id().as_deref(), Some(root.id()));
        assert_eq!(res.lock().owner_id().as_deref(), Some(root.id()));
    }

    #[test]
    fn test_handler_may_hold_request_across_next() {
        let root = app();
        let blog = app();
        let owners: Log = Arc::default();

        let log = Arc::clone(&owners);
        blog.use_fn(move |req, _res, next| {
            let req = req.lock();
            log.lock().push(req.owner_id().unwrap());
            if req.method() == "GET" {
                next(None);
            }
        });
        root.mount("/blog", &blog);

        let (tx, rx) = std::sync::mpsc::channel();
        let app = Arc::clone(&root);
        std::thread::spawn(move || {
            let (req, err) = dispatch(&app, "/blog/posts");
            let owner = req.lock().owner_id();
            let _ = tx.send((owner, err));
        });

        let (owner, err) = rx
            .recv_timeout(std::time::Duration::from_secs(3))
            .expect("dispatch should finish while the handler holds the request");
        assert!(err.is_none());
        assert_eq!(owner.as_deref(), Some(root.id()));
        assert_eq!(*owners.lock(), vec![blog.id().to_string()]);
    }

    #[test]
    fn test_request_settings_resolve_through_owner() {
        let root = app();
        let sub = app();
        root.set("name", "root");
        sub.set("name", "sub");

        let seen: Log = Arc::default();
        let log = Arc::clone(&seen);
        sub.use_fn(move |req, _res, next| {
            let name = req.lock().setting("name").unwrap();
            log.lock().push(name.as_str().unwrap().to_string());
            next(None);
        });
        root.mount("/sub", &sub);

        let (req, _) = dispatch(&root, "/sub");
        assert_eq!(*seen.lock(), vec!["sub"]);
        assert_eq!(req.lock().setting("name"), Some(Value::from("root")));
    }

    #[test]
    fn test_query_parsed_by_builtin_layer() {
        let app = app();
        let (req, _) = dispatch(&app, "/search?q=rust");
        assert_eq!(
            req.lock().query().and_then(|q| q.get("q")).cloned(),
            Some(Value::from("rust"))
        );
    }

    #[test]
    fn test_global_is_never_replaced() {
        let first = Application::global();
        let _another = app();
        let second = Application::global();

        assert!(second.is_some());
        if let Some(first) = first {
            assert_eq!(first.id(), second.unwrap().id());
        }
    }

    #[test]
    fn test_case_sensitive_routing() {
        let log: Log = Arc::default();
        let config = Config {
            case_sensitive_routing: true,
            publish_global: false,
        };
        let app = Application::with_config(host(), config);
        app.use_middleware(vec![Middleware::from("/Admin"), recorder(&log, "hit")])
            .unwrap();

        dispatch(&app, "/admin");
        assert!(log.lock().is_empty());
        dispatch(&app, "/Admin");
        assert_eq!(*log.lock(), vec!["hit"]);
    }
}
