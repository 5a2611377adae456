//! Event interception

use std::sync::Arc;

use serde_json::Value;
use strand_core::{collect_fields, Application, MiddlewareError, NavigateOptions, RequestInit};

use crate::config::InterceptConfig;
use crate::event::DomEvent;

/// Called when an intercepted navigation's chain completes. Without one the
/// application's default (load the page for real) applies.
pub type CompletionHandler = Arc<dyn Fn(Option<MiddlewareError>) + Send + Sync>;

pub struct Interceptor {
    app: Arc<Application>,
    config: InterceptConfig,
    on_complete: Option<CompletionHandler>,
}

impl Interceptor {
    pub fn new(app: Arc<Application>, config: InterceptConfig) -> Self {
        Self {
            app,
            config,
            on_complete: None,
        }
    }

    pub fn with_completion<F>(mut self, handler: F) -> Self
    where
        F: Fn(Option<MiddlewareError>) + Send + Sync + 'static,
    {
        self.on_complete = Some(Arc::new(handler));
        self
    }

    pub fn app(&self) -> &Arc<Application> {
        &self.app
    }

    pub fn config(&self) -> &InterceptConfig {
        &self.config
    }

    /// A click on a link whose resolved href is `href`.
    ///
    /// Returns true if the navigation was taken over.
    pub fn on_click(&self, event: &dyn DomEvent, href: &str) -> bool {
        if !self.config.links || event.default_prevented() {
            return false;
        }

        self.take_over(event, RequestInit::new(href))
    }

    /// A form submission to `action` carrying `fields` as `(name, value)`
    /// pairs. Always dispatched as `POST`.
    pub fn on_submit<I, K, V>(&self, event: &dyn DomEvent, action: &str, fields: I) -> bool
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        if !self.config.forms || event.default_prevented() {
            return false;
        }

        let body = Value::Object(collect_fields(fields, false));
        let init = RequestInit::new(action).method("POST").body(body);
        self.take_over(event, init)
    }

    /// Back/forward navigation. Always a full refresh, never a replay of
    /// the earlier request.
    pub fn on_popstate(&self, state_present: bool) -> bool {
        if !self.config.popstate || !state_present {
            return false;
        }

        match self.app.refresh() {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!(error = %e, "Refresh after popstate failed");
                false
            }
        }
    }

    fn take_over(&self, event: &dyn DomEvent, init: RequestInit) -> bool {
        let url = init.url.clone().unwrap_or_default();
        let mut options = NavigateOptions::push();
        if let Some(handler) = &self.on_complete {
            let handler = Arc::clone(handler);
            options = options.done(move |err| handler(err));
        }

        match self.app.navigate(init, options) {
            Ok(true) => {
                event.stop_propagation();
                event.prevent_default();
                true
            }
            Ok(false) => {
                tracing::debug!(url = %url, "Leaving navigation to the browser");
                false
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Could not intercept navigation");
                false
            }
        }
    }
}
