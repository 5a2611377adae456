//! Navigation controller
//!
//! Lifecycle of one navigation:
//! ```text
//! Requested
//!   ↓ same host            ↘ other host
//! SameOriginChecked          Refused
//!   ↓ pushState / replaceState
//! HistoryUpdated
//!   ↓ router.handle
//! Dispatching
//!   ↓ done (success or error)
//! Completed
//! ```
//!
//! History is always updated before the first handler runs and is never
//! rolled back, whatever the chain reports.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strand_router::{shared, Next};
use url::Url;
use uuid::Uuid;

use crate::application::Application;
use crate::error::CoreError;
use crate::host::BrowserHost;
use crate::request::{Request, RequestInit};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationPhase {
    Requested,
    SameOriginChecked,
    HistoryUpdated,
    Dispatching,
    Completed,
    Refused,
}

impl NavigationPhase {
    pub fn can_transition_to(&self, target: NavigationPhase) -> bool {
        use NavigationPhase::*;

        matches!(
            (self, target),
            (Requested, SameOriginChecked)
                | (Requested, Refused)
                | (SameOriginChecked, HistoryUpdated)
                | (HistoryUpdated, Dispatching)
                | (Dispatching, Completed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, NavigationPhase::Completed | NavigationPhase::Refused)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationPhase::Requested => "requested",
            NavigationPhase::SameOriginChecked => "same_origin_checked",
            NavigationPhase::HistoryUpdated => "history_updated",
            NavigationPhase::Dispatching => "dispatching",
            NavigationPhase::Completed => "completed",
            NavigationPhase::Refused => "refused",
        }
    }
}

impl fmt::Display for NavigationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One navigation attempt moving through its phases.
#[derive(Debug, Clone)]
pub struct Navigation {
    pub id: String,
    pub url: String,
    pub phase: NavigationPhase,
}

impl Navigation {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url: url.into(),
            phase: NavigationPhase::Requested,
        }
    }

    pub fn transition_to(&mut self, phase: NavigationPhase) -> Result<()> {
        if !self.phase.can_transition_to(phase) {
            return Err(CoreError::InvalidTransition {
                from: self.phase.to_string(),
                to: phase.to_string(),
            });
        }

        tracing::debug!(
            navigation_id = %self.id,
            url = %self.url,
            from = %self.phase,
            to = %phase,
            "Navigation phase transition"
        );

        self.phase = phase;
        Ok(())
    }
}

/// Options for [`Application::navigate`].
#[derive(Default)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing a new one
    pub replace: bool,
    /// Completion callback; without one the document is reloaded
    pub done: Option<Next>,
}

impl NavigateOptions {
    pub fn push() -> Self {
        Self::default()
    }

    pub fn replace() -> Self {
        Self {
            replace: true,
            done: None,
        }
    }

    pub fn done<F>(mut self, done: F) -> Self
    where
        F: FnOnce(Option<strand_router::MiddlewareError>) + Send + 'static,
    {
        self.done = Some(Box::new(done));
        self
    }
}

impl fmt::Debug for NavigateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigateOptions")
            .field("replace", &self.replace)
            .field("done", &self.done.is_some())
            .finish()
    }
}

impl Application {
    /// Dispatch `input` through this application after updating history.
    ///
    /// Returns `Ok(false)` without touching history when the target lives
    /// on another host. `Ok(true)` only means dispatch has started; the
    /// chain's outcome is reported to `options.done`.
    pub fn navigate(&self, input: impl Into<RequestInit>, options: NavigateOptions) -> Result<bool> {
        let host = Arc::clone(self.host());
        let location = host.location()?;
        let req = Request::create(input, &location)?;
        let res = self.create_response();

        let mut navigation = Navigation::new(req.url().as_str());
        let current = Url::parse(&location)
            .map_err(|e| CoreError::InvalidUrl(format!("{}: {}", location, e)))?;

        if host_of(req.url()) != host_of(&current) {
            navigation.transition_to(NavigationPhase::Refused)?;
            tracing::debug!(url = %req.url(), location = %current, "Refusing cross-origin navigation");
            return Ok(false);
        }
        navigation.transition_to(NavigationPhase::SameOriginChecked)?;

        let target = req.url().as_str().to_string();
        if options.replace {
            if current.as_str() != target {
                host.replace_state(&target)?;
            }
        } else {
            host.push_state(&target)?;
        }
        navigation.transition_to(NavigationPhase::HistoryUpdated)?;

        let replace = options.replace;
        let done = options
            .done
            .unwrap_or_else(|| default_done(Arc::clone(&host), replace));

        navigation.transition_to(NavigationPhase::Dispatching)?;
        tracing::info!(
            navigation_id = %navigation.id,
            method = %req.method(),
            url = %target,
            replace,
            "Navigating"
        );

        let finish: Next = Box::new(move |err| {
            if let Err(e) = navigation.transition_to(NavigationPhase::Completed) {
                tracing::warn!(error = %e, "Navigation completed twice");
            }
            done(err);
        });

        self.handle(shared(req), shared(res), finish);
        Ok(true)
    }

    /// Navigate, replacing the current history entry.
    pub fn redirect(&self, input: impl Into<RequestInit>) -> Result<bool> {
        self.navigate(input, NavigateOptions::replace())
    }

    /// Re-dispatch the current document URL.
    pub fn refresh(&self) -> Result<bool> {
        let location = self.host().location()?;
        self.redirect(location)
    }
}

/// `location.host`: hostname plus any non-default port.
fn host_of(url: &Url) -> (Option<String>, Option<u16>) {
    (url.host_str().map(str::to_lowercase), url.port())
}

/// Without a custom callback the page is simply loaded for real: errors
/// are logged, a replace reloads, a push assigns the (new) location.
fn default_done(host: Arc<dyn BrowserHost>, replace: bool) -> Next {
    Box::new(move |err| {
        let outcome = match err {
            Some(err) => {
                tracing::error!(error = %err, "Navigation middleware failed");
                return;
            }
            None if replace => host.reload(),
            None => host.location().and_then(|href| host.assign(&href)),
        };

        if let Err(e) = outcome {
            tracing::error!(error = %e, "Failed to load document");
        }
    })
}
