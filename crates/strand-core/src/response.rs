//! Per-dispatch response context

use std::sync::{Arc, Weak};

use crate::application::{Application, OwnerSlot};
use crate::error::CoreError;
use crate::request::RequestInit;
use crate::Result;

#[derive(Debug)]
pub struct Response {
    /// Application whose navigation controller created this response
    origin: Weak<Application>,
    owner: OwnerSlot,
}

impl Response {
    pub(crate) fn new(origin: Weak<Application>) -> Self {
        Self {
            owner: OwnerSlot::new(origin.clone()),
            origin,
        }
    }

    /// Navigate to `input`, replacing the current history entry.
    ///
    /// Returns `Ok(false)` if the target is on another host.
    pub fn redirect(&self, input: impl Into<RequestInit>) -> Result<bool> {
        let app = self
            .origin
            .upgrade()
            .ok_or_else(|| CoreError::InvalidArgument("application was dropped".to_string()))?;
        app.redirect(input)
    }

    pub fn app(&self) -> Option<Arc<Application>> {
        self.owner.get().upgrade()
    }

    pub fn owner_id(&self) -> Option<String> {
        self.app().map(|app| app.id().to_string())
    }

    pub(crate) fn owner_slot(&self) -> &OwnerSlot {
        &self.owner
    }
}
