//! `BrowserHost` over `window.location` and `window.history`

use js_sys::Object;
use wasm_bindgen::JsValue;
use web_sys::{History, Location};

use strand_core::{BrowserHost, CoreError, Result};

/// The real page. Holds nothing; every call looks the window up afresh.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebHost;

impl WebHost {
    fn location_object(&self) -> Result<Location> {
        web_sys::window()
            .map(|window| window.location())
            .ok_or_else(|| CoreError::Host("no window".to_string()))
    }

    fn history(&self) -> Result<History> {
        web_sys::window()
            .ok_or_else(|| CoreError::Host("no window".to_string()))?
            .history()
            .map_err(host_error)
    }
}

impl BrowserHost for WebHost {
    fn location(&self) -> Result<String> {
        self.location_object()?.href().map_err(host_error)
    }

    fn push_state(&self, url: &str) -> Result<()> {
        self.history()?
            .push_state_with_url(&Object::new(), "", Some(url))
            .map_err(host_error)
    }

    fn replace_state(&self, url: &str) -> Result<()> {
        self.history()?
            .replace_state_with_url(&Object::new(), "", Some(url))
            .map_err(host_error)
    }

    fn reload(&self) -> Result<()> {
        self.location_object()?.reload().map_err(host_error)
    }

    fn assign(&self, url: &str) -> Result<()> {
        self.location_object()?.set_href(url).map_err(host_error)
    }

    fn history_state_present(&self) -> bool {
        self.history()
            .and_then(|history| history.state().map_err(host_error))
            .map(|state| !state.is_null() && !state.is_undefined())
            .unwrap_or(false)
    }
}

pub(crate) fn host_error(value: JsValue) -> CoreError {
    CoreError::Host(describe(&value))
}

pub(crate) fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
