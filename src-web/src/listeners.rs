//! Delegated DOM listeners

use std::rc::Rc;

use js_sys::{Array, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, Element, Event, EventTarget, FormData, HtmlAnchorElement, HtmlFormElement, Window,
};

use strand_core::BrowserHost;
use strand_dom::{DomError, DomEvent, Interceptor, Result};

use crate::host::{describe, WebHost};

struct WebEvent<'a>(&'a Event);

impl DomEvent for WebEvent<'_> {
    fn default_prevented(&self) -> bool {
        self.0.default_prevented()
    }

    fn prevent_default(&self) {
        self.0.prevent_default();
    }

    fn stop_propagation(&self) {
        self.0.stop_propagation();
    }
}

/// Bind body listeners now, or once `DOMContentLoaded` fires.
pub(crate) fn bind_when_ready(document: &Document, interceptor: Rc<Interceptor>) -> Result<()> {
    if !is_loading(document) {
        return bind_body(document, &interceptor);
    }

    let ready = document.clone();
    let mut pending = Some(interceptor);
    let listener = Closure::wrap(Box::new(move |_event: Event| {
        let Some(interceptor) = pending.take() else {
            return;
        };
        if let Err(e) = bind_body(&ready, &interceptor) {
            tracing::error!(error = %e, "Failed to bind navigation listeners");
        }
    }) as Box<dyn FnMut(Event)>);

    listen(document, "DOMContentLoaded", listener)
}

fn is_loading(document: &Document) -> bool {
    Reflect::get(document, &JsValue::from_str("readyState"))
        .ok()
        .and_then(|state| state.as_string())
        .map(|state| state == "loading")
        .unwrap_or(false)
}

fn bind_body(document: &Document, interceptor: &Rc<Interceptor>) -> Result<()> {
    let body = document
        .body()
        .ok_or_else(|| DomError::Binding("document has no body".to_string()))?;

    let links = Rc::clone(interceptor);
    delegate(
        &body,
        "click",
        &interceptor.config().link_selector,
        move |event, target| {
            if let Some(anchor) = target.dyn_ref::<HtmlAnchorElement>() {
                links.on_click(&WebEvent(event), &anchor.href());
            }
        },
    )?;

    let forms = Rc::clone(interceptor);
    delegate(
        &body,
        "submit",
        &interceptor.config().form_selector,
        move |event, target| {
            if let Some(form) = target.dyn_ref::<HtmlFormElement>() {
                forms.on_submit(&WebEvent(event), &form.action(), form_fields(form));
            }
        },
    )?;

    tracing::info!("Link and form interception bound");
    Ok(())
}

pub(crate) fn bind_popstate(window: &Window, interceptor: Rc<Interceptor>) -> Result<()> {
    let listener = Closure::wrap(Box::new(move |_event: Event| {
        interceptor.on_popstate(WebHost.history_state_present());
    }) as Box<dyn FnMut(Event)>);

    listen(window, "popstate", listener)
}

/// Call `handler` with the closest ancestor of the event target matching
/// `selector`.
fn delegate<F>(root: &EventTarget, event_type: &str, selector: &str, handler: F) -> Result<()>
where
    F: Fn(&Event, &Element) + 'static,
{
    let selector = selector.to_string();
    let listener = Closure::wrap(Box::new(move |event: Event| {
        let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };
        if let Ok(Some(matched)) = target.closest(&selector) {
            handler(&event, &matched);
        }
    }) as Box<dyn FnMut(Event)>);

    listen(root, event_type, listener)
}

/// Attach `listener` for the lifetime of the page.
fn listen(target: &EventTarget, event_type: &str, listener: Closure<dyn FnMut(Event)>) -> Result<()> {
    target
        .add_event_listener_with_callback(event_type, listener.as_ref().unchecked_ref())
        .map_err(|e| DomError::Binding(describe(&e)))?;
    listener.forget();
    Ok(())
}

/// Successful controls of `form` as `(name, value)` pairs. File inputs are
/// skipped.
fn form_fields(form: &HtmlFormElement) -> Vec<(String, String)> {
    let Ok(data) = FormData::new_with_form(form) else {
        return Vec::new();
    };
    let Ok(Some(entries)) = js_sys::try_iter(&data) else {
        return Vec::new();
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let pair = Array::from(&entry);
            Some((pair.get(0).as_string()?, pair.get(1).as_string()?))
        })
        .collect()
}
