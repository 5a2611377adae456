//! Strand for the browser
//!
//! Binds the interception layer to the real page and exposes the root
//! application to page scripts.

mod host;
mod listeners;

use std::rc::Rc;
use std::sync::Arc;

use wasm_bindgen::prelude::*;

use strand_core::{Application, Config, NavigateOptions};
use strand_dom::{DomError, InterceptConfig, Interceptor, Result};

pub use host::WebHost;

/// Initialize logging to the browser console. Later calls keep the first
/// subscriber.
pub fn init_logging() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer()
        .with_ansi(false)
        .without_time()
        .with_target(true)
        .with_writer(tracing_web::MakeWebConsoleWriter::new());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .try_init();
}

/// Start intercepting links, forms and back/forward for `app`.
///
/// Listeners are bound on every call, so call this once per page.
pub fn start(app: Arc<Application>, config: InterceptConfig) -> Result<()> {
    init_logging();

    let window = web_sys::window().ok_or_else(|| DomError::Binding("no window".to_string()))?;
    let document = window
        .document()
        .ok_or_else(|| DomError::Binding("no document".to_string()))?;

    tracing::info!(app_id = %app.id(), "Starting navigation interception");
    let interceptor = Rc::new(Interceptor::new(app, config));

    listeners::bind_when_ready(&document, Rc::clone(&interceptor))?;
    listeners::bind_popstate(&window, interceptor)?;

    Ok(())
}

/// Start from page script: use the root application if Rust code already
/// built one, otherwise create it over the real page. Both arguments are
/// optional JSON configs.
#[wasm_bindgen(js_name = start)]
pub fn start_global(
    app_config: Option<String>,
    intercept_config: Option<String>,
) -> std::result::Result<(), JsValue> {
    boot(app_config.as_deref(), intercept_config.as_deref())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn boot(app_config: Option<&str>, intercept_config: Option<&str>) -> Result<()> {
    let app = match Application::global() {
        Some(app) => app,
        None => {
            let config = app_config.map(Config::from_json).transpose()?.unwrap_or_default();
            Application::with_config(
                Arc::new(WebHost),
                Config {
                    publish_global: true,
                    ..config
                },
            )
        }
    };

    let intercept = intercept_config
        .map(InterceptConfig::from_json)
        .transpose()?
        .unwrap_or_default();

    start(app, intercept)
}

fn global_app() -> std::result::Result<Arc<Application>, JsValue> {
    Application::global().ok_or_else(|| JsValue::from_str("strand has not been started"))
}

/// Navigate the root application from page script.
#[wasm_bindgen(js_name = navigate)]
pub fn navigate_global(url: &str) -> std::result::Result<bool, JsValue> {
    global_app()?
        .navigate(url, NavigateOptions::push())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Redirect the root application from page script.
#[wasm_bindgen(js_name = redirect)]
pub fn redirect_global(url: &str) -> std::result::Result<bool, JsValue> {
    global_app()?
        .redirect(url)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Re-dispatch the current document URL through the root application.
#[wasm_bindgen(js_name = refresh)]
pub fn refresh_global() -> std::result::Result<bool, JsValue> {
    global_app()?
        .refresh()
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
