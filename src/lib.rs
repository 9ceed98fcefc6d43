//! Typeswap - a browser extension that overrides page fonts
//!
//! This crate is the WebAssembly entry point for the extension's three
//! contexts:
//! - `startContent` runs in every page, probing fonts and injecting the override
//! - `startBackground` runs in the service worker and routes panel requests to tabs
//! - `Panel` drives the toolbar popup

pub mod background;
pub mod content;
pub mod error;
pub mod panel;

use std::sync::Once;

use serde::Serialize;
use wasm_bindgen::JsValue;

// Re-export main types
pub use background::start_background;
pub use content::start_content;
pub use error::{ExtensionError, ExtensionResult};
pub use panel::Panel;

// Re-export the core and browser backend
pub use typeswap_web::*;

static RUNTIME: Once = Once::new();

/// Panic hook and `log` sink for whichever context loads first
pub(crate) fn init_runtime() {
    RUNTIME.call_once(|| {
        console_error_panic_hook::set_once();
        wasm_logger::init(wasm_logger::Config::default());
    });
}

/// Plain JS object for a serializable value
pub(crate) fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let text = serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&text)
}
