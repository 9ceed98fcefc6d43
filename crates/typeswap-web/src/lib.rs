//! Typeswap Web - browser backend for typeswap-core
//!
//! This crate implements the typeswap-core seams on top of `web-sys` and the
//! extension APIs: text measurement and style elements against the live
//! document, settings in `chrome.storage.sync`, and messaging through
//! `chrome.runtime` and `chrome.tabs`.

use js_sys::Reflect;
use wasm_bindgen::JsValue;

mod chrome;
mod measurer;
mod style_host;

pub use chrome::{listen, ChromeStorage, ChromeTabRouter, ChromeTransport};
pub use measurer::DomTextMeasurer;
pub use style_host::DomStyleHost;

// Re-export typeswap-core types for convenience
pub use typeswap_core::*;

/// Readable text for a thrown or rejected JS value
pub(crate) fn describe_js(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    if let Some(message) = Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
    {
        return message;
    }
    format!("{:?}", value)
}
