// src/chrome.rs
//! Extension API bindings: storage, runtime messaging and tab routing
//!
//! The MV3 `chrome.*` calls return promises when no callback is passed, so
//! every binding is a plain `catch` import awaited through `JsFuture`.
//! Messages cross the boundary as JSON.

use std::future::Future;

use js_sys::{Array, Function, Object, Promise, Reflect, JSON};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use typeswap_core::{Envelope, SettingsStore, TabRouter, Transport, TypeswapError};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{spawn_local, JsFuture};

use crate::describe_js;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "runtime"], js_name = sendMessage)]
    fn runtime_send_message(message: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "runtime", "onMessage"], js_name = addListener)]
    fn add_message_listener(listener: &Closure<dyn FnMut(JsValue, JsValue, Function) -> bool>);

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = query)]
    fn tabs_query(query: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = sendMessage)]
    fn tabs_send_message(tab_id: u32, message: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "sync"], js_name = get)]
    fn storage_sync_get(keys: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "sync"], js_name = set)]
    fn storage_sync_set(items: &JsValue) -> Result<Promise, JsValue>;
}

fn delivery_failed(e: JsValue) -> TypeswapError {
    TypeswapError::DeliveryFailed {
        message: describe_js(&e),
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, TypeswapError> {
    let text = serde_json::to_string(value)?;
    JSON::parse(&text).map_err(delivery_failed)
}

fn from_js(value: &JsValue) -> Result<Value, TypeswapError> {
    if value.is_undefined() {
        return Ok(Value::Null);
    }
    let text = String::from(JSON::stringify(value).map_err(delivery_failed)?);
    Ok(serde_json::from_str(&text)?)
}

/// Await a `chrome.*` promise and decode the JSON it resolves to
async fn round_trip(kind: &str, promise: Result<Promise, JsValue>) -> Result<Value, TypeswapError> {
    let response = JsFuture::from(promise.map_err(delivery_failed)?)
        .await
        .map_err(delivery_failed)?;
    if response.is_undefined() {
        return Err(TypeswapError::NoResponder {
            request: kind.to_string(),
        });
    }
    from_js(&response)
}

/// `Transport` over `chrome.runtime.sendMessage` (panel to background)
#[derive(Clone, Debug, Default)]
pub struct ChromeTransport;

impl ChromeTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for ChromeTransport {
    async fn send(&self, envelope: Envelope) -> Result<Value, TypeswapError> {
        let message = to_js(&envelope)?;
        round_trip(envelope.kind(), runtime_send_message(&message)).await
    }
}

/// `TabRouter` over `chrome.tabs` (background to content)
#[derive(Clone, Debug, Default)]
pub struct ChromeTabRouter;

impl ChromeTabRouter {
    pub fn new() -> Self {
        Self
    }
}

impl TabRouter for ChromeTabRouter {
    async fn active_tab(&self) -> Option<u32> {
        let query = to_js(&json!({"active": true, "currentWindow": true})).ok()?;
        let tabs = JsFuture::from(tabs_query(&query).ok()?).await.ok()?;
        let first = Array::from(&tabs).get(0);
        let id = Reflect::get(&first, &JsValue::from_str("id")).ok()?.as_f64()?;
        Some(id as u32)
    }

    async fn send_to_tab(&self, tab_id: u32, envelope: Envelope) -> Result<Value, TypeswapError> {
        let message = to_js(&envelope)?;
        round_trip(envelope.kind(), tabs_send_message(tab_id, &message)).await
    }
}

/// `SettingsStore` over `chrome.storage.sync`; values are stored as JSON objects
#[derive(Clone, Debug, Default)]
pub struct ChromeStorage;

impl ChromeStorage {
    pub fn new() -> Self {
        Self
    }
}

impl SettingsStore for ChromeStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, String> {
        let promise = storage_sync_get(&JsValue::from_str(key)).map_err(|e| describe_js(&e))?;
        let items = JsFuture::from(promise).await.map_err(|e| describe_js(&e))?;
        let value = Reflect::get(&items, &JsValue::from_str(key)).map_err(|e| describe_js(&e))?;
        if value.is_undefined() || value.is_null() {
            return Ok(None);
        }
        let text = JSON::stringify(&value).map_err(|e| describe_js(&e))?;
        Ok(Some(String::from(text)))
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), String> {
        let parsed = JSON::parse(value).map_err(|e| describe_js(&e))?;
        let items = Object::new();
        Reflect::set(&items, &JsValue::from_str(key), &parsed).map_err(|e| describe_js(&e))?;
        let promise = storage_sync_set(&items).map_err(|e| describe_js(&e))?;
        JsFuture::from(promise).await.map_err(|e| describe_js(&e))?;
        Ok(())
    }
}

/// Answer every protocol message this context receives with `handler`.
///
/// Messages that do not decode as an envelope are left for other listeners.
/// The listener lives as long as the page.
pub fn listen<F, Fut>(handler: F)
where
    F: Fn(Envelope) -> Fut + 'static,
    Fut: Future<Output = Value> + 'static,
{
    let listener = Closure::<dyn FnMut(JsValue, JsValue, Function) -> bool>::new(
        move |message: JsValue, _sender: JsValue, send_response: Function| {
            let envelope = match from_js(&message)
                .and_then(|value| serde_json::from_value::<Envelope>(value).map_err(TypeswapError::from))
            {
                Ok(envelope) => envelope,
                Err(e) => {
                    debug!("ignoring message: {}", e);
                    return false;
                }
            };

            let kind = envelope.kind();
            let response = handler(envelope);
            spawn_local(async move {
                let value = response.await;
                let sent = to_js(&value)
                    .and_then(|js| send_response.call1(&JsValue::NULL, &js).map_err(delivery_failed));
                if let Err(e) = sent {
                    warn!("could not answer {}: {}", kind, e);
                }
            });
            // keep the channel open for the async reply
            true
        },
    );
    add_message_listener(&listener);
    listener.forget();
}
