// src/content.rs
//! Content script entry point

use std::cell::RefCell;

use tracing::info;
use typeswap_web::{
    listen, ChromeStorage, ContentHandler, DomStyleHost, DomTextMeasurer, ExtensionConfig, ProbeConfig,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::error::ExtensionResult;
use crate::init_runtime;

/// Restore the stored override, then answer probe and style requests
#[wasm_bindgen(js_name = startContent)]
pub fn start_content() -> Result<(), JsValue> {
    init_runtime();
    Ok(spawn_content(ExtensionConfig::default())?)
}

fn spawn_content(config: ExtensionConfig) -> ExtensionResult<()> {
    let measurer = DomTextMeasurer::from_global()?;
    let host = DomStyleHost::from_global()?;
    let mut content = ContentHandler::with_config(measurer, host, ProbeConfig::default(), &config);

    spawn_local(async move {
        if content.restore(&ChromeStorage::new(), &config.storage_key).await {
            info!("stored font override restored");
        }
        let content = RefCell::new(content);
        listen(move |envelope| {
            let response = content.borrow_mut().handle(envelope);
            async move { response }
        });
        info!("content script listening");
    });
    Ok(())
}
