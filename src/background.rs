// src/background.rs
//! Service worker entry point

use std::rc::Rc;

use tracing::info;
use typeswap_web::{listen, BackgroundRelay, ChromeTabRouter};
use wasm_bindgen::prelude::*;

use crate::init_runtime;

/// Relay every panel request to its target tab
#[wasm_bindgen(js_name = startBackground)]
pub fn start_background() {
    init_runtime();
    let relay = Rc::new(BackgroundRelay::new(ChromeTabRouter::new()));
    listen(move |envelope| {
        let relay = Rc::clone(&relay);
        async move { relay.forward(envelope).await }
    });
    info!("background relay listening");
}
