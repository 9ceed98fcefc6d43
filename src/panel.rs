// src/panel.rs
//! Popup panel facade
//!
//! Each method hands back a promise so the popup's event handlers can await
//! the request and then re-render from `view()`.

use std::future::Future;
use std::rc::Rc;
use std::str::FromStr;

use js_sys::Promise;
use serde::Serialize;
use typeswap_web::{
    ChromeStorage, ChromeTransport, ExtensionConfig, FontChannel, FontWeight, PanelController, TextTransform,
    TypeswapError, TypeswapResult,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::error::ExtensionError;
use crate::{init_runtime, to_js};

type Controller = PanelController<ChromeTransport, ChromeStorage>;

#[wasm_bindgen]
pub struct Panel {
    controller: Rc<Controller>,
}

impl Panel {
    fn run<F, Fut, T>(&self, action: F) -> Promise
    where
        F: FnOnce(Rc<Controller>) -> Fut + 'static,
        Fut: Future<Output = TypeswapResult<T>> + 'static,
        T: Serialize,
    {
        let controller = Rc::clone(&self.controller);
        future_to_promise(async move {
            let value = action(controller).await.map_err(ExtensionError::from)?;
            to_js(&value)
        })
    }

    fn rejected(error: ExtensionError) -> Promise {
        Promise::reject(&JsValue::from(error))
    }
}

#[wasm_bindgen]
impl Panel {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Panel {
        init_runtime();
        let config = ExtensionConfig::default();
        let channel = FontChannel::new(ChromeTransport::new());
        Panel {
            controller: Rc::new(PanelController::with_config(channel, ChromeStorage::new(), &config)),
        }
    }

    /// Snapshot to render from
    pub fn view(&self) -> Result<JsValue, JsValue> {
        to_js(&self.controller.view())
    }

    /// Restore the stored selection; resolves to it
    pub fn load(&self) -> Promise {
        self.run(|c| async move { Ok::<_, TypeswapError>(c.load().await) })
    }

    /// Resolves to `applied`, `cleared`, `notFound` or `superseded`
    pub fn commit(&self, font_name: String) -> Promise {
        self.run(|c| async move { c.commit_font_name(&font_name).await })
    }

    #[wasm_bindgen(js_name = setWeight)]
    pub fn set_weight(&self, weight: &str) -> Promise {
        match FontWeight::from_str(weight) {
            Ok(weight) => self.run(move |c| async move { c.set_weight(weight).await }),
            Err(message) => Self::rejected(ExtensionError::InvalidArgument {
                field: "weight",
                message,
            }),
        }
    }

    #[wasm_bindgen(js_name = setTextTransform)]
    pub fn set_text_transform(&self, transform: &str) -> Promise {
        match TextTransform::from_str(transform) {
            Ok(transform) => self.run(move |c| async move { c.set_text_transform(transform).await }),
            Err(message) => Self::rejected(ExtensionError::InvalidArgument {
                field: "textTransform",
                message,
            }),
        }
    }

    #[wasm_bindgen(js_name = toggleStylisticSet)]
    pub fn toggle_stylistic_set(&self, n: u8) -> Promise {
        self.run(move |c| async move { c.toggle_stylistic_set(n).await })
    }

    #[wasm_bindgen(js_name = setSwashLevel)]
    pub fn set_swash_level(&self, level: u8) -> Promise {
        self.run(move |c| async move { c.set_swash_level(level).await })
    }

    #[wasm_bindgen(js_name = setLigatures)]
    pub fn set_ligatures(&self, on: bool) -> Promise {
        self.run(move |c| async move { c.set_ligatures(on).await })
    }

    #[wasm_bindgen(js_name = setDiscretionaryLigatures)]
    pub fn set_discretionary_ligatures(&self, on: bool) -> Promise {
        self.run(move |c| async move { c.set_discretionary_ligatures(on).await })
    }

    #[wasm_bindgen(js_name = setContextualAlternates)]
    pub fn set_contextual_alternates(&self, on: bool) -> Promise {
        self.run(move |c| async move { c.set_contextual_alternates(on).await })
    }

    #[wasm_bindgen(js_name = toggleTextStyle)]
    pub fn toggle_text_style(&self, selector: String) -> Promise {
        self.run(|c| async move { c.toggle_text_style(&selector).await })
    }

    #[wasm_bindgen(js_name = setLetterSpacing)]
    pub fn set_letter_spacing(&self, em: f32) -> Promise {
        self.run(move |c| async move { c.set_letter_spacing(em).await })
    }

    /// Resolves to `false` when there is no previous font
    pub fn revert(&self) -> Promise {
        self.run(|c| async move { c.revert_to_previous().await })
    }

    #[wasm_bindgen(js_name = resetAll)]
    pub fn reset_all(&self) -> Promise {
        self.run(|c| async move { c.reset_all().await })
    }

    #[wasm_bindgen(js_name = resetFonts)]
    pub fn reset_fonts(&self) -> Promise {
        self.run(|c| async move { c.reset_fonts().await })
    }
}

impl Default for Panel {
    fn default() -> Self {
        Self::new()
    }
}
