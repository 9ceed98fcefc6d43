// src/style_host.rs
//! `StyleHost` writing `<style>` elements into the document head

use typeswap_core::{StyleError, StyleHost};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, NodeList};

use crate::describe_js;

pub struct DomStyleHost {
    document: Document,
}

impl DomStyleHost {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    pub fn from_global() -> Result<Self, StyleError> {
        web_sys::window()
            .and_then(|w| w.document())
            .map(Self::new)
            .ok_or_else(|| StyleError::Dom("no global document exists".to_string()))
    }

    fn matching(&self, id: &str) -> Option<NodeList> {
        let selector = format!("style[id=\"{}\"]", id.replace('"', "\\\""));
        self.document.query_selector_all(&selector).ok()
    }
}

impl StyleHost for DomStyleHost {
    fn insert_style(&mut self, id: &str, css: &str) -> Result<(), StyleError> {
        let head = self.document.head().ok_or(StyleError::NoHead)?;
        let style = self
            .document
            .create_element("style")
            .map_err(|e| StyleError::Dom(describe_js(&e)))?;
        style.set_id(id);
        style.set_text_content(Some(css));
        head.append_child(&style).map_err(|e| StyleError::Dom(describe_js(&e)))?;
        Ok(())
    }

    fn remove_style(&mut self, id: &str) -> usize {
        let Some(nodes) = self.matching(id) else {
            return 0;
        };
        // NodeList from querySelectorAll is static, removal does not shift it
        let mut removed = 0;
        for i in 0..nodes.length() {
            if let Some(element) = nodes.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                element.remove();
                removed += 1;
            }
        }
        removed
    }

    fn count_styles(&self, id: &str) -> usize {
        self.matching(id).map_or(0, |nodes| nodes.length() as usize)
    }
}
