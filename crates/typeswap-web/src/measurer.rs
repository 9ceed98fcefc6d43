// src/measurer.rs
//! `TextMeasurer` over the live document
//!
//! A batch attaches one hidden off-screen container holding a span per probe,
//! forces a single layout by reading the container's offset width, then reads
//! computed style and bounding boxes. The container is removed when the batch
//! ends, whichever way it ends.

use js_sys::Reflect;
use tracing::{trace, warn};
use typeswap_core::{Measurement, ProbeError, ProbeSpec, TextMeasurer};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, FontFaceSet, HtmlElement, Window};

use crate::describe_js;

const CONTAINER_STYLE: &str =
    "position:absolute;left:-9999px;top:-9999px;visibility:hidden;white-space:nowrap;pointer-events:none";

fn dom(e: JsValue) -> ProbeError {
    ProbeError::Dom(describe_js(&e))
}

/// Attached probe container, detached on drop
struct AttachedProbes {
    container: Element,
}

impl Drop for AttachedProbes {
    fn drop(&mut self) {
        self.container.remove();
    }
}

pub struct DomTextMeasurer {
    window: Window,
    document: Document,
}

impl DomTextMeasurer {
    pub fn new(window: Window) -> Result<Self, ProbeError> {
        let document = window
            .document()
            .ok_or_else(|| ProbeError::Dom("window has no document".to_string()))?;
        Ok(Self { window, document })
    }

    /// Measurer for the global `window`
    pub fn from_global() -> Result<Self, ProbeError> {
        let window = web_sys::window().ok_or_else(|| ProbeError::Dom("no global window exists".to_string()))?;
        Self::new(window)
    }

    fn create_html(&self, tag: &str) -> Result<HtmlElement, ProbeError> {
        self.document
            .create_element(tag)
            .map_err(dom)?
            .dyn_into::<HtmlElement>()
            .map_err(|_| ProbeError::Dom(format!("<{}> is not an HTML element", tag)))
    }

    fn probe_node(&self, text: &str, spec: &ProbeSpec) -> Result<HtmlElement, ProbeError> {
        let span = self.create_html("span")?;
        span.set_text_content(Some(text));

        let size = format!("{}px", spec.size_px);
        let weight = spec.weight.to_string();
        let style = span.style();
        for (name, value) in [
            ("font-family", spec.font_family.as_str()),
            ("font-size", size.as_str()),
            ("font-weight", weight.as_str()),
            ("font-style", spec.style),
            ("font-variant", spec.variant),
            ("font-stretch", spec.stretch),
        ] {
            style.set_property(name, value).map_err(dom)?;
        }
        if let Some(settings) = &spec.feature_settings {
            style.set_property("font-feature-settings", settings).map_err(dom)?;
        }
        Ok(span)
    }

    fn read(&self, node: &HtmlElement, spec: &ProbeSpec) -> Result<Measurement, ProbeError> {
        let computed = self
            .window
            .get_computed_style(node)
            .map_err(dom)?
            .ok_or_else(|| ProbeError::Dom("no computed style for probe".to_string()))?;
        let rect = node.get_bounding_client_rect();
        let computed_weight = computed
            .get_property_value("font-weight")
            .map_err(dom)?
            .trim()
            .parse()
            .unwrap_or(spec.weight);

        Ok(Measurement {
            computed_family: computed.get_property_value("font-family").map_err(dom)?,
            computed_feature_settings: computed.get_property_value("font-feature-settings").map_err(dom)?,
            computed_weight,
            width: rect.width(),
            height: rect.height(),
        })
    }
}

impl TextMeasurer for DomTextMeasurer {
    fn is_ready(&self) -> bool {
        self.document.body().is_some()
    }

    fn measure_batch(&self, text: &str, specs: &[ProbeSpec]) -> Result<Vec<Measurement>, ProbeError> {
        let body = self.document.body().ok_or(ProbeError::NotReady)?;

        let container = self.create_html("div")?;
        container.set_attribute("style", CONTAINER_STYLE).map_err(dom)?;
        container.set_attribute("aria-hidden", "true").map_err(dom)?;
        let nodes = specs
            .iter()
            .map(|spec| {
                let node = self.probe_node(text, spec)?;
                container.append_child(&node).map_err(dom)?;
                Ok(node)
            })
            .collect::<Result<Vec<_>, ProbeError>>()?;

        body.append_child(&container).map_err(dom)?;
        let _attached = AttachedProbes {
            container: Element::from(container.clone()),
        };

        // single forced layout for the whole batch
        let _ = container.offset_width();
        trace!("measuring {} probes", nodes.len());

        nodes.iter().zip(specs).map(|(node, spec)| self.read(node, spec)).collect()
    }

    fn check_font(&self, font_shorthand: &str) -> Option<bool> {
        let fonts = Reflect::get(&self.document, &JsValue::from_str("fonts")).ok()?;
        if fonts.is_undefined() || fonts.is_null() {
            return None;
        }
        let fonts = fonts.dyn_into::<FontFaceSet>().ok()?;
        match fonts.check(font_shorthand) {
            Ok(loaded) => Some(loaded),
            Err(e) => {
                warn!("document.fonts.check({}) threw: {}", font_shorthand, describe_js(&e));
                None
            }
        }
    }
}
