// src/protocol.rs
//! Wire protocol between panel, background and content contexts
//!
//! Messages are JSON objects `{type, payload?, tabId?, generation?}`.
//! Responses are plain JSON objects shaped per request type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::font::{FontCapabilities, FontWeight};
use crate::state::StyleSelection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectCapabilitiesPayload {
    pub font_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckFontWeightsPayload {
    pub base_font_name: String,
    pub weight_suffixes: Vec<FontWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_typed_font_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_weight_suffix: Option<FontWeight>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckFeatureSupportPayload {
    pub font_family: String,
    /// Feature tag such as `liga` or `ss03`
    pub feature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertPayload {
    /// Full name, suffix included
    pub font_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    DetectCapabilities(DetectCapabilitiesPayload),
    CheckFontWeights(CheckFontWeightsPayload),
    ApplyFont(StyleSelection),
    CheckFeatureSupport(CheckFeatureSupportPayload),
    ResetAll,
    ResetFonts,
    RevertToPreviousFont(RevertPayload),
}

impl Request {
    /// Wire `type` value
    pub fn kind(&self) -> &'static str {
        match self {
            Request::DetectCapabilities(_) => "DETECT_CAPABILITIES",
            Request::CheckFontWeights(_) => "CHECK_FONT_WEIGHTS",
            Request::ApplyFont(_) => "APPLY_FONT",
            Request::CheckFeatureSupport(_) => "CHECK_FEATURE_SUPPORT",
            Request::ResetAll => "RESET_ALL",
            Request::ResetFonts => "RESET_FONTS",
            Request::RevertToPreviousFont(_) => "REVERT_TO_PREVIOUS_FONT",
        }
    }

    /// Response sent back when the request could not be delivered
    pub fn failure_response(&self, error: &str) -> Value {
        let response = match self {
            Request::DetectCapabilities(_) => serde_json::to_value(CapabilitiesResponse::failed(error)),
            Request::CheckFontWeights(payload) => {
                serde_json::to_value(WeightsResponse::failed(&payload.weight_suffixes, error))
            }
            Request::CheckFeatureSupport(_) => serde_json::to_value(FeatureSupportResponse { is_supported: false }),
            Request::ApplyFont(_) | Request::ResetAll | Request::ResetFonts | Request::RevertToPreviousFont(_) => {
                serde_json::to_value(SuccessResponse::failed(error))
            }
        };
        response.unwrap_or(Value::Null)
    }
}

/// A request plus routing metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(flatten)]
    pub request: Request,
    #[serde(rename = "tabId", default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u64>,
}

impl Envelope {
    pub fn new(request: Request) -> Self {
        Self {
            request,
            tab_id: None,
            generation: None,
        }
    }

    pub fn with_tab(mut self, tab_id: u32) -> Self {
        self.tab_id = Some(tab_id);
        self
    }

    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = Some(generation);
        self
    }

    pub fn kind(&self) -> &'static str {
        self.request.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilitiesResponse {
    /// `null` when the font was not found or detection failed
    pub capabilities: Option<FontCapabilities>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CapabilitiesResponse {
    pub fn found(capabilities: FontCapabilities) -> Self {
        Self {
            capabilities: Some(capabilities),
            error: None,
        }
    }

    pub fn failed(error: &str) -> Self {
        Self {
            capabilities: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightsResponse {
    pub available_weights: Vec<FontWeight>,
    /// Set when the weights could not be resolved; the weights then echo
    /// every candidate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WeightsResponse {
    pub fn resolved(available_weights: Vec<FontWeight>) -> Self {
        Self {
            available_weights,
            error: None,
        }
    }

    /// Fail-open answer: all candidates allowed
    pub fn failed(candidates: &[FontWeight], error: &str) -> Self {
        Self {
            available_weights: candidates.to_vec(),
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: &str) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSupportResponse {
    pub is_supported: bool,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = Envelope::new(Request::DetectCapabilities(DetectCapabilitiesPayload {
            font_name: "Georgia".to_string(),
        }))
        .with_tab(7)
        .with_generation(3);

        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"type": "DETECT_CAPABILITIES", "payload": {"fontName": "Georgia"}, "tabId": 7, "generation": 3})
        );
    }

    #[test]
    fn test_payloadless_requests() {
        let envelope: Envelope = serde_json::from_value(json!({"type": "RESET_ALL"})).unwrap();
        assert_eq!(envelope.request, Request::ResetAll);
        assert_eq!(envelope.tab_id, None);
        assert_eq!(
            serde_json::to_value(Envelope::new(Request::ResetFonts)).unwrap(),
            json!({"type": "RESET_FONTS"})
        );
    }

    #[test]
    fn test_weight_query_accepts_aliases() {
        let envelope: Envelope = serde_json::from_value(json!({
            "type": "CHECK_FONT_WEIGHTS",
            "payload": {
                "baseFontName": "CustomFont",
                "weightSuffixes": ["regular", "heavy", "demi-bold"],
                "userTypedFontName": "CustomFont-Bold",
                "userWeightSuffix": "bold"
            }
        }))
        .unwrap();
        let Request::CheckFontWeights(payload) = envelope.request else {
            panic!("wrong request kind");
        };
        assert_eq!(payload.weight_suffixes, vec![FontWeight::Regular, FontWeight::Black, FontWeight::SemiBold]);
        assert_eq!(payload.user_weight_suffix, Some(FontWeight::Bold));
    }

    #[test]
    fn test_apply_payload_optional_fields_default() {
        let envelope: Envelope = serde_json::from_value(json!({
            "type": "APPLY_FONT",
            "payload": {
                "fontName": "Georgia", "fontWeight": "regular", "textTransform": "none",
                "stylisticSets": [1], "swashLevel": 0, "liga": true, "dlig": false, "calt": true
            }
        }))
        .unwrap();
        let Request::ApplyFont(selection) = envelope.request else {
            panic!("wrong request kind");
        };
        assert!(selection.text_styles.is_empty());
        assert_eq!(selection.letter_spacing, 0.0);
    }

    #[test]
    fn test_failure_responses_are_shaped_per_request() {
        let detect = Request::DetectCapabilities(DetectCapabilitiesPayload { font_name: "X".to_string() });
        assert_eq!(detect.failure_response("No active tab"), json!({"capabilities": null, "error": "No active tab"}));
        assert_eq!(Request::ResetAll.failure_response("boom"), json!({"success": false, "error": "boom"}));

        let weights = Request::CheckFontWeights(CheckFontWeightsPayload {
            base_font_name: "X".to_string(),
            weight_suffixes: vec![FontWeight::Regular, FontWeight::Bold],
            user_typed_font_name: None,
            user_weight_suffix: None,
        });
        assert_eq!(
            weights.failure_response("boom"),
            json!({"availableWeights": ["regular", "bold"], "error": "boom"})
        );

        let feature = Request::CheckFeatureSupport(CheckFeatureSupportPayload {
            font_family: "X".to_string(),
            feature: "liga".to_string(),
        });
        assert_eq!(feature.failure_response("boom"), json!({"isSupported": false}));
    }
}
