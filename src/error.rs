// src/error.rs
use thiserror::Error;
use typeswap_web::{ProbeError, StyleError, TypeswapError};
use wasm_bindgen::JsValue;

/// Failures surfaced to the extension's JS glue
#[derive(Error, Debug)]
pub enum ExtensionError {
    #[error("Page measurement unavailable: {0}")]
    Measurer(#[from] ProbeError),

    #[error("Page styling unavailable: {0}")]
    StyleHost(#[from] StyleError),

    #[error("{0}")]
    Request(#[from] TypeswapError),

    #[error("Invalid {field}: {message}")]
    InvalidArgument { field: &'static str, message: String },
}

impl From<ExtensionError> for JsValue {
    fn from(e: ExtensionError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}

pub type ExtensionResult<T> = Result<T, ExtensionError>;
