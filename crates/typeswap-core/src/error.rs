// src/error.rs
use thiserror::Error;

use crate::traits::{ProbeError, StyleError};

/// Error hierarchy for the override extension
/// Covers transport, storage and page-side failures. Probe ambiguity is never
/// an error: heuristics resolve it to a default verdict instead.
#[derive(Error, Debug)]
pub enum TypeswapError {
    // Transport and relay errors
    #[error("Relay channel closed: {destination}")]
    ChannelClosed { destination: String },

    #[error("No responder for {request}")]
    NoResponder { request: String },

    #[error("No active tab")]
    NoActiveTab,

    #[error("Message delivery failed: {message}")]
    DeliveryFailed { message: String },

    #[error("Unexpected response to {request}: {message}")]
    UnexpectedResponse { request: String, message: String },

    // Page-side errors
    #[error("Probe failed: {source}")]
    Probe {
        #[from]
        source: ProbeError,
    },

    #[error("Style injection failed: {source}")]
    Style {
        #[from]
        source: StyleError,
    },

    // Persistence and serialization errors
    #[error("Settings storage error: {message}")]
    Storage { message: String },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    // Input errors
    #[error("Invalid selection: {field} = {value}")]
    InvalidSelection { field: String, value: String },
}

pub type TypeswapResult<T> = Result<T, TypeswapError>;
