//! Typeswap Core - DOM-agnostic font override core
//!
//! This crate holds the font capability probing heuristics, the style rule
//! derivation and the message plumbing of the extension, written against
//! the seams in `traits` so everything runs without a browser.

pub mod background;
pub mod config;
pub mod constants;
pub mod content;
pub mod dummy_backend;
pub mod error;
pub mod font;
pub mod panel;
pub mod protocol;
pub mod relay;
pub mod state;
pub mod style;
pub mod traits;

// Re-export main types
pub use background::BackgroundRelay;
pub use config::{ExtensionConfig, ProbeConfig, Tolerance};
pub use content::ContentHandler;
pub use error::{TypeswapError, TypeswapResult};
pub use font::{FontCapabilities, FontWeight, OpenTypeFeature};
pub use panel::{CommitOutcome, FontInput, PanelController, PanelView};
pub use protocol::{Envelope, Request};
pub use relay::{local_channel, FontChannel, LocalEndpoint, LocalTransport, Responder};
pub use state::{StyleSelection, TextTransform};
pub use style::{RuleHandle, StyleInjector, StyleRule};

// Re-export traits and types
pub use traits::*;
