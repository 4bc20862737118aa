//! Platform abstraction layer
//!
//! Browser bindings for the pure engine:
//! - DOM layout probe and style sink
//! - Reduced-motion detection
//! - Native and momentum scroll sources
//! - Mount lifecycle (resize debounce, settle timer, teardown)
//! - Camera/microphone capture and chunked media upload
//! - Web storage helpers

#[cfg(target_arch = "wasm32")]
pub mod capture;
#[cfg(target_arch = "wasm32")]
pub mod dom;
#[cfg(target_arch = "wasm32")]
pub mod events;
#[cfg(target_arch = "wasm32")]
pub mod motion;
#[cfg(target_arch = "wasm32")]
pub mod mount;
#[cfg(target_arch = "wasm32")]
pub mod scroll;
#[cfg(target_arch = "wasm32")]
pub mod storage;
#[cfg(target_arch = "wasm32")]
pub mod upload;

use thiserror::Error;

/// Browser setup failures
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("no window (not running in a browser)")]
    NoWindow,
    #[error("no document")]
    NoDocument,
    #[error("browser call failed: {0}")]
    Js(String),
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for PlatformError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        PlatformError::Js(format!("{value:?}"))
    }
}
