//! Error types
//!
//! Animation itself never fails. Errors only come from the host environment
//! (missing window, no 2d context) or from a malformed options blob.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RippleError {
    /// The browser refused an operation (no window, no 2d context, DOM call threw)
    #[error("host environment error: {0}")]
    Host(String),
    /// Options could not be parsed
    #[error("invalid ripple options: {0}")]
    Options(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RippleError>;

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for RippleError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        RippleError::Host(
            value
                .as_string()
                .unwrap_or_else(|| format!("{:?}", value)),
        )
    }
}

#[cfg(target_arch = "wasm32")]
impl From<RippleError> for wasm_bindgen::JsValue {
    fn from(err: RippleError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}
