//! Error conversion at the JS boundary

use wasm_bindgen::JsValue;

/// Render any engine-side error as a JS string value
pub(crate) fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}
