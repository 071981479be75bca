//! JavaScript entry points
//!
//! The bindings themselves are driven from Rust. What JS gets is config
//! handling: view code hands in a JSON document and receives it back with
//! every default filled in, or a descriptive error string.

use crate::bindings::AnnotationStyle;
use crate::config::{to_json_string, SurfaceConfig};
use crate::error::BindingError;
use wasm_bindgen::prelude::*;

fn to_js_error(err: BindingError) -> JsValue {
    log::warn!("api: {}", err);
    JsValue::from_str(&err.to_string())
}

/// Fill in the defaults of a surface config
#[wasm_bindgen(js_name = normalizeSurfaceConfig)]
pub fn normalize_surface_config(json: &str) -> Result<String, JsValue> {
    let config = SurfaceConfig::from_json(json).map_err(to_js_error)?;
    to_json_string(&config).map_err(to_js_error)
}

/// Fill in the defaults of a decoration style, rejecting gutter styles
/// without a gutter name
#[wasm_bindgen(js_name = normalizeAnnotationStyle)]
pub fn normalize_annotation_style(json: &str) -> Result<String, JsValue> {
    let style = AnnotationStyle::from_json(json).map_err(to_js_error)?;
    to_json_string(&style).map_err(to_js_error)
}
