//! Serde-backed configuration for surfaces and decoration themes
//!
//! Everything here deserialises from camelCase JSON and falls back to the
//! same defaults the bindings use when a field is left out.

use crate::error::{BindingError, BindingResult};
use crate::host::DisplayConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parse a JSON document, logging failures with some context
pub fn from_json_str<T: DeserializeOwned>(json: &str, error_context: &str) -> BindingResult<T> {
    serde_json::from_str(json).map_err(|e| {
        let msg = format!("{}: {}", error_context, e);
        log::error!("{}", msg);
        BindingError::Config(msg)
    })
}

/// Read and parse a JSON file
pub fn from_json_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> BindingResult<T> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|e| {
        let msg = format!("Failed to read {}: {}", path.display(), e);
        log::error!("{}", msg);
        BindingError::Config(msg)
    })?;
    from_json_str(&json, &path.display().to_string())
}

pub fn to_json_string<T: Serialize>(value: &T) -> BindingResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Surface settings.
///
/// `buffer` and `mini` only matter when the editor is created. The flattened
/// [`DisplayConfig`] is re-applied on every update (its
/// `line_number_gutter_visible` also seeds the editor at creation).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SurfaceConfig {
    /// Initial buffer text
    pub buffer: Option<String>,
    pub mini: bool,
    #[serde(flatten)]
    pub display: DisplayConfig,
    pub tab_index: Option<i32>,
    /// Whitespace-separated classes for the editor element
    pub class_name: Option<String>,
    /// Select the whole buffer after creation
    pub preselect: bool,
    pub hide_emptiness: bool,
}

impl SurfaceConfig {
    pub fn from_json(json: &str) -> BindingResult<Self> {
        from_json_str(json, "Invalid surface config")
    }

    pub fn from_path(path: impl AsRef<Path>) -> BindingResult<Self> {
        from_json_file(path)
    }
}
