//! DOM element adapter and the JS config entry points
//!
//! Runs in a browser through wasm-bindgen-test.

#![cfg(target_arch = "wasm32")]

use editor_bindings::api::{normalize_annotation_style, normalize_surface_config};
use editor_bindings::host::web::{create_element, DomElement};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn test_classes_round_trip() {
    let element = create_element("div").unwrap();
    element.add_class("editor-surface--empty");
    assert!(element.has_class("editor-surface--empty"));

    element.remove_class("editor-surface--empty");
    assert!(!element.has_class("editor-surface--empty"));
}

#[wasm_bindgen_test]
fn test_tab_index_attribute() {
    let element = create_element("div").unwrap();
    assert_eq!(element.tab_index(), None);

    element.set_tab_index(2);
    assert_eq!(element.tab_index(), Some(2));
}

#[wasm_bindgen_test]
fn test_append_child() {
    let parent = create_element("div").unwrap();
    let child = create_element("span").unwrap();

    parent.append_child(&child);

    assert_eq!(parent.child_count(), 1);
    assert_eq!(child.tag(), "span");
}

#[wasm_bindgen_test]
fn test_wraps_existing_element() {
    let document = web_sys::window().unwrap().document().unwrap();
    let raw = document.create_element("section").unwrap();
    raw.set_class_name("preset");

    let handle = DomElement::handle(raw);

    assert!(handle.has_class("preset"));
}

#[wasm_bindgen_test]
fn test_surface_config_defaults_filled_in() {
    let json = normalize_surface_config(r#"{"buffer": "hi"}"#).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["buffer"], "hi");
    assert_eq!(value["lineNumberGutterVisible"], true);
    assert_eq!(value["mini"], false);
}

#[wasm_bindgen_test]
fn test_gutter_style_without_name_rejected() {
    let err = normalize_annotation_style(r#"{"kind": "gutter"}"#).unwrap_err();
    assert!(err.as_string().unwrap().contains("gutter name"));
}
