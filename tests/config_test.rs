//! Loading surface configuration from disk

use editor_bindings::host::memory::MemoryHost;
use editor_bindings::{BindingError, Context, Surface, SurfaceConfig, SurfaceProps};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"buffer": "from disk", "softWrapped": true, "preselect": true, "hideEmptiness": true}}"#
    )
    .unwrap();

    let config = SurfaceConfig::from_path(file.path()).unwrap();

    assert_eq!(config.buffer.as_deref(), Some("from disk"));
    assert!(config.display.soft_wrapped);
    assert!(config.preselect);
    assert!(config.hide_emptiness);
}

#[test]
fn test_loaded_config_mounts_surface() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("surface.json");
    std::fs::write(&path, r#"{"buffer": "", "hideEmptiness": true, "tabIndex": -1}"#).unwrap();

    let config = SurfaceConfig::from_path(&path).unwrap();
    let host = MemoryHost::shared();
    let surface = Surface::mount(
        SurfaceProps {
            config,
            ..SurfaceProps::default()
        },
        &Context::root(host),
    )
    .unwrap();

    assert!(surface.is_empty_marked());
    assert_eq!(surface.element().tab_index(), Some(-1));
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SurfaceConfig::from_path(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, BindingError::Config(_)));
}

#[test]
fn test_wrong_type_is_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(br#"{"mini": "yes"}"#).unwrap();

    let err = SurfaceConfig::from_path(file.path()).unwrap_err();
    assert!(matches!(err, BindingError::Config(_)));
}
