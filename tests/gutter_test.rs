//! Gutter lifecycle, including teardown after the owning surface is gone

use editor_bindings::host::memory::MemoryHost;
use editor_bindings::host::{Callback, DecorationKind, GutterKind, GutterOptions, LineLabelRequest};
use editor_bindings::{
    Annotation, AnnotationProps, AnnotationStyle, Context, Gutter, GutterProps, Mark, MarkProps,
    Surface, SurfaceProps,
};
use std::rc::Rc;

fn gutter_props(name: &str) -> GutterProps {
    GutterProps {
        options: GutterOptions {
            name: name.to_string(),
            priority: 10,
            kind: GutterKind::Decorated,
            class_name: Some("diff-gutter".to_string()),
            ..GutterOptions::default()
        },
        ..GutterProps::default()
    }
}

fn surface() -> (Rc<MemoryHost>, Surface) {
    let host = MemoryHost::shared();
    let surface = Surface::mount(SurfaceProps::default(), &Context::root(host.clone())).unwrap();
    (host, surface)
}

#[test]
fn test_gutter_options_reach_host() {
    let (_host, surface) = surface();
    let gutter = Gutter::mount(gutter_props("diff-icons"), &surface.context()).unwrap();

    let options = gutter.gutter().unwrap().options();
    assert_eq!(options.priority, 10);
    assert_eq!(options.class_name.as_deref(), Some("diff-gutter"));
    assert_eq!(surface.editor().gutters().len(), 1);
}

#[test]
fn test_surface_unmounted_first() {
    let (host, mut surface) = surface();
    let mut gutter = Gutter::mount(gutter_props("diff-icons"), &surface.context()).unwrap();

    surface.unmount();

    assert_eq!(gutter.unmount(), Ok(()));
    assert_eq!(host.live_gutter_count(), 0);
}

#[test]
fn test_gutter_unmounted_first() {
    let (host, mut surface) = surface();
    let mut gutter = Gutter::mount(gutter_props("diff-icons"), &surface.context()).unwrap();

    gutter.unmount().unwrap();
    assert_eq!(host.live_gutter_count(), 0);

    surface.unmount();
    assert!(host.editors().is_empty());
}

#[test]
fn test_hide_and_show() {
    let (_host, surface) = surface();
    let mut props = gutter_props("diff-icons");
    let mut gutter = Gutter::mount(props.clone(), &surface.context()).unwrap();
    let handle = gutter.gutter().unwrap();

    props.options.visible = false;
    gutter.update(props.clone()).unwrap();
    assert!(!handle.is_visible());

    props.options.visible = true;
    gutter.update(props).unwrap();
    assert!(handle.is_visible());
    assert_eq!(gutter.gutter(), Some(handle));
}

#[test]
fn test_rename_recreates() {
    let (_host, surface) = surface();
    let mut gutter = Gutter::mount(gutter_props("old-name"), &surface.context()).unwrap();

    gutter.update(gutter_props("new-name")).unwrap();

    assert!(surface.editor().gutter_with_name("old-name").is_none());
    assert_eq!(surface.editor().gutter_with_name("new-name"), gutter.gutter());
}

fn labelled_props(label: &'static str) -> GutterProps {
    let mut props = gutter_props("diff-icons");
    props.options.label_fn = Some(Callback::new(move |_: &LineLabelRequest| label.to_string()));
    props
}

#[test]
fn test_rerender_with_fresh_label_keeps_decorations() {
    let (host, surface) = surface();
    let mut gutter = Gutter::mount(labelled_props("a"), &surface.context()).unwrap();
    let handle = gutter.gutter().unwrap();
    let mark = Mark::mount(MarkProps::default(), &surface.context()).unwrap();
    let annotation = Annotation::mount(
        AnnotationProps {
            style: AnnotationStyle {
                kind: DecorationKind::Gutter,
                gutter_name: Some("diff-icons".to_string()),
                ..AnnotationStyle::default()
            },
            ..AnnotationProps::default()
        },
        &mark.context(),
    )
    .unwrap();
    let decoration = annotation.decoration().unwrap();

    gutter.update(labelled_props("b")).unwrap();

    assert_eq!(gutter.gutter(), Some(handle));
    assert!(!decoration.is_destroyed());
    assert_eq!(host.live_decoration_count(), 1);
}
