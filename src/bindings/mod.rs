//! Declarative bindings onto host editor resources
//!
//! Each binding follows the same lifecycle: `mount` with props and a
//! [`Context`], `update` with new props, `unmount` (also run on drop).
//! Targets are resolved explicitly: a prop always wins over whatever the
//! enclosing binding published into the context.
//!
//! The resolution chain is:
//!
//! - [`Surface`] publishes its editor.
//! - [`Layer`] publishes its marker layer as both a markable target and a
//!   decorable target.
//! - [`Mark`] publishes its marker as a decorable target.
//! - [`Annotation`] and [`Gutter`] are leaves.

pub mod annotation;
pub mod gutter;
pub mod layer;
pub mod mark;
pub mod surface;

pub use annotation::{Annotation, AnnotationProps, AnnotationStyle};
pub use gutter::{Gutter, GutterProps};
pub use layer::{Layer, LayerProps};
pub use mark::{Mark, MarkChange, MarkProps};
pub use surface::{Surface, SurfaceProps, EMPTY_CLASS};

use crate::cell::ValueCell;
use crate::host::{
    DecorationHandle, DecorationParams, EditorHandle, Host, HostResult, MarkerHandle, MarkerId,
    MarkerLayerHandle, MarkerProperties, Range,
};
use std::rc::Rc;

/// Whether a binding created a host object or merely found it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Created here, destroyed here
    Owned,
    /// Located by identity, never destroyed here
    Adopted,
}

/// A resolved host object together with who is responsible for it
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<H> {
    pub handle: H,
    pub ownership: Ownership,
}

impl<H> Resolved<H> {
    pub fn owned(handle: H) -> Self {
        Self {
            handle,
            ownership: Ownership::Owned,
        }
    }

    pub fn adopted(handle: H) -> Self {
        Self {
            handle,
            ownership: Ownership::Adopted,
        }
    }

    pub fn is_owned(&self) -> bool {
        self.ownership == Ownership::Owned
    }
}

/// Something a marker can be created on
#[derive(Debug, Clone, PartialEq)]
pub enum Markable {
    Editor(EditorHandle),
    Layer(MarkerLayerHandle),
}

impl Markable {
    pub fn mark_buffer_range(&self, range: Range, properties: &MarkerProperties) -> MarkerHandle {
        match self {
            Markable::Editor(editor) => editor.mark_buffer_range(range, properties),
            Markable::Layer(layer) => layer.mark_buffer_range(range, properties),
        }
    }

    pub fn marker(&self, id: MarkerId) -> Option<MarkerHandle> {
        match self {
            Markable::Editor(editor) => editor.marker(id),
            Markable::Layer(layer) => layer.marker(id),
        }
    }

    pub fn is_destroyed(&self) -> bool {
        match self {
            Markable::Editor(editor) => editor.is_destroyed(),
            Markable::Layer(layer) => layer.is_destroyed(),
        }
    }
}

/// Something a decoration can be attached to, paired with the editor
/// method that decorates it
#[derive(Debug, Clone, PartialEq)]
pub enum Decorable {
    Marker(MarkerHandle),
    Layer(MarkerLayerHandle),
}

impl Decorable {
    pub fn is_destroyed(&self) -> bool {
        match self {
            Decorable::Marker(marker) => marker.is_destroyed(),
            Decorable::Layer(layer) => layer.is_destroyed(),
        }
    }

    /// The marker layer underneath this target
    pub fn layer(&self) -> Option<MarkerLayerHandle> {
        match self {
            Decorable::Marker(marker) => marker.layer(),
            Decorable::Layer(layer) => Some(layer.clone()),
        }
    }

    /// Whether `editor` really holds this target's layer, rather than some
    /// other layer that happens to share its id
    pub fn belongs_to(&self, editor: &EditorHandle) -> bool {
        match self.layer() {
            Some(layer) => editor
                .marker_layer(layer.id())
                .map_or(false, |found| found == layer),
            None => false,
        }
    }

    pub fn decorate(&self, editor: &EditorHandle, params: &DecorationParams) -> HostResult<DecorationHandle> {
        match self {
            Decorable::Marker(marker) => editor.decorate_marker(marker, params),
            Decorable::Layer(layer) => editor.decorate_marker_layer(layer, params),
        }
    }
}

/// Values published by enclosing bindings, passed down explicitly
#[derive(Clone)]
pub struct Context {
    host: Rc<dyn Host>,
    editor: Option<ValueCell<EditorHandle>>,
    layer: Option<ValueCell<MarkerLayerHandle>>,
    decorable: Option<ValueCell<Decorable>>,
}

impl Context {
    /// A context with nothing inherited yet
    pub fn root(host: Rc<dyn Host>) -> Self {
        Self {
            host,
            editor: None,
            layer: None,
            decorable: None,
        }
    }

    pub fn host(&self) -> &Rc<dyn Host> {
        &self.host
    }

    pub fn editor(&self) -> Option<&ValueCell<EditorHandle>> {
        self.editor.as_ref()
    }

    pub fn layer(&self) -> Option<&ValueCell<MarkerLayerHandle>> {
        self.layer.as_ref()
    }

    pub fn decorable(&self) -> Option<&ValueCell<Decorable>> {
        self.decorable.as_ref()
    }

    pub fn with_editor(&self, editor: ValueCell<EditorHandle>) -> Self {
        Self {
            editor: Some(editor),
            ..self.clone()
        }
    }

    pub fn with_layer(&self, layer: ValueCell<MarkerLayerHandle>) -> Self {
        Self {
            layer: Some(layer),
            ..self.clone()
        }
    }

    pub fn with_decorable(&self, decorable: ValueCell<Decorable>) -> Self {
        Self {
            decorable: Some(decorable),
            ..self.clone()
        }
    }
}

/// Whether two optional sources point at the same cell
pub(crate) fn same_source<T: Clone + PartialEq + 'static>(
    a: Option<&ValueCell<T>>,
    b: Option<&ValueCell<T>>,
) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.same_cell(b),
        (None, None) => true,
        _ => false,
    }
}
