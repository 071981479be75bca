//! Host text-editing API boundary
//!
//! The bindings never render text or store buffers themselves. They drive a
//! host through the traits in this module: an element factory and editor
//! constructor ([`Host`]), DOM-like nodes ([`HostElement`]), editors, marker
//! layers, markers, decorations and gutters.
//!
//! Host objects are shared through handle types that compare by reference
//! identity. Two handles are equal only if they point at the same host
//! object, which is what [`crate::ValueCell`] uses to suppress repeated
//! notifications.

pub mod memory;
pub mod types;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use types::*;

use crate::error::HostError;
use crate::subscription::Subscription;
use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

pub type HostResult<T> = Result<T, HostError>;

macro_rules! host_handle {
    ($(#[$meta:meta])* $name:ident => $trait_:ident) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name(Rc<dyn $trait_>);

        impl $name {
            pub fn new(inner: Rc<dyn $trait_>) -> Self {
                Self(inner)
            }

            pub fn ptr_eq(&self, other: &Self) -> bool {
                Rc::as_ptr(&self.0) as *const () == Rc::as_ptr(&other.0) as *const ()
            }
        }

        impl Deref for $name {
            type Target = dyn $trait_;

            fn deref(&self) -> &Self::Target {
                &*self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.ptr_eq(other)
            }
        }

        impl Eq for $name {}

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:p})", stringify!($name), Rc::as_ptr(&self.0) as *const ())
            }
        }
    };
}

host_handle!(
    /// Shared reference to a DOM-like host node
    ElementHandle => HostElement
);
host_handle!(
    /// Shared reference to a host editor
    EditorHandle => TextEditor
);
host_handle!(MarkerLayerHandle => MarkerLayer);
host_handle!(MarkerHandle => Marker);
host_handle!(DecorationHandle => Decoration);
host_handle!(GutterHandle => Gutter);

/// Entry point into a host environment
pub trait Host {
    fn create_element(&self, tag: &str) -> ElementHandle;

    /// Build an editor and attach its element beneath `mount`
    fn create_editor(&self, params: &EditorParams, mount: &ElementHandle) -> HostResult<EditorHandle>;
}

pub trait HostElement {
    fn tag(&self) -> String;
    fn add_class(&self, class: &str);
    fn remove_class(&self, class: &str);
    fn has_class(&self, class: &str) -> bool;
    fn set_tab_index(&self, index: i32);
    fn tab_index(&self) -> Option<i32>;
    fn append_child(&self, child: &ElementHandle);
    fn child_count(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
}

pub trait TextEditor {
    fn id(&self) -> EditorId;
    fn element(&self) -> ElementHandle;

    fn text(&self) -> String;
    fn set_text(&self, text: &str);
    fn is_empty(&self) -> bool;
    fn is_mini(&self) -> bool;

    fn display_config(&self) -> DisplayConfig;
    fn update(&self, config: &DisplayConfig);

    fn select_all(&self);
    fn selected_ranges(&self) -> Vec<Range>;
    fn cursor_buffer_position(&self) -> Point;
    fn set_cursor_buffer_position(&self, position: Point);
    fn add_selection_for_buffer_range(&self, range: Range) -> Selection;
    fn set_selected_buffer_range(&self, range: Range);
    /// Drop every selection except the first
    fn clear_selections(&self);

    fn is_destroyed(&self) -> bool;
    fn destroy(&self);

    fn add_marker_layer(&self, options: &LayerOptions) -> MarkerLayerHandle;
    fn marker_layer(&self, id: LayerId) -> Option<MarkerLayerHandle>;
    fn default_marker_layer(&self) -> MarkerLayerHandle;
    /// Mark a range on the default marker layer
    fn mark_buffer_range(&self, range: Range, properties: &MarkerProperties) -> MarkerHandle;
    /// Look up a marker on the default marker layer
    fn marker(&self, id: MarkerId) -> Option<MarkerHandle>;

    fn decorate_marker(&self, marker: &MarkerHandle, params: &DecorationParams) -> HostResult<DecorationHandle>;
    fn decorate_marker_layer(
        &self,
        layer: &MarkerLayerHandle,
        params: &DecorationParams,
    ) -> HostResult<DecorationHandle>;
    /// Live decorations
    fn decorations(&self) -> Vec<DecorationHandle>;

    fn add_gutter(&self, options: &GutterOptions) -> HostResult<GutterHandle>;
    fn gutter_with_name(&self, name: &str) -> Option<GutterHandle>;
    fn gutters(&self) -> Vec<GutterHandle>;
    /// Call back for every existing gutter and every gutter added later
    fn observe_gutters(&self, callback: Box<dyn Fn(&GutterHandle)>) -> Subscription;

    fn on_did_change(&self, callback: Box<dyn Fn()>) -> Subscription;
    fn on_did_change_cursor_position(&self, callback: Box<dyn Fn(&CursorPositionChange)>) -> Subscription;
    fn on_did_add_selection(&self, callback: Box<dyn Fn(&Selection)>) -> Subscription;
    fn on_did_change_selection_range(&self, callback: Box<dyn Fn(&SelectionRangeChange)>) -> Subscription;
    fn on_did_destroy_selection(&self, callback: Box<dyn Fn(&Selection)>) -> Subscription;
}

pub trait MarkerLayer {
    fn id(&self) -> LayerId;
    fn options(&self) -> LayerOptions;
    fn mark_buffer_range(&self, range: Range, properties: &MarkerProperties) -> MarkerHandle;
    fn marker(&self, id: MarkerId) -> Option<MarkerHandle>;
    fn marker_count(&self) -> usize;
    fn is_destroyed(&self) -> bool;
    fn destroy(&self);
}

pub trait Marker {
    fn id(&self) -> MarkerId;
    /// The layer holding this marker, while it is still reachable
    fn layer(&self) -> Option<MarkerLayerHandle>;
    fn buffer_range(&self) -> Range;
    fn set_buffer_range(&self, range: Range);
    fn properties(&self) -> MarkerProperties;
    fn set_properties(&self, properties: &MarkerProperties);
    fn is_reversed(&self) -> bool;
    fn is_destroyed(&self) -> bool;
    fn destroy(&self);
    fn on_did_change(&self, callback: Box<dyn Fn(&MarkerChange)>) -> Subscription;
}

pub trait Decoration {
    fn params(&self) -> DecorationParams;
    fn target(&self) -> DecorationTarget;
    fn is_destroyed(&self) -> bool;
    fn destroy(&self);
}

pub trait Gutter {
    fn name(&self) -> String;
    fn options(&self) -> GutterOptions;
    fn is_visible(&self) -> bool;
    fn show(&self);
    fn hide(&self);
    fn is_destroyed(&self) -> bool;
    /// Fails with [`HostError::AlreadyDestroyed`] on a second call
    fn destroy(&self) -> HostResult<()>;
}
