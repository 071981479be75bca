//! Surface binding: owns one host editor and its mount point
//!
//! The editor is always created here, never adopted. Caller-supplied
//! `editor_cell` / `element_cell` are pure publish destinations, so tearing
//! the editor down on unmount can never destroy something the caller owns.

use super::{Context, Ownership};
use crate::cell::ValueCell;
use crate::config::SurfaceConfig;
use crate::error::BindingResult;
use crate::host::{
    Callback, CursorPositionChange, EditorHandle, EditorParams, ElementHandle, Selection,
    SelectionRangeChange,
};
use crate::subscription::SubscriptionSet;
use std::cell::RefCell;
use std::rc::Rc;

/// Class toggled on the editor element while the buffer is empty and
/// `hide_emptiness` is set
pub const EMPTY_CLASS: &str = "editor-surface--empty";

const MOUNT_CLASS: &str = "editor-surface";

#[derive(Debug, Clone, Default)]
pub struct SurfaceProps {
    pub config: SurfaceConfig,
    pub on_did_change_cursor_position: Option<Callback<CursorPositionChange>>,
    pub on_did_add_selection: Option<Callback<Selection>>,
    pub on_did_change_selection_range: Option<Callback<SelectionRangeChange>>,
    pub on_did_destroy_selection: Option<Callback<Selection>>,
    /// Where to publish the editor
    pub editor_cell: Option<ValueCell<EditorHandle>>,
    /// Where to publish the editor's element
    pub element_cell: Option<ValueCell<ElementHandle>>,
}

struct Shared {
    props: RefCell<SurfaceProps>,
    editor: EditorHandle,
}

impl Shared {
    fn refresh_emptiness(&self) {
        let hide_emptiness = self.props.borrow().config.hide_emptiness;
        let element = self.editor.element();
        if hide_emptiness && self.editor.is_empty() {
            element.add_class(EMPTY_CLASS);
        } else {
            element.remove_class(EMPTY_CLASS);
        }
    }
}

pub struct Surface {
    shared: Rc<Shared>,
    mount_point: ElementHandle,
    editor_cell: ValueCell<EditorHandle>,
    element_cell: ValueCell<ElementHandle>,
    subscriptions: SubscriptionSet,
    context: Context,
    mounted: bool,
}

impl Surface {
    pub fn mount(props: SurfaceProps, context: &Context) -> BindingResult<Self> {
        let host = context.host();
        let config = &props.config;

        let mount_point = host.create_element("div");
        mount_point.add_class(MOUNT_CLASS);

        let params = EditorParams {
            text: config.buffer.clone().unwrap_or_default(),
            mini: config.mini,
            display: config.display.clone(),
        };
        let editor = host.create_editor(&params, &mount_point)?;
        log::debug!("surface: created editor {}", editor.id());

        let element = editor.element();
        if let Some(tab_index) = config.tab_index {
            element.set_tab_index(tab_index);
        }
        if let Some(class_name) = &config.class_name {
            for class in class_name.split_whitespace() {
                element.add_class(class);
            }
        }
        if config.preselect {
            editor.select_all();
        }

        let editor_cell = props.editor_cell.clone().unwrap_or_default();
        let element_cell = props.element_cell.clone().unwrap_or_default();
        editor_cell.set(editor.clone());
        element_cell.set(element);

        let shared = Rc::new(Shared {
            props: RefCell::new(props),
            editor,
        });
        let subscriptions = bridge_events(&shared);
        shared.refresh_emptiness();

        Ok(Self {
            context: context.with_editor(editor_cell.clone()),
            shared,
            mount_point,
            editor_cell,
            element_cell,
            subscriptions,
            mounted: true,
        })
    }

    /// Re-apply the updatable display settings. Creation-only settings
    /// (`buffer`, `mini`) are ignored.
    pub fn update(&mut self, props: SurfaceProps) -> BindingResult<()> {
        if !self.mounted {
            return Ok(());
        }
        self.shared.editor.update(&props.config.display);
        *self.shared.props.borrow_mut() = props;
        self.shared.refresh_emptiness();
        Ok(())
    }

    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.subscriptions.dispose();
        self.shared.editor.destroy();
        log::debug!("surface: destroyed editor {}", self.shared.editor.id());
    }

    /// Context for nested bindings, carrying this surface's editor
    pub fn context(&self) -> Context {
        self.context.clone()
    }

    pub fn editor(&self) -> &EditorHandle {
        &self.shared.editor
    }

    pub fn element(&self) -> ElementHandle {
        self.shared.editor.element()
    }

    pub fn mount_point(&self) -> &ElementHandle {
        &self.mount_point
    }

    pub fn editor_cell(&self) -> &ValueCell<EditorHandle> {
        &self.editor_cell
    }

    pub fn element_cell(&self) -> &ValueCell<ElementHandle> {
        &self.element_cell
    }

    /// Surfaces always own their editor
    pub fn ownership(&self) -> Ownership {
        Ownership::Owned
    }

    pub fn is_empty_marked(&self) -> bool {
        self.element().has_class(EMPTY_CLASS)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Forward host editor events to whichever callbacks the current props hold.
/// Listeners only keep a weak reference, so the editor never keeps its own
/// binding state alive.
fn bridge_events(shared: &Rc<Shared>) -> SubscriptionSet {
    let mut subscriptions = SubscriptionSet::new();
    let editor = &shared.editor;

    let weak = Rc::downgrade(shared);
    subscriptions.add(editor.on_did_change_cursor_position(Box::new(move |event| {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let callback = shared.props.borrow().on_did_change_cursor_position.clone();
        if let Some(callback) = callback {
            callback.call(event);
        }
    })));

    let weak = Rc::downgrade(shared);
    subscriptions.add(editor.on_did_add_selection(Box::new(move |selection| {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let callback = shared.props.borrow().on_did_add_selection.clone();
        if let Some(callback) = callback {
            callback.call(selection);
        }
    })));

    let weak = Rc::downgrade(shared);
    subscriptions.add(editor.on_did_change_selection_range(Box::new(move |event| {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let callback = shared.props.borrow().on_did_change_selection_range.clone();
        if let Some(callback) = callback {
            callback.call(event);
        }
    })));

    let weak = Rc::downgrade(shared);
    subscriptions.add(editor.on_did_destroy_selection(Box::new(move |selection| {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let callback = shared.props.borrow().on_did_destroy_selection.clone();
        if let Some(callback) = callback {
            callback.call(selection);
        }
    })));

    let weak = Rc::downgrade(shared);
    subscriptions.add(editor.on_did_change(Box::new(move || {
        if let Some(shared) = weak.upgrade() {
            shared.refresh_emptiness();
        }
    })));

    subscriptions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;
    use crate::host::Point;
    use std::cell::Cell;

    fn mount(props: SurfaceProps) -> (Rc<MemoryHost>, Surface) {
        let host = MemoryHost::shared();
        let surface = Surface::mount(props, &Context::root(host.clone())).unwrap();
        (host, surface)
    }

    #[test]
    fn test_mount_without_buffer_is_empty() {
        let (_host, surface) = mount(SurfaceProps::default());
        assert_eq!(surface.editor().text(), "");
        assert!(surface.editor().is_empty());
    }

    #[test]
    fn test_mount_with_buffer_and_preselect() {
        let mut props = SurfaceProps::default();
        props.config.buffer = Some("precreated".to_string());
        props.config.preselect = true;

        let (_host, surface) = mount(props);

        assert_eq!(surface.editor().text(), "precreated");
        assert_eq!(
            surface.editor().selected_ranges(),
            vec![crate::host::Range::from([[0, 0], [0, 10]])]
        );
    }

    #[test]
    fn test_publishes_into_supplied_cells() {
        let editor_cell = ValueCell::new();
        let element_cell = ValueCell::new();
        let props = SurfaceProps {
            editor_cell: Some(editor_cell.clone()),
            element_cell: Some(element_cell.clone()),
            ..SurfaceProps::default()
        };

        let (_host, surface) = mount(props);

        assert_eq!(editor_cell.get().as_ref(), Some(surface.editor()));
        assert_eq!(element_cell.get(), Some(surface.element()));
        assert!(surface.context().editor().unwrap().same_cell(&editor_cell));
    }

    #[test]
    fn test_tab_index_and_classes() {
        let mut props = SurfaceProps::default();
        props.config.tab_index = Some(3);
        props.config.class_name = Some("first second".to_string());

        let (_host, surface) = mount(props);
        let element = surface.element();

        assert_eq!(element.tab_index(), Some(3));
        assert!(element.has_class("first"));
        assert!(element.has_class("second"));
        assert_eq!(surface.mount_point().child_count(), 1);
    }

    #[test]
    fn test_update_applies_display_config_only() {
        let mut props = SurfaceProps::default();
        props.config.buffer = Some("original".to_string());
        let (_host, mut surface) = mount(props.clone());

        props.config.buffer = Some("ignored".to_string());
        props.config.display.read_only = true;
        props.config.display.placeholder_text = Some("type here".to_string());
        surface.update(props).unwrap();

        let display = surface.editor().display_config();
        assert!(display.read_only);
        assert_eq!(display.placeholder_text.as_deref(), Some("type here"));
        assert_eq!(surface.editor().text(), "original");
    }

    #[test]
    fn test_emptiness_class_tracks_buffer() {
        let mut props = SurfaceProps::default();
        props.config.hide_emptiness = true;
        let (_host, mut surface) = mount(props.clone());
        assert!(surface.is_empty_marked());

        surface.editor().set_text("content");
        assert!(!surface.is_empty_marked());

        surface.editor().set_text("");
        assert!(surface.is_empty_marked());

        props.config.hide_emptiness = false;
        surface.update(props).unwrap();
        assert!(!surface.is_empty_marked());
    }

    #[test]
    fn test_cursor_callback_bridged() {
        let seen = Rc::new(Cell::new(None));
        let sink = Rc::clone(&seen);
        let props = SurfaceProps {
            on_did_change_cursor_position: Some(Callback::new(move |event: &CursorPositionChange| {
                sink.set(Some(event.new_position))
            })),
            ..SurfaceProps::default()
        };
        let (_host, surface) = mount(props);

        surface.editor().set_cursor_buffer_position(Point::new(0, 0));
        assert_eq!(seen.get(), None);

        surface.editor().set_text("abc");
        surface.editor().set_cursor_buffer_position(Point::new(0, 2));
        assert_eq!(seen.get(), Some(Point::new(0, 2)));
    }

    #[test]
    fn test_selection_callbacks_bridged() {
        let added = Rc::new(Cell::new(0));
        let destroyed = Rc::new(Cell::new(0));
        let changed = Rc::new(Cell::new(0));
        let (a, d, c) = (Rc::clone(&added), Rc::clone(&destroyed), Rc::clone(&changed));
        let props = SurfaceProps {
            on_did_add_selection: Some(Callback::new(move |_: &Selection| a.set(a.get() + 1))),
            on_did_destroy_selection: Some(Callback::new(move |_: &Selection| d.set(d.get() + 1))),
            on_did_change_selection_range: Some(Callback::new(move |_: &SelectionRangeChange| {
                c.set(c.get() + 1)
            })),
            ..SurfaceProps::default()
        };
        let (_host, surface) = mount(props);
        surface.editor().set_text("line one\nline two");

        surface
            .editor()
            .add_selection_for_buffer_range(crate::host::Range::from([[1, 0], [1, 4]]));
        surface.editor().select_all();

        assert_eq!(added.get(), 1);
        assert_eq!(destroyed.get(), 1);
        assert_eq!(changed.get(), 1);
    }

    #[test]
    fn test_unmount_destroys_editor_once() {
        let (host, mut surface) = mount(SurfaceProps::default());
        let editor = surface.editor().clone();

        surface.unmount();
        surface.unmount();

        assert!(editor.is_destroyed());
        assert!(host.editors().is_empty());
        assert!(!surface.is_mounted());
    }
}
