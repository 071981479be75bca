//! In-memory host
//!
//! A complete, headless implementation of the host traits. Buffers are kept
//! as line vectors and markers are never moved by edits; everything else
//! (identity, destruction cascades, event delivery) behaves like a real
//! editor host. Layer and marker ids are allocated per editor, so two
//! editors hand out the same ids, which is exactly the situation the
//! stale-reference guards in the bindings exist for.

use super::*;
use crate::error::HostError;
use crate::subscription::{Emitter, Subscription};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n').map(|line| line.to_string()).collect()
}

// ============================================================================
// Elements
// ============================================================================

pub struct MemoryElement {
    tag: String,
    classes: RefCell<BTreeSet<String>>,
    tab_index: Cell<Option<i32>>,
    children: RefCell<Vec<ElementHandle>>,
}

impl MemoryElement {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            classes: RefCell::new(BTreeSet::new()),
            tab_index: Cell::new(None),
            children: RefCell::new(Vec::new()),
        }
    }

    pub fn classes(&self) -> Vec<String> {
        self.classes.borrow().iter().cloned().collect()
    }

    pub fn children(&self) -> Vec<ElementHandle> {
        self.children.borrow().clone()
    }
}

impl HostElement for MemoryElement {
    fn tag(&self) -> String {
        self.tag.clone()
    }

    fn add_class(&self, class: &str) {
        self.classes.borrow_mut().insert(class.to_string());
    }

    fn remove_class(&self, class: &str) {
        self.classes.borrow_mut().remove(class);
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.borrow().contains(class)
    }

    fn set_tab_index(&self, index: i32) {
        self.tab_index.set(Some(index));
    }

    fn tab_index(&self) -> Option<i32> {
        self.tab_index.get()
    }

    fn append_child(&self, child: &ElementHandle) {
        self.children.borrow_mut().push(child.clone());
    }

    fn child_count(&self) -> usize {
        self.children.borrow().len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Host
// ============================================================================

#[derive(Default)]
pub struct MemoryHost {
    next_editor_id: Cell<u64>,
    editors: RefCell<Vec<Rc<MemoryEditor>>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    fn build_editor(&self, params: &EditorParams) -> Rc<MemoryEditor> {
        let id = self.next_editor_id.get() + 1;
        self.next_editor_id.set(id);

        let editor = MemoryEditor::new(EditorId(id), params);
        self.editors.borrow_mut().push(Rc::clone(&editor));
        editor
    }

    /// An editor that is not attached to any mount point
    pub fn detached_editor(&self, text: &str) -> EditorHandle {
        let params = EditorParams {
            text: text.to_string(),
            ..EditorParams::default()
        };
        EditorHandle::new(self.build_editor(&params))
    }

    /// Live editors
    pub fn editors(&self) -> Vec<EditorHandle> {
        self.editors
            .borrow()
            .iter()
            .filter(|editor| !editor.destroyed.get())
            .map(|editor| EditorHandle::new(Rc::clone(editor) as Rc<dyn TextEditor>))
            .collect()
    }

    /// Live markers across every live editor, default layers included
    pub fn live_marker_count(&self) -> usize {
        self.live_editors()
            .iter()
            .map(|editor| {
                editor.default_layer.live_markers().len()
                    + editor
                        .live_layers()
                        .iter()
                        .map(|layer| layer.live_markers().len())
                        .sum::<usize>()
            })
            .sum()
    }

    /// Live non-default marker layers across every live editor
    pub fn live_layer_count(&self) -> usize {
        self.live_editors().iter().map(|editor| editor.live_layers().len()).sum()
    }

    pub fn live_decoration_count(&self) -> usize {
        self.live_editors().iter().map(|editor| editor.decorations().len()).sum()
    }

    pub fn live_gutter_count(&self) -> usize {
        self.live_editors().iter().map(|editor| editor.gutters().len()).sum()
    }

    /// Make gutter teardown on every live editor fail with
    /// [`HostError::Rejected`] until called again with `None`
    pub fn refuse_gutter_destroy(&self, reason: Option<&str>) {
        for editor in self.live_editors() {
            *editor.gutter_destroy_refusal.borrow_mut() = reason.map(str::to_string);
        }
    }

    fn live_editors(&self) -> Vec<Rc<MemoryEditor>> {
        self.editors
            .borrow()
            .iter()
            .filter(|editor| !editor.destroyed.get())
            .cloned()
            .collect()
    }
}

impl Host for MemoryHost {
    fn create_element(&self, tag: &str) -> ElementHandle {
        ElementHandle::new(Rc::new(MemoryElement::new(tag)))
    }

    fn create_editor(&self, params: &EditorParams, mount: &ElementHandle) -> HostResult<EditorHandle> {
        let editor = self.build_editor(params);
        mount.append_child(&editor.element);
        log::debug!("memory host: created editor {}", editor.id);
        Ok(EditorHandle::new(editor))
    }
}

// ============================================================================
// Editor
// ============================================================================

pub struct MemoryEditor {
    id: EditorId,
    this: Weak<MemoryEditor>,
    element: ElementHandle,
    mini: bool,
    lines: RefCell<Vec<String>>,
    display: RefCell<DisplayConfig>,
    destroyed: Cell<bool>,
    next_layer_id: Cell<u64>,
    next_marker_id: Rc<Cell<u64>>,
    next_selection_id: Cell<u64>,
    default_layer: Rc<MemoryLayer>,
    layers: RefCell<Vec<Rc<MemoryLayer>>>,
    decorations: RefCell<Vec<Rc<MemoryDecoration>>>,
    gutters: RefCell<Vec<Rc<MemoryGutter>>>,
    gutter_destroy_refusal: RefCell<Option<String>>,
    cursor: Cell<Point>,
    selections: RefCell<Vec<Selection>>,
    did_change: Emitter<()>,
    did_change_cursor_position: Emitter<CursorPositionChange>,
    did_add_selection: Emitter<Selection>,
    did_change_selection_range: Emitter<SelectionRangeChange>,
    did_destroy_selection: Emitter<Selection>,
    did_add_gutter: Emitter<GutterHandle>,
}

impl MemoryEditor {
    fn new(id: EditorId, params: &EditorParams) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<MemoryEditor>| {
            let next_marker_id = Rc::new(Cell::new(0));
            let default_layer = MemoryLayer::new(
                LayerId(0),
                this.clone(),
                LayerOptions::default(),
                Rc::clone(&next_marker_id),
            );

            Self {
                id,
                this: this.clone(),
                element: ElementHandle::new(Rc::new(MemoryElement::new("text-editor"))),
                mini: params.mini,
                lines: RefCell::new(split_lines(&params.text)),
                display: RefCell::new(params.display.clone()),
                destroyed: Cell::new(false),
                next_layer_id: Cell::new(0),
                next_marker_id,
                next_selection_id: Cell::new(1),
                default_layer,
                layers: RefCell::new(Vec::new()),
                decorations: RefCell::new(Vec::new()),
                gutters: RefCell::new(Vec::new()),
                gutter_destroy_refusal: RefCell::new(None),
                cursor: Cell::new(Point::zero()),
                selections: RefCell::new(vec![Selection {
                    id: SelectionId(0),
                    range: Range::default(),
                    reversed: false,
                }]),
                did_change: Emitter::new(),
                did_change_cursor_position: Emitter::new(),
                did_add_selection: Emitter::new(),
                did_change_selection_range: Emitter::new(),
                did_destroy_selection: Emitter::new(),
                did_add_gutter: Emitter::new(),
            }
        })
    }

    fn end_of_buffer(&self) -> Point {
        let lines = self.lines.borrow();
        let row = lines.len().saturating_sub(1);
        let column = lines.last().map(|line| line.chars().count()).unwrap_or(0);
        Point::new(row, column)
    }

    fn live_layers(&self) -> Vec<Rc<MemoryLayer>> {
        self.layers
            .borrow()
            .iter()
            .filter(|layer| !layer.destroyed.get())
            .cloned()
            .collect()
    }

    fn live_gutters(&self) -> Vec<Rc<MemoryGutter>> {
        self.gutters
            .borrow()
            .iter()
            .filter(|gutter| !gutter.destroyed.get())
            .cloned()
            .collect()
    }

    fn destroy_decorations_where(&self, predicate: impl Fn(&MemoryDecoration) -> bool) {
        let doomed: Vec<Rc<MemoryDecoration>> = self
            .decorations
            .borrow()
            .iter()
            .filter(|decoration| {
                let decoration: &MemoryDecoration = decoration;
                !decoration.destroyed.get() && predicate(decoration)
            })
            .cloned()
            .collect();
        for decoration in doomed {
            decoration.destroyed.set(true);
        }
    }

    fn add_decoration(&self, target: DecorationTarget, params: &DecorationParams) -> HostResult<DecorationHandle> {
        if self.destroyed.get() {
            return Err(HostError::AlreadyDestroyed { object: "editor" });
        }
        if params.kind == DecorationKind::Gutter {
            let name = params
                .gutter_name
                .as_deref()
                .ok_or_else(|| HostError::Rejected("gutter decorations need a gutter name".to_string()))?;
            if self.gutter_with_name(name).is_none() {
                return Err(HostError::GutterNotFound(name.to_string()));
            }
        }

        let decoration = Rc::new(MemoryDecoration {
            params: params.clone(),
            target,
            destroyed: Cell::new(false),
        });
        self.decorations.borrow_mut().push(Rc::clone(&decoration));
        Ok(DecorationHandle::new(decoration))
    }
}

impl TextEditor for MemoryEditor {
    fn id(&self) -> EditorId {
        self.id
    }

    fn element(&self) -> ElementHandle {
        self.element.clone()
    }

    fn text(&self) -> String {
        self.lines.borrow().join("\n")
    }

    fn set_text(&self, text: &str) {
        *self.lines.borrow_mut() = split_lines(text);
        self.did_change.emit(&());
    }

    fn is_empty(&self) -> bool {
        let lines = self.lines.borrow();
        lines.len() == 1 && lines[0].is_empty()
    }

    fn is_mini(&self) -> bool {
        self.mini
    }

    fn display_config(&self) -> DisplayConfig {
        self.display.borrow().clone()
    }

    fn update(&self, config: &DisplayConfig) {
        *self.display.borrow_mut() = config.clone();
    }

    fn select_all(&self) {
        let full = Range::new(Point::zero(), self.end_of_buffer());
        self.set_selected_buffer_range(full);
    }

    fn selected_ranges(&self) -> Vec<Range> {
        self.selections.borrow().iter().map(|selection| selection.range).collect()
    }

    fn cursor_buffer_position(&self) -> Point {
        self.cursor.get()
    }

    fn set_cursor_buffer_position(&self, position: Point) {
        let old_position = self.cursor.replace(position);
        if old_position != position {
            self.did_change_cursor_position.emit(&CursorPositionChange {
                old_position,
                new_position: position,
                text_changed: false,
            });
        }
    }

    fn add_selection_for_buffer_range(&self, range: Range) -> Selection {
        let id = self.next_selection_id.get();
        self.next_selection_id.set(id + 1);

        let selection = Selection {
            id: SelectionId(id),
            range,
            reversed: false,
        };
        self.selections.borrow_mut().push(selection);
        self.did_add_selection.emit(&selection);
        selection
    }

    fn set_selected_buffer_range(&self, range: Range) {
        self.clear_selections();

        let change = {
            let mut selections = self.selections.borrow_mut();
            let primary = &mut selections[0];
            let old_range = primary.range;
            primary.range = range;
            (old_range != range).then_some(SelectionRangeChange {
                selection: primary.id,
                old_range,
                new_range: range,
            })
        };

        if let Some(change) = change {
            self.did_change_selection_range.emit(&change);
        }
        self.set_cursor_buffer_position(range.end);
    }

    fn clear_selections(&self) {
        let removed: Vec<Selection> = {
            let mut selections = self.selections.borrow_mut();
            selections.drain(1..).collect()
        };
        for selection in removed {
            self.did_destroy_selection.emit(&selection);
        }
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    fn destroy(&self) {
        if self.destroyed.get() {
            return;
        }

        for gutter in self.live_gutters() {
            gutter.destroyed.set(true);
        }
        for layer in self.live_layers() {
            layer.destroy();
        }
        self.default_layer.destroy();
        self.destroy_decorations_where(|_| true);
        self.destroyed.set(true);

        self.did_change.clear();
        self.did_change_cursor_position.clear();
        self.did_add_selection.clear();
        self.did_change_selection_range.clear();
        self.did_destroy_selection.clear();
        self.did_add_gutter.clear();
        log::debug!("memory host: destroyed editor {}", self.id);
    }

    fn add_marker_layer(&self, options: &LayerOptions) -> MarkerLayerHandle {
        let id = self.next_layer_id.get() + 1;
        self.next_layer_id.set(id);

        let layer = MemoryLayer::new(
            LayerId(id),
            self.this.clone(),
            *options,
            Rc::clone(&self.next_marker_id),
        );
        self.layers.borrow_mut().push(Rc::clone(&layer));
        MarkerLayerHandle::new(layer)
    }

    fn marker_layer(&self, id: LayerId) -> Option<MarkerLayerHandle> {
        if id == self.default_layer.id {
            return Some(self.default_marker_layer());
        }
        self.live_layers()
            .into_iter()
            .find(|layer| layer.id == id)
            .map(|layer| MarkerLayerHandle::new(layer))
    }

    fn default_marker_layer(&self) -> MarkerLayerHandle {
        MarkerLayerHandle::new(Rc::clone(&self.default_layer) as Rc<dyn MarkerLayer>)
    }

    fn mark_buffer_range(&self, range: Range, properties: &MarkerProperties) -> MarkerHandle {
        self.default_layer.mark_buffer_range(range, properties)
    }

    fn marker(&self, id: MarkerId) -> Option<MarkerHandle> {
        self.default_layer.marker(id)
    }

    fn decorate_marker(&self, marker: &MarkerHandle, params: &DecorationParams) -> HostResult<DecorationHandle> {
        if marker.is_destroyed() {
            return Err(HostError::AlreadyDestroyed { object: "marker" });
        }
        self.add_decoration(DecorationTarget::Marker(marker.id()), params)
    }

    fn decorate_marker_layer(
        &self,
        layer: &MarkerLayerHandle,
        params: &DecorationParams,
    ) -> HostResult<DecorationHandle> {
        if layer.is_destroyed() {
            return Err(HostError::AlreadyDestroyed { object: "marker layer" });
        }
        self.add_decoration(DecorationTarget::Layer(layer.id()), params)
    }

    fn decorations(&self) -> Vec<DecorationHandle> {
        let mut decorations = self.decorations.borrow_mut();
        decorations.retain(|decoration| !decoration.destroyed.get());
        decorations
            .iter()
            .map(|decoration| DecorationHandle::new(Rc::clone(decoration) as Rc<dyn Decoration>))
            .collect()
    }

    fn add_gutter(&self, options: &GutterOptions) -> HostResult<GutterHandle> {
        if self.destroyed.get() {
            return Err(HostError::AlreadyDestroyed { object: "editor" });
        }
        if self.gutter_with_name(&options.name).is_some() {
            return Err(HostError::DuplicateGutter(options.name.clone()));
        }

        let gutter = Rc::new(MemoryGutter {
            editor: self.this.clone(),
            options: options.clone(),
            visible: Cell::new(options.visible),
            destroyed: Cell::new(false),
        });
        self.gutters.borrow_mut().push(Rc::clone(&gutter));

        let handle = GutterHandle::new(gutter);
        self.did_add_gutter.emit(&handle);
        Ok(handle)
    }

    fn gutter_with_name(&self, name: &str) -> Option<GutterHandle> {
        self.live_gutters()
            .into_iter()
            .find(|gutter| gutter.options.name == name)
            .map(|gutter| GutterHandle::new(gutter))
    }

    fn gutters(&self) -> Vec<GutterHandle> {
        self.live_gutters()
            .into_iter()
            .map(|gutter| GutterHandle::new(gutter))
            .collect()
    }

    fn observe_gutters(&self, callback: Box<dyn Fn(&GutterHandle)>) -> Subscription {
        let callback: Rc<dyn Fn(&GutterHandle)> = Rc::from(callback);
        for gutter in self.gutters() {
            callback(&gutter);
        }
        self.did_add_gutter.on(move |gutter| callback(gutter))
    }

    fn on_did_change(&self, callback: Box<dyn Fn()>) -> Subscription {
        self.did_change.on(move |_| callback())
    }

    fn on_did_change_cursor_position(&self, callback: Box<dyn Fn(&CursorPositionChange)>) -> Subscription {
        self.did_change_cursor_position.on(move |event| callback(event))
    }

    fn on_did_add_selection(&self, callback: Box<dyn Fn(&Selection)>) -> Subscription {
        self.did_add_selection.on(move |event| callback(event))
    }

    fn on_did_change_selection_range(&self, callback: Box<dyn Fn(&SelectionRangeChange)>) -> Subscription {
        self.did_change_selection_range.on(move |event| callback(event))
    }

    fn on_did_destroy_selection(&self, callback: Box<dyn Fn(&Selection)>) -> Subscription {
        self.did_destroy_selection.on(move |event| callback(event))
    }
}

// ============================================================================
// Marker layers and markers
// ============================================================================

pub struct MemoryLayer {
    id: LayerId,
    this: Weak<MemoryLayer>,
    editor: Weak<MemoryEditor>,
    options: LayerOptions,
    markers: RefCell<Vec<Rc<MemoryMarker>>>,
    next_marker_id: Rc<Cell<u64>>,
    destroyed: Cell<bool>,
}

impl MemoryLayer {
    fn new(
        id: LayerId,
        editor: Weak<MemoryEditor>,
        options: LayerOptions,
        next_marker_id: Rc<Cell<u64>>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<MemoryLayer>| Self {
            id,
            this: this.clone(),
            editor,
            options,
            markers: RefCell::new(Vec::new()),
            next_marker_id,
            destroyed: Cell::new(false),
        })
    }

    fn live_markers(&self) -> Vec<Rc<MemoryMarker>> {
        self.markers
            .borrow()
            .iter()
            .filter(|marker| !marker.destroyed.get())
            .cloned()
            .collect()
    }
}

impl MarkerLayer for MemoryLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn options(&self) -> LayerOptions {
        self.options
    }

    fn mark_buffer_range(&self, range: Range, properties: &MarkerProperties) -> MarkerHandle {
        let id = self.next_marker_id.get() + 1;
        self.next_marker_id.set(id);

        let marker = Rc::new(MemoryMarker {
            id: MarkerId(id),
            layer: self.this.clone(),
            editor: self.editor.clone(),
            range: Cell::new(range),
            properties: Cell::new(*properties),
            destroyed: Cell::new(false),
            did_change: Emitter::new(),
        });
        self.markers.borrow_mut().push(Rc::clone(&marker));
        MarkerHandle::new(marker)
    }

    fn marker(&self, id: MarkerId) -> Option<MarkerHandle> {
        self.live_markers()
            .into_iter()
            .find(|marker| marker.id == id)
            .map(|marker| MarkerHandle::new(marker))
    }

    fn marker_count(&self) -> usize {
        self.live_markers().len()
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        for marker in self.live_markers() {
            marker.destroy();
        }
        if let Some(editor) = self.editor.upgrade() {
            let target = DecorationTarget::Layer(self.id);
            editor.destroy_decorations_where(|decoration| decoration.target == target);
        }
    }
}

pub struct MemoryMarker {
    id: MarkerId,
    layer: Weak<MemoryLayer>,
    editor: Weak<MemoryEditor>,
    range: Cell<Range>,
    properties: Cell<MarkerProperties>,
    destroyed: Cell<bool>,
    did_change: Emitter<MarkerChange>,
}

impl MemoryMarker {
    fn head_and_tail(&self, range: Range) -> (Point, Point) {
        if self.properties.get().reversed {
            (range.start, range.end)
        } else {
            (range.end, range.start)
        }
    }
}

impl Marker for MemoryMarker {
    fn id(&self) -> MarkerId {
        self.id
    }

    fn layer(&self) -> Option<MarkerLayerHandle> {
        self.layer.upgrade().map(|layer| MarkerLayerHandle::new(layer))
    }

    fn buffer_range(&self) -> Range {
        self.range.get()
    }

    fn set_buffer_range(&self, range: Range) {
        let old_range = self.range.replace(range);
        if self.destroyed.get() || old_range == range {
            return;
        }

        let (old_head, old_tail) = self.head_and_tail(old_range);
        let (new_head, new_tail) = self.head_and_tail(range);
        self.did_change.emit(&MarkerChange {
            old_head,
            new_head,
            old_tail,
            new_tail,
            was_valid: true,
            is_valid: true,
            text_changed: false,
        });
    }

    fn properties(&self) -> MarkerProperties {
        self.properties.get()
    }

    fn set_properties(&self, properties: &MarkerProperties) {
        self.properties.set(*properties);
    }

    fn is_reversed(&self) -> bool {
        self.properties.get().reversed
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        self.did_change.clear();
        if let Some(editor) = self.editor.upgrade() {
            let target = DecorationTarget::Marker(self.id);
            editor.destroy_decorations_where(|decoration| decoration.target == target);
        }
    }

    fn on_did_change(&self, callback: Box<dyn Fn(&MarkerChange)>) -> Subscription {
        self.did_change.on(move |event| callback(event))
    }
}

// ============================================================================
// Decorations and gutters
// ============================================================================

pub struct MemoryDecoration {
    params: DecorationParams,
    target: DecorationTarget,
    destroyed: Cell<bool>,
}

impl Decoration for MemoryDecoration {
    fn params(&self) -> DecorationParams {
        self.params.clone()
    }

    fn target(&self) -> DecorationTarget {
        self.target
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    fn destroy(&self) {
        self.destroyed.set(true);
    }
}

pub struct MemoryGutter {
    editor: Weak<MemoryEditor>,
    options: GutterOptions,
    visible: Cell<bool>,
    destroyed: Cell<bool>,
}

impl Gutter for MemoryGutter {
    fn name(&self) -> String {
        self.options.name.clone()
    }

    fn options(&self) -> GutterOptions {
        self.options.clone()
    }

    fn is_visible(&self) -> bool {
        self.visible.get()
    }

    fn show(&self) {
        self.visible.set(true);
    }

    fn hide(&self) {
        self.visible.set(false);
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    fn destroy(&self) -> HostResult<()> {
        if self.destroyed.get() {
            return Err(HostError::AlreadyDestroyed { object: "gutter" });
        }
        if let Some(editor) = self.editor.upgrade() {
            let refusal = editor.gutter_destroy_refusal.borrow().clone();
            if let Some(reason) = refusal {
                return Err(HostError::Rejected(reason));
            }
        }
        self.destroyed.set(true);
        if let Some(editor) = self.editor.upgrade() {
            let name = self.options.name.as_str();
            editor.destroy_decorations_where(|decoration| {
                decoration.params.kind == DecorationKind::Gutter
                    && decoration.params.gutter_name.as_deref() == Some(name)
            });
        }
        Ok(())
    }
}
