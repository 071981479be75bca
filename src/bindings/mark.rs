//! Mark binding: creates or references a single range marker
//!
//! The markable target is picked in this order: explicit `layer` prop,
//! explicit `editor` prop, inherited layer, inherited editor. Range and
//! property changes are applied to the live marker; only a target or id
//! change tears it down.

use super::{same_source, Context, Decorable, Markable, Ownership, Resolved};
use crate::cell::ValueCell;
use crate::error::{BindingError, BindingResult};
use crate::host::{
    Callback, EditorHandle, MarkerChange, MarkerHandle, MarkerId, MarkerLayerHandle,
    MarkerProperties, MarkerPropertyOverrides, Point, Range,
};
use crate::subscription::Subscription;
use std::cell::RefCell;
use std::rc::Rc;

/// A marker movement with head and tail folded into ordered ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkChange {
    pub old_range: Range,
    pub new_range: Range,
    pub was_valid: bool,
    pub is_valid: bool,
    pub text_changed: bool,
}

impl MarkChange {
    pub fn from_marker_change(change: &MarkerChange, reversed: bool) -> Self {
        Self {
            old_range: fold(change.old_head, change.old_tail, reversed),
            new_range: fold(change.new_head, change.new_tail, reversed),
            was_valid: change.was_valid,
            is_valid: change.is_valid,
            text_changed: change.text_changed,
        }
    }
}

fn fold(head: Point, tail: Point, reversed: bool) -> Range {
    if reversed {
        Range::new(head, tail)
    } else {
        Range::new(tail, head)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MarkProps {
    pub editor: Option<ValueCell<EditorHandle>>,
    pub layer: Option<ValueCell<MarkerLayerHandle>>,
    pub range: Range,
    /// Only the fields set here are written to the marker
    pub properties: MarkerPropertyOverrides,
    /// Reference an existing marker instead of creating one
    pub id: Option<MarkerId>,
    pub on_did_change: Option<Callback<MarkChange>>,
    pub on_did_change_id: Option<Callback<Option<MarkerId>>>,
    pub on_did_resolve: Option<Callback<Option<MarkerHandle>>>,
}

#[derive(Debug, Clone)]
enum MarkableSource {
    Editor(ValueCell<EditorHandle>),
    Layer(ValueCell<MarkerLayerHandle>),
}

impl MarkableSource {
    fn resolve(props: &MarkProps, context: &Context) -> Option<Self> {
        if let Some(layer) = &props.layer {
            return Some(MarkableSource::Layer(layer.clone()));
        }
        if let Some(editor) = &props.editor {
            return Some(MarkableSource::Editor(editor.clone()));
        }
        if let Some(layer) = context.layer() {
            return Some(MarkableSource::Layer(layer.clone()));
        }
        context.editor().cloned().map(MarkableSource::Editor)
    }

    fn same(a: Option<&Self>, b: Option<&Self>) -> bool {
        match (a, b) {
            (Some(MarkableSource::Editor(a)), Some(MarkableSource::Editor(b))) => {
                same_source(Some(a), Some(b))
            }
            (Some(MarkableSource::Layer(a)), Some(MarkableSource::Layer(b))) => {
                same_source(Some(a), Some(b))
            }
            (None, None) => true,
            _ => false,
        }
    }

    fn observe(&self, callback: impl Fn(Markable) + 'static) -> Subscription {
        match self {
            MarkableSource::Editor(cell) => {
                cell.observe(move |editor| callback(Markable::Editor(editor.clone())))
            }
            MarkableSource::Layer(cell) => {
                cell.observe(move |layer| callback(Markable::Layer(layer.clone())))
            }
        }
    }
}

struct Shared {
    props: RefCell<MarkProps>,
    resolved: RefCell<Option<Resolved<MarkerHandle>>>,
    marker_subscription: RefCell<Option<Subscription>>,
    decorable_cell: ValueCell<Decorable>,
    last_error: RefCell<Option<BindingError>>,
}

impl Shared {
    fn attach(self: &Rc<Self>, markable: &Markable) {
        self.detach();
        if markable.is_destroyed() {
            log::debug!("mark: target is destroyed, nothing to attach");
            return;
        }

        let (range, properties, id) = {
            let props = self.props.borrow();
            (props.range, props.properties, props.id)
        };

        let resolved = match id {
            None => {
                let properties = properties.apply_to(MarkerProperties::default());
                let marker = markable.mark_buffer_range(range, &properties);
                log::debug!("mark: created marker {} at {}", marker.id(), range);
                Resolved::owned(marker)
            }
            Some(id) => match markable.marker(id) {
                Some(marker) => {
                    if !properties.is_empty() {
                        marker.set_properties(&properties.apply_to(marker.properties()));
                    }
                    log::debug!("mark: referenced marker {}", id);
                    Resolved::adopted(marker)
                }
                None => {
                    let err = BindingError::InvalidMarkerId(id);
                    log::error!("mark: {}", err);
                    *self.last_error.borrow_mut() = Some(err);
                    return;
                }
            },
        };

        let marker = resolved.handle.clone();
        *self.resolved.borrow_mut() = Some(resolved);

        let weak = Rc::downgrade(self);
        let subscription = marker.on_did_change(Box::new(move |change| {
            if let Some(shared) = weak.upgrade() {
                shared.forward_change(change);
            }
        }));
        *self.marker_subscription.borrow_mut() = Some(subscription);

        self.decorable_cell.set(Decorable::Marker(marker.clone()));
        self.publish(Some(marker));
    }

    fn detach(&self) {
        let subscription = self.marker_subscription.borrow_mut().take();
        drop(subscription);

        let Some(resolved) = self.resolved.borrow_mut().take() else {
            return;
        };
        if resolved.is_owned() {
            log::debug!("mark: destroying marker {}", resolved.handle.id());
            resolved.handle.destroy();
            self.publish(None);
        }
    }

    fn forward_change(&self, change: &MarkerChange) {
        let reversed = match self.marker() {
            Some(marker) => marker.is_reversed(),
            None => return,
        };
        let callback = self.props.borrow().on_did_change.clone();
        if let Some(callback) = callback {
            callback.call(&MarkChange::from_marker_change(change, reversed));
        }
    }

    fn publish(&self, marker: Option<MarkerHandle>) {
        let (on_id, on_resolve) = {
            let props = self.props.borrow();
            (props.on_did_change_id.clone(), props.on_did_resolve.clone())
        };
        if let Some(callback) = on_id {
            callback.call(&marker.as_ref().map(|marker| marker.id()));
        }
        if let Some(callback) = on_resolve {
            callback.call(&marker);
        }
    }

    fn marker(&self) -> Option<MarkerHandle> {
        self.resolved
            .borrow()
            .as_ref()
            .map(|resolved| resolved.handle.clone())
    }

    fn take_error(&self) -> Option<BindingError> {
        self.last_error.borrow_mut().take()
    }
}

pub struct Mark {
    shared: Rc<Shared>,
    parent: Context,
    source: Option<MarkableSource>,
    subscription: Option<Subscription>,
    mounted: bool,
}

impl Mark {
    /// Fails with [`BindingError::InvalidMarkerId`] when a referenced marker
    /// is missing from an already-resolved target.
    pub fn mount(props: MarkProps, context: &Context) -> BindingResult<Self> {
        let source = MarkableSource::resolve(&props, context);
        let shared = Rc::new(Shared {
            props: RefCell::new(props),
            resolved: RefCell::new(None),
            marker_subscription: RefCell::new(None),
            decorable_cell: ValueCell::new(),
            last_error: RefCell::new(None),
        });

        let mut mark = Self {
            shared,
            parent: context.clone(),
            source,
            subscription: None,
            mounted: true,
        };
        mark.observe_source();

        match mark.shared.take_error() {
            Some(err) => Err(err),
            None => Ok(mark),
        }
    }

    pub fn update(&mut self, props: MarkProps) -> BindingResult<()> {
        if !self.mounted {
            return Ok(());
        }

        let source = MarkableSource::resolve(&props, &self.parent);
        let (old_range, old_properties, old_id) = {
            let old = self.shared.props.borrow();
            (old.range, old.properties, old.id)
        };
        let retarget = !MarkableSource::same(source.as_ref(), self.source.as_ref()) || props.id != old_id;
        let (range, properties) = (props.range, props.properties);
        *self.shared.props.borrow_mut() = props;

        if retarget {
            self.subscription = None;
            self.shared.detach();
            self.source = source;
            self.observe_source();
        } else if let Some(marker) = self.shared.marker() {
            if properties != old_properties && !properties.is_empty() {
                marker.set_properties(&properties.apply_to(marker.properties()));
            }
            if range != old_range {
                marker.set_buffer_range(range);
            }
        }

        match self.shared.take_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.subscription = None;
        self.shared.detach();
    }

    fn observe_source(&mut self) {
        let Some(source) = &self.source else {
            log::debug!("mark: no markable target");
            return;
        };
        let weak = Rc::downgrade(&self.shared);
        self.subscription = Some(source.observe(move |markable| {
            if let Some(shared) = weak.upgrade() {
                shared.attach(&markable);
            }
        }));
    }

    /// Context for nested annotations
    pub fn context(&self) -> Context {
        let context = match &self.shared.props.borrow().editor {
            Some(editor) => self.parent.with_editor(editor.clone()),
            None => self.parent.clone(),
        };
        context.with_decorable(self.shared.decorable_cell.clone())
    }

    pub fn marker(&self) -> Option<MarkerHandle> {
        self.shared.marker()
    }

    pub fn ownership(&self) -> Option<Ownership> {
        self.shared
            .resolved
            .borrow()
            .as_ref()
            .map(|resolved| resolved.ownership)
    }

    pub fn decorable_cell(&self) -> &ValueCell<Decorable> {
        &self.shared.decorable_cell
    }

    /// A deferred resolution failure not yet reported through `update`
    pub fn last_error(&self) -> Option<BindingError> {
        self.shared.last_error.borrow().clone()
    }
}

impl Drop for Mark {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;
    use crate::host::{InvalidationStrategy, LayerOptions, MarkerProperties};

    fn setup() -> (Rc<MemoryHost>, EditorHandle, Context) {
        let host = MemoryHost::shared();
        let editor = host.detached_editor("0123456789\nsecond line");
        let context = Context::root(host.clone()).with_editor(ValueCell::with_value(editor.clone()));
        (host, editor, context)
    }

    #[test]
    fn test_fold_respects_reversal() {
        let change = MarkerChange {
            old_head: Point::new(0, 4),
            new_head: Point::new(1, 2),
            old_tail: Point::new(0, 0),
            new_tail: Point::new(1, 0),
            was_valid: true,
            is_valid: false,
            text_changed: true,
        };

        let forward = MarkChange::from_marker_change(&change, false);
        assert_eq!(forward.old_range, Range::from([[0, 0], [0, 4]]));
        assert_eq!(forward.new_range, Range::from([[1, 0], [1, 2]]));
        assert!(forward.text_changed);
        assert!(!forward.is_valid);

        let backward = MarkChange::from_marker_change(&change, true);
        assert_eq!(backward.old_range, forward.old_range);
    }

    #[test]
    fn test_create_mode() {
        let (host, _editor, context) = setup();
        let props = MarkProps {
            range: Range::from([[0, 0], [10, 0]]),
            ..MarkProps::default()
        };

        let mut mark = Mark::mount(props, &context).unwrap();
        let marker = mark.marker().unwrap();
        assert_eq!(marker.buffer_range(), Range::from([[0, 0], [10, 0]]));
        assert_eq!(marker.properties().invalidate, InvalidationStrategy::Overlap);
        assert_eq!(mark.ownership(), Some(Ownership::Owned));

        mark.unmount();
        assert!(marker.is_destroyed());
        assert_eq!(host.live_marker_count(), 0);
    }

    #[test]
    fn test_missing_id_fails() {
        let (_host, _editor, context) = setup();
        let props = MarkProps {
            id: Some(MarkerId(42)),
            ..MarkProps::default()
        };

        let err = Mark::mount(props, &context).err().unwrap();
        assert_eq!(err.to_string(), "Invalid marker ID: 42");
    }

    #[test]
    fn test_referenced_marker_survives_unmount() {
        let (_host, editor, context) = setup();
        let existing = editor.mark_buffer_range(Range::from([[0, 1], [0, 3]]), &MarkerProperties::default());
        let props = MarkProps {
            id: Some(existing.id()),
            ..MarkProps::default()
        };

        let mut mark = Mark::mount(props, &context).unwrap();
        assert_eq!(mark.marker(), Some(existing.clone()));
        assert_eq!(mark.ownership(), Some(Ownership::Adopted));

        mark.unmount();
        assert!(!existing.is_destroyed());
    }

    #[test]
    fn test_referenced_marker_keeps_unset_properties() {
        let (_host, editor, context) = setup();
        let original = MarkerProperties {
            exclusive: true,
            reversed: true,
            invalidate: InvalidationStrategy::Never,
        };
        let existing = editor.mark_buffer_range(Range::from([[0, 1], [0, 3]]), &original);
        let mut props = MarkProps {
            id: Some(existing.id()),
            ..MarkProps::default()
        };

        let mut mark = Mark::mount(props.clone(), &context).unwrap();
        assert_eq!(existing.properties(), original);

        props.properties.exclusive = Some(false);
        mark.update(props).unwrap();
        mark.unmount();

        let after = existing.properties();
        assert!(!after.exclusive);
        assert!(after.reversed);
        assert_eq!(after.invalidate, InvalidationStrategy::Never);
    }

    #[test]
    fn test_range_and_properties_update_in_place() {
        let (_host, _editor, context) = setup();
        let mut props = MarkProps {
            range: Range::from([[0, 0], [0, 2]]),
            ..MarkProps::default()
        };
        let mut mark = Mark::mount(props.clone(), &context).unwrap();
        let marker = mark.marker().unwrap();

        props.range = Range::from([[1, 0], [1, 6]]);
        props.properties.invalidate = Some(InvalidationStrategy::Never);
        mark.update(props).unwrap();

        assert_eq!(mark.marker(), Some(marker.clone()));
        assert!(!marker.is_destroyed());
        assert_eq!(marker.buffer_range(), Range::from([[1, 0], [1, 6]]));
        assert_eq!(marker.properties().invalidate, InvalidationStrategy::Never);
    }

    #[test]
    fn test_change_callback_receives_ranges() {
        let (_host, _editor, context) = setup();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut props = MarkProps {
            range: Range::from([[0, 0], [0, 2]]),
            properties: MarkerPropertyOverrides {
                reversed: Some(true),
                ..MarkerPropertyOverrides::default()
            },
            on_did_change: Some(Callback::new(move |change: &MarkChange| sink.borrow_mut().push(*change))),
            ..MarkProps::default()
        };
        let mut mark = Mark::mount(props.clone(), &context).unwrap();

        props.range = Range::from([[0, 4], [0, 8]]);
        mark.update(props).unwrap();

        let changes = seen.borrow();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_range, Range::from([[0, 0], [0, 2]]));
        assert_eq!(changes[0].new_range, Range::from([[0, 4], [0, 8]]));
    }

    #[test]
    fn test_prefers_inherited_layer_over_editor() {
        let (_host, editor, context) = setup();
        let layer = editor.add_marker_layer(&LayerOptions::default());
        let context = context.with_layer(ValueCell::with_value(layer.clone()));

        let mark = Mark::mount(MarkProps::default(), &context).unwrap();

        assert_eq!(mark.marker().and_then(|marker| marker.layer()), Some(layer.clone()));
        assert_eq!(layer.marker_count(), 1);
    }

    #[test]
    fn test_target_change_recreates_marker() {
        let (host, _editor, _context) = setup();
        let target = ValueCell::with_value(host.detached_editor("abc"));
        let context = Context::root(host.clone());
        let props = MarkProps {
            editor: Some(target.clone()),
            ..MarkProps::default()
        };
        let mark = Mark::mount(props, &context).unwrap();
        let first = mark.marker().unwrap();

        target.set(host.detached_editor("def"));

        assert!(first.is_destroyed());
        assert_ne!(mark.marker(), Some(first));
    }

    #[test]
    fn test_publishes_none_on_teardown() {
        let (_host, _editor, context) = setup();
        let ids = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&ids);
        let props = MarkProps {
            on_did_change_id: Some(Callback::new(move |id: &Option<MarkerId>| sink.borrow_mut().push(*id))),
            ..MarkProps::default()
        };

        let mut mark = Mark::mount(props, &context).unwrap();
        mark.unmount();

        let ids = ids.borrow();
        assert_eq!(ids.len(), 2);
        assert!(ids[0].is_some());
        assert_eq!(ids[1], None);
    }
}
