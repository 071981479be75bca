//! Gutter binding: one named gutter on an editor

use super::{same_source, Context};
use crate::cell::ValueCell;
use crate::error::{BindingError, BindingResult, HostError};
use crate::host::{Callback, EditorHandle, GutterHandle, GutterOptions, LineLabelRequest};
use crate::subscription::Subscription;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Default)]
pub struct GutterProps {
    pub editor: Option<ValueCell<EditorHandle>>,
    pub options: GutterOptions,
}

/// Destroy a gutter, treating "already destroyed" as success
fn destroy_gutter(gutter: &GutterHandle) -> BindingResult<()> {
    match gutter.destroy() {
        Ok(()) => Ok(()),
        Err(HostError::AlreadyDestroyed { .. }) => {
            log::debug!("gutter: '{}' was already destroyed", gutter.name());
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// Whether the host has to recreate the gutter to apply `new`
///
/// Visibility is toggled in place and callbacks are forwarded, so neither
/// counts. Adding or removing a callback does.
fn requires_rebuild(old: &GutterOptions, new: &GutterOptions) -> bool {
    old.name != new.name
        || old.priority != new.priority
        || old.kind != new.kind
        || old.class_name != new.class_name
        || old.label_fn.is_some() != new.label_fn.is_some()
        || old.on_mouse_down.is_some() != new.on_mouse_down.is_some()
        || old.on_mouse_move.is_some() != new.on_mouse_move.is_some()
}

/// A host-side callback that calls whatever the binding currently holds
fn forward<E: 'static>(
    weak: &Weak<Shared>,
    pick: fn(&GutterOptions) -> Option<Callback<E>>,
) -> Callback<E> {
    let weak = weak.clone();
    Callback::new(move |event: &E| {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let callback = pick(&shared.options.borrow());
        if let Some(callback) = callback {
            callback.call(event);
        }
    })
}

#[derive(Default)]
struct Shared {
    options: RefCell<GutterOptions>,
    editor: RefCell<Option<EditorHandle>>,
    gutter: RefCell<Option<GutterHandle>>,
    last_error: RefCell<Option<BindingError>>,
}

impl Shared {
    fn attach(self: &Rc<Self>, editor: &EditorHandle) {
        *self.editor.borrow_mut() = Some(editor.clone());
        self.rebuild();
    }

    fn rebuild(self: &Rc<Self>) {
        if let Err(err) = self.detach() {
            self.fail(err);
        }

        let Some(editor) = self.editor.borrow().clone() else {
            return;
        };
        if editor.is_destroyed() {
            return;
        }

        let options = self.host_options();
        match editor.add_gutter(&options) {
            Ok(gutter) => {
                log::debug!("gutter: created '{}' on editor {}", options.name, editor.id());
                *self.gutter.borrow_mut() = Some(gutter);
            }
            Err(err) => self.fail(err.into()),
        }
    }

    /// Options handed to the host, with callbacks routed back through the
    /// binding so they can change without recreating the gutter
    fn host_options(self: &Rc<Self>) -> GutterOptions {
        let mut options = self.options.borrow().clone();
        let weak = Rc::downgrade(self);
        if options.label_fn.is_some() {
            let weak = weak.clone();
            options.label_fn = Some(Callback::new(move |request: &LineLabelRequest| {
                let Some(shared) = weak.upgrade() else {
                    return String::new();
                };
                let label_fn = shared.options.borrow().label_fn.clone();
                match label_fn {
                    Some(label_fn) => label_fn.call(request),
                    None => String::new(),
                }
            }));
        }
        if options.on_mouse_down.is_some() {
            options.on_mouse_down = Some(forward(&weak, |options| options.on_mouse_down.clone()));
        }
        if options.on_mouse_move.is_some() {
            options.on_mouse_move = Some(forward(&weak, |options| options.on_mouse_move.clone()));
        }
        options
    }

    fn detach(&self) -> BindingResult<()> {
        let gutter = self.gutter.borrow_mut().take();
        match gutter {
            Some(gutter) => destroy_gutter(&gutter),
            None => Ok(()),
        }
    }

    fn fail(&self, err: BindingError) {
        log::error!("gutter: {}", err);
        *self.last_error.borrow_mut() = Some(err);
    }

    fn take_error(&self) -> Option<BindingError> {
        self.last_error.borrow_mut().take()
    }
}

pub struct Gutter {
    shared: Rc<Shared>,
    parent: Context,
    source: Option<ValueCell<EditorHandle>>,
    subscription: Option<Subscription>,
    mounted: bool,
}

impl Gutter {
    pub fn mount(props: GutterProps, context: &Context) -> BindingResult<Self> {
        let source = props.editor.clone().or_else(|| context.editor().cloned());
        let shared = Rc::new(Shared {
            options: RefCell::new(props.options),
            ..Shared::default()
        });

        let mut gutter = Self {
            shared,
            parent: context.clone(),
            source,
            subscription: None,
            mounted: true,
        };
        gutter.observe_source();

        match gutter.shared.take_error() {
            Some(err) => Err(err),
            None => Ok(gutter),
        }
    }

    /// Visibility and callback changes are applied to the live gutter. Name,
    /// priority, kind or class changes recreate it.
    pub fn update(&mut self, props: GutterProps) -> BindingResult<()> {
        if !self.mounted {
            return Ok(());
        }

        let source = props.editor.clone().or_else(|| self.parent.editor().cloned());
        let old = self.shared.options.borrow().clone();
        let new = props.options;
        *self.shared.options.borrow_mut() = new.clone();

        if !same_source(source.as_ref(), self.source.as_ref()) {
            self.subscription = None;
            if let Err(err) = self.shared.detach() {
                self.shared.fail(err);
            }
            *self.shared.editor.borrow_mut() = None;
            self.source = source;
            self.observe_source();
        } else if requires_rebuild(&old, &new) {
            self.shared.rebuild();
        } else if old.visible != new.visible {
            if let Some(gutter) = self.gutter() {
                if new.visible {
                    gutter.show();
                } else {
                    gutter.hide();
                }
            }
        }

        match self.shared.take_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Destroy the gutter. A gutter its editor already tore down is fine.
    pub fn unmount(&mut self) -> BindingResult<()> {
        if !self.mounted {
            return Ok(());
        }
        self.mounted = false;
        self.subscription = None;
        self.shared.detach()
    }

    fn observe_source(&mut self) {
        let Some(source) = &self.source else {
            log::debug!("gutter: no editor to attach to");
            return;
        };
        let weak = Rc::downgrade(&self.shared);
        self.subscription = Some(source.observe(move |editor| {
            if let Some(shared) = weak.upgrade() {
                shared.attach(editor);
            }
        }));
    }

    pub fn gutter(&self) -> Option<GutterHandle> {
        self.shared.gutter.borrow().clone()
    }

    pub fn last_error(&self) -> Option<BindingError> {
        self.shared.last_error.borrow().clone()
    }
}

impl Drop for Gutter {
    fn drop(&mut self) {
        if let Err(err) = self.unmount() {
            log::warn!("gutter: failed to destroy on drop: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;
    use crate::host::{GutterKind, GutterMouseEvent};

    fn named(name: &str) -> GutterProps {
        GutterProps {
            options: GutterOptions {
                name: name.to_string(),
                ..GutterOptions::default()
            },
            ..GutterProps::default()
        }
    }

    fn setup() -> (Rc<MemoryHost>, ValueCell<EditorHandle>, Context) {
        let host = MemoryHost::shared();
        let editor = ValueCell::with_value(host.detached_editor(""));
        let context = Context::root(host.clone()).with_editor(editor.clone());
        (host, editor, context)
    }

    #[test]
    fn test_rebuild_rules() {
        let old = GutterOptions::default();
        let hidden = GutterOptions {
            visible: false,
            ..GutterOptions::default()
        };
        let relabelled = GutterOptions {
            label_fn: Some(Callback::new(|_: &LineLabelRequest| String::new())),
            ..GutterOptions::default()
        };
        let renamed = GutterOptions {
            name: "other".to_string(),
            ..GutterOptions::default()
        };

        assert!(!requires_rebuild(&old, &old));
        assert!(!requires_rebuild(&old, &hidden));
        assert!(!requires_rebuild(&relabelled, &relabelled.clone()));
        assert!(requires_rebuild(&old, &relabelled));
        assert!(requires_rebuild(&old, &renamed));
    }

    #[test]
    fn test_creates_named_gutter() {
        let (_host, editor, context) = setup();
        let gutter = Gutter::mount(named("diff-icons"), &context).unwrap();

        let editor = editor.get().unwrap();
        assert_eq!(editor.gutter_with_name("diff-icons"), gutter.gutter());
    }

    #[test]
    fn test_visibility_update_keeps_gutter() {
        let (_host, _editor, context) = setup();
        let mut props = named("diff-icons");
        let mut gutter = Gutter::mount(props.clone(), &context).unwrap();
        let handle = gutter.gutter().unwrap();

        props.options.visible = false;
        gutter.update(props).unwrap();

        assert_eq!(gutter.gutter(), Some(handle.clone()));
        assert!(!handle.is_visible());
    }

    fn labelled(label: &'static str) -> GutterProps {
        let mut props = named("diff-icons");
        props.options.label_fn = Some(Callback::new(move |_: &LineLabelRequest| label.to_string()));
        props
    }

    #[test]
    fn test_fresh_callbacks_keep_gutter() {
        let (host, _editor, context) = setup();
        let mut gutter = Gutter::mount(labelled("old"), &context).unwrap();
        let handle = gutter.gutter().unwrap();

        gutter.update(labelled("new")).unwrap();

        assert_eq!(gutter.gutter(), Some(handle.clone()));
        assert!(!handle.is_destroyed());
        assert_eq!(host.live_gutter_count(), 1);

        let request = LineLabelRequest {
            buffer_row: 0,
            screen_row: 0,
            soft_wrapped: false,
            max_digits: 1,
        };
        let label_fn = handle.options().label_fn.unwrap();
        assert_eq!(label_fn.call(&request), "new");
    }

    #[test]
    fn test_mouse_callbacks_forwarded_after_update() {
        let (_host, _editor, context) = setup();
        let rows = Rc::new(RefCell::new(Vec::new()));
        let mut props = named("diff-icons");
        props.options.on_mouse_down = Some(Callback::new(|_: &GutterMouseEvent| {}));
        let mut gutter = Gutter::mount(props.clone(), &context).unwrap();
        let handle = gutter.gutter().unwrap();

        let sink = Rc::clone(&rows);
        props.options.on_mouse_down = Some(Callback::new(move |event: &GutterMouseEvent| {
            sink.borrow_mut().push(event.buffer_row);
        }));
        gutter.update(props).unwrap();

        let on_mouse_down = handle.options().on_mouse_down.unwrap();
        on_mouse_down.call(&GutterMouseEvent { buffer_row: 3 });
        assert_eq!(*rows.borrow(), vec![3]);
    }

    #[test]
    fn test_failed_destroy_on_retarget_still_follows_new_editor() {
        let (host, _editor, context) = setup();
        let mut gutter = Gutter::mount(named("diff-icons"), &context).unwrap();
        let first = gutter.gutter().unwrap();

        host.refuse_gutter_destroy(Some("busy"));
        let target = ValueCell::with_value(host.detached_editor(""));
        let mut props = named("diff-icons");
        props.editor = Some(target.clone());

        let err = gutter.update(props).err().unwrap();
        assert_eq!(err, BindingError::Host(HostError::Rejected("busy".to_string())));

        let moved = gutter.gutter().unwrap();
        assert_ne!(moved, first);
        assert_eq!(target.get().unwrap().gutter_with_name("diff-icons"), Some(moved));

        host.refuse_gutter_destroy(None);
    }

    #[test]
    fn test_option_change_recreates_gutter() {
        let (host, _editor, context) = setup();
        let mut props = named("diff-icons");
        let mut gutter = Gutter::mount(props.clone(), &context).unwrap();
        let first = gutter.gutter().unwrap();

        props.options.kind = GutterKind::LineNumber;
        props.options.priority = 5;
        gutter.update(props).unwrap();

        assert!(first.is_destroyed());
        assert_eq!(gutter.gutter().unwrap().options().priority, 5);
        assert_eq!(host.live_gutter_count(), 1);
    }

    #[test]
    fn test_editor_change_moves_gutter() {
        let (host, editor, context) = setup();
        let gutter = Gutter::mount(named("diff-icons"), &context).unwrap();
        let first = gutter.gutter().unwrap();

        editor.set(host.detached_editor(""));

        assert!(first.is_destroyed());
        assert!(gutter.gutter().is_some());
        assert_eq!(host.live_gutter_count(), 1);
    }

    #[test]
    fn test_unmount_after_editor_destroyed() {
        let (host, editor, context) = setup();
        let mut gutter = Gutter::mount(named("diff-icons"), &context).unwrap();

        editor.get().unwrap().destroy();

        assert_eq!(gutter.unmount(), Ok(()));
        assert_eq!(host.live_gutter_count(), 0);
    }

    #[test]
    fn test_duplicate_name_is_host_error() {
        let (_host, _editor, context) = setup();
        let _first = Gutter::mount(named("diff-icons"), &context).unwrap();

        let err = Gutter::mount(named("diff-icons"), &context).err().unwrap();
        assert_eq!(
            err,
            BindingError::Host(HostError::DuplicateGutter("diff-icons".to_string()))
        );
    }
}
