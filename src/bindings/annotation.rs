//! Annotation binding: one host decoration on a marker or marker layer
//!
//! The decoration is rebuilt from scratch whenever the editor, the
//! decorable target or the style changes. It is never created against a
//! destroyed target, nor against a target whose layer lives in another
//! editor.

use super::{same_source, Context, Decorable};
use crate::cell::ValueCell;
use crate::error::{BindingError, BindingResult};
use crate::host::{
    DecorationHandle, DecorationKind, DecorationParams, DecorationPosition, EditorHandle,
    ElementHandle, Host,
};
use crate::subscription::{Subscription, SubscriptionSet};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Everything about a decoration's appearance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnnotationStyle {
    pub kind: DecorationKind,
    pub class_name: Option<String>,
    /// Inline style properties
    pub style: BTreeMap<String, String>,
    pub only_head: bool,
    pub only_empty: bool,
    pub only_non_empty: bool,
    pub omit_empty_last_row: bool,
    pub position: Option<DecorationPosition>,
    pub order: Option<i32>,
    pub avoid_overflow: Option<bool>,
    /// Required for the gutter kind
    pub gutter_name: Option<String>,
}

impl AnnotationStyle {
    pub fn params(&self, item: Option<ElementHandle>) -> DecorationParams {
        DecorationParams {
            kind: self.kind,
            class_name: self.class_name.clone(),
            style: self.style.clone(),
            only_head: self.only_head,
            only_empty: self.only_empty,
            only_non_empty: self.only_non_empty,
            omit_empty_last_row: self.omit_empty_last_row,
            position: self.position,
            order: self.order,
            avoid_overflow: self.avoid_overflow,
            gutter_name: self.gutter_name.clone(),
            item,
        }
    }

    /// Parse a style from camelCase JSON and validate it
    pub fn from_json(json: &str) -> BindingResult<Self> {
        let style: Self = crate::config::from_json_str(json, "Invalid annotation style")?;
        style.validate()?;
        Ok(style)
    }

    fn validate(&self) -> BindingResult<()> {
        if self.kind == DecorationKind::Gutter && self.gutter_name.is_none() {
            return Err(BindingError::MissingGutterName);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnnotationProps {
    pub editor: Option<ValueCell<EditorHandle>>,
    pub decorable: Option<ValueCell<Decorable>>,
    pub style: AnnotationStyle,
}

#[derive(Default)]
struct Shared {
    style: RefCell<AnnotationStyle>,
    container: RefCell<Option<ElementHandle>>,
    editor: RefCell<Option<EditorHandle>>,
    decorable: RefCell<Option<Decorable>>,
    decoration: RefCell<Option<DecorationHandle>>,
    gutter_subscription: RefCell<Option<Subscription>>,
    /// Suppresses refreshes while both sources are being observed
    batching: Cell<bool>,
    last_error: RefCell<Option<BindingError>>,
}

impl Shared {
    fn targets(&self) -> Option<(EditorHandle, Decorable)> {
        let editor = self.editor.borrow().clone()?;
        let decorable = self.decorable.borrow().clone()?;
        if editor.is_destroyed() || decorable.is_destroyed() {
            log::debug!("annotation: target is destroyed");
            return None;
        }
        if !decorable.belongs_to(&editor) {
            log::debug!("annotation: target does not belong to editor {}", editor.id());
            return None;
        }
        Some((editor, decorable))
    }

    fn clear(&self) {
        let subscription = self.gutter_subscription.borrow_mut().take();
        drop(subscription);

        let decoration = self.decoration.borrow_mut().take();
        if let Some(decoration) = decoration {
            decoration.destroy();
        }
    }

    fn refresh(self: &Rc<Self>) {
        if self.batching.get() {
            return;
        }
        self.clear();

        let Some((editor, _)) = self.targets() else {
            return;
        };

        let style = self.style.borrow().clone();
        match (style.kind, style.gutter_name) {
            (DecorationKind::Gutter, Some(name)) => {
                let weak = Rc::downgrade(self);
                let subscription = editor.observe_gutters(Box::new(move |gutter| {
                    if gutter.name() != name {
                        return;
                    }
                    if let Some(shared) = weak.upgrade() {
                        shared.decorate();
                    }
                }));
                *self.gutter_subscription.borrow_mut() = Some(subscription);
            }
            _ => self.decorate(),
        }
    }

    fn decorate(&self) {
        let previous = self.decoration.borrow_mut().take();
        if let Some(previous) = previous {
            previous.destroy();
        }

        let Some((editor, decorable)) = self.targets() else {
            return;
        };
        let params = self.style.borrow().params(self.container.borrow().clone());

        match decorable.decorate(&editor, &params) {
            Ok(decoration) => {
                log::debug!("annotation: created {} decoration", params.kind);
                *self.decoration.borrow_mut() = Some(decoration);
            }
            Err(err) => {
                log::error!("annotation: failed to decorate: {}", err);
                *self.last_error.borrow_mut() = Some(err.into());
            }
        }
    }

    fn take_error(&self) -> Option<BindingError> {
        self.last_error.borrow_mut().take()
    }
}

pub struct Annotation {
    shared: Rc<Shared>,
    host: Rc<dyn Host>,
    parent: Context,
    editor_source: Option<ValueCell<EditorHandle>>,
    decorable_source: Option<ValueCell<Decorable>>,
    subscriptions: SubscriptionSet,
    mounted: bool,
}

impl Annotation {
    /// Fails with [`BindingError::MissingGutterName`] before touching the
    /// host when a gutter decoration has no gutter name.
    pub fn mount(props: AnnotationProps, context: &Context) -> BindingResult<Self> {
        props.style.validate()?;

        let shared = Rc::new(Shared::default());
        let mut annotation = Self {
            shared,
            host: Rc::clone(context.host()),
            parent: context.clone(),
            editor_source: props.editor.clone().or_else(|| context.editor().cloned()),
            decorable_source: props.decorable.clone().or_else(|| context.decorable().cloned()),
            subscriptions: SubscriptionSet::new(),
            mounted: true,
        };
        annotation.apply_style(props.style);
        annotation.observe_sources();

        match annotation.shared.take_error() {
            Some(err) => Err(err),
            None => Ok(annotation),
        }
    }

    pub fn update(&mut self, props: AnnotationProps) -> BindingResult<()> {
        if !self.mounted {
            return Ok(());
        }
        props.style.validate()?;

        let editor_source = props.editor.clone().or_else(|| self.parent.editor().cloned());
        let decorable_source = props
            .decorable
            .clone()
            .or_else(|| self.parent.decorable().cloned());
        let retarget = !same_source(editor_source.as_ref(), self.editor_source.as_ref())
            || !same_source(decorable_source.as_ref(), self.decorable_source.as_ref());
        let restyle = props.style != *self.shared.style.borrow();

        if restyle {
            self.apply_style(props.style);
        }
        if retarget {
            self.subscriptions.dispose();
            self.shared.clear();
            *self.shared.editor.borrow_mut() = None;
            *self.shared.decorable.borrow_mut() = None;
            self.editor_source = editor_source;
            self.decorable_source = decorable_source;
            self.observe_sources();
        } else if restyle {
            self.shared.refresh();
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
        self.subscriptions.dispose();
        self.shared.clear();
    }

    /// Store a new style, allocating or dropping the content container
    /// when the kind starts or stops needing one
    fn apply_style(&mut self, style: AnnotationStyle) {
        let needs_container = style.kind.needs_content_container();
        let has_container = self.shared.container.borrow().is_some();
        if needs_container && !has_container {
            let container = self.host.create_element("div");
            container.add_class(&format!("annotation-{}", style.kind));
            *self.shared.container.borrow_mut() = Some(container);
        } else if !needs_container && has_container {
            *self.shared.container.borrow_mut() = None;
        }
        *self.shared.style.borrow_mut() = style;
    }

    fn observe_sources(&mut self) {
        self.shared.batching.set(true);

        if let Some(source) = &self.editor_source {
            let weak = Rc::downgrade(&self.shared);
            self.subscriptions.add(source.observe(move |editor| {
                if let Some(shared) = weak.upgrade() {
                    *shared.editor.borrow_mut() = Some(editor.clone());
                    shared.refresh();
                }
            }));
        }
        if let Some(source) = &self.decorable_source {
            let weak = Rc::downgrade(&self.shared);
            self.subscriptions.add(source.observe(move |decorable| {
                if let Some(shared) = weak.upgrade() {
                    *shared.decorable.borrow_mut() = Some(decorable.clone());
                    shared.refresh();
                }
            }));
        }

        self.shared.batching.set(false);
        self.shared.refresh();
    }

    pub fn decoration(&self) -> Option<DecorationHandle> {
        self.shared.decoration.borrow().clone()
    }

    /// Element that child content should be rendered into, for kinds that
    /// carry content
    pub fn container(&self) -> Option<ElementHandle> {
        self.shared.container.borrow().clone()
    }

    pub fn style(&self) -> AnnotationStyle {
        self.shared.style.borrow().clone()
    }

    pub fn last_error(&self) -> Option<BindingError> {
        self.shared.last_error.borrow().clone()
    }
}

impl Drop for Annotation {
    fn drop(&mut self) {
        self.unmount();
    }
}
