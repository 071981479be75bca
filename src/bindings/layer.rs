//! Layer binding: creates or adopts a marker layer on an editor

use super::{same_source, Context, Decorable, Ownership, Resolved};
use crate::cell::ValueCell;
use crate::error::BindingResult;
use crate::host::{Callback, EditorHandle, LayerId, LayerOptions, MarkerLayerHandle};
use crate::subscription::Subscription;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
pub struct LayerProps {
    /// Target editor; inherited from the context when absent
    pub editor: Option<ValueCell<EditorHandle>>,
    /// Creation options, ignored when adopting
    pub options: LayerOptions,
    /// Adopt this layer instead of creating one
    pub external: Option<MarkerLayerHandle>,
    pub on_did_change_id: Option<Callback<Option<LayerId>>>,
    pub on_did_resolve: Option<Callback<Option<MarkerLayerHandle>>>,
}

struct Shared {
    props: RefCell<LayerProps>,
    resolved: RefCell<Option<Resolved<MarkerLayerHandle>>>,
    layer_cell: ValueCell<MarkerLayerHandle>,
    decorable_cell: ValueCell<Decorable>,
}

impl Shared {
    fn attach(&self, editor: &EditorHandle) {
        self.detach();
        if editor.is_destroyed() {
            log::debug!("layer: editor {} is destroyed, nothing to attach", editor.id());
            return;
        }

        let (options, external) = {
            let props = self.props.borrow();
            (props.options, props.external.clone())
        };

        let resolved = match external {
            None => {
                let layer = editor.add_marker_layer(&options);
                log::debug!("layer: created layer {} on editor {}", layer.id(), editor.id());
                Resolved::owned(layer)
            }
            Some(external) => match editor.marker_layer(external.id()) {
                Some(found) if found == external => {
                    log::debug!("layer: adopted layer {} on editor {}", found.id(), editor.id());
                    Resolved::adopted(found)
                }
                _ => {
                    log::debug!(
                        "layer: layer {} does not belong to editor {}",
                        external.id(),
                        editor.id()
                    );
                    return;
                }
            },
        };

        let layer = resolved.handle.clone();
        *self.resolved.borrow_mut() = Some(resolved);
        self.layer_cell.set(layer.clone());
        self.decorable_cell.set(Decorable::Layer(layer.clone()));
        self.publish(Some(layer));
    }

    fn detach(&self) {
        let Some(resolved) = self.resolved.borrow_mut().take() else {
            return;
        };
        if resolved.is_owned() {
            log::debug!("layer: destroying layer {}", resolved.handle.id());
            resolved.handle.destroy();
            self.publish(None);
        }
    }

    fn publish(&self, layer: Option<MarkerLayerHandle>) {
        let (on_id, on_resolve) = {
            let props = self.props.borrow();
            (props.on_did_change_id.clone(), props.on_did_resolve.clone())
        };
        if let Some(callback) = on_id {
            callback.call(&layer.as_ref().map(|layer| layer.id()));
        }
        if let Some(callback) = on_resolve {
            callback.call(&layer);
        }
    }
}

pub struct Layer {
    shared: Rc<Shared>,
    parent: Context,
    source: Option<ValueCell<EditorHandle>>,
    subscription: Option<Subscription>,
    mounted: bool,
}

impl Layer {
    pub fn mount(props: LayerProps, context: &Context) -> BindingResult<Self> {
        let source = resolve_source(&props, context);
        let shared = Rc::new(Shared {
            props: RefCell::new(props),
            resolved: RefCell::new(None),
            layer_cell: ValueCell::new(),
            decorable_cell: ValueCell::new(),
        });

        let mut layer = Self {
            shared,
            parent: context.clone(),
            source,
            subscription: None,
            mounted: true,
        };
        layer.observe_source();
        Ok(layer)
    }

    pub fn update(&mut self, props: LayerProps) -> BindingResult<()> {
        if !self.mounted {
            return Ok(());
        }

        let source = resolve_source(&props, &self.parent);
        let retarget = !same_source(source.as_ref(), self.source.as_ref())
            || props.external != self.shared.props.borrow().external;
        *self.shared.props.borrow_mut() = props;

        if retarget {
            self.subscription = None;
            self.shared.detach();
            self.source = source;
            self.observe_source();
        }
        Ok(())
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
            log::debug!("layer: no editor to attach to");
            return;
        };
        let weak = Rc::downgrade(&self.shared);
        self.subscription = Some(source.observe(move |editor| {
            if let Some(shared) = weak.upgrade() {
                shared.attach(editor);
            }
        }));
    }

    /// Context for nested marks and annotations
    pub fn context(&self) -> Context {
        let context = match &self.source {
            Some(editor) => self.parent.with_editor(editor.clone()),
            None => self.parent.clone(),
        };
        context
            .with_layer(self.shared.layer_cell.clone())
            .with_decorable(self.shared.decorable_cell.clone())
    }

    pub fn layer(&self) -> Option<MarkerLayerHandle> {
        self.shared
            .resolved
            .borrow()
            .as_ref()
            .map(|resolved| resolved.handle.clone())
    }

    pub fn ownership(&self) -> Option<Ownership> {
        self.shared
            .resolved
            .borrow()
            .as_ref()
            .map(|resolved| resolved.ownership)
    }

    pub fn layer_cell(&self) -> &ValueCell<MarkerLayerHandle> {
        &self.shared.layer_cell
    }

    pub fn decorable_cell(&self) -> &ValueCell<Decorable> {
        &self.shared.decorable_cell
    }
}

impl Drop for Layer {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn resolve_source(props: &LayerProps, context: &Context) -> Option<ValueCell<EditorHandle>> {
    props.editor.clone().or_else(|| context.editor().cloned())
}
