//! Browser DOM adapter
//!
//! Lets a browser host hand real `web_sys::Element`s to the bindings as
//! mount points, editor elements and decoration content containers.

use super::{ElementHandle, HostElement};
use std::any::Any;
use std::rc::Rc;
use wasm_bindgen::JsValue;

pub struct DomElement {
    element: web_sys::Element,
}

impl DomElement {
    pub fn new(element: web_sys::Element) -> Self {
        Self { element }
    }

    pub fn handle(element: web_sys::Element) -> ElementHandle {
        ElementHandle::new(Rc::new(Self::new(element)))
    }

    pub fn element(&self) -> &web_sys::Element {
        &self.element
    }
}

fn report(action: &str, result: Result<(), JsValue>) {
    if let Err(err) = result {
        log::warn!("DOM {} failed: {:?}", action, err);
    }
}

/// Create a detached element in the current document
pub fn create_element(tag: &str) -> Option<ElementHandle> {
    let document = web_sys::window()?.document()?;
    match document.create_element(tag) {
        Ok(element) => Some(DomElement::handle(element)),
        Err(err) => {
            log::warn!("DOM createElement({}) failed: {:?}", tag, err);
            None
        }
    }
}

impl HostElement for DomElement {
    fn tag(&self) -> String {
        self.element.tag_name().to_lowercase()
    }

    fn add_class(&self, class: &str) {
        report("classList.add", self.element.class_list().add_1(class));
    }

    fn remove_class(&self, class: &str) {
        report("classList.remove", self.element.class_list().remove_1(class));
    }

    fn has_class(&self, class: &str) -> bool {
        self.element.class_list().contains(class)
    }

    fn set_tab_index(&self, index: i32) {
        report(
            "setAttribute(tabindex)",
            self.element.set_attribute("tabindex", &index.to_string()),
        );
    }

    fn tab_index(&self) -> Option<i32> {
        self.element
            .get_attribute("tabindex")
            .and_then(|value| value.parse().ok())
    }

    fn append_child(&self, child: &ElementHandle) {
        match child.as_any().downcast_ref::<DomElement>() {
            Some(child) => {
                if let Err(err) = self.element.append_child(&child.element) {
                    log::warn!("DOM appendChild failed: {:?}", err);
                }
            }
            None => log::warn!("Cannot append a non-DOM element to a DOM node"),
        }
    }

    fn child_count(&self) -> usize {
        self.element.child_element_count() as usize
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
