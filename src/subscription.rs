//! Disposable subscriptions and a synchronous event emitter
//!
//! Every callback registration in this crate hands back a [`Subscription`].
//! Dropping it (or calling [`Subscription::dispose`]) unregisters the
//! callback, so a binding that drops its subscriptions before destroying its
//! host objects can never be called back against a destroyed object.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A disposable registration
pub struct Subscription {
    dispose: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(dispose: impl FnOnce() + 'static) -> Self {
        Self {
            dispose: Some(Box::new(dispose)),
        }
    }

    /// A subscription with nothing to release
    pub fn empty() -> Self {
        Self { dispose: None }
    }

    /// Release the registration. Calling this more than once is a no-op.
    pub fn dispose(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.dispose.is_none()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Composite holder that disposes its members in registration order
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub fn dispose(&mut self) {
        for mut subscription in self.subscriptions.drain(..) {
            subscription.dispose();
        }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

type Listener<E> = Rc<dyn Fn(&E)>;

struct EmitterInner<E> {
    next_id: u64,
    listeners: Vec<(u64, Listener<E>)>,
}

/// Ordered listener list with synchronous delivery
///
/// Listeners run in registration order. The listener list is snapshotted
/// before delivery and no borrow is held while a listener runs, so listeners
/// may subscribe, dispose or emit again. A listener disposed during an emit
/// is skipped for the rest of that emit.
pub struct Emitter<E> {
    inner: Rc<RefCell<EmitterInner<E>>>,
}

impl<E> Clone for Emitter<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: 'static> Default for Emitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> Emitter<E> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(EmitterInner {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Register a listener
    pub fn on(&self, listener: impl Fn(&E) + 'static) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.listeners.push((id, Rc::new(listener)));
            id
        };

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                // The listener is dropped after the borrow is released
                let removed = {
                    let mut inner = inner.borrow_mut();
                    let index = inner.listeners.iter().position(|(other, _)| *other == id);
                    index.map(|index| inner.listeners.remove(index))
                };
                drop(removed);
            }
        })
    }

    pub fn emit(&self, event: &E) {
        let snapshot: Vec<(u64, Listener<E>)> = self.inner.borrow().listeners.clone();
        for (id, listener) in snapshot {
            let live = self
                .inner
                .borrow()
                .listeners
                .iter()
                .any(|(other, _)| *other == id);
            if live {
                listener(event);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Drop every listener, e.g. when the owning host object is destroyed
    pub fn clear(&self) {
        let drained: Vec<(u64, Listener<E>)> =
            self.inner.borrow_mut().listeners.drain(..).collect();
        drop(drained);
    }
}
