//! Single-slot value holder with observer notification
//!
//! A [`ValueCell`] starts empty and is resolved by its producer. Consumers
//! that mount before the producer has anything to offer call
//! [`ValueCell::observe`] and are invoked synchronously once the value shows
//! up. Clones share the same slot.

use crate::error::{BindingError, BindingResult};
use crate::subscription::{Emitter, Subscription};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub struct ValueCell<T> {
    value: Rc<RefCell<Option<T>>>,
    emitter: Emitter<T>,
}

impl<T> Clone for ValueCell<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
            emitter: self.emitter.clone(),
        }
    }
}

impl<T: Clone + PartialEq + 'static> ValueCell<T> {
    /// Create an empty cell
    pub fn new() -> Self {
        Self {
            value: Rc::new(RefCell::new(None)),
            emitter: Emitter::new(),
        }
    }

    /// Create an already-resolved cell
    pub fn with_value(value: T) -> Self {
        let cell = Self::new();
        *cell.value.borrow_mut() = Some(value);
        cell
    }

    /// Return an existing cell unchanged, or wrap a bare value
    pub fn wrap(value: impl Into<ValueCell<T>>) -> Self {
        value.into()
    }

    pub fn is_empty(&self) -> bool {
        self.value.borrow().is_none()
    }

    pub fn get(&self) -> Option<T> {
        self.value.borrow().clone()
    }

    pub fn get_or_throw(&self) -> BindingResult<T> {
        self.get().ok_or(BindingError::EmptyCell)
    }

    pub fn get_or(&self, default: T) -> T {
        self.get().unwrap_or(default)
    }

    /// Resolve the cell.
    ///
    /// `None` is ignored and never empties a resolved cell. Assigning the
    /// value already held is a no-op and notifies nobody.
    pub fn set(&self, value: impl Into<Option<T>>) {
        let Some(value) = value.into() else {
            return;
        };

        {
            let mut slot = self.value.borrow_mut();
            if slot.as_ref() == Some(&value) {
                return;
            }
            *slot = Some(value.clone());
        }

        self.emitter.emit(&value);
    }

    /// A publish callback that feeds this cell
    pub fn setter(&self) -> impl Fn(Option<T>) + 'static {
        let cell = self.clone();
        move |value| cell.set(value)
    }

    /// Snapshot-map into a new cell. An empty cell maps to an empty cell,
    /// and the result stays unlinked: it does not resolve when `self` does.
    pub fn map<U: Clone + PartialEq + 'static>(&self, present: impl FnOnce(&T) -> U) -> ValueCell<U> {
        match self.get() {
            Some(value) => ValueCell::with_value(present(&value)),
            None => ValueCell::new(),
        }
    }

    pub fn map_or_else<U: Clone + PartialEq + 'static>(
        &self,
        present: impl FnOnce(&T) -> U,
        absent: impl FnOnce() -> U,
    ) -> ValueCell<U> {
        match self.get() {
            Some(value) => ValueCell::with_value(present(&value)),
            None => ValueCell::with_value(absent()),
        }
    }

    /// Call `callback` now if resolved, then on every later distinct value
    pub fn observe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let callback = Rc::new(callback);
        if let Some(value) = self.get() {
            callback(&value);
        }
        let listener = Rc::clone(&callback);
        self.emitter.on(move |value| listener(value))
    }

    /// Call `callback` exactly once with the first available value.
    ///
    /// The callback only fires while the returned subscription is alive.
    pub fn on_resolved(&self, callback: impl FnOnce(&T) + 'static) -> Subscription {
        if let Some(value) = self.get() {
            callback(&value);
            return Subscription::empty();
        }

        let slot = RefCell::new(Some(callback));
        self.emitter.on(move |value| {
            let pending = slot.borrow_mut().take();
            if let Some(callback) = pending {
                callback(value);
            }
        })
    }

    /// Whether both handles share one slot
    pub fn same_cell(&self, other: &ValueCell<T>) -> bool {
        Rc::ptr_eq(&self.value, &other.value)
    }

    pub fn observer_count(&self) -> usize {
        self.emitter.listener_count()
    }
}

impl<T: Clone + PartialEq + 'static> Default for ValueCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + PartialEq + 'static> From<T> for ValueCell<T> {
    fn from(value: T) -> Self {
        Self::with_value(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for ValueCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.value.borrow() {
            Some(value) => f.debug_tuple("ValueCell").field(value).finish(),
            None => f.write_str("ValueCell(<empty>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn recorder() -> (Rc<RefCell<Vec<i32>>>, impl Fn(&i32) + 'static) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, move |v: &i32| sink.borrow_mut().push(*v))
    }

    #[test]
    fn test_empty_cell() {
        let cell = ValueCell::<i32>::new();
        assert!(cell.is_empty());
        assert_eq!(cell.get_or_throw(), Err(BindingError::EmptyCell));
        assert_eq!(cell.get_or(5), 5);
    }

    #[test]
    fn test_observe_distinct_values() {
        let cell = ValueCell::<i32>::new();
        let (seen, callback) = recorder();
        let _sub = cell.observe(callback);

        cell.set(1);
        cell.set(2);

        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_repeated_value_is_suppressed() {
        let cell = ValueCell::<i32>::new();
        let (seen, callback) = recorder();
        let _sub = cell.observe(callback);

        cell.set(1);
        cell.set(1);

        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn test_none_never_resolves() {
        let cell = ValueCell::<i32>::new();
        let (seen, callback) = recorder();
        let _sub = cell.observe(callback);

        cell.set(None);
        assert!(cell.is_empty());

        cell.set(3);
        cell.set(None);
        assert_eq!(cell.get(), Some(3));
        assert_eq!(*seen.borrow(), vec![3]);
    }

    #[test]
    fn test_observe_fires_immediately_when_resolved() {
        let cell = ValueCell::with_value(9);
        let (seen, callback) = recorder();
        let _sub = cell.observe(callback);
        assert_eq!(*seen.borrow(), vec![9]);
    }

    #[test]
    fn test_disposed_observer_is_silent() {
        let cell = ValueCell::<i32>::new();
        let (seen, callback) = recorder();
        let sub = cell.observe(callback);

        cell.set(1);
        drop(sub);
        cell.set(2);

        assert_eq!(*seen.borrow(), vec![1]);
        assert_eq!(cell.observer_count(), 0);
    }

    #[test]
    fn test_on_resolved_fires_once() {
        let cell = ValueCell::<i32>::new();
        let count = Rc::new(Cell::new(0));
        let first = Rc::new(Cell::new(0));

        let counter = Rc::clone(&count);
        let sink = Rc::clone(&first);
        let _sub = cell.on_resolved(move |v: &i32| {
            counter.set(counter.get() + 1);
            sink.set(*v);
        });

        cell.set(4);
        cell.set(5);

        assert_eq!(count.get(), 1);
        assert_eq!(first.get(), 4);
    }

    #[test]
    fn test_map_and_wrap() {
        let cell = ValueCell::with_value(2);
        assert_eq!(cell.map(|v| v * 10).get(), Some(20));

        let empty = ValueCell::<i32>::new();
        assert!(empty.map(|v| v * 10).is_empty());
        assert_eq!(empty.map_or_else(|_| true, || false).get(), Some(false));

        let wrapped = ValueCell::<i32>::wrap(cell.clone());
        assert!(wrapped.same_cell(&cell));
        assert_eq!(ValueCell::<i32>::wrap(8).get(), Some(8));
    }

    #[test]
    fn test_setter_publishes_into_cell() {
        let cell = ValueCell::<&'static str>::new();
        let setter = cell.setter();
        setter(None);
        assert!(cell.is_empty());
        setter(Some("ready"));
        assert_eq!(cell.get(), Some("ready"));
    }
}
