//! Single-threaded publish/subscribe primitives.
//!
//! Listeners are removed through the [`SubscriptionId`] returned when they were added, never by
//! comparing closures. Callbacks run with no internal borrow held, so a callback may subscribe,
//! unsubscribe or publish again.

use std::cell::RefCell;
use std::rc::Rc;

/// Token identifying one subscription on a [`Signal`] or [`Emitter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Callback<T> = Rc<dyn Fn(&T)>;

struct Subscribers<T> {
    next_id: u64,
    list: Vec<(SubscriptionId, Callback<T>)>,
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            list: Vec::new(),
        }
    }
}

impl<T> Subscribers<T> {
    fn add(&mut self, cb: Callback<T>) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.list.push((id, cb));
        id
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.list.len();
        self.list.retain(|(sid, _)| *sid != id);
        self.list.len() != before
    }

    fn snapshot(&self) -> Vec<Callback<T>> {
        self.list.iter().map(|(_, cb)| Rc::clone(cb)).collect()
    }
}

struct SignalInner<T> {
    value: T,
    subscribers: Subscribers<T>,
}

/// Observable value with replay of the current value on subscribe.
pub struct Signal<T> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Signal")
            .field("value", &inner.value)
            .field("subscribers", &inner.subscribers.list.len())
            .finish()
    }
}

impl<T: Clone + 'static> Signal<T> {
    /// Create a signal holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                value,
                subscribers: Subscribers::default(),
            })),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Store `value` and notify every subscriber.
    pub fn set(&self, value: T) {
        let subscribers = {
            let mut inner = self.inner.borrow_mut();
            inner.value = value.clone();
            inner.subscribers.snapshot()
        };
        for cb in subscribers {
            cb(&value);
        }
    }

    /// Like [`Signal::set`] but silent when the value is unchanged. Returns whether it changed.
    pub fn set_if_changed(&self, value: T) -> bool
    where
        T: PartialEq,
    {
        if self.inner.borrow().value == value {
            return false;
        }
        self.set(value);
        true
    }

    /// Subscribe; `f` is called immediately with the current value.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubscriptionId {
        let cb: Callback<T> = Rc::new(f);
        let (id, current) = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.subscribers.add(Rc::clone(&cb));
            (id, inner.value.clone())
        };
        cb(&current);
        id
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.borrow_mut().subscribers.remove(id)
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.list.len()
    }
}

/// Event stream without a current value.
pub struct Emitter<T> {
    inner: Rc<RefCell<Subscribers<T>>>,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Subscribers::default())),
        }
    }
}

impl<T> std::fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("subscribers", &self.inner.borrow().list.len())
            .finish()
    }
}

impl<T: 'static> Emitter<T> {
    /// Create an emitter with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every current subscriber.
    pub fn emit(&self, event: &T) {
        let subscribers = self.inner.borrow().snapshot();
        for cb in subscribers {
            cb(event);
        }
    }

    /// Subscribe to future events.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubscriptionId {
        self.inner.borrow_mut().add(Rc::new(f))
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.borrow_mut().remove(id)
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().list.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/signal.rs"]
mod tests;
