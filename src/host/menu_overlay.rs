use std::cell::RefCell;
use std::rc::Rc;

use crate::foundation::signal::{Signal, SubscriptionId};
use crate::host::events::{HostEvent, HostEvents, ListenerId};
use crate::host::scroll_lock::{ScrollLock, ScrollLockGuard};

/// Open/closed state of the mobile menu overlay, shared explicitly with its consumers.
///
/// The overlay only opens on mobile-wide viewports and closes itself when the viewport grows
/// past the breakpoint. While open it holds a body scroll lock.
pub struct MenuOverlay {
    active: Signal<bool>,
    events: HostEvents,
    guard: Rc<RefCell<Option<ScrollLockGuard>>>,
    lock: ScrollLock,
    max_width: f64,
    listener: Option<ListenerId>,
}

impl MenuOverlay {
    pub fn new(events: HostEvents, lock: ScrollLock, mobile_max_width_px: f64) -> Self {
        let active = Signal::new(false);
        let guard: Rc<RefCell<Option<ScrollLockGuard>>> = Rc::new(RefCell::new(None));

        let listener = {
            let active = active.clone();
            let guard = Rc::clone(&guard);
            events.listen(move |event| {
                let HostEvent::Resize { width, .. } = event else {
                    return;
                };
                if *width > mobile_max_width_px && active.get() {
                    tracing::debug!(width, "viewport left mobile range; closing menu overlay");
                    let released = guard.borrow_mut().take();
                    drop(released);
                    active.set(false);
                }
            })
        };

        Self {
            active,
            events,
            guard,
            lock,
            max_width: mobile_max_width_px,
            listener: Some(listener),
        }
    }

    fn is_mobile_wide(&self) -> bool {
        self.events.viewport().width <= self.max_width
    }

    /// Request the overlay open or closed. Opening is refused outside the mobile range.
    /// Returns the resulting state.
    pub fn set_active(&self, active: bool) -> bool {
        if active {
            if !self.is_mobile_wide() {
                return self.active.get();
            }
            if self.guard.borrow().is_none() {
                let guard = self.lock.acquire("menu-overlay");
                *self.guard.borrow_mut() = Some(guard);
            }
            self.active.set_if_changed(true);
        } else {
            let released = self.guard.borrow_mut().take();
            drop(released);
            self.active.set_if_changed(false);
        }
        self.active.get()
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn subscribe(&self, f: impl Fn(&bool) + 'static) -> SubscriptionId {
        self.active.subscribe(f)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.active.unsubscribe(id)
    }

    /// Stop following viewport changes and release the scroll lock.
    pub fn detach(&mut self) {
        if let Some(id) = self.listener.take() {
            self.events.unlisten(id);
        }
        let released = self.guard.borrow_mut().take();
        drop(released);
    }
}

impl Drop for MenuOverlay {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/menu_overlay.rs"]
mod tests;
