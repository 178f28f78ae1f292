use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::host::events::HostEvents;

/// Presentation state of the document body as far as scroll locking is concerned.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct BodyLockStyle {
    /// `position: fixed` is applied.
    pub fixed: bool,
    /// Applied `top` offset in px (negative scroll position while locked).
    pub top_px: f64,
    /// Scroll position to restore on release.
    pub saved_scroll_y: Option<f64>,
}

#[derive(Debug, Default)]
struct LockState {
    next_id: u64,
    holders: BTreeMap<u64, String>,
    body: BodyLockStyle,
}

/// Reference-counted body scroll lock.
///
/// The first holder pins the body at the current scroll position; only the last release unpins
/// it and scrolls back, so independent overlays cannot unlock each other.
#[derive(Clone, Debug)]
pub struct ScrollLock {
    events: HostEvents,
    state: Rc<RefCell<LockState>>,
}

impl ScrollLock {
    pub fn new(events: HostEvents) -> Self {
        Self {
            events,
            state: Rc::new(RefCell::new(LockState::default())),
        }
    }

    /// Take a hold on the lock for `owner`. The hold lasts until the guard is dropped.
    pub fn acquire(&self, owner: &str) -> ScrollLockGuard {
        let mut state = self.state.borrow_mut();
        if state.holders.is_empty() {
            let scroll_y = self.events.viewport().scroll_y;
            state.body = BodyLockStyle {
                fixed: true,
                top_px: -scroll_y,
                saved_scroll_y: Some(scroll_y),
            };
            tracing::debug!(owner, scroll_y, "body scroll locked");
        }
        state.next_id += 1;
        let id = state.next_id;
        state.holders.insert(id, owner.to_owned());
        ScrollLockGuard {
            id,
            lock: Rc::downgrade(&self.state),
            events: self.events.clone(),
        }
    }

    pub fn is_locked(&self) -> bool {
        !self.state.borrow().holders.is_empty()
    }

    /// Owners currently holding the lock, oldest first.
    pub fn holders(&self) -> Vec<String> {
        self.state.borrow().holders.values().cloned().collect()
    }

    pub fn body(&self) -> BodyLockStyle {
        self.state.borrow().body.clone()
    }
}

/// Hold on a [`ScrollLock`]; releases on drop.
#[derive(Debug)]
pub struct ScrollLockGuard {
    id: u64,
    lock: Weak<RefCell<LockState>>,
    events: HostEvents,
}

impl Drop for ScrollLockGuard {
    fn drop(&mut self) {
        let Some(state) = self.lock.upgrade() else {
            return;
        };
        let restore = {
            let mut state = state.borrow_mut();
            let owner = state.holders.remove(&self.id);
            if owner.is_none() || !state.holders.is_empty() {
                None
            } else {
                let saved = state.body.saved_scroll_y.unwrap_or(0.0);
                state.body = BodyLockStyle::default();
                Some(saved)
            }
        };
        if let Some(y) = restore {
            tracing::debug!(scroll_y = y, "body scroll released");
            self.events.scroll_to(y);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/scroll_lock.rs"]
mod tests;
