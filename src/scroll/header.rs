use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::foundation::signal::Signal;
use crate::host::events::{HostEvent, HostEvents, ListenerId};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HeaderSettings {
    /// The header never hides above this scroll position.
    pub hide_after_px: f64,
    /// A pointer closer than this to the top edge keeps the header visible.
    pub pointer_reveal_px: f64,
}

impl Default for HeaderSettings {
    fn default() -> Self {
        Self {
            hide_after_px: 140.0,
            pointer_reveal_px: 60.0,
        }
    }
}

/// Hide-on-scroll-down decision for the page header.
///
/// The first scroll or pointer event only records a baseline. After that the header is hidden
/// while the page is past [`HeaderSettings::hide_after_px`], the last scroll went down, and the
/// pointer is away from the top edge.
#[derive(Clone, Debug)]
pub struct HeaderVisibility {
    settings: HeaderSettings,
    last_scroll_top: f64,
    pointer_near_top: bool,
    has_scrolled: bool,
    hidden: bool,
}

impl HeaderVisibility {
    pub fn new(settings: HeaderSettings, initial_scroll_top: f64) -> Self {
        Self {
            settings,
            last_scroll_top: initial_scroll_top,
            pointer_near_top: false,
            has_scrolled: false,
            hidden: false,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn take_baseline(&mut self, scroll_top: f64) -> bool {
        if self.has_scrolled {
            return false;
        }
        self.has_scrolled = true;
        self.last_scroll_top = scroll_top;
        true
    }

    fn should_hide(&self, scroll_top: f64) -> bool {
        if scroll_top < self.settings.hide_after_px {
            return false;
        }
        scroll_top > self.last_scroll_top && !self.pointer_near_top
    }

    /// Returns the new hidden state.
    pub fn on_scroll(&mut self, scroll_top: f64) -> bool {
        if self.take_baseline(scroll_top) {
            return self.hidden;
        }
        self.hidden = self.should_hide(scroll_top);
        self.last_scroll_top = scroll_top;
        self.hidden
    }

    /// `client_y` is the pointer's distance from the viewport top. Returns the new hidden state.
    ///
    /// Pointer moves do not advance the scroll baseline.
    pub fn on_pointer_move(&mut self, client_y: f64, scroll_top: f64) -> bool {
        self.pointer_near_top = client_y < self.settings.pointer_reveal_px;
        if self.take_baseline(scroll_top) {
            return self.hidden;
        }
        self.hidden = self.should_hide(scroll_top);
        self.hidden
    }
}

/// [`HeaderVisibility`] wired to host events, published as a signal.
pub struct HeaderAutoHide {
    events: HostEvents,
    hidden: Signal<bool>,
    listener: Cell<Option<ListenerId>>,
}

impl std::fmt::Debug for HeaderAutoHide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderAutoHide")
            .field("hidden", &self.hidden.get())
            .field("attached", &self.listener.get().is_some())
            .finish()
    }
}

impl HeaderAutoHide {
    pub fn attach(events: &HostEvents, settings: HeaderSettings) -> Self {
        let hidden = Signal::new(false);
        let state = Rc::new(RefCell::new(HeaderVisibility::new(
            settings,
            events.viewport().scroll_y,
        )));
        let out = hidden.clone();
        let viewport = events.clone();
        let listener = events.listen(move |event| {
            let next = match event {
                HostEvent::Scroll { y } => state.borrow_mut().on_scroll(*y),
                HostEvent::PointerMove { y, .. } => {
                    let scroll_top = viewport.viewport().scroll_y;
                    state.borrow_mut().on_pointer_move(*y, scroll_top)
                }
                HostEvent::Resize { .. } | HostEvent::ElementResized { .. } => return,
            };
            if out.set_if_changed(next) {
                tracing::trace!(hidden = next, "header visibility changed");
            }
        });
        Self {
            events: events.clone(),
            hidden,
            listener: Cell::new(Some(listener)),
        }
    }

    /// Current and future hidden states.
    pub fn hidden(&self) -> Signal<bool> {
        self.hidden.clone()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden.get()
    }

    pub fn detach(&self) -> bool {
        match self.listener.take() {
            Some(id) => self.events.unlisten(id),
            None => false,
        }
    }
}

impl Drop for HeaderAutoHide {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scroll/header.rs"]
mod tests;
