use std::cell::Cell;
use std::rc::Rc;

use crate::foundation::signal::{Emitter, SubscriptionId};

/// Token returned by [`HostEvents::listen`].
pub type ListenerId = SubscriptionId;

/// Browser-level notification forwarded by the host.
#[derive(Clone, Debug, PartialEq)]
pub enum HostEvent {
    /// Window scrolled to `y`.
    Scroll { y: f64 },
    /// Window resized.
    Resize { width: f64, height: f64 },
    /// An observed element changed size.
    ElementResized { id: String },
    /// Pointer moved to viewport coordinates.
    PointerMove { x: f64, y: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1440.0,
            height: 900.0,
            scroll_y: 0.0,
        }
    }
}

/// What the runtime environment can do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Capabilities {
    /// Element size changes can be observed.
    pub resize_observer: bool,
    /// Primary input is touch.
    pub touch: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            resize_observer: true,
            touch: false,
        }
    }
}

/// Event hub standing in for `window`: keeps the viewport state and fans events out.
///
/// Listeners are removed with the [`ListenerId`] they were registered under.
#[derive(Clone, Debug)]
pub struct HostEvents {
    emitter: Emitter<HostEvent>,
    viewport: Rc<Cell<Viewport>>,
    capabilities: Capabilities,
}

impl Default for HostEvents {
    fn default() -> Self {
        Self::new(Viewport::default(), Capabilities::default())
    }
}

impl HostEvents {
    pub fn new(viewport: Viewport, capabilities: Capabilities) -> Self {
        Self {
            emitter: Emitter::new(),
            viewport: Rc::new(Cell::new(viewport)),
            capabilities,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn listen(&self, f: impl Fn(&HostEvent) + 'static) -> ListenerId {
        self.emitter.subscribe(f)
    }

    /// Returns `false` when the listener was already removed.
    pub fn unlisten(&self, id: ListenerId) -> bool {
        self.emitter.unsubscribe(id)
    }

    pub fn listener_count(&self) -> usize {
        self.emitter.subscriber_count()
    }

    /// Update the viewport from `event`, then notify listeners.
    pub fn dispatch(&self, event: HostEvent) {
        let mut vp = self.viewport.get();
        match &event {
            HostEvent::Scroll { y } => vp.scroll_y = *y,
            HostEvent::Resize { width, height } => {
                vp.width = *width;
                vp.height = *height;
            }
            HostEvent::ElementResized { .. } | HostEvent::PointerMove { .. } => {}
        }
        self.viewport.set(vp);
        tracing::trace!(?event, "host event");
        self.emitter.emit(&event);
    }

    pub fn scroll_to(&self, y: f64) {
        self.dispatch(HostEvent::Scroll { y });
    }

    pub fn resize(&self, width: f64, height: f64) {
        self.dispatch(HostEvent::Resize { width, height });
    }

    pub fn element_resized(&self, id: impl Into<String>) {
        self.dispatch(HostEvent::ElementResized { id: id.into() });
    }

    pub fn pointer_move(&self, x: f64, y: f64) {
        self.dispatch(HostEvent::PointerMove { x, y });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/events.rs"]
mod tests;
