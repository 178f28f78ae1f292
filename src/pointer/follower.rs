//! Decorative blob that trails the pointer.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::foundation::core::{Millis, Point};
use crate::host::element::ElementRef;
use crate::host::events::{Capabilities, HostEvent, HostEvents, ListenerId, Viewport};
use crate::runtime::scheduler::{Scheduler, TimerId};

pub const SIZE_STYLE: &str = "--follower-size";
pub const EXPANDED_SIZE_STYLE: &str = "--follower-expanded-size";
pub const EXPANDED_STYLE: &str = "--follower-expanded";

const BACKGROUND_DEFAULT: &str =
    "radial-gradient(circle, rgba(100, 149, 237, 0.2) 0%, rgba(255, 255, 255, 0) 70%)";
const BACKGROUND_EXPANDED: &str = "radial-gradient(circle, rgba(82, 130, 255, 0.4) 0%, rgba(179, 206, 255, 0.2) 40%, rgba(255, 255, 255, 0) 70%)";

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FollowerSettings {
    /// Fraction of the remaining distance covered per frame.
    pub smoothing: f64,
    pub base_size_px: f64,
    pub expanded_size_px: f64,
    /// Viewport width at which sizes reach their full value.
    pub reference_width_px: f64,
    /// At or below this width the follower is hidden.
    pub mobile_max_width_px: f64,
    pub frame_interval: Millis,
}

impl Default for FollowerSettings {
    fn default() -> Self {
        Self {
            smoothing: 0.1,
            base_size_px: 200.0,
            expanded_size_px: 300.0,
            reference_width_px: 1200.0,
            mobile_max_width_px: 768.0,
            frame_interval: Millis(16),
        }
    }
}

/// Follower state without any host wiring.
#[derive(Clone, Debug)]
pub struct MouseFollower {
    settings: FollowerSettings,
    pointer: Point,
    position: Point,
    hovering: bool,
    mobile: bool,
    width: f64,
}

impl MouseFollower {
    pub fn new(settings: FollowerSettings, viewport: Viewport, capabilities: Capabilities) -> Self {
        let mut follower = Self {
            settings,
            pointer: Point::ZERO,
            position: Point::ZERO,
            hovering: false,
            mobile: false,
            width: 0.0,
        };
        follower.on_resize(viewport.width, capabilities.touch);
        follower
    }

    pub fn on_resize(&mut self, width: f64, touch: bool) {
        self.width = width;
        self.mobile = touch || width <= self.settings.mobile_max_width_px;
    }

    /// Pointer moves are ignored on mobile viewports.
    pub fn on_pointer(&mut self, x: f64, y: f64) {
        if !self.mobile {
            self.pointer = Point::new(x, y);
        }
    }

    /// Advance one frame and return the new position.
    pub fn step(&mut self) -> Point {
        let k = self.settings.smoothing;
        self.position = self.position + (self.pointer - self.position) * k;
        self.position
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn is_visible(&self) -> bool {
        !self.mobile
    }

    pub fn set_hovering(&mut self, hovering: bool) {
        self.hovering = hovering;
    }

    pub fn is_hovering(&self) -> bool {
        self.hovering
    }

    fn scale(&self) -> f64 {
        if self.settings.reference_width_px <= 0.0 {
            return 1.0;
        }
        (self.width / self.settings.reference_width_px).clamp(0.0, 1.0)
    }

    /// `(size, expanded size)` in whole pixels for the current width.
    pub fn sizes(&self) -> (f64, f64) {
        let s = self.scale();
        (
            (self.settings.base_size_px * s).round(),
            (self.settings.expanded_size_px * s).round(),
        )
    }

    /// Transform centring the follower on its position.
    pub fn transform(&self) -> String {
        let (size, _) = self.sizes();
        format!(
            "translate3d({}px, {}px, 0)",
            self.position.x - size / 2.0,
            self.position.y - size / 2.0
        )
    }

    pub fn background(&self) -> &'static str {
        if self.hovering {
            BACKGROUND_EXPANDED
        } else {
            BACKGROUND_DEFAULT
        }
    }
}

struct DriverShared {
    scheduler: Scheduler,
    element: ElementRef,
    follower: RefCell<MouseFollower>,
    frame: Cell<Option<TimerId>>,
}

impl DriverShared {
    fn write(&self, property: &str, value: &str) {
        if let Err(err) = self.element.set_style(property, value) {
            tracing::warn!(element = self.element.id(), property, error = %err, "follower write failed");
        }
    }

    fn apply_sizes(&self) {
        let (size, expanded) = self.follower.borrow().sizes();
        self.write(SIZE_STYLE, &format!("{size}px"));
        self.write(EXPANDED_SIZE_STYLE, &format!("{expanded}px"));
    }

    fn show(this: &Rc<Self>) {
        this.write("display", "block");
        if this.frame.get().is_none() {
            Self::frame(this);
        }
    }

    fn hide(&self) {
        self.write("display", "none");
        if let Some(id) = self.frame.take() {
            self.scheduler.clear_timeout(id);
        }
    }

    fn frame(this: &Rc<Self>) {
        let (transform, background) = {
            let mut follower = this.follower.borrow_mut();
            follower.step();
            (follower.transform(), follower.background())
        };
        this.write("transform", &transform);
        this.write("background", background);

        let weak = Rc::downgrade(this);
        let interval = this.follower.borrow().settings.frame_interval;
        let id = this.scheduler.set_timeout(interval, move || {
            if let Some(shared) = weak.upgrade() {
                shared.frame.set(None);
                Self::frame(&shared);
            }
        });
        this.frame.set(Some(id));
    }
}

/// Runs a [`MouseFollower`] on the scheduler's frame loop and mirrors it onto an element.
pub struct FollowerDriver {
    events: HostEvents,
    shared: Rc<DriverShared>,
    listener: Cell<Option<ListenerId>>,
}

impl std::fmt::Debug for FollowerDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FollowerDriver")
            .field("follower", &*self.shared.follower.borrow())
            .field("frame_pending", &self.shared.frame.get().is_some())
            .finish()
    }
}

impl FollowerDriver {
    pub fn attach(
        events: &HostEvents,
        scheduler: &Scheduler,
        element: ElementRef,
        settings: FollowerSettings,
    ) -> Self {
        let follower = MouseFollower::new(settings, events.viewport(), events.capabilities());
        let shared = Rc::new(DriverShared {
            scheduler: scheduler.clone(),
            element,
            follower: RefCell::new(follower),
            frame: Cell::new(None),
        });
        shared.apply_sizes();
        if shared.follower.borrow().is_visible() {
            DriverShared::show(&shared);
        } else {
            shared.hide();
        }

        let weak = Rc::downgrade(&shared);
        let touch = events.capabilities().touch;
        let listener = events.listen(move |event| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            match event {
                HostEvent::PointerMove { x, y } => shared.follower.borrow_mut().on_pointer(*x, *y),
                HostEvent::Resize { width, .. } => {
                    let visible = {
                        let mut follower = shared.follower.borrow_mut();
                        follower.on_resize(*width, touch);
                        follower.is_visible()
                    };
                    shared.apply_sizes();
                    if visible {
                        DriverShared::show(&shared);
                    } else {
                        shared.hide();
                    }
                }
                HostEvent::Scroll { .. } | HostEvent::ElementResized { .. } => {}
            }
        });

        Self {
            events: events.clone(),
            shared,
            listener: Cell::new(Some(listener)),
        }
    }

    /// Pointer entered or left a highlighted element.
    pub fn set_hovering(&self, hovering: bool) {
        self.shared.follower.borrow_mut().set_hovering(hovering);
        if hovering {
            self.shared.write(EXPANDED_STYLE, "1");
        } else if let Err(err) = self.shared.element.remove_style(EXPANDED_STYLE) {
            tracing::warn!(error = %err, "follower write failed");
        }
    }

    pub fn position(&self) -> Point {
        self.shared.follower.borrow().position()
    }

    pub fn is_running(&self) -> bool {
        self.shared.frame.get().is_some()
    }

    /// Stop listening and cancel the pending frame.
    pub fn detach(&self) {
        if let Some(id) = self.listener.take() {
            self.events.unlisten(id);
        }
        if let Some(id) = self.shared.frame.take() {
            self.shared.scheduler.clear_timeout(id);
        }
    }
}

impl Drop for FollowerDriver {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pointer/follower.rs"]
mod tests;
