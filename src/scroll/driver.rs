use std::cell::Cell;
use std::rc::Rc;

use crate::host::element::ElementRef;
use crate::host::events::{HostEvent, HostEvents, ListenerId};
use crate::scroll::progress::{ScrollFrame, ScrollSettings};

/// Custom property carrying the eased progress, for stylesheet-driven effects.
pub const PROGRESS_STYLE: &str = "--scroll-progress";

/// Elements receiving scroll effects. Every slot is optional.
#[derive(Clone, Default)]
pub struct ScrollTargets {
    /// Gets `transform: translateY(..)`.
    pub parallax: Option<ElementRef>,
    /// Gets `height`.
    pub collapse: Option<ElementRef>,
    /// Gets `opacity`.
    pub fade: Option<ElementRef>,
    /// Gets [`PROGRESS_STYLE`].
    pub section: Option<ElementRef>,
}

impl std::fmt::Debug for ScrollTargets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id = |e: &Option<ElementRef>| e.as_ref().map(|e| e.id().to_owned());
        f.debug_struct("ScrollTargets")
            .field("parallax", &id(&self.parallax))
            .field("collapse", &id(&self.collapse))
            .field("fade", &id(&self.fade))
            .field("section", &id(&self.section))
            .finish()
    }
}

struct DriverShared {
    settings: ScrollSettings,
    section_top: Cell<f64>,
    targets: ScrollTargets,
    last: Cell<ScrollFrame>,
}

impl DriverShared {
    fn apply(&self, scroll_y: f64) {
        let frame = self.settings.frame(scroll_y, self.section_top.get());
        self.last.set(frame);

        let writes: [(&Option<ElementRef>, &str, String); 4] = [
            (
                &self.targets.parallax,
                "transform",
                format!("translateY({:.2}px)", frame.translate_y),
            ),
            (&self.targets.collapse, "height", format!("{:.2}px", frame.height)),
            (&self.targets.fade, "opacity", format!("{:.3}", frame.opacity)),
            (
                &self.targets.section,
                PROGRESS_STYLE,
                format!("{:.4}", frame.progress.eased),
            ),
        ];
        for (target, property, value) in writes {
            let Some(element) = target else {
                continue;
            };
            if let Err(err) = element.set_style(property, &value) {
                tracing::warn!(element = element.id(), property, error = %err, "scroll effect write failed");
            }
        }
    }
}

/// Applies scroll effects to a section on every scroll event until detached.
pub struct ScrollDriver {
    events: HostEvents,
    shared: Rc<DriverShared>,
    listener: Cell<Option<ListenerId>>,
}

impl std::fmt::Debug for ScrollDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollDriver")
            .field("settings", &self.shared.settings)
            .field("section_top", &self.shared.section_top.get())
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl ScrollDriver {
    /// Attach and apply the current scroll position once.
    pub fn attach(
        events: &HostEvents,
        settings: ScrollSettings,
        section_top: f64,
        targets: ScrollTargets,
    ) -> Self {
        let shared = Rc::new(DriverShared {
            settings,
            section_top: Cell::new(section_top),
            targets,
            last: Cell::new(ScrollFrame::default()),
        });
        let weak = Rc::downgrade(&shared);
        let listener = events.listen(move |event| {
            if let HostEvent::Scroll { y } = event {
                if let Some(shared) = weak.upgrade() {
                    shared.apply(*y);
                }
            }
        });
        shared.apply(events.viewport().scroll_y);
        tracing::debug!(section_top, "scroll driver attached");
        Self {
            events: events.clone(),
            shared,
            listener: Cell::new(Some(listener)),
        }
    }

    /// Layout moved the section; re-apply at the current position.
    pub fn set_section_top(&self, section_top: f64) {
        self.shared.section_top.set(section_top);
        self.shared.apply(self.events.viewport().scroll_y);
    }

    pub fn last_frame(&self) -> ScrollFrame {
        self.shared.last.get()
    }

    pub fn is_attached(&self) -> bool {
        self.listener.get().is_some()
    }

    /// Stop listening. Returns `false` when already detached.
    pub fn detach(&self) -> bool {
        match self.listener.take() {
            Some(id) => self.events.unlisten(id),
            None => false,
        }
    }
}

impl Drop for ScrollDriver {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scroll/driver.rs"]
mod tests;
