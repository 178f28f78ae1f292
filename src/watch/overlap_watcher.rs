use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::geometry::overlap::{ColorRole, OverlapDecision, OverlapPolicy};
use crate::host::element::ElementRef;
use crate::host::events::{HostEvent, HostEvents, ListenerId};

/// Style property the watcher writes.
pub const COLOR_STYLE: &str = "color";

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WatchOptions {
    pub primary_color: String,
    pub overlap_color: String,
    pub policy: OverlapPolicy,
    /// Viewport width at or below which the fallback rule picks the overlap colour.
    pub narrow_breakpoint_px: f64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            primary_color: "var(--color-primary)".to_owned(),
            overlap_color: "white".to_owned(),
            policy: OverlapPolicy::Coarse,
            narrow_breakpoint_px: 768.0,
        }
    }
}

/// Handle for one [`OverlapWatcher::watch`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WatchToken(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Geometry is re-measured on every trigger.
    Precise,
    /// No resize observation; colour follows the breakpoint. Holds the last applied side.
    Breakpoint { narrow: bool },
}

struct Watch {
    texts: Vec<ElementRef>,
    shape: ElementRef,
    options: WatchOptions,
    mode: Mode,
    listener: ListenerId,
}

impl Watch {
    fn observes(&self, id: &str) -> bool {
        self.shape.id() == id || self.texts.iter().any(|t| t.id() == id)
    }
}

struct WatcherState {
    events: HostEvents,
    next_token: u64,
    watches: BTreeMap<WatchToken, Watch>,
}

impl Drop for WatcherState {
    fn drop(&mut self) {
        for watch in self.watches.values() {
            self.events.unlisten(watch.listener);
        }
    }
}

/// Recolours text elements depending on how much of them sits on a background shape.
///
/// Clones share their watches. Listeners of watches still active are removed when the last
/// clone is dropped.
#[derive(Clone)]
pub struct OverlapWatcher {
    events: HostEvents,
    state: Rc<RefCell<WatcherState>>,
}

impl std::fmt::Debug for OverlapWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlapWatcher")
            .field("watches", &self.state.borrow().watches.len())
            .finish()
    }
}

impl OverlapWatcher {
    pub fn new(events: HostEvents) -> Self {
        let state = WatcherState {
            events: events.clone(),
            next_token: 0,
            watches: BTreeMap::new(),
        };
        Self {
            events,
            state: Rc::new(RefCell::new(state)),
        }
    }

    /// Start recolouring `texts` against `shape`.
    ///
    /// Colours are applied once right away and then on every scroll, window resize, and size
    /// change of the shape or one of the texts. Without resize observation the breakpoint rule
    /// from `options` is used instead and only re-applied when the viewport crosses it.
    #[tracing::instrument(level = "debug", skip_all, fields(shape = shape.id(), texts = texts.len()))]
    pub fn watch(&self, texts: Vec<ElementRef>, shape: ElementRef, options: WatchOptions) -> WatchToken {
        let token = {
            let mut state = self.state.borrow_mut();
            state.next_token += 1;
            WatchToken(state.next_token)
        };

        let weak = Rc::downgrade(&self.state);
        let listener = self.events.listen(move |event| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let events = state.borrow().events.clone();
            let watcher = OverlapWatcher { events, state };
            watcher.on_event(token, event);
        });

        let precise = self.events.capabilities().resize_observer;
        let mode = if precise {
            Mode::Precise
        } else {
            tracing::debug!(
                breakpoint = options.narrow_breakpoint_px,
                "resize observation unavailable; using breakpoint rule"
            );
            Mode::Breakpoint {
                narrow: self.is_narrow(&options),
            }
        };

        self.state.borrow_mut().watches.insert(
            token,
            Watch {
                texts,
                shape,
                options,
                mode,
                listener,
            },
        );
        self.refresh(token);
        token
    }

    /// Stop watching. Returns `false` for unknown or already removed tokens.
    pub fn unwatch(&self, token: WatchToken) -> bool {
        let Some(watch) = self.state.borrow_mut().watches.remove(&token) else {
            return false;
        };
        self.events.unlisten(watch.listener);
        tracing::debug!(?token, "overlap watch removed");
        true
    }

    /// Re-apply colours for `token` now, whatever the mode.
    pub fn refresh(&self, token: WatchToken) -> bool {
        let Some((texts, shape, options, mode)) = self.snapshot(token) else {
            return false;
        };
        match mode {
            Mode::Precise => apply_precise(&texts, &shape, &options),
            Mode::Breakpoint { narrow } => apply_breakpoint(&texts, &options, narrow),
        }
        true
    }

    pub fn active_watches(&self) -> usize {
        self.state.borrow().watches.len()
    }

    fn is_narrow(&self, options: &WatchOptions) -> bool {
        self.events.viewport().width <= options.narrow_breakpoint_px
    }

    fn snapshot(&self, token: WatchToken) -> Option<(Vec<ElementRef>, ElementRef, WatchOptions, Mode)> {
        let state = self.state.borrow();
        let watch = state.watches.get(&token)?;
        Some((
            watch.texts.clone(),
            Rc::clone(&watch.shape),
            watch.options.clone(),
            watch.mode,
        ))
    }

    fn on_event(&self, token: WatchToken, event: &HostEvent) {
        let (mode, relevant) = {
            let state = self.state.borrow();
            let Some(watch) = state.watches.get(&token) else {
                return;
            };
            let relevant = match event {
                HostEvent::Scroll { .. } | HostEvent::Resize { .. } => true,
                HostEvent::ElementResized { id } => watch.observes(id),
                HostEvent::PointerMove { .. } => false,
            };
            (watch.mode, relevant)
        };
        if !relevant {
            return;
        }

        match mode {
            Mode::Precise => {
                self.refresh(token);
            }
            Mode::Breakpoint { narrow } => {
                if !matches!(event, HostEvent::Resize { .. }) {
                    return;
                }
                let now_narrow = {
                    let mut state = self.state.borrow_mut();
                    let Some(watch) = state.watches.get_mut(&token) else {
                        return;
                    };
                    let now_narrow = self.events.viewport().width <= watch.options.narrow_breakpoint_px;
                    watch.mode = Mode::Breakpoint { narrow: now_narrow };
                    now_narrow
                };
                if now_narrow != narrow {
                    tracing::debug!(narrow = now_narrow, "breakpoint crossed");
                    self.refresh(token);
                }
            }
        }
    }
}

fn apply_precise(texts: &[ElementRef], shape: &ElementRef, options: &WatchOptions) {
    let shape_rect = shape.bounding_rect();
    for text in texts {
        let decision = OverlapDecision::evaluate(text.bounding_rect(), shape_rect, options.policy);
        let color = decision.color(&options.primary_color, &options.overlap_color);
        write_color(text, color);
    }
}

fn apply_breakpoint(texts: &[ElementRef], options: &WatchOptions, narrow: bool) {
    let role = if narrow { ColorRole::Overlap } else { ColorRole::Primary };
    let color = match role {
        ColorRole::Primary => &options.primary_color,
        ColorRole::Overlap => &options.overlap_color,
    };
    for text in texts {
        write_color(text, color);
    }
}

fn write_color(element: &ElementRef, color: &str) {
    if let Err(err) = element.set_style(COLOR_STYLE, color) {
        tracing::warn!(element = element.id(), error = %err, "could not apply overlap colour");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/watch/overlap_watcher.rs"]
mod tests;
