//! Scroll-linked progress and the effects derived from it.
//!
//! Everything here is a pure function of the scroll position and fixed settings; no state
//! survives between two scroll events.

use crate::animation::ease::Ease;
use crate::foundation::core::finite_or;

/// Progress through a section's scroll window.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct ScrollProgress {
    /// Linear progress in `[0, 1]`.
    pub raw: f64,
    /// `raw` after easing, in `[0, 1]`.
    pub eased: f64,
}

impl ScrollProgress {
    /// Pre-trigger state.
    pub const RESET: Self = Self { raw: 0.0, eased: 0.0 };
}

/// Progress with the default cubic ease-out.
pub fn on_scroll(scroll_y: f64, section_top: f64, start_offset: f64, duration: f64) -> ScrollProgress {
    on_scroll_with(Ease::OutCubic, scroll_y, section_top, start_offset, duration)
}

/// Progress of `scroll_y` through the window that starts `start_offset` px above `section_top`
/// and lasts `duration` px.
///
/// Before the window (or for NaN input) the result is [`ScrollProgress::RESET`]. A zero or
/// negative `duration` jumps straight to full progress once the window is reached.
pub fn on_scroll_with(
    ease: Ease,
    scroll_y: f64,
    section_top: f64,
    start_offset: f64,
    duration: f64,
) -> ScrollProgress {
    let relative = scroll_y - (section_top - start_offset);
    if relative.is_nan() || relative < 0.0 {
        return ScrollProgress::RESET;
    }
    let raw = if duration.is_nan() || duration <= 0.0 {
        1.0
    } else {
        (relative / duration).clamp(0.0, 1.0)
    };
    ScrollProgress {
        raw,
        eased: ease.apply(raw),
    }
}

/// Constants for the three scroll-driven effects.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScrollEffects {
    /// Pixels of effect per pixel scrolled.
    pub factor: f64,
    /// Scroll distance after which content is fully faded and translation stops.
    pub fade_threshold: f64,
    /// Height of the collapsing element before any scroll.
    pub base_height: f64,
}

impl Default for ScrollEffects {
    fn default() -> Self {
        Self {
            factor: 0.5,
            fade_threshold: 400.0,
            base_height: 320.0,
        }
    }
}

impl ScrollEffects {
    /// `min(scroll_y * factor, fade_threshold * factor)`.
    pub fn translate_y(&self, scroll_y: f64) -> f64 {
        finite_or((scroll_y * self.factor).min(self.fade_threshold * self.factor), 0.0)
    }

    /// `max(base_height - scroll_y * factor, 0)`.
    pub fn height(&self, scroll_y: f64) -> f64 {
        finite_or((self.base_height - scroll_y * self.factor).max(0.0), 0.0)
    }

    /// `max(1 - scroll_y / fade_threshold, 0)`, capped at 1.
    pub fn opacity(&self, scroll_y: f64) -> f64 {
        if scroll_y.is_nan() {
            return 1.0;
        }
        if self.fade_threshold.is_nan() || self.fade_threshold <= 0.0 {
            return if scroll_y > 0.0 { 0.0 } else { 1.0 };
        }
        (1.0 - scroll_y / self.fade_threshold).clamp(0.0, 1.0)
    }
}

/// All effect values for one scroll position.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct ScrollFrame {
    pub scroll_y: f64,
    pub progress: ScrollProgress,
    pub translate_y: f64,
    pub height: f64,
    pub opacity: f64,
}

/// Window and effect settings for one scroll-driven section.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScrollSettings {
    /// How far above the section top the window opens.
    pub start_offset_px: f64,
    pub duration_px: f64,
    pub ease: Ease,
    pub effects: ScrollEffects,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            start_offset_px: 300.0,
            duration_px: 600.0,
            ease: Ease::OutCubic,
            effects: ScrollEffects::default(),
        }
    }
}

impl ScrollSettings {
    pub fn frame(&self, scroll_y: f64, section_top: f64) -> ScrollFrame {
        ScrollFrame {
            scroll_y,
            progress: on_scroll_with(
                self.ease,
                scroll_y,
                section_top,
                self.start_offset_px,
                self.duration_px,
            ),
            translate_y: self.effects.translate_y(scroll_y),
            height: self.effects.height(scroll_y),
            opacity: self.effects.opacity(scroll_y),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scroll/progress.rs"]
mod tests;
