//! Rectangle overlap math used for contrast recoloring.
//!
//! The ratio is always normalised by the *text* rectangle: a huge background shape that covers a
//! small heading yields 1.0, while a small shape touching a wide paragraph yields a small value.

use crate::foundation::core::{Rect, Size};

/// Overlapping part of two axis-aligned rectangles.
///
/// Disjoint inputs produce a zero-size rectangle, never negative dimensions. Inputs with swapped
/// corners are normalised first.
pub fn intersect(a: Rect, b: Rect) -> Rect {
    let (a, b) = (a.abs(), b.abs());
    let x0 = a.x0.max(b.x0);
    let y0 = a.y0.max(b.y0);
    let x1 = a.x1.min(b.x1);
    let y1 = a.y1.min(b.y1);
    if x1 < x0 || y1 < y0 {
        return Rect::from_origin_size((x0, y0), Size::ZERO);
    }
    Rect::new(x0, y0, x1, y1)
}

/// Fraction of `text`'s area covered by `shape`, in `[0, 1]`.
///
/// Collapsed or hidden text (zero or non-finite area) yields `0.0`.
pub fn overlap_ratio(text: Rect, shape: Rect) -> f64 {
    let area = text.abs().area();
    if !area.is_finite() || area <= 0.0 {
        return 0.0;
    }
    let covered = intersect(text, shape).area();
    if !covered.is_finite() {
        return 0.0;
    }
    (covered / area).clamp(0.0, 1.0)
}

/// How much cover counts as "on the shape".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// At least 20 % of the text is covered. Tolerant; flips as soon as text is mostly readable
    /// against the shape.
    #[default]
    Coarse,
    /// More than 99.99 % covered. Only flips when the text sits fully on the shape.
    Strict,
}

impl OverlapPolicy {
    pub const COARSE_THRESHOLD: f64 = 0.20;
    pub const STRICT_THRESHOLD: f64 = 0.9999;
    /// Absorbs rounding in ratios computed from fractional coordinates.
    pub const RATIO_EPSILON: f64 = 1e-9;

    pub fn threshold(self) -> f64 {
        match self {
            Self::Coarse => Self::COARSE_THRESHOLD,
            Self::Strict => Self::STRICT_THRESHOLD,
        }
    }

    /// Coarse is inclusive at its threshold (within [`Self::RATIO_EPSILON`]), strict is
    /// exclusive.
    pub fn is_overlapping(self, ratio: f64) -> bool {
        match self {
            Self::Coarse => ratio >= Self::COARSE_THRESHOLD - Self::RATIO_EPSILON,
            Self::Strict => ratio > Self::STRICT_THRESHOLD,
        }
    }
}

/// Which of the two configured colours a text element should use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorRole {
    Primary,
    Overlap,
}

/// Result of testing one text rectangle against the shape.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct OverlapDecision {
    pub ratio: f64,
    pub overlapping: bool,
    pub role: ColorRole,
}

impl OverlapDecision {
    /// Evaluate from the current geometry. Nothing is cached between calls.
    pub fn evaluate(text: Rect, shape: Rect, policy: OverlapPolicy) -> Self {
        let ratio = overlap_ratio(text, shape);
        let overlapping = policy.is_overlapping(ratio);
        Self {
            ratio,
            overlapping,
            role: if overlapping {
                ColorRole::Overlap
            } else {
                ColorRole::Primary
            },
        }
    }

    /// Pick the colour string for this decision.
    pub fn color<'a>(&self, primary: &'a str, overlap: &'a str) -> &'a str {
        match self.role {
            ColorRole::Primary => primary,
            ColorRole::Overlap => overlap,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/overlap.rs"]
mod tests;
