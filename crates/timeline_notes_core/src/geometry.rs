//! Anchor calculation and overlay edge correction.
//!
//! # Responsibility
//! - Express element rectangles relative to a reference container.
//! - Compute marker percentages and tooltip viewport corrections.
//!
//! # Invariants
//! - Every function here is pure; nothing is cached between calls.
//! - Missing or detached elements yield `None`, never a panic.

use crate::host::{ElementId, Layout};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Element position and size relative to a reference container's origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Anchor {
    /// Horizontal centre, the point tooltips hang from.
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

/// Expresses `element` relative to `reference`.
pub fn anchor_between(element: Option<Rect>, reference: Option<Rect>) -> Option<Anchor> {
    let element = element?;
    let reference = reference?;
    Some(Anchor {
        x: element.left - reference.left,
        y: element.top - reference.top,
        width: element.width,
        height: element.height,
    })
}

/// Measures `element` against `reference` through the host layout.
pub fn anchor_of(
    layout: &(impl Layout + ?Sized),
    element: Option<ElementId>,
    reference: Option<ElementId>,
) -> Option<Anchor> {
    let element_rect = element.and_then(|id| layout.bounding_rect(id));
    let reference_rect = reference.and_then(|id| layout.bounding_rect(id));
    anchor_between(element_rect, reference_rect)
}

/// Marker position on the track, in percent.
///
/// Callers must have checked that `duration` is finite and positive.
pub fn marker_percent(time: f64, duration: f64) -> f64 {
    (time / duration * 100.0).clamp(0.0, 100.0)
}

/// Returns whether a host duration can place markers.
pub fn is_known_duration(duration: f64) -> bool {
    duration.is_finite() && duration > 0.0
}

/// Smallest horizontal shift keeping `rect` inside the viewport minus `buffer`.
///
/// Positive values move right, negative values move left. The left edge wins
/// when the rectangle is wider than the usable viewport.
pub fn edge_shift(rect: Rect, viewport_width: f64, buffer: f64) -> f64 {
    if rect.left < buffer {
        buffer - rect.left
    } else if rect.right() > viewport_width - buffer {
        (viewport_width - buffer) - rect.right()
    } else {
        0.0
    }
}
