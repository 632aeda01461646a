//! Gesture model: where a press landed and the drag state machine.
//!
//! Pan events carry the cumulative displacement since the press, the way
//! native gesture responders report them. A press only becomes a drag once
//! that displacement passes the threshold on either axis; below it the
//! press is still a candidate tap.

#[cfg(test)]
#[path = "gesture_test.rs"]
mod gesture_test;

use crate::geometry::Point;

/// Which part of the widget a press landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// The collapsed circular handle.
    Handle,
    /// The header strip of the expanded panel (drag zone).
    Header,
    /// Anywhere else on the expanded panel (inputs, lists, buttons).
    Body,
}

/// Drag tracking between press and release.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    /// No press in progress.
    #[default]
    Idle,
    /// Pressed but not yet past the movement threshold.
    Pending {
        /// Committed position when the press started.
        origin: Point,
    },
    /// Actively dragging; the live position follows the pointer.
    Dragging {
        /// Committed position when the press started; restored on abort.
        origin: Point,
    },
}

impl DragState {
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }

    #[must_use]
    pub fn origin(&self) -> Option<Point> {
        match *self {
            Self::Idle => None,
            Self::Pending { origin } | Self::Dragging { origin } => Some(origin),
        }
    }
}

/// Whether a cumulative displacement is large enough to start a drag.
#[must_use]
pub fn exceeds_threshold(delta: Point, threshold_px: f64) -> bool {
    delta.x.abs() > threshold_px || delta.y.abs() > threshold_px
}

/// Whether a tap at `now_ms` is far enough from the last drag release to count.
#[must_use]
pub fn tap_allowed(last_drag_end_ms: Option<u64>, now_ms: u64, suppress_ms: u64) -> bool {
    match last_drag_end_ms {
        None => true,
        Some(end) => now_ms.saturating_sub(end) > suppress_ms,
    }
}
