//! Screen-space geometry: points, sizes, the viewport, and clamp bounds.
//!
//! All coordinates are CSS/device-independent pixels with the origin at the
//! top-left of the viewport. A widget position is always its top-left corner.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use crate::consts::{
    BOTTOM_MARGIN_PX, BUBBLE_SIZE_PX, DRAG_EDGE_INSET_PX, DRAG_TOP_MARGIN_PX, EXPANDED_HEIGHT_GUTTER_PX,
    EXPANDED_MAX_HEIGHT_PX, EXPANDED_MAX_WIDTH_PX, EXPANDED_WIDTH_GUTTER_PX, INITIAL_X_PX, INITIAL_Y_FRACTION,
    REST_EDGE_INSET_PX, REST_TOP_MARGIN_PX,
};

/// A point (or a displacement) in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// This point displaced by `delta`.
    #[must_use]
    pub fn offset(self, delta: Point) -> Self {
        Self { x: self.x + delta.x, y: self.y + delta.y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn square(side: f64) -> Self {
        Self { width: side, height: side }
    }
}

/// The visible screen area the widget floats over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both dimensions are finite and positive.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Size of the collapsed handle.
    #[must_use]
    pub fn collapsed_size(&self) -> Size {
        Size::square(BUBBLE_SIZE_PX)
    }

    /// Size of the expanded panel. Shrinks on small screens but never below
    /// the handle itself.
    #[must_use]
    pub fn expanded_size(&self) -> Size {
        let width = EXPANDED_MAX_WIDTH_PX.min(self.width - EXPANDED_WIDTH_GUTTER_PX);
        let height = EXPANDED_MAX_HEIGHT_PX.min(self.height - EXPANDED_HEIGHT_GUTTER_PX);
        Size::new(width.max(BUBBLE_SIZE_PX), height.max(BUBBLE_SIZE_PX))
    }

    /// Where the handle first appears: left edge, a little above center.
    #[must_use]
    pub fn initial_position(&self) -> Point {
        let raw = Point::new(INITIAL_X_PX, self.height * INITIAL_Y_FRACTION);
        Bounds::rest(*self, self.collapsed_size()).clamp(raw)
    }
}

/// Inclusive range of legal top-left positions for a widget of some size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Bounds applied to the live position while a drag is in progress.
    #[must_use]
    pub fn drag(viewport: Viewport, size: Size) -> Self {
        Self::inset(viewport, size, DRAG_EDGE_INSET_PX, DRAG_TOP_MARGIN_PX, BOTTOM_MARGIN_PX)
    }

    /// Bounds applied to a committed (resting) position.
    #[must_use]
    pub fn rest(viewport: Viewport, size: Size) -> Self {
        Self::inset(viewport, size, REST_EDGE_INSET_PX, REST_TOP_MARGIN_PX, BOTTOM_MARGIN_PX)
    }

    fn inset(viewport: Viewport, size: Size, side: f64, top: f64, bottom: f64) -> Self {
        let (min_x, max_x) = axis_range(viewport.width, size.width, side, side);
        let (min_y, max_y) = axis_range(viewport.height, size.height, top, bottom);
        Self { min_x, max_x, min_y, max_y }
    }

    #[must_use]
    pub fn clamp(&self, p: Point) -> Point {
        Point::new(clamp_or_min(p.x, self.min_x, self.max_x), clamp_or_min(p.y, self.min_y, self.max_y))
    }

    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Snap `x` to whichever side edge the widget's center is closer to.
    #[must_use]
    pub fn snap_x(&self, x: f64, width: f64, viewport_width: f64) -> f64 {
        if x + width / 2.0 > viewport_width / 2.0 { self.max_x } else { self.min_x }
    }
}

/// Legal range for one axis. When the safety margins leave no room, the
/// margins are dropped and the raw viewport is used; when even that is too
/// small the widget pins to the origin.
fn axis_range(extent: f64, size: f64, lead: f64, trail: f64) -> (f64, f64) {
    let lo = lead;
    let hi = extent - size - trail;
    if hi >= lo {
        return (lo, hi);
    }
    (0.0, (extent - size).max(0.0))
}

fn clamp_or_min(v: f64, lo: f64, hi: f64) -> f64 {
    if v.is_nan() {
        return lo;
    }
    v.clamp(lo, hi)
}
