//! Shared numeric constants for the feedback bubble.

// ── Sizes ───────────────────────────────────────────────────────

/// Diameter of the collapsed handle, in screen pixels.
pub const BUBBLE_SIZE_PX: f64 = 56.0;

/// Upper bound on the expanded panel width.
pub const EXPANDED_MAX_WIDTH_PX: f64 = 340.0;

/// Horizontal room left around the expanded panel on narrow screens.
pub const EXPANDED_WIDTH_GUTTER_PX: f64 = 32.0;

/// Upper bound on the expanded panel height.
pub const EXPANDED_MAX_HEIGHT_PX: f64 = 480.0;

/// Vertical room left around the expanded panel on short screens.
pub const EXPANDED_HEIGHT_GUTTER_PX: f64 = 200.0;

// ── Placement ───────────────────────────────────────────────────

/// Initial x of the handle.
pub const INITIAL_X_PX: f64 = 16.0;

/// Initial y of the handle as a fraction of the viewport height.
pub const INITIAL_Y_FRACTION: f64 = 0.4;

/// Side inset applied while a drag is in progress.
pub const DRAG_EDGE_INSET_PX: f64 = 8.0;

/// Top safety margin applied while a drag is in progress.
pub const DRAG_TOP_MARGIN_PX: f64 = 60.0;

/// Side inset of a widget at rest (edge snap target).
pub const REST_EDGE_INSET_PX: f64 = 16.0;

/// Top safety margin of a widget at rest.
pub const REST_TOP_MARGIN_PX: f64 = 80.0;

/// Bottom safety margin (tab bar, home indicator). Same for drag and rest.
pub const BOTTOM_MARGIN_PX: f64 = 120.0;

// ── Gestures ────────────────────────────────────────────────────

/// Movement on either axis before a press turns into a drag.
pub const DEFAULT_DRAG_THRESHOLD_PX: f64 = 8.0;

/// A tap this soon after a drag release is treated as part of the drag.
pub const DEFAULT_TAP_SUPPRESS_MS: u64 = 200;

// ── Springs ─────────────────────────────────────────────────────

/// Friction of the edge-snap spring played on drag release.
pub const RELEASE_SPRING_FRICTION: f64 = 7.0;

/// Tension of the edge-snap spring played on drag release.
pub const RELEASE_SPRING_TENSION: f64 = 40.0;

/// Friction of the spring that pulls an expanding panel back on screen.
pub const EXPAND_SPRING_FRICTION: f64 = 8.0;

/// Tension of the spring that pulls an expanding panel back on screen.
pub const EXPAND_SPRING_TENSION: f64 = 40.0;

/// A spring closer than this to its target counts as settled.
pub const SPRING_REST_DISPLACEMENT: f64 = 0.001;

/// A spring slower than this (px/s) counts as settled.
pub const SPRING_REST_SPEED: f64 = 0.001;

// ── Pulse ───────────────────────────────────────────────────────

/// Peak scale of the collapsed handle while it holds notes.
pub const PULSE_PEAK_SCALE: f64 = 1.1;

/// Duration of one half (grow or shrink) of the pulse cycle.
pub const PULSE_HALF_PERIOD_MS: f64 = 800.0;
