//! Spring settle physics and the idle pulse curve.
//!
//! Springs are damped harmonic oscillators integrated in fixed 1 ms
//! sub-steps, parameterized by friction/tension the way mobile animation
//! toolkits expose them. The host advances them by wall-clock deltas; there
//! is no fixed duration, a spring simply runs until it comes to rest.

#[cfg(test)]
#[path = "animation_test.rs"]
mod animation_test;

use crate::consts::{PULSE_HALF_PERIOD_MS, PULSE_PEAK_SCALE, SPRING_REST_DISPLACEMENT, SPRING_REST_SPEED};
use crate::geometry::Point;

/// Integration sub-step, in seconds.
const STEP_S: f64 = 0.001;

/// Physical spring coefficients (unit mass).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringParams {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
}

impl SpringParams {
    /// Convert friction/tension into stiffness/damping (Origami mapping).
    #[must_use]
    pub fn from_friction_tension(friction: f64, tension: f64) -> Self {
        Self { stiffness: (tension - 30.0) * 3.62 + 194.0, damping: (friction - 8.0) * 3.0 + 25.0, mass: 1.0 }
    }
}

/// One animated scalar moving toward a target.
#[derive(Debug, Clone, Copy)]
pub struct Spring {
    value: f64,
    velocity: f64,
    target: f64,
    params: SpringParams,
    settled: bool,
}

impl Spring {
    #[must_use]
    pub fn new(from: f64, to: f64, params: SpringParams) -> Self {
        let settled = (from - to).abs() < SPRING_REST_DISPLACEMENT;
        Self { value: if settled { to } else { from }, velocity: 0.0, target: to, params, settled }
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Advance the simulation by `dt_ms` and return the new value.
    pub fn step(&mut self, dt_ms: f64) -> f64 {
        if self.settled || !dt_ms.is_finite() || dt_ms <= 0.0 {
            return self.value;
        }

        let SpringParams { stiffness, damping, mass } = self.params;
        let mut remaining = dt_ms / 1000.0;
        while remaining > 0.0 {
            let h = remaining.min(STEP_S);
            let force = -stiffness * (self.value - self.target) - damping * self.velocity;
            self.velocity += force / mass * h;
            self.value += self.velocity * h;
            remaining -= h;

            if self.velocity.abs() < SPRING_REST_SPEED && (self.value - self.target).abs() < SPRING_REST_DISPLACEMENT {
                self.value = self.target;
                self.velocity = 0.0;
                self.settled = true;
                break;
            }
        }
        self.value
    }
}

/// Two springs driving a widget position toward a target point.
#[derive(Debug, Clone, Copy)]
pub struct PositionMotion {
    x: Spring,
    y: Spring,
}

impl PositionMotion {
    #[must_use]
    pub fn new(from: Point, to: Point, params: SpringParams) -> Self {
        Self { x: Spring::new(from.x, to.x, params), y: Spring::new(from.y, to.y, params) }
    }

    pub fn step(&mut self, dt_ms: f64) -> Point {
        Point::new(self.x.step(dt_ms), self.y.step(dt_ms))
    }

    #[must_use]
    pub fn current(&self) -> Point {
        Point::new(self.x.value(), self.y.value())
    }

    #[must_use]
    pub fn target(&self) -> Point {
        Point::new(self.x.target(), self.y.target())
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.x.is_settled() && self.y.is_settled()
    }
}

/// Scale of the pulsing handle `elapsed_ms` after the pulse started.
///
/// Grows from 1.0 to the peak and back, ease in-out on each half.
#[must_use]
pub fn pulse_scale(elapsed_ms: f64) -> f64 {
    if !elapsed_ms.is_finite() || elapsed_ms <= 0.0 {
        return 1.0;
    }
    let phase = elapsed_ms % (2.0 * PULSE_HALF_PERIOD_MS);
    let t = if phase < PULSE_HALF_PERIOD_MS {
        phase / PULSE_HALF_PERIOD_MS
    } else {
        2.0 - phase / PULSE_HALF_PERIOD_MS
    };
    1.0 + (PULSE_PEAK_SCALE - 1.0) * ease_in_out(t)
}

fn ease_in_out(t: f64) -> f64 {
    0.5 - 0.5 * (std::f64::consts::PI * t).cos()
}
