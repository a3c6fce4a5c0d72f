//! The timing curve and fixed-length tween behind animated zooms.

use std::time::Duration;

/// Values that can be blended toward another of the same type.
pub trait Lerp {
    fn lerp(&self, target: &Self, fraction: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(&self, target: &Self, fraction: f32) -> Self {
        self + (target - self) * fraction
    }
}

/// A cubic-bezier timing curve anchored at (0, 0) and (1, 1), stored as
/// the polynomial coefficients of its x and y components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Easing {
    x: [f32; 3],
    y: [f32; 3],
}

impl Easing {
    /// Curve through control points `(x1, y1)` and `(x2, y2)`.
    pub fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: coefficients(x1, x2),
            y: coefficients(y1, y2),
        }
    }

    /// CSS `ease`. A zoom-to-rect starts quickly and settles gently.
    pub fn ease() -> Self {
        Self::cubic_bezier(0.25, 0.1, 0.25, 1.0)
    }

    /// Maps time progress in [0, 1] to motion progress. Input outside the
    /// range is clamped.
    pub fn transform(&self, fraction: f32) -> f32 {
        if fraction <= 0.0 {
            return 0.0;
        }
        if fraction >= 1.0 {
            return 1.0;
        }
        polynomial(self.y, self.solve_for_x(fraction))
    }

    /// Parameter `t` at which the curve reaches `x`.
    fn solve_for_x(&self, x: f32) -> f32 {
        const TOLERANCE: f32 = 1e-6;

        let mut t = x;
        for _ in 0..8 {
            let error = polynomial(self.x, t) - x;
            if error.abs() < TOLERANCE {
                return t;
            }
            let slope = slope(self.x, t);
            if slope.abs() < TOLERANCE {
                break;
            }
            t = (t - error / slope).clamp(0.0, 1.0);
        }

        // Flat spots stall Newton's method; bisect instead.
        let (mut low, mut high) = (0.0, 1.0);
        t = x;
        for _ in 0..20 {
            let error = polynomial(self.x, t) - x;
            if error.abs() < TOLERANCE {
                break;
            }
            if error > 0.0 {
                high = t;
            } else {
                low = t;
            }
            t = 0.5 * (low + high);
        }
        t
    }
}

fn coefficients(p1: f32, p2: f32) -> [f32; 3] {
    let c = 3.0 * p1;
    let b = 3.0 * (p2 - p1) - c;
    let a = 1.0 - c - b;
    [a, b, c]
}

fn polynomial([a, b, c]: [f32; 3], t: f32) -> f32 {
    ((a * t + b) * t + c) * t
}

fn slope([a, b, c]: [f32; 3], t: f32) -> f32 {
    (3.0 * a * t + 2.0 * b) * t + c
}

/// Progress through an animation of fixed length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub duration: Duration,
    pub easing: Easing,
}

impl Tween {
    pub fn new(duration: Duration, easing: Easing) -> Self {
        Self { duration, easing }
    }

    /// Whether `elapsed` has reached the end. A zero-length tween is done
    /// from the start.
    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }

    /// Eased progress at `elapsed`, in [0, 1].
    pub fn progress(&self, elapsed: Duration) -> f32 {
        if self.is_finished(elapsed) {
            return 1.0;
        }
        let linear = (elapsed.as_secs_f64() / self.duration.as_secs_f64()) as f32;
        self.easing.transform(linear)
    }
}

#[cfg(test)]
#[path = "tests/easing_tests.rs"]
mod tests;
