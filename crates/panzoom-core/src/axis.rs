//! Per-axis touch tracking, velocity and overscroll.
//!
//! An [`AxisTracker`] never owns the viewport. Every operation that depends on
//! scroll bounds takes the current [`FrameMetrics`] and reads the component
//! selected by its [`AxisKind`].
//!
//! Units: touch positions, velocity and overscroll are in screen pixels
//! (velocity per millisecond); the scroll offset and page bounds are in
//! content pixels and converted with the zoom where the two meet.

use std::time::Duration;

use panzoom_animation::{FrictionDecay, SpringSpec};
use panzoom_geometry::{Point, Rect, Size};
use web_time::Instant;

use crate::config::ApzConfig;
use crate::velocity::VelocityQueue;
use crate::viewport::{FrameMetrics, COORDINATE_EPSILON};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AxisKind {
    Horizontal,
    Vertical,
}

impl AxisKind {
    pub fn of_point(self, point: Point) -> f32 {
        match self {
            AxisKind::Horizontal => point.x,
            AxisKind::Vertical => point.y,
        }
    }

    pub fn of_size(self, size: Size) -> f32 {
        match self {
            AxisKind::Horizontal => size.width,
            AxisKind::Vertical => size.height,
        }
    }

    pub fn rect_start(self, rect: &Rect) -> f32 {
        match self {
            AxisKind::Horizontal => rect.x,
            AxisKind::Vertical => rect.y,
        }
    }

    pub fn rect_length(self, rect: &Rect) -> f32 {
        match self {
            AxisKind::Horizontal => rect.width,
            AxisKind::Vertical => rect.height,
        }
    }
}

/// Result of splitting a requested displacement against the scroll bounds.
/// Both parts are in screen pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AdjustedDisplacement {
    /// Portion that can be scrolled without leaving the page.
    pub accepted: f32,
    /// Portion that would have gone past the page edge.
    pub overscroll: f32,
    /// Whether existing overscroll in the opposite direction was relieved.
    pub consumed_overscroll: bool,
}

#[derive(Clone, Debug)]
pub struct AxisTracker {
    kind: AxisKind,
    pos: f32,
    pos_time: Option<Instant>,
    start_pos: f32,
    velocity: f32,
    axis_locked: bool,
    overscroll: f32,
    velocity_queue: VelocityQueue,
}

impl AxisTracker {
    pub fn new(kind: AxisKind, config: &ApzConfig) -> Self {
        Self {
            kind,
            pos: 0.0,
            pos_time: None,
            start_pos: 0.0,
            velocity: 0.0,
            axis_locked: false,
            overscroll: 0.0,
            velocity_queue: VelocityQueue::new(config.max_velocity_queue_size),
        }
    }

    pub fn kind(&self) -> AxisKind {
        self.kind
    }

    /// Anchors a new touch. Pan distance is measured from here.
    pub fn start_touch(&mut self, pos: f32, time: Instant) {
        self.start_pos = pos;
        self.pos = pos;
        self.pos_time = Some(time);
        self.axis_locked = false;
    }

    /// Records a new finger position and derives the instantaneous velocity.
    pub fn update_with_touch(&mut self, pos: f32, time: Instant, config: &ApzConfig) {
        if pos == self.pos {
            return;
        }
        let elapsed_ms = match self.pos_time {
            Some(previous) => time.saturating_duration_since(previous).as_secs_f32() * 1000.0,
            None => 0.0,
        };
        if elapsed_ms <= 0.0 {
            self.pos = pos;
            self.pos_time = Some(time);
            return;
        }

        let mut velocity = if self.axis_locked {
            0.0
        } else {
            (self.pos - pos) / elapsed_ms
        };
        if config.max_velocity_inches_per_ms > 0.0 {
            let max = config.max_velocity_inches_per_ms * config.dpi;
            velocity = velocity.clamp(-max, max);
        }

        self.velocity = velocity;
        self.pos = pos;
        self.pos_time = Some(time);
        self.velocity_queue.push(time, velocity);
    }

    /// Finishes a touch: the release velocity is the mean of recent samples.
    pub fn end_touch(&mut self, time: Instant, config: &ApzConfig) {
        self.axis_locked = false;
        let relevance = Duration::from_millis(config.velocity_relevance_time_ms);
        self.velocity = self.velocity_queue.average_since(time, relevance);
        self.velocity_queue.clear();
    }

    pub fn cancel_touch(&mut self) {
        self.axis_locked = false;
        self.velocity = 0.0;
        self.velocity_queue.clear();
    }

    pub fn position(&self) -> f32 {
        self.pos
    }

    pub fn pan_start(&self) -> f32 {
        self.start_pos
    }

    pub fn pan_distance(&self) -> f32 {
        (self.pos - self.start_pos).abs()
    }

    pub fn pan_distance_to(&self, pos: f32) -> f32 {
        (pos - self.start_pos).abs()
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: f32) {
        self.velocity = velocity;
    }

    pub fn set_axis_locked(&mut self, locked: bool) {
        self.axis_locked = locked;
    }

    pub fn is_axis_locked(&self) -> bool {
        self.axis_locked
    }

    pub fn overscroll(&self) -> f32 {
        self.overscroll
    }

    pub fn is_overscrolled(&self) -> bool {
        self.overscroll != 0.0
    }

    pub fn is_in_positive_overscroll(&self) -> bool {
        self.overscroll > 0.0
    }

    pub fn clear_overscroll(&mut self) {
        self.overscroll = 0.0;
    }

    pub fn can_scroll(&self, metrics: &FrameMetrics) -> bool {
        self.page_length(metrics) - self.composition_length_css(metrics) > COORDINATE_EPSILON
    }

    pub fn can_scroll_now(&self, metrics: &FrameMetrics) -> bool {
        !self.axis_locked && self.can_scroll(metrics)
    }

    /// Splits a screen-space displacement into the part that stays on the
    /// page and the part that would overscroll.
    ///
    /// A locked axis accepts nothing. Overscroll in the opposite direction is
    /// relieved before anything scrolls. Whenever a residual remains the
    /// velocity is dropped, since it cannot move the content any further.
    pub fn adjust_displacement(
        &mut self,
        displacement: f32,
        metrics: &FrameMetrics,
    ) -> AdjustedDisplacement {
        if self.axis_locked {
            return AdjustedDisplacement::default();
        }

        let mut displacement = displacement;
        let mut consumed = 0.0;
        if self.overscroll > 0.0 && displacement < 0.0 {
            consumed = self.overscroll.min(-displacement);
        } else if self.overscroll < 0.0 && displacement > 0.0 {
            consumed = self.overscroll.max(-displacement);
        }
        self.overscroll -= consumed;
        displacement += consumed;

        let zoom = positive_zoom(metrics);
        let overscroll = self.displacement_will_overscroll_amount(displacement / zoom, metrics) * zoom;
        if overscroll != 0.0 {
            self.velocity = 0.0;
            displacement -= overscroll;
        }

        AdjustedDisplacement {
            accepted: displacement,
            overscroll,
            consumed_overscroll: consumed.abs() > crate::viewport::EPSILON,
        }
    }

    /// How far, in content pixels, moving by `displacement` content pixels
    /// would go past the page. Zero when the move stays on the page or would
    /// overflow both edges.
    pub fn displacement_will_overscroll_amount(&self, displacement: f32, metrics: &FrameMetrics) -> f32 {
        let origin = self.origin(metrics);
        let composition_end = origin + self.composition_length_css(metrics);
        let page_start = self.page_start(metrics);
        let page_end = page_start + self.page_length(metrics);

        let minus = origin + displacement < page_start - COORDINATE_EPSILON;
        let plus = composition_end + displacement > page_end + COORDINATE_EPSILON;
        match (minus, plus) {
            (true, false) => origin + displacement - page_start,
            (false, true) => composition_end + displacement - page_end,
            _ => 0.0,
        }
    }

    /// How far, in content pixels, zooming by `scale` about `focus` (content
    /// pixels from the scroll offset) would push the visible rect off the page.
    pub fn scale_will_overscroll_amount(&self, scale: f32, focus: f32, metrics: &FrameMetrics) -> f32 {
        if scale <= 0.0 {
            return 0.0;
        }
        let origin_after_scale = (self.origin(metrics) + focus) - (focus / scale);
        let length_after_scale = self.composition_length_css(metrics) / scale;
        let page_start = self.page_start(metrics);
        let page_end = page_start + self.page_length(metrics);

        let both = self.scale_will_overscroll_both_sides(scale, metrics);
        let minus = origin_after_scale < page_start - COORDINATE_EPSILON;
        let plus = origin_after_scale + length_after_scale > page_end + COORDINATE_EPSILON;
        if both || (minus && plus) {
            return 0.0;
        }
        if minus {
            origin_after_scale - page_start
        } else if plus {
            origin_after_scale + length_after_scale - page_end
        } else {
            0.0
        }
    }

    /// True when zooming by `scale` would make the visible length exceed the
    /// whole page.
    pub fn scale_will_overscroll_both_sides(&self, scale: f32, metrics: &FrameMetrics) -> bool {
        let zoom = metrics.zoom * scale;
        if zoom <= 0.0 {
            return true;
        }
        let composition = self.composition_length(metrics) / zoom;
        self.page_length(metrics) < composition
    }

    /// Accumulates elastic overscroll. Only applies at an edge the content has
    /// already reached, and is damped the further the axis is stretched.
    pub fn overscroll_by(&mut self, amount: f32, metrics: &FrameMetrics) {
        let amount = self.apply_resistance(amount, metrics);
        if amount > 0.0 {
            let composition_end = self.origin(metrics) + self.composition_length_css(metrics);
            let page_end = self.page_start(metrics) + self.page_length(metrics);
            if (composition_end - page_end).abs() > COORDINATE_EPSILON || self.overscroll < 0.0 {
                return;
            }
        } else if amount < 0.0 {
            if (self.origin(metrics) - self.page_start(metrics)).abs() > COORDINATE_EPSILON
                || self.overscroll > 0.0
            {
                return;
            }
        }
        self.overscroll += amount;
    }

    fn apply_resistance(&self, requested: f32, metrics: &FrameMetrics) -> f32 {
        let length = self.composition_length(metrics);
        if length <= 0.0 {
            return 0.0;
        }
        let factor = 1.0 - self.overscroll.abs() / length;
        if factor < 0.0 {
            0.0
        } else {
            requested * factor
        }
    }

    /// Decays the velocity by one frame of friction. Returns false, with the
    /// velocity zeroed, once it is at or below `stopped_threshold`.
    pub fn apply_fling_friction(&mut self, delta: Duration, friction: f32, stopped_threshold: f32) -> bool {
        let decay = FrictionDecay::new(friction, stopped_threshold);
        match decay.apply(self.velocity, delta.as_secs_f32() * 1000.0) {
            Some(velocity) => {
                self.velocity = velocity;
                true
            }
            None => {
                self.velocity = 0.0;
                false
            }
        }
    }

    /// Advances the snap-back spring by `delta`. Returns true while overscroll
    /// remains; the overscroll is clamped so it never crosses zero.
    pub fn sample_snap_back(&mut self, delta: Duration, spring: &SpringSpec) -> bool {
        if self.overscroll == 0.0 {
            return false;
        }
        let dt_ms = delta.as_secs_f32() * 1000.0;
        self.velocity = spring.step_velocity(self.overscroll, self.velocity, dt_ms);
        let displacement = self.velocity * dt_ms;

        let wrong_direction = (self.overscroll > 0.0 && displacement > 0.0)
            || (self.overscroll < 0.0 && displacement < 0.0);
        if wrong_direction {
            log::warn!("snap-back moving away from the edge on {:?}; settling", self.kind);
            self.overscroll = 0.0;
            self.velocity = 0.0;
            return false;
        }

        self.overscroll = if self.overscroll > 0.0 {
            (self.overscroll + displacement).max(0.0)
        } else {
            (self.overscroll + displacement).min(0.0)
        };
        if self.overscroll == 0.0 {
            self.velocity = 0.0;
            return false;
        }
        true
    }

    fn origin(&self, metrics: &FrameMetrics) -> f32 {
        self.kind.of_point(metrics.scroll_offset)
    }

    /// Visible length in screen pixels.
    pub fn composition_length(&self, metrics: &FrameMetrics) -> f32 {
        self.kind.of_size(metrics.composition_bounds.size())
    }

    fn composition_length_css(&self, metrics: &FrameMetrics) -> f32 {
        self.kind.of_size(metrics.composition_size_css())
    }

    fn page_start(&self, metrics: &FrameMetrics) -> f32 {
        self.kind.rect_start(&metrics.expanded_scrollable_rect())
    }

    fn page_length(&self, metrics: &FrameMetrics) -> f32 {
        self.kind.rect_length(&metrics.expanded_scrollable_rect())
    }
}

fn positive_zoom(metrics: &FrameMetrics) -> f32 {
    if metrics.zoom > 0.0 {
        metrics.zoom
    } else {
        1.0
    }
}

#[cfg(test)]
#[path = "tests/axis_tests.rs"]
mod tests;
