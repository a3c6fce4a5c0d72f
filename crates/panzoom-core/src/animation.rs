//! Time-stepped motion driven by the sampling context.
//!
//! Animations mutate the viewport and axis state they are handed, under the
//! controller lock. Anything that needs to touch another controller is
//! returned as a [`DeferredAction`] and run once the lock is released.

use std::sync::Arc;
use std::time::Duration;

use panzoom_animation::{Easing, Lerp, MassSpringDamper, Tween};
use panzoom_geometry::Point;
use smallvec::SmallVec;
use web_time::Instant;

use crate::axis::AxisTracker;
use crate::config::ApzConfig;
use crate::handoff::OverscrollHandoffChain;
use crate::viewport::{FrameMetrics, COORDINATE_EPSILON};

/// State an animation may mutate during one sample.
pub struct AnimationTarget<'a> {
    pub metrics: &'a mut FrameMetrics,
    pub x: &'a mut AxisTracker,
    pub y: &'a mut AxisTracker,
    pub config: &'a ApzConfig,
}

/// Follow-up work produced while sampling, run after the lock is released.
#[derive(Clone)]
pub enum DeferredAction {
    /// Offer the residual fling velocity to the rest of the chain.
    HandOffFling {
        velocity: Point,
        chain: Arc<OverscrollHandoffChain>,
    },
    /// Same for a smooth scroll that ran off the edge; the chain is rebuilt.
    HandOffSmoothScroll { velocity: Point },
    /// Spring back whichever chain member ended up overscrolled.
    SnapBackOverscrolled { chain: Arc<OverscrollHandoffChain> },
}

impl std::fmt::Debug for DeferredAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeferredAction::HandOffFling { velocity, chain } => f
                .debug_struct("HandOffFling")
                .field("velocity", velocity)
                .field("chain_len", &chain.len())
                .finish(),
            DeferredAction::HandOffSmoothScroll { velocity } => f
                .debug_struct("HandOffSmoothScroll")
                .field("velocity", velocity)
                .finish(),
            DeferredAction::SnapBackOverscrolled { chain } => f
                .debug_struct("SnapBackOverscrolled")
                .field("chain_len", &chain.len())
                .finish(),
        }
    }
}

pub type DeferredActions = SmallVec<[DeferredAction; 1]>;

#[derive(Debug, Default)]
pub struct SampleOutcome {
    pub keep_going: bool,
    pub deferred: DeferredActions,
}

impl SampleOutcome {
    fn running() -> Self {
        Self {
            keep_going: true,
            deferred: DeferredActions::new(),
        }
    }

    fn finished() -> Self {
        Self::default()
    }

    fn finished_with(action: DeferredAction) -> Self {
        let mut deferred = DeferredActions::new();
        deferred.push(action);
        Self {
            keep_going: false,
            deferred,
        }
    }
}

/// Time and velocity of the most recent fling, used to accelerate the next.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlingAcceleration {
    pub last_fling_time: Option<Instant>,
    pub last_fling_velocity: Point,
}

fn same_direction(a: f32, b: f32) -> bool {
    a == 0.0 || b == 0.0 || (a > 0.0) == (b > 0.0)
}

/// Momentum scroll seeded by the axis velocities.
#[derive(Clone)]
pub struct FlingAnimation {
    chain: Arc<OverscrollHandoffChain>,
    allow_overscroll: bool,
}

impl FlingAnimation {
    /// Starts a fling from the current axis velocities.
    ///
    /// Velocity on an axis with no scroll room is dropped. With
    /// `apply_acceleration`, a fling that follows the previous one closely in
    /// the same direction inherits its velocity.
    pub fn new(
        target: AnimationTarget<'_>,
        chain: Arc<OverscrollHandoffChain>,
        apply_acceleration: bool,
        allow_overscroll: bool,
        acceleration: &mut FlingAcceleration,
        now: Instant,
    ) -> Self {
        let AnimationTarget {
            metrics,
            x,
            y,
            config,
        } = target;
        if !x.can_scroll(metrics) {
            x.set_velocity(0.0);
        }
        if !y.can_scroll(metrics) {
            y.set_velocity(0.0);
        }

        let mut velocity = Point::new(x.velocity(), y.velocity());
        let interval = Duration::from_millis(config.fling_accel_interval_ms);
        if let Some(last) = acceleration.last_fling_time.filter(|_| apply_acceleration) {
            if now.saturating_duration_since(last) < interval {
                let previous = acceleration.last_fling_velocity;
                if same_direction(velocity.x, previous.x) {
                    velocity.x = velocity.x * config.fling_accel_base_mult
                        + previous.x * config.fling_accel_supplemental_mult;
                    x.set_velocity(velocity.x);
                }
                if same_direction(velocity.y, previous.y) {
                    velocity.y = velocity.y * config.fling_accel_base_mult
                        + previous.y * config.fling_accel_supplemental_mult;
                    y.set_velocity(velocity.y);
                }
                log::debug!("fling accelerated to {:?}", velocity);
            }
        }
        acceleration.last_fling_time = Some(now);
        acceleration.last_fling_velocity = velocity;

        Self {
            chain,
            allow_overscroll,
        }
    }

    fn sample(&mut self, target: AnimationTarget<'_>, delta: Duration) -> SampleOutcome {
        let AnimationTarget {
            metrics,
            x,
            y,
            config,
        } = target;
        let overscrolled = x.is_overscrolled() || y.is_overscrolled();
        let (friction, threshold) = if overscrolled {
            (
                config.overscroll_fling_friction,
                config.overscroll_fling_stopped_threshold,
            )
        } else {
            (config.fling_friction, config.fling_stopped_threshold)
        };

        let continue_x = x.apply_fling_friction(delta, friction, threshold);
        let continue_y = y.apply_fling_friction(delta, friction, threshold);
        if !continue_x && !continue_y {
            return SampleOutcome::finished_with(DeferredAction::SnapBackOverscrolled {
                chain: Arc::clone(&self.chain),
            });
        }

        let mut velocity = Point::new(x.velocity(), y.velocity());
        let dt_ms = delta.as_secs_f32() * 1000.0;
        let offset = velocity * dt_ms;
        let adjusted_x = x.adjust_displacement(offset.x, metrics);
        let adjusted_y = y.adjust_displacement(offset.y, metrics);
        metrics.scroll_by(Point::new(adjusted_x.accepted, adjusted_y.accepted) / metrics.zoom);

        let overscroll = Point::new(adjusted_x.overscroll, adjusted_y.overscroll);
        if overscroll.is_zero() {
            return SampleOutcome::running();
        }

        if self.allow_overscroll {
            if config.overscroll_enabled {
                if x.can_scroll(metrics) {
                    x.overscroll_by(overscroll.x, metrics);
                }
                if y.can_scroll(metrics) {
                    y.overscroll_by(overscroll.y, metrics);
                }
                x.set_velocity(velocity.x);
                y.set_velocity(velocity.y);
            }
            return SampleOutcome::running();
        }

        // Only the velocity along the exhausted axis travels on.
        if overscroll.x.abs() < COORDINATE_EPSILON {
            velocity.x = 0.0;
        } else if overscroll.y.abs() < COORDINATE_EPSILON {
            velocity.y = 0.0;
        }
        log::debug!("fling reached the edge; handing off {:?}", velocity);
        SampleOutcome::finished_with(DeferredAction::HandOffFling {
            velocity,
            chain: Arc::clone(&self.chain),
        })
    }
}

/// Animated zoom between two captured viewports.
#[derive(Clone, Debug)]
pub struct ZoomAnimation {
    start_offset: Point,
    start_zoom: f32,
    end_offset: Point,
    end_zoom: f32,
    elapsed: Duration,
    tween: Tween,
}

impl ZoomAnimation {
    pub fn new(
        start_offset: Point,
        start_zoom: f32,
        end_offset: Point,
        end_zoom: f32,
        config: &ApzConfig,
    ) -> Self {
        Self {
            start_offset,
            start_zoom,
            end_offset,
            end_zoom,
            elapsed: Duration::ZERO,
            tween: Tween::new(
                Duration::from_millis(config.zoom_animation_duration_ms),
                Easing::ease(),
            ),
        }
    }

    /// Offset and zoom at eased position `t` in [0, 1]. The offset moves
    /// linearly, so the zoom is interpolated in reciprocal space to keep
    /// the two in step on screen.
    pub fn interpolate(&self, t: f32) -> (Point, f32) {
        let zoom = 1.0 / (t / self.end_zoom + (1.0 - t) / self.start_zoom);
        let offset = Point::new(
            self.start_offset.x.lerp(&self.end_offset.x, t),
            self.start_offset.y.lerp(&self.end_offset.y, t),
        );
        (offset, zoom)
    }

    pub fn end(&self) -> (Point, f32) {
        (self.end_offset, self.end_zoom)
    }

    fn sample(&mut self, metrics: &mut FrameMetrics, delta: Duration) -> SampleOutcome {
        self.elapsed += delta;
        if self.tween.is_finished(self.elapsed) {
            metrics.zoom = self.end_zoom;
            metrics.scroll_offset = self.end_offset;
            return SampleOutcome::finished();
        }
        let (offset, zoom) = self.interpolate(self.tween.progress(self.elapsed));
        metrics.zoom = zoom;
        metrics.scroll_offset = offset;
        SampleOutcome::running()
    }
}

/// Springs overscroll on both axes back to the edge.
#[derive(Clone, Debug, Default)]
pub struct SnapBackAnimation;

impl SnapBackAnimation {
    pub fn new(x: &mut AxisTracker, y: &mut AxisTracker) -> Self {
        x.set_velocity(0.0);
        y.set_velocity(0.0);
        SnapBackAnimation
    }

    fn sample(&mut self, target: AnimationTarget<'_>, delta: Duration) -> SampleOutcome {
        let spring = &target.config.snap_back;
        let continue_x = target.x.sample_snap_back(delta, spring);
        let continue_y = target.y.sample_snap_back(delta, spring);
        if continue_x || continue_y {
            SampleOutcome::running()
        } else {
            SampleOutcome::finished()
        }
    }
}

/// Content-requested scroll to a destination, driven by a spring per axis.
///
/// The models run in content pixels per second.
#[derive(Clone, Debug)]
pub struct SmoothScrollAnimation {
    x_model: MassSpringDamper,
    y_model: MassSpringDamper,
}

impl SmoothScrollAnimation {
    /// `velocity` is the current axis velocity in screen pixels per millisecond.
    pub fn new(
        metrics: &FrameMetrics,
        velocity: Point,
        destination: Point,
        config: &ApzConfig,
    ) -> Self {
        let zoom = metrics.zoom as f64;
        let position = metrics.scroll_offset;
        let model = |pos: f32, dest: f32, v: f32| {
            MassSpringDamper::new(
                pos as f64,
                dest as f64,
                v as f64 / zoom * 1000.0,
                config.smooth_scroll_spring_constant,
                config.smooth_scroll_damping_ratio,
            )
        };
        Self {
            x_model: model(position.x, destination.x, velocity.x),
            y_model: model(position.y, destination.y, velocity.y),
        }
    }

    pub fn destination(&self) -> Point {
        Point::new(
            self.x_model.destination() as f32,
            self.y_model.destination() as f32,
        )
    }

    /// Retargets a running smooth scroll without resetting its momentum.
    pub fn set_destination(&mut self, destination: Point) {
        self.x_model.set_destination(destination.x as f64);
        self.y_model.set_destination(destination.y as f64);
    }

    fn sample(&mut self, target: AnimationTarget<'_>, delta: Duration) -> SampleOutcome {
        let AnimationTarget { metrics, x, y, .. } = target;
        let zoom = metrics.zoom;
        // One screen pixel, in content pixels.
        let increment = 1.0 / zoom as f64;
        if self.x_model.is_finished(increment) && self.y_model.is_finished(increment) {
            return SampleOutcome::finished();
        }
        self.x_model.simulate(delta);
        self.y_model.simulate(delta);

        let position = Point::new(self.x_model.position() as f32, self.y_model.position() as f32);
        let mut velocity = Point::new(
            (self.x_model.velocity() / 1000.0) as f32 * zoom,
            (self.y_model.velocity() / 1000.0) as f32 * zoom,
        );
        if self.x_model.is_finished(increment) {
            velocity.x = 0.0;
        }
        if self.y_model.is_finished(increment) {
            velocity.y = 0.0;
        }
        x.set_velocity(velocity.x);
        y.set_velocity(velocity.y);

        let displacement = (position - metrics.scroll_offset) * zoom;
        let adjusted_x = x.adjust_displacement(displacement.x, metrics);
        let adjusted_y = y.adjust_displacement(displacement.y, metrics);
        metrics.scroll_by(Point::new(adjusted_x.accepted, adjusted_y.accepted) / zoom);

        let overscroll = Point::new(adjusted_x.overscroll, adjusted_y.overscroll);
        if overscroll.is_zero() {
            return SampleOutcome::running();
        }
        if overscroll.x.abs() < COORDINATE_EPSILON {
            velocity.x = 0.0;
        } else if overscroll.y.abs() < COORDINATE_EPSILON {
            velocity.y = 0.0;
        }
        SampleOutcome::finished_with(DeferredAction::HandOffSmoothScroll { velocity })
    }
}

/// The fixed set of animations a controller can run.
#[derive(Clone)]
pub enum Animation {
    Fling(FlingAnimation),
    ZoomTo(ZoomAnimation),
    SnapBack(SnapBackAnimation),
    SmoothScroll(SmoothScrollAnimation),
}

impl Animation {
    /// Advances by `delta`. A non-positive delta changes nothing and keeps
    /// the animation alive.
    pub fn sample(&mut self, target: AnimationTarget<'_>, delta: Duration) -> SampleOutcome {
        if delta.is_zero() {
            return SampleOutcome::running();
        }
        match self {
            Animation::Fling(fling) => fling.sample(target, delta),
            Animation::ZoomTo(zoom) => zoom.sample(target.metrics, delta),
            Animation::SnapBack(snap_back) => snap_back.sample(target, delta),
            Animation::SmoothScroll(smooth) => smooth.sample(target, delta),
        }
    }

    /// How often content should be asked to repaint while this runs, if at all.
    pub fn repaint_interval(&self, config: &ApzConfig) -> Option<Duration> {
        match self {
            Animation::Fling(_) => Some(Duration::from_millis(config.fling_repaint_interval_ms)),
            Animation::SmoothScroll(_) => Some(Duration::from_millis(
                config.smooth_scroll_repaint_interval_ms,
            )),
            Animation::ZoomTo(_) | Animation::SnapBack(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Animation::Fling(_) => "fling",
            Animation::ZoomTo(_) => "zoom",
            Animation::SnapBack(_) => "snap-back",
            Animation::SmoothScroll(_) => "smooth-scroll",
        }
    }
}

impl std::fmt::Debug for Animation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Animation({})", self.name())
    }
}

#[cfg(test)]
#[path = "tests/animation_tests.rs"]
mod tests;
