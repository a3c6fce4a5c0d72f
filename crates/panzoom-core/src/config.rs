//! Tunables consulted by the controller.
//!
//! Every value that influences gesture classification, physics or repaint
//! policy lives here. Distances expressed in inches are converted to screen
//! pixels with [`ApzConfig::dpi`].

use std::f32::consts::PI;

use panzoom_animation::SpringSpec;

/// Lowest zoom any content may request.
pub const MIN_ZOOM: f32 = 0.125;

/// Highest zoom any content may request.
pub const MAX_ZOOM: f32 = 8.0;

/// How a pan commits to a single axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AxisLockMode {
    /// Never lock; every pan is free in both directions.
    Free,
    /// Lock once at pan start if the initial angle is close to an axis.
    #[default]
    Standard,
    /// Lock at pan start, then break out of the lock when the finger
    /// travels far enough away from the locked axis.
    Sticky,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApzConfig {
    /// Screen pixels per inch.
    pub dpi: f32,
    /// Finger travel, in inches, before a touch becomes a pan.
    pub touch_start_tolerance: f32,
    pub axis_lock_mode: AxisLockMode,
    /// Maximum angle from an axis, in radians, for the pan to lock onto it.
    pub axis_lock_angle: f32,
    /// Travel, in inches, required to break a sticky lock.
    pub axis_breakout_threshold: f32,
    pub axis_breakout_angle: f32,
    /// Angle from an axis within which a restricted touch-action still pans.
    pub allowed_direct_pan_angle: f32,
    pub cross_slide_enabled: bool,
    pub touch_action_enabled: bool,
    pub content_response_timeout_ms: u64,
    pub async_scroll_throttle_ms: u64,
    pub async_scroll_timeout_ms: u64,
    /// When false the async transform is clamped to the painted display port.
    pub allow_checkerboarding: bool,

    pub fling_accel_interval_ms: u64,
    pub fling_accel_base_mult: f32,
    pub fling_accel_supplemental_mult: f32,
    /// Per-millisecond friction applied to flings.
    pub fling_friction: f32,
    /// Velocity, in pixels per millisecond, below which a fling stops.
    pub fling_stopped_threshold: f32,
    /// Flings faster than this are not treated as taps when interrupted.
    pub fling_stop_on_tap_threshold: f32,
    pub fling_repaint_interval_ms: u64,
    /// Cap on tracked velocity, in inches per millisecond. Negative disables.
    pub max_velocity_inches_per_ms: f32,
    pub max_velocity_queue_size: usize,
    pub velocity_relevance_time_ms: u64,

    pub overscroll_enabled: bool,
    pub overscroll_fling_friction: f32,
    pub overscroll_fling_stopped_threshold: f32,
    pub overscroll_stretch_factor: f32,
    pub snap_back: SpringSpec,

    pub pan_repaint_interval_ms: u64,
    pub smooth_scroll_repaint_interval_ms: u64,
    pub smooth_scroll_spring_constant: f64,
    pub smooth_scroll_damping_ratio: f64,
    pub zoom_animation_duration_ms: u64,

    pub num_paint_duration_samples: usize,
    pub use_paint_duration: bool,
    pub velocity_bias: f32,
    pub min_skate_speed: f32,
    pub x_skate_size_multiplier: f32,
    pub y_skate_size_multiplier: f32,
    pub x_stationary_size_multiplier: f32,
    pub y_stationary_size_multiplier: f32,
    /// Minimum display-port padding beyond the visible area, in content pixels.
    pub danger_zone_x: f32,
    pub danger_zone_y: f32,
    pub enlarge_displayport_when_clipped: bool,
}

impl Default for ApzConfig {
    fn default() -> Self {
        Self {
            dpi: 160.0,
            touch_start_tolerance: 1.0 / 4.5,
            axis_lock_mode: AxisLockMode::Standard,
            axis_lock_angle: PI / 6.0,
            axis_breakout_threshold: 1.0 / 32.0,
            axis_breakout_angle: PI / 8.0,
            allowed_direct_pan_angle: PI / 3.0,
            cross_slide_enabled: false,
            touch_action_enabled: false,
            content_response_timeout_ms: 300,
            async_scroll_throttle_ms: 100,
            async_scroll_timeout_ms: 300,
            allow_checkerboarding: true,

            fling_accel_interval_ms: 500,
            fling_accel_base_mult: 1.0,
            fling_accel_supplemental_mult: 1.0,
            fling_friction: 0.002,
            fling_stopped_threshold: 0.01,
            fling_stop_on_tap_threshold: 0.05,
            fling_repaint_interval_ms: 75,
            max_velocity_inches_per_ms: -1.0,
            max_velocity_queue_size: 5,
            velocity_relevance_time_ms: 150,

            overscroll_enabled: false,
            overscroll_fling_friction: 0.02,
            overscroll_fling_stopped_threshold: 0.4,
            overscroll_stretch_factor: 0.5,
            snap_back: SpringSpec::default(),

            pan_repaint_interval_ms: 250,
            smooth_scroll_repaint_interval_ms: 75,
            smooth_scroll_spring_constant: 250.0,
            smooth_scroll_damping_ratio: 1.0,
            zoom_animation_duration_ms: 250,

            num_paint_duration_samples: 3,
            use_paint_duration: true,
            velocity_bias: 1.0,
            min_skate_speed: 1.0,
            x_skate_size_multiplier: 1.5,
            y_skate_size_multiplier: 2.5,
            x_stationary_size_multiplier: 3.0,
            y_stationary_size_multiplier: 3.5,
            danger_zone_x: 50.0,
            danger_zone_y: 100.0,
            enlarge_displayport_when_clipped: false,
        }
    }
}

impl ApzConfig {
    /// Touch start tolerance in screen pixels.
    pub fn touch_start_tolerance_px(&self) -> f32 {
        self.touch_start_tolerance * self.dpi
    }

    pub fn axis_breakout_threshold_px(&self) -> f32 {
        self.axis_breakout_threshold * self.dpi
    }

    pub fn with_overscroll(mut self, enabled: bool) -> Self {
        self.overscroll_enabled = enabled;
        self
    }

    pub fn with_axis_lock_mode(mut self, mode: AxisLockMode) -> Self {
        self.axis_lock_mode = mode;
        self
    }

    pub fn with_touch_action(mut self, enabled: bool) -> Self {
        self.touch_action_enabled = enabled;
        self
    }

    pub fn with_cross_slide(mut self, enabled: bool) -> Self {
        self.cross_slide_enabled = enabled;
        self
    }

    pub fn with_fling_friction(mut self, friction: f32, stopped_threshold: f32) -> Self {
        self.fling_friction = friction;
        self.fling_stopped_threshold = stopped_threshold;
        self
    }

    pub fn with_allow_checkerboarding(mut self, allow: bool) -> Self {
        self.allow_checkerboarding = allow;
        self
    }
}
