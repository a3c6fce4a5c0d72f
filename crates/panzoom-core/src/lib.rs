//! Asynchronous pan/zoom controller
//!
//! One [`PanZoomController`] per scrollable surface turns touch, pinch, tap
//! and trackpad input into scroll offset and zoom changes, runs fling, zoom,
//! snap-back and smooth-scroll animations on the compositor's clock, and
//! keeps content informed through a [`ContentController`]. Leftover motion
//! travels outward along an [`OverscrollHandoffChain`] built by the
//! [`TreeAuthority`] that owns the controllers.

mod animation;
mod axis;
mod collaborators;
mod config;
mod context;
mod controller;
mod error;
mod handoff;
mod input;
mod state;
mod touch_block;
mod velocity;
mod viewport;
mod viewport_sync;

pub use animation::{
    Animation, AnimationTarget, DeferredAction, DeferredActions, FlingAcceleration,
    FlingAnimation, SampleOutcome, SmoothScrollAnimation, SnapBackAnimation, ZoomAnimation,
};
pub use axis::{AdjustedDisplacement, AxisKind, AxisTracker};
pub use collaborators::{
    Collaborators, CompositeScheduler, ContentController, DelayedTask, GestureBehavior,
    GestureListener, SnapshotSink, StateChange, TreeAuthority,
};
pub use config::{ApzConfig, AxisLockMode, MAX_ZOOM, MIN_ZOOM};
pub use context::ApzContext;
pub use controller::{FrameSample, PanZoomController, StateChangeBatch};
pub use error::ApzError;
pub use handoff::OverscrollHandoffChain;
pub use input::{
    EventStatus, InputEvent, Modifiers, MultiTouchInput, MultiTouchKind, PanGestureInput, PanKind,
    PinchGestureInput, PinchKind, TapGestureInput, TapKind, TouchList, TouchPoint,
};
pub use state::PanZoomState;
pub use touch_block::{
    AllowedTouchBehavior, QueueStep, TouchBehaviorList, TouchBlockQueue, TouchBlockState,
};
pub use velocity::VelocityQueue;
pub use viewport::{
    calculate_pending_display_port, FrameMetrics, ScrollGuid, ZoomConstraints,
    COORDINATE_EPSILON, EPSILON,
};
pub use viewport_sync::{
    AsyncScrollDecision, AsyncScrollThrottle, CancelToken, DelayedTaskHandle, PaintThrottler,
};

pub mod prelude {
    pub use crate::collaborators::{
        Collaborators, CompositeScheduler, ContentController, GestureBehavior, SnapshotSink,
        TreeAuthority,
    };
    pub use crate::config::ApzConfig;
    pub use crate::context::ApzContext;
    pub use crate::controller::PanZoomController;
    pub use crate::input::{EventStatus, InputEvent};
    pub use crate::state::PanZoomState;
    pub use crate::viewport::{FrameMetrics, ZoomConstraints};
}
