//! Contracts the controller consumes from its surroundings.
//!
//! Controllers hold every collaborator through a [`Weak`] handle: the tree
//! authority and the content bridge outlive any single controller and are
//! never owned by one.

use std::sync::{Arc, Weak};
use std::time::Duration;

use panzoom_geometry::{Point, Rect, Size};

use crate::controller::PanZoomController;
use crate::handoff::OverscrollHandoffChain;
use crate::input::{EventStatus, Modifiers, MultiTouchInput};
use crate::viewport::{FrameMetrics, ScrollGuid};

/// Notifications about the gesture lifecycle delivered to content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateChange {
    /// The surface started moving under an async transform.
    TransformBegin,
    /// The surface stopped moving.
    TransformEnd,
    /// A finger went down. The argument is 1 when the chain can pan.
    StartTouch,
    StartPanning,
    /// A finger went up. The argument is 1 when it produced a single tap.
    EndTouch,
}

/// Work posted back to content; executed later on its thread.
pub type DelayedTask = Box<dyn FnOnce() + Send>;

/// Owner of the controller tree.
///
/// The default scroll and fling dispatch walk the hand-off chain in order;
/// authorities only override them when they need to route differently.
pub trait TreeAuthority: Send + Sync {
    /// Ordered scrollable ancestors of `initial`, starting with `initial`.
    fn build_overscroll_handoff_chain(
        &self,
        initial: &Arc<PanZoomController>,
    ) -> Arc<OverscrollHandoffChain>;

    /// Offers the scroll from `start` to `end` to chain member `index` and,
    /// through it, to everything after it.
    fn dispatch_scroll(
        &self,
        _prev: &PanZoomController,
        start: Point,
        end: Point,
        chain: &Arc<OverscrollHandoffChain>,
        index: usize,
    ) -> bool {
        chain.dispatch_scroll_from(index, start, end)
    }

    /// Offers a fling. When `handoff` is set the walk starts after `prev`.
    fn dispatch_fling(
        &self,
        prev: &PanZoomController,
        velocity: Point,
        chain: &Arc<OverscrollHandoffChain>,
        handoff: bool,
    ) -> bool {
        chain.dispatch_fling(prev, velocity, handoff)
    }

    /// Maps a screen point into the content coordinates of `controller`.
    fn convert_to_content(&self, controller: &PanZoomController, point: Point) -> Point {
        controller.screen_to_content(point)
    }
}

/// Bridge to the content (layout/script) side.
pub trait ContentController: Send + Sync {
    fn request_content_repaint(&self, metrics: &FrameMetrics);

    fn acknowledge_scroll_update(&self, scroll_id: u64, scroll_generation: u32);

    fn handle_double_tap(&self, point: Point, modifiers: Modifiers, guid: ScrollGuid);

    fn handle_single_tap(&self, point: Point, modifiers: Modifiers, guid: ScrollGuid);

    fn handle_long_tap(&self, point: Point, modifiers: Modifiers, guid: ScrollGuid);

    fn handle_long_tap_up(&self, point: Point, modifiers: Modifiers, guid: ScrollGuid);

    /// Tells content where the surface is scrolled to while the offset is
    /// still changing asynchronously.
    fn send_async_scroll_event(&self, is_root: bool, content_rect: Rect, scrollable_size: Size);

    fn post_delayed_task(&self, task: DelayedTask, delay: Duration);

    fn notify_state_change(&self, _guid: ScrollGuid, _change: StateChange, _arg: i32) {}
}

/// Asks for a new composited frame. Fire and forget.
pub trait CompositeScheduler: Send + Sync {
    fn schedule_composite(&self);
}

/// Receives a copy of the viewport after changes readers care about.
pub trait SnapshotSink: Send + Sync {
    fn publish(&self, controller_id: u64, metrics: &FrameMetrics);
}

/// Low-level gesture recognizer that sees raw touches first.
pub trait GestureListener: Send + Sync {
    /// Returns [`EventStatus::ConsumeNoDefault`] to swallow the event.
    fn handle_input_event(&self, event: &MultiTouchInput) -> EventStatus;

    /// Drops any gesture in progress.
    fn cancel_gesture(&self);
}

/// Whether raw touches are routed through a [`GestureListener`].
#[derive(Clone)]
pub enum GestureBehavior {
    Default,
    UseGestureListener(Arc<dyn GestureListener>),
}

impl GestureBehavior {
    pub(crate) fn listener(&self) -> Option<Arc<dyn GestureListener>> {
        match self {
            GestureBehavior::Default => None,
            GestureBehavior::UseGestureListener(listener) => Some(Arc::clone(listener)),
        }
    }
}

/// Non-owning handles to everything a controller talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub tree: Weak<dyn TreeAuthority>,
    pub content: Option<Weak<dyn ContentController>>,
    pub scheduler: Option<Weak<dyn CompositeScheduler>>,
    pub snapshots: Option<Weak<dyn SnapshotSink>>,
}

impl Collaborators {
    pub fn new(tree: Weak<dyn TreeAuthority>) -> Self {
        Self {
            tree,
            content: None,
            scheduler: None,
            snapshots: None,
        }
    }

    pub fn with_content(mut self, content: Weak<dyn ContentController>) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_scheduler(mut self, scheduler: Weak<dyn CompositeScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn with_snapshots(mut self, snapshots: Weak<dyn SnapshotSink>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    pub(crate) fn tree(&self) -> Option<Arc<dyn TreeAuthority>> {
        self.tree.upgrade()
    }

    pub(crate) fn content(&self) -> Option<Arc<dyn ContentController>> {
        self.content.as_ref().and_then(Weak::upgrade)
    }

    pub(crate) fn scheduler(&self) -> Option<Arc<dyn CompositeScheduler>> {
        self.scheduler.as_ref().and_then(Weak::upgrade)
    }

    pub(crate) fn snapshots(&self) -> Option<Arc<dyn SnapshotSink>> {
        self.snapshots.as_ref().and_then(Weak::upgrade)
    }
}
