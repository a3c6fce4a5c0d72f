//! The per-surface pan/zoom state machine.
//!
//! Input and sampling both mutate one [`SharedState`] behind a re-entrant
//! lock. Mutations happen inside short closures that only touch the state
//! itself; anything they want to tell the outside world is queued as an
//! [`Effect`] and delivered once the borrow is released. Calls into the
//! hand-off chain, which locks other controllers, are only ever made with
//! no lock held.

mod handoff;
mod input;
mod sampling;
mod sync;

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use panzoom_geometry::{Point, Rect, Size};
use parking_lot::{Mutex, ReentrantMutex};
use web_time::Instant;

use crate::animation::{Animation, FlingAcceleration, SnapBackAnimation};
use crate::axis::{AxisKind, AxisTracker};
use crate::collaborators::{Collaborators, GestureBehavior, GestureListener, StateChange};
use crate::context::ApzContext;
use crate::handoff::OverscrollHandoffChain;
use crate::state::PanZoomState;
use crate::touch_block::{TouchBlockQueue, TouchBlockState};
use crate::viewport::{calculate_pending_display_port, FrameMetrics, ScrollGuid, ZoomConstraints};
use crate::viewport_sync::{AsyncScrollThrottle, PaintThrottler};

pub use sampling::FrameSample;

/// A repaint request older than this no longer holds back newer ones.
const MAX_PAINT_WAIT: Duration = Duration::from_millis(500);

/// Outbound work queued while the state is borrowed.
enum Effect {
    ScheduleComposite,
    RequestRepaint(FrameMetrics),
    AsyncScroll {
        is_root: bool,
        content_rect: Rect,
        scrollable_size: Size,
    },
    StateChange {
        guid: ScrollGuid,
        change: StateChange,
        arg: i32,
    },
    AcknowledgeScrollUpdate {
        scroll_id: u64,
        scroll_generation: u32,
    },
}

/// Everything guarded by the controller lock.
struct SharedState {
    context: Arc<ApzContext>,
    layers_id: u64,
    metrics: FrameMetrics,
    /// Last viewport content reported as painted.
    last_content_paint: FrameMetrics,
    last_paint_request: FrameMetrics,
    last_dispatched_paint: FrameMetrics,
    x: AxisTracker,
    y: AxisTracker,
    state: PanZoomState,
    notification_blockers: u32,
    animation: Option<Animation>,
    zoom_constraints: ZoomConstraints,
    /// Pinch focus of the previous scale event, relative to the composition bounds.
    last_zoom_focus: Point,
    last_sample_time: Instant,
    fling_acceleration: FlingAcceleration,
    /// Set when touch-action restricted the pan to one direction.
    pan_dir_restricted: bool,
    paint_throttler: PaintThrottler,
    async_scroll: AsyncScrollThrottle,
    outbox: Vec<Effect>,
    publish_pending: bool,
}

impl SharedState {
    fn new(context: Arc<ApzContext>, layers_id: u64) -> Self {
        let now = context.now();
        let config = context.config();
        let x = AxisTracker::new(AxisKind::Horizontal, config);
        let y = AxisTracker::new(AxisKind::Vertical, config);
        Self {
            layers_id,
            metrics: FrameMetrics::default(),
            last_content_paint: FrameMetrics::default(),
            last_paint_request: FrameMetrics::default(),
            last_dispatched_paint: FrameMetrics::default(),
            x,
            y,
            state: PanZoomState::Idle,
            notification_blockers: 0,
            animation: None,
            zoom_constraints: ZoomConstraints::default(),
            last_zoom_focus: Point::ZERO,
            last_sample_time: now,
            fling_acceleration: FlingAcceleration::default(),
            pan_dir_restricted: false,
            paint_throttler: PaintThrottler::new(now, MAX_PAINT_WAIT),
            async_scroll: AsyncScrollThrottle::new(now),
            outbox: Vec::new(),
            publish_pending: false,
            context,
        }
    }

    fn guid(&self) -> ScrollGuid {
        self.metrics.guid(self.layers_id)
    }

    fn velocity(&self) -> Point {
        Point::new(self.x.velocity(), self.y.velocity())
    }

    fn is_overscrolled(&self) -> bool {
        self.x.is_overscrolled() || self.y.is_overscrolled()
    }

    fn is_pannable(&self) -> bool {
        self.x.can_scroll(&self.metrics) || self.y.can_scroll(&self.metrics)
    }

    fn set_state(&mut self, new_state: PanZoomState) {
        let old_state = std::mem::replace(&mut self.state, new_state);
        if old_state != new_state {
            log::debug!("controller state {:?} -> {:?}", old_state, new_state);
        }
        if self.notification_blockers == 0 {
            self.dispatch_state_change(old_state, new_state);
        }
    }

    fn dispatch_state_change(&mut self, old_state: PanZoomState, new_state: PanZoomState) {
        if !old_state.is_transforming() && new_state.is_transforming() {
            self.notify(StateChange::TransformBegin, 0);
        } else if old_state.is_transforming() && !new_state.is_transforming() {
            self.notify(StateChange::TransformEnd, 0);
        }
    }

    fn notify(&mut self, change: StateChange, arg: i32) {
        let guid = self.guid();
        self.outbox.push(Effect::StateChange { guid, change, arg });
    }

    fn schedule_composite(&mut self) {
        self.outbox.push(Effect::ScheduleComposite);
    }

    /// Marks the viewport as changed for snapshot readers.
    fn publish(&mut self) {
        self.publish_pending = true;
    }

    fn start_animation(&mut self, animation: Animation) {
        log::debug!("starting {} animation", animation.name());
        self.animation = Some(animation);
        self.last_sample_time = self.context.now();
        self.schedule_composite();
    }

    fn cancel_animation(&mut self) {
        log::trace!("cancelling animation in state {:?}", self.state);
        self.set_state(PanZoomState::Idle);
        self.animation = None;
        self.x.set_velocity(0.0);
        self.y.set_velocity(0.0);
        // Nothing else will relieve overscroll once the animation is gone.
        if self.is_overscrolled() {
            self.clear_overscroll();
            self.request_content_repaint();
            self.schedule_composite();
            self.publish();
        }
    }

    fn clear_overscroll(&mut self) {
        self.x.clear_overscroll();
        self.y.clear_overscroll();
    }

    fn start_snap_back(&mut self) {
        self.set_state(PanZoomState::SnapBack);
        let snap_back = SnapBackAnimation::new(&mut self.x, &mut self.y);
        self.start_animation(Animation::SnapBack(snap_back));
    }

    fn pending_display_port_for(&self, metrics: &mut FrameMetrics) {
        let paint_ms = self.paint_throttler.average_duration().as_secs_f32() * 1000.0;
        metrics.display_port_margins =
            calculate_pending_display_port(metrics, self.velocity(), paint_ms, self.context.config());
    }

    fn request_content_repaint(&mut self) {
        let mut metrics = self.metrics;
        self.pending_display_port_for(&mut metrics);
        self.metrics.display_port_margins = metrics.display_port_margins;
        self.post_repaint(metrics);
    }

    fn request_content_repaint_for(&mut self, mut metrics: FrameMetrics) {
        self.pending_display_port_for(&mut metrics);
        self.post_repaint(metrics);
    }

    fn post_repaint(&mut self, mut metrics: FrameMetrics) {
        if metrics.is_repaint_equivalent(&self.last_paint_request) {
            return;
        }
        self.send_async_scroll_event();
        metrics.pres_shell_id = self.last_content_paint.pres_shell_id;
        let now = self.context.now();
        if let Some(request) = self.paint_throttler.post(metrics, now) {
            self.dispatch_repaint(request);
        }
        self.last_paint_request = metrics;
    }

    fn dispatch_repaint(&mut self, request: FrameMetrics) {
        log::trace!(
            "requesting repaint at {:?} zoom {}",
            request.scroll_offset,
            request.zoom
        );
        self.last_dispatched_paint = request;
        self.outbox.push(Effect::RequestRepaint(request));
    }

    fn schedule_composite_and_maybe_repaint(&mut self) {
        self.schedule_composite();
        let interval = Duration::from_millis(self.context.config().pan_repaint_interval_ms);
        let now = self.context.now();
        if self.paint_throttler.time_since_last_request(now) > interval {
            self.request_content_repaint();
        }
    }

    fn send_async_scroll_event(&mut self) {
        let content_rect = Rect::from_origin_size(
            self.async_scroll.current_offset(),
            self.metrics.composition_size_css(),
        );
        self.outbox.push(Effect::AsyncScroll {
            is_root: self.metrics.is_root,
            content_rect,
            scrollable_size: self.metrics.scrollable_rect.size(),
        });
    }

    fn take_snapshot(&mut self) -> Option<FrameMetrics> {
        if std::mem::take(&mut self.publish_pending) {
            Some(self.metrics)
        } else {
            None
        }
    }
}

/// Touch-block bookkeeping, touched only from the input context.
#[derive(Default)]
struct InputState {
    touch_blocks: TouchBlockQueue,
    /// Hand-off chain of the trackpad pan in progress.
    pan_gesture_chain: Option<Arc<OverscrollHandoffChain>>,
    /// Hand-off chain of the pinch in progress.
    pinch_chain: Option<Arc<OverscrollHandoffChain>>,
}

/// Drives pan, pinch and animation for one scrollable surface.
pub struct PanZoomController {
    id: u64,
    layers_id: u64,
    context: Arc<ApzContext>,
    self_ref: Weak<PanZoomController>,
    shared: ReentrantMutex<RefCell<SharedState>>,
    input: Mutex<InputState>,
    collaborators: Mutex<Option<Collaborators>>,
    gesture_listener: Mutex<Option<Arc<dyn GestureListener>>>,
    destroyed: AtomicBool,
}

impl PanZoomController {
    pub fn new(
        context: Arc<ApzContext>,
        layers_id: u64,
        collaborators: Collaborators,
        behavior: GestureBehavior,
    ) -> Arc<Self> {
        let id = context.next_controller_id();
        let shared = SharedState::new(Arc::clone(&context), layers_id);
        log::debug!("created controller {} for layers {}", id, layers_id);
        Arc::new_cyclic(|self_ref| Self {
            id,
            layers_id,
            context,
            self_ref: self_ref.clone(),
            shared: ReentrantMutex::new(RefCell::new(shared)),
            input: Mutex::new(InputState::default()),
            collaborators: Mutex::new(Some(collaborators)),
            gesture_listener: Mutex::new(behavior.listener()),
            destroyed: AtomicBool::new(false),
        })
    }

    /// Runs `f` on the shared state, then delivers whatever it queued.
    ///
    /// Effects run with the lock still held so a collaborator may call back
    /// into this controller; the snapshot is published after it is released.
    fn update<R>(&self, f: impl FnOnce(&mut SharedState) -> R) -> R {
        let (result, snapshot) = {
            let guard = self.shared.lock();
            let (result, effects, snapshot) = {
                let mut shared = guard.borrow_mut();
                let result = f(&mut shared);
                let effects = std::mem::take(&mut shared.outbox);
                let snapshot = shared.take_snapshot();
                (result, effects, snapshot)
            };
            if !effects.is_empty() {
                self.run_effects(effects);
            }
            (result, snapshot)
        };
        if let Some(metrics) = snapshot {
            self.publish_snapshot(&metrics);
        }
        result
    }

    fn read<R>(&self, f: impl FnOnce(&SharedState) -> R) -> R {
        let guard = self.shared.lock();
        let shared = guard.borrow();
        f(&shared)
    }

    fn run_effects(&self, effects: Vec<Effect>) {
        let Some(collaborators) = self.collaborators() else {
            return;
        };
        let content = collaborators.content();
        for effect in effects {
            match effect {
                Effect::ScheduleComposite => {
                    if let Some(scheduler) = collaborators.scheduler() {
                        scheduler.schedule_composite();
                    }
                }
                Effect::RequestRepaint(metrics) => {
                    if let Some(content) = &content {
                        content.request_content_repaint(&metrics);
                    }
                }
                Effect::AsyncScroll {
                    is_root,
                    content_rect,
                    scrollable_size,
                } => {
                    if let Some(content) = &content {
                        content.send_async_scroll_event(is_root, content_rect, scrollable_size);
                    }
                }
                Effect::StateChange { guid, change, arg } => {
                    if let Some(content) = &content {
                        content.notify_state_change(guid, change, arg);
                    }
                }
                Effect::AcknowledgeScrollUpdate {
                    scroll_id,
                    scroll_generation,
                } => {
                    if let Some(content) = &content {
                        log::debug!("acknowledging scroll update generation {}", scroll_generation);
                        content.acknowledge_scroll_update(scroll_id, scroll_generation);
                    }
                }
            }
        }
    }

    fn publish_snapshot(&self, metrics: &FrameMetrics) {
        let sink = self
            .collaborators()
            .and_then(|collaborators| collaborators.snapshots());
        if let Some(sink) = sink {
            sink.publish(self.id, metrics);
        }
    }

    fn collaborators(&self) -> Option<Collaborators> {
        self.collaborators.lock().clone()
    }

    fn gesture_listener(&self) -> Option<Arc<dyn GestureListener>> {
        self.gesture_listener.lock().clone()
    }

    fn current_block<R>(&self, f: impl FnOnce(&TouchBlockState) -> R) -> Option<R> {
        self.input.lock().touch_blocks.current().map(f)
    }

    fn current_block_chain(&self) -> Option<Arc<OverscrollHandoffChain>> {
        self.current_block(|block| Arc::clone(block.overscroll_handoff_chain()))
    }

    /// Delays state-change notifications until the returned batch ends.
    pub fn batch_state_changes(&self) -> StateChangeBatch<'_> {
        StateChangeBatch::new(self)
    }

    /// Identifier assigned at construction; never reused.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn layers_id(&self) -> u64 {
        self.layers_id
    }

    pub fn guid(&self) -> ScrollGuid {
        self.read(SharedState::guid)
    }

    pub fn state(&self) -> PanZoomState {
        self.read(|shared| shared.state)
    }

    pub fn frame_metrics(&self) -> FrameMetrics {
        self.read(|shared| shared.metrics)
    }

    /// Replaces the viewport outright, bypassing layers-update reconciliation.
    pub fn set_frame_metrics(&self, metrics: FrameMetrics) {
        self.update(|shared| {
            shared.metrics = metrics;
            shared.publish();
        });
    }

    /// Axis velocities in screen pixels per millisecond.
    pub fn velocity(&self) -> Point {
        self.read(SharedState::velocity)
    }

    /// Current overscroll per axis, in screen pixels.
    pub fn overscroll(&self) -> Point {
        self.read(|shared| Point::new(shared.x.overscroll(), shared.y.overscroll()))
    }

    /// Maps a screen point into this surface's content coordinates.
    pub fn screen_to_content(&self, point: Point) -> Point {
        self.read(|shared| {
            let metrics = &shared.metrics;
            let zoom = if metrics.zoom > 0.0 { metrics.zoom } else { 1.0 };
            (point - metrics.composition_bounds.origin()) / zoom + metrics.scroll_offset
        })
    }

    /// Stops everything and lets go of every collaborator.
    pub fn destroy(&self) {
        self.cancel_animation();
        {
            let mut input = self.input.lock();
            input.touch_blocks.clear();
            input.pan_gesture_chain = None;
            input.pinch_chain = None;
        }
        self.update(|shared| shared.async_scroll.cancel_timeout());
        *self.collaborators.lock() = None;
        *self.gesture_listener.lock() = None;
        self.destroyed.store(true, Ordering::Release);
        log::debug!("destroyed controller {}", self.id);
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for PanZoomController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanZoomController")
            .field("id", &self.id)
            .field("layers_id", &self.layers_id)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

/// Scope during which state-change notifications are held back.
///
/// When the outermost batch ends, content hears about the net transition
/// from the state the batch started in to the current one, if that
/// transition crosses between transforming and non-transforming states.
pub struct StateChangeBatch<'a> {
    controller: &'a PanZoomController,
    initial: PanZoomState,
    open: bool,
}

impl<'a> StateChangeBatch<'a> {
    fn new(controller: &'a PanZoomController) -> Self {
        let initial = controller.update(|shared| {
            shared.notification_blockers += 1;
            shared.state
        });
        Self {
            controller,
            initial,
            open: true,
        }
    }

    /// Ends the batch, returning the states it started and ended in.
    pub fn close(mut self) -> (PanZoomState, PanZoomState) {
        self.finish()
    }

    fn finish(&mut self) -> (PanZoomState, PanZoomState) {
        let initial = self.initial;
        if !self.open {
            return (initial, self.controller.state());
        }
        self.open = false;
        self.controller.update(|shared| {
            shared.notification_blockers = shared.notification_blockers.saturating_sub(1);
            let current = shared.state;
            if shared.notification_blockers == 0 {
                shared.dispatch_state_change(initial, current);
            }
            (initial, current)
        })
    }
}

impl Drop for StateChangeBatch<'_> {
    fn drop(&mut self) {
        if self.open {
            self.finish();
        }
    }
}
