use std::sync::{Arc, Weak};
use std::time::Duration;

use panzoom_core::{
    ApzConfig, ApzContext, Collaborators, CompositeScheduler, ContentController, EventStatus,
    GestureBehavior, MultiTouchKind, PanZoomController, SnapshotSink, TreeAuthority,
};
use panzoom_geometry::{Point, Size};
use parking_lot::Mutex;
use web_time::Instant;

use crate::gestures::{scrollable_metrics, touch};
use crate::recorders::{
    RecordingContentController, RecordingScheduler, RecordingSnapshotSink, TestTree,
};

/// Headless harness for driving controllers in tests.
///
/// `PanZoomTestRule` owns a pinned clock and a full set of recording
/// collaborators. Time only moves when the test advances it, so sampling,
/// velocity and delayed tasks are deterministic.
pub struct PanZoomTestRule {
    context: Arc<ApzContext>,
    tree: Arc<TestTree>,
    content: Arc<RecordingContentController>,
    scheduler: Arc<RecordingScheduler>,
    snapshots: Arc<RecordingSnapshotSink>,
    now: Mutex<Instant>,
}

impl PanZoomTestRule {
    pub fn new(config: ApzConfig) -> Self {
        let context = ApzContext::new(config);
        let now = Instant::now();
        context.set_frame_time(now);
        Self {
            tree: Arc::new(TestTree::default()),
            content: Arc::new(RecordingContentController::new(Arc::clone(&context))),
            scheduler: Arc::new(RecordingScheduler::default()),
            snapshots: Arc::new(RecordingSnapshotSink::default()),
            now: Mutex::new(now),
            context,
        }
    }

    pub fn context(&self) -> &Arc<ApzContext> {
        &self.context
    }

    pub fn tree(&self) -> &TestTree {
        &self.tree
    }

    pub fn content(&self) -> &RecordingContentController {
        &self.content
    }

    pub fn scheduler(&self) -> &RecordingScheduler {
        &self.scheduler
    }

    pub fn snapshots(&self) -> &RecordingSnapshotSink {
        &self.snapshots
    }

    pub fn now(&self) -> Instant {
        *self.now.lock()
    }

    /// Moves the pinned clock forward and returns the new time.
    pub fn advance(&self, by: Duration) -> Instant {
        let mut now = self.now.lock();
        *now += by;
        self.context.set_frame_time(*now);
        *now
    }

    pub fn advance_ms(&self, millis: u64) -> Instant {
        self.advance(Duration::from_millis(millis))
    }

    pub fn collaborators(&self) -> Collaborators {
        let tree: Arc<dyn TreeAuthority> = self.tree.clone();
        let content: Arc<dyn ContentController> = self.content.clone();
        let scheduler: Arc<dyn CompositeScheduler> = self.scheduler.clone();
        let snapshots: Arc<dyn SnapshotSink> = self.snapshots.clone();
        Collaborators::new(Arc::downgrade(&tree))
            .with_content(Arc::downgrade(&content))
            .with_scheduler(Arc::downgrade(&scheduler))
            .with_snapshots(Arc::downgrade(&snapshots))
    }

    pub fn controller(&self) -> Arc<PanZoomController> {
        self.controller_with(GestureBehavior::Default)
    }

    pub fn controller_with(&self, behavior: GestureBehavior) -> Arc<PanZoomController> {
        PanZoomController::new(Arc::clone(&self.context), 0, self.collaborators(), behavior)
    }

    /// Controller wired to the tree only; nothing on the content side.
    pub fn controller_without_content(&self) -> Arc<PanZoomController> {
        let tree: Arc<dyn TreeAuthority> = self.tree.clone();
        let tree: Weak<dyn TreeAuthority> = Arc::downgrade(&tree);
        PanZoomController::new(
            Arc::clone(&self.context),
            0,
            Collaborators::new(tree),
            GestureBehavior::Default,
        )
    }

    /// Controller that has already received its first paint for a page of
    /// `page` size shown through `composition`.
    pub fn scrollable_controller(&self, composition: Size, page: Size) -> Arc<PanZoomController> {
        let controller = self.controller();
        controller.notify_layers_updated(&scrollable_metrics(composition, page), true);
        controller
    }

    /// Like [`scrollable_controller`](Self::scrollable_controller), with
    /// `parent` next in its hand-off chain.
    pub fn scrollable_child(
        &self,
        parent: &Arc<PanZoomController>,
        composition: Size,
        page: Size,
    ) -> Arc<PanZoomController> {
        let child = self.scrollable_controller(composition, page);
        self.tree.set_parent(&child, parent);
        child
    }

    pub fn touch_down(&self, controller: &PanZoomController, point: Point) -> EventStatus {
        controller.receive_input_event(touch(MultiTouchKind::Start, self.now(), point))
    }

    pub fn touch_move(&self, controller: &PanZoomController, point: Point) -> EventStatus {
        controller.receive_input_event(touch(MultiTouchKind::Move, self.now(), point))
    }

    pub fn touch_up(&self, controller: &PanZoomController, point: Point) -> EventStatus {
        controller.receive_input_event(touch(MultiTouchKind::End, self.now(), point))
    }

    /// Presses at `from`, moves to `to` in `steps` equal moves spaced
    /// `step` apart, and returns the status of every event sent. The finger
    /// stays down.
    pub fn drag(
        &self,
        controller: &PanZoomController,
        from: Point,
        to: Point,
        steps: u32,
        step: Duration,
    ) -> Vec<EventStatus> {
        let mut statuses = vec![self.touch_down(controller, from)];
        let steps = steps.max(1);
        for index in 1..=steps {
            self.advance(step);
            let t = index as f32 / steps as f32;
            let point = from + (to - from) * t;
            statuses.push(self.touch_move(controller, point));
        }
        statuses
    }

    /// [`drag`](Self::drag) followed by lifting the finger at `to`.
    pub fn swipe(
        &self,
        controller: &PanZoomController,
        from: Point,
        to: Point,
        steps: u32,
        step: Duration,
    ) -> Vec<EventStatus> {
        let mut statuses = self.drag(controller, from, to, steps, step);
        statuses.push(self.touch_up(controller, to));
        statuses
    }

    /// Advances the clock by `step` and samples `controller` there.
    pub fn frame(&self, controller: &PanZoomController, step: Duration) -> bool {
        let now = self.advance(step);
        controller.advance_animations(now)
    }

    /// Samples until the controller stops asking for frames. Returns the
    /// number of frames taken, or `None` if it was still animating after
    /// `max_frames`.
    pub fn run_animation(
        &self,
        controller: &PanZoomController,
        step: Duration,
        max_frames: usize,
    ) -> Option<usize> {
        for frame in 1..=max_frames {
            if !self.frame(controller, step) {
                return Some(frame);
            }
        }
        log::warn!("controller {} still animating after {} frames", controller.id(), max_frames);
        None
    }

    /// Runs the content tasks due at the current time.
    pub fn run_due_tasks(&self) -> usize {
        self.content.run_due_tasks()
    }
}

impl Default for PanZoomTestRule {
    fn default() -> Self {
        Self::new(ApzConfig::default())
    }
}
