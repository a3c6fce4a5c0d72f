//! In-memory collaborators that record what a controller asks of them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use panzoom_core::{
    ApzContext, CompositeScheduler, ContentController, DelayedTask, EventStatus, FrameMetrics,
    GestureListener, Modifiers, MultiTouchInput, MultiTouchKind, OverscrollHandoffChain,
    PanZoomController, ScrollGuid, SnapshotSink, StateChange, TreeAuthority,
};
use panzoom_geometry::{Point, Rect, Size};
use parking_lot::Mutex;
use web_time::Instant;

/// A tap content was told about.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TapRecord {
    Single(Point),
    Double(Point),
    Long(Point),
    LongUp(Point),
}

struct PendingTask {
    due: Instant,
    sequence: u64,
    task: DelayedTask,
}

/// Content controller that records every call and queues posted tasks
/// until the test runs them.
pub struct RecordingContentController {
    context: Arc<ApzContext>,
    repaints: Mutex<Vec<FrameMetrics>>,
    acknowledgements: Mutex<Vec<(u64, u32)>>,
    taps: Mutex<Vec<TapRecord>>,
    async_scrolls: Mutex<Vec<Rect>>,
    state_changes: Mutex<Vec<(ScrollGuid, StateChange, i32)>>,
    tasks: Mutex<Vec<PendingTask>>,
    next_sequence: AtomicU64,
}

impl RecordingContentController {
    /// Task due times are measured on `context`'s clock.
    pub fn new(context: Arc<ApzContext>) -> Self {
        Self {
            context,
            repaints: Mutex::new(Vec::new()),
            acknowledgements: Mutex::new(Vec::new()),
            taps: Mutex::new(Vec::new()),
            async_scrolls: Mutex::new(Vec::new()),
            state_changes: Mutex::new(Vec::new()),
            tasks: Mutex::new(Vec::new()),
            next_sequence: AtomicU64::new(0),
        }
    }

    pub fn repaints(&self) -> Vec<FrameMetrics> {
        self.repaints.lock().clone()
    }

    pub fn last_repaint(&self) -> Option<FrameMetrics> {
        self.repaints.lock().last().copied()
    }

    pub fn acknowledgements(&self) -> Vec<(u64, u32)> {
        self.acknowledgements.lock().clone()
    }

    pub fn taps(&self) -> Vec<TapRecord> {
        self.taps.lock().clone()
    }

    pub fn async_scrolls(&self) -> Vec<Rect> {
        self.async_scrolls.lock().clone()
    }

    pub fn state_changes(&self) -> Vec<(ScrollGuid, StateChange, i32)> {
        self.state_changes.lock().clone()
    }

    /// Just the kinds, in delivery order.
    pub fn state_change_kinds(&self) -> Vec<StateChange> {
        self.state_changes
            .lock()
            .iter()
            .map(|(_, change, _)| *change)
            .collect()
    }

    pub fn count_state_changes(&self, change: StateChange) -> usize {
        self.state_changes
            .lock()
            .iter()
            .filter(|(_, recorded, _)| *recorded == change)
            .count()
    }

    pub fn clear(&self) {
        self.repaints.lock().clear();
        self.acknowledgements.lock().clear();
        self.taps.lock().clear();
        self.async_scrolls.lock().clear();
        self.state_changes.lock().clear();
    }

    pub fn pending_task_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Runs every task due at the context's current time, including tasks
    /// those tasks post. Returns how many ran.
    pub fn run_due_tasks(&self) -> usize {
        let mut ran = 0;
        loop {
            let now = self.context.now();
            let next = {
                let mut tasks = self.tasks.lock();
                let index = tasks
                    .iter()
                    .enumerate()
                    .filter(|(_, pending)| pending.due <= now)
                    .min_by_key(|(_, pending)| (pending.due, pending.sequence))
                    .map(|(index, _)| index);
                index.map(|index| tasks.remove(index))
            };
            let Some(pending) = next else {
                return ran;
            };
            (pending.task)();
            ran += 1;
        }
    }

    /// Runs every queued task regardless of its delay.
    pub fn run_all_tasks(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = {
                let mut tasks = self.tasks.lock();
                let index = tasks
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, pending)| (pending.due, pending.sequence))
                    .map(|(index, _)| index);
                index.map(|index| tasks.remove(index))
            };
            let Some(pending) = next else {
                return ran;
            };
            (pending.task)();
            ran += 1;
        }
    }
}

impl ContentController for RecordingContentController {
    fn request_content_repaint(&self, metrics: &FrameMetrics) {
        self.repaints.lock().push(*metrics);
    }

    fn acknowledge_scroll_update(&self, scroll_id: u64, scroll_generation: u32) {
        self.acknowledgements.lock().push((scroll_id, scroll_generation));
    }

    fn handle_double_tap(&self, point: Point, _modifiers: Modifiers, _guid: ScrollGuid) {
        self.taps.lock().push(TapRecord::Double(point));
    }

    fn handle_single_tap(&self, point: Point, _modifiers: Modifiers, _guid: ScrollGuid) {
        self.taps.lock().push(TapRecord::Single(point));
    }

    fn handle_long_tap(&self, point: Point, _modifiers: Modifiers, _guid: ScrollGuid) {
        self.taps.lock().push(TapRecord::Long(point));
    }

    fn handle_long_tap_up(&self, point: Point, _modifiers: Modifiers, _guid: ScrollGuid) {
        self.taps.lock().push(TapRecord::LongUp(point));
    }

    fn send_async_scroll_event(&self, _is_root: bool, content_rect: Rect, _scrollable_size: Size) {
        self.async_scrolls.lock().push(content_rect);
    }

    fn post_delayed_task(&self, task: DelayedTask, delay: Duration) {
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let due = self.context.now() + delay;
        self.tasks.lock().push(PendingTask {
            due,
            sequence,
            task,
        });
    }

    fn notify_state_change(&self, guid: ScrollGuid, change: StateChange, arg: i32) {
        log::trace!("state change {:?}({}) for {:?}", change, arg, guid);
        self.state_changes.lock().push((guid, change, arg));
    }
}

/// Counts composite requests.
#[derive(Default)]
pub struct RecordingScheduler {
    composites: AtomicUsize,
}

impl RecordingScheduler {
    pub fn composite_count(&self) -> usize {
        self.composites.load(Ordering::Relaxed)
    }
}

impl CompositeScheduler for RecordingScheduler {
    fn schedule_composite(&self) {
        self.composites.fetch_add(1, Ordering::Relaxed);
    }
}

/// Keeps the latest published viewport per controller.
#[derive(Default)]
pub struct RecordingSnapshotSink {
    latest: Mutex<HashMap<u64, FrameMetrics>>,
    publications: AtomicUsize,
}

impl RecordingSnapshotSink {
    pub fn latest(&self, controller_id: u64) -> Option<FrameMetrics> {
        self.latest.lock().get(&controller_id).copied()
    }

    pub fn publication_count(&self) -> usize {
        self.publications.load(Ordering::Relaxed)
    }
}

impl SnapshotSink for RecordingSnapshotSink {
    fn publish(&self, controller_id: u64, metrics: &FrameMetrics) {
        self.latest.lock().insert(controller_id, *metrics);
        self.publications.fetch_add(1, Ordering::Relaxed);
    }
}

/// Tree authority backed by a parent map. Chains run from a controller up
/// through its registered ancestors.
#[derive(Default)]
pub struct TestTree {
    parents: Mutex<HashMap<u64, Weak<PanZoomController>>>,
    flings: AtomicUsize,
}

impl TestTree {
    pub fn set_parent(&self, child: &PanZoomController, parent: &Arc<PanZoomController>) {
        self.parents.lock().insert(child.id(), Arc::downgrade(parent));
    }

    fn parent_of(&self, controller: &PanZoomController) -> Option<Arc<PanZoomController>> {
        self.parents
            .lock()
            .get(&controller.id())
            .and_then(Weak::upgrade)
    }

    /// Fling dispatches seen, hand-offs included.
    pub fn fling_count(&self) -> usize {
        self.flings.load(Ordering::Relaxed)
    }
}

impl TreeAuthority for TestTree {
    fn build_overscroll_handoff_chain(
        &self,
        initial: &Arc<PanZoomController>,
    ) -> Arc<OverscrollHandoffChain> {
        let mut chain = OverscrollHandoffChain::new();
        chain.push(initial);
        let mut current = Arc::clone(initial);
        while let Some(parent) = self.parent_of(&current) {
            chain.push(&parent);
            current = parent;
        }
        Arc::new(chain)
    }

    fn dispatch_fling(
        &self,
        prev: &PanZoomController,
        velocity: Point,
        chain: &Arc<OverscrollHandoffChain>,
        handoff: bool,
    ) -> bool {
        self.flings.fetch_add(1, Ordering::Relaxed);
        chain.dispatch_fling(prev, velocity, handoff)
    }
}

/// Gesture listener that answers every touch the same way and remembers
/// what it saw.
pub struct ScriptedGestureListener {
    response: Mutex<EventStatus>,
    seen: Mutex<Vec<MultiTouchKind>>,
    cancels: AtomicUsize,
}

impl ScriptedGestureListener {
    pub fn new(response: EventStatus) -> Self {
        Self {
            response: Mutex::new(response),
            seen: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
        }
    }

    pub fn set_response(&self, response: EventStatus) {
        *self.response.lock() = response;
    }

    pub fn seen(&self) -> Vec<MultiTouchKind> {
        self.seen.lock().clone()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::Relaxed)
    }
}

impl GestureListener for ScriptedGestureListener {
    fn handle_input_event(&self, event: &MultiTouchInput) -> EventStatus {
        self.seen.lock().push(event.kind);
        *self.response.lock()
    }

    fn cancel_gesture(&self) {
        self.cancels.fetch_add(1, Ordering::Relaxed);
    }
}
