//! The ordered set of controllers that may absorb leftover motion.

use std::sync::{Arc, Weak};

use panzoom_geometry::Point;

use crate::controller::PanZoomController;

/// Scrollable surfaces from the one a gesture started on outward to the
/// root, frozen for the lifetime of the gesture.
///
/// Entries are weak: a chain never keeps a controller alive, and members
/// that have been destroyed are skipped.
#[derive(Default)]
pub struct OverscrollHandoffChain {
    chain: Vec<Weak<PanZoomController>>,
}

impl OverscrollHandoffChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_controllers<'a>(
        controllers: impl IntoIterator<Item = &'a Arc<PanZoomController>>,
    ) -> Self {
        Self {
            chain: controllers.into_iter().map(Arc::downgrade).collect(),
        }
    }

    pub fn push(&mut self, controller: &Arc<PanZoomController>) {
        self.chain.push(Arc::downgrade(controller));
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Member at `index`, unless it has been dropped.
    pub fn get(&self, index: usize) -> Option<Arc<PanZoomController>> {
        self.chain.get(index).and_then(Weak::upgrade)
    }

    pub fn index_of(&self, controller: &PanZoomController) -> Option<usize> {
        let target: *const PanZoomController = controller;
        self.chain
            .iter()
            .position(|entry| std::ptr::eq(entry.as_ptr(), target))
    }

    fn live_members(&self) -> impl Iterator<Item = Arc<PanZoomController>> + '_ {
        self.chain
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|controller| !controller.is_destroyed())
    }

    /// Whether `controller` or anything after it can pan.
    pub fn can_be_panned(&self, controller: &PanZoomController) -> bool {
        let Some(start) = self.index_of(controller) else {
            return false;
        };
        self.chain[start..]
            .iter()
            .filter_map(Weak::upgrade)
            .any(|member| !member.is_destroyed() && member.is_pannable())
    }

    pub fn cancel_animations(&self) {
        for member in self.live_members() {
            member.cancel_animation();
        }
    }

    pub fn flush_repaints(&self) {
        for member in self.live_members() {
            member.flush_repaint_for_overscroll_handoff();
        }
    }

    pub fn clear_overscroll(&self) {
        for member in self.live_members() {
            member.clear_overscroll();
        }
    }

    /// Starts a snap-back on the first overscrolled member. At most one
    /// member is overscrolled at a time.
    pub fn snap_back_overscrolled(&self) {
        for member in self.live_members() {
            if member.snap_back_if_overscrolled() {
                break;
            }
        }
    }

    pub fn has_overscrolled_apzc(&self) -> bool {
        self.live_members().any(|member| member.is_overscrolled())
    }

    /// Offers the scroll from `start` to `end` to the member at `index`.
    /// Returns false when the chain is exhausted or that member is gone.
    pub fn dispatch_scroll_from(self: &Arc<Self>, index: usize, start: Point, end: Point) -> bool {
        if index >= self.len() {
            return false;
        }
        match self.get(index) {
            Some(next) if !next.is_destroyed() => next.attempt_scroll(start, end, self, index),
            _ => false,
        }
    }

    /// Offers `velocity` to each member in turn until one takes it. For a
    /// hand-off the walk starts after `prev`; otherwise it starts at the
    /// head and the head is told whether this is a hand-off.
    pub fn dispatch_fling(
        self: &Arc<Self>,
        prev: &PanZoomController,
        velocity: Point,
        handoff: bool,
    ) -> bool {
        let start = if handoff {
            match self.index_of(prev) {
                Some(index) => index + 1,
                None => return false,
            }
        } else {
            0
        };
        if start >= self.len() {
            return false;
        }

        for index in start..self.len() {
            let Some(member) = self.get(index) else {
                return false;
            };
            if member.is_destroyed() {
                return false;
            }
            let is_handoff = if index == 0 { handoff } else { true };
            if member.attempt_fling(velocity, self, is_handoff) {
                return true;
            }
        }
        false
    }
}

impl std::fmt::Debug for OverscrollHandoffChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<Option<u64>> = self
            .chain
            .iter()
            .map(|entry| entry.upgrade().map(|controller| controller.id()))
            .collect();
        f.debug_struct("OverscrollHandoffChain")
            .field("members", &ids)
            .finish()
    }
}
