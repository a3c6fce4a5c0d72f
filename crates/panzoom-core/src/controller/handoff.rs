use std::sync::Arc;

use panzoom_geometry::Point;

use super::{PanZoomController, SharedState};
use crate::animation::{Animation, AnimationTarget, DeferredAction, FlingAnimation};
use crate::handoff::OverscrollHandoffChain;
use crate::state::PanZoomState;

impl PanZoomController {
    /// Asks the tree authority for this controller's chain. A controller the
    /// tree no longer knows about gets a chain holding only itself.
    pub(super) fn build_overscroll_handoff_chain(&self) -> Arc<OverscrollHandoffChain> {
        let Some(this) = self.self_ref.upgrade() else {
            return Arc::new(OverscrollHandoffChain::new());
        };
        match self.collaborators().and_then(|collaborators| collaborators.tree()) {
            Some(tree) => tree.build_overscroll_handoff_chain(&this),
            None => Arc::new(OverscrollHandoffChain::from_controllers([&this])),
        }
    }

    pub(super) fn call_dispatch_scroll(
        &self,
        start: Point,
        end: Point,
        chain: &Arc<OverscrollHandoffChain>,
        index: usize,
    ) -> bool {
        match self.collaborators().and_then(|collaborators| collaborators.tree()) {
            Some(tree) => tree.dispatch_scroll(self, start, end, chain, index),
            None => false,
        }
    }

    /// Scrolls by the motion from `start` to `end`, passing what this
    /// surface cannot take to the chain members after `index`, and keeping
    /// the rest as overscroll when nobody wants it.
    pub fn attempt_scroll(
        &self,
        start: Point,
        end: Point,
        chain: &Arc<OverscrollHandoffChain>,
        index: usize,
    ) -> bool {
        if self.is_destroyed() {
            return false;
        }
        // Moving a finger down scrolls the content up.
        let displacement = start - end;
        let overscroll = self.update(|shared| {
            let adjusted_x = shared.x.adjust_displacement(displacement.x, &shared.metrics);
            let adjusted_y = shared.y.adjust_displacement(displacement.y, &shared.metrics);
            if adjusted_x.consumed_overscroll || adjusted_y.consumed_overscroll {
                shared.schedule_composite();
            }
            let accepted = Point::new(adjusted_x.accepted, adjusted_y.accepted);
            if !accepted.is_zero() {
                let zoom = shared.metrics.zoom;
                shared.metrics.scroll_by(accepted / zoom);
                shared.schedule_composite_and_maybe_repaint();
                shared.publish();
            }
            Point::new(adjusted_x.overscroll, adjusted_y.overscroll)
        });

        if overscroll.is_zero() {
            return true;
        }
        if self.call_dispatch_scroll(end + overscroll, end, chain, index + 1) {
            return true;
        }
        log::trace!("controller {} taking overscroll {:?}", self.id, overscroll);
        self.overscroll_by(overscroll)
    }

    /// Stretches into overscroll along the axes that have room to scroll.
    fn overscroll_by(&self, overscroll: Point) -> bool {
        if !self.context.config().overscroll_enabled {
            return false;
        }
        self.update(|shared| {
            let x_can_scroll = shared.x.can_scroll(&shared.metrics);
            let y_can_scroll = shared.y.can_scroll(&shared.metrics);
            if x_can_scroll {
                shared.x.overscroll_by(overscroll.x, &shared.metrics);
            }
            if y_can_scroll {
                shared.y.overscroll_by(overscroll.y, &shared.metrics);
            }
            if x_can_scroll || y_can_scroll {
                shared.schedule_composite();
                return true;
            }
            false
        })
    }

    fn accept_fling(
        &self,
        velocity: Point,
        chain: &Arc<OverscrollHandoffChain>,
        handoff: bool,
        allow_overscroll: bool,
    ) {
        self.update(|shared| {
            // A fling handed to us adds to whatever velocity we already have.
            let x = shared.x.velocity() + velocity.x;
            let y = shared.y.velocity() + velocity.y;
            shared.x.set_velocity(x);
            shared.y.set_velocity(y);
            shared.set_state(PanZoomState::Fling);
            let now = shared.context.now();
            let context = Arc::clone(&shared.context);
            let SharedState {
                metrics,
                x,
                y,
                fling_acceleration,
                ..
            } = &mut *shared;
            let fling = FlingAnimation::new(
                AnimationTarget {
                    metrics,
                    x,
                    y,
                    config: context.config(),
                },
                Arc::clone(chain),
                !handoff,
                allow_overscroll,
                fling_acceleration,
                now,
            );
            shared.start_animation(Animation::Fling(fling));
        });
    }

    /// Takes the fling if this surface can pan at all.
    pub fn attempt_fling(
        &self,
        velocity: Point,
        chain: &Arc<OverscrollHandoffChain>,
        handoff: bool,
    ) -> bool {
        if self.is_destroyed() || !self.is_pannable() {
            return false;
        }
        self.accept_fling(velocity, chain, handoff, false);
        true
    }

    /// Offers a fling that ran into the edge to the rest of the chain; when
    /// nobody takes it this surface keeps flinging into overscroll.
    pub fn handle_fling_overscroll(&self, velocity: Point, chain: &Arc<OverscrollHandoffChain>) {
        let handed_off = match self.collaborators().and_then(|collaborators| collaborators.tree()) {
            Some(tree) => tree.dispatch_fling(self, velocity, chain, true),
            None => false,
        };
        if !handed_off && self.is_pannable() {
            self.accept_fling(velocity, chain, true, true);
        }
    }

    /// Like [`handle_fling_overscroll`](Self::handle_fling_overscroll), with
    /// a freshly built chain.
    pub fn handle_smooth_scroll_overscroll(&self, velocity: Point) {
        let chain = self.build_overscroll_handoff_chain();
        self.handle_fling_overscroll(velocity, &chain);
    }

    pub(super) fn run_deferred(&self, action: DeferredAction) {
        match action {
            DeferredAction::HandOffFling { velocity, chain } => {
                self.handle_fling_overscroll(velocity, &chain)
            }
            DeferredAction::HandOffSmoothScroll { velocity } => {
                self.handle_smooth_scroll_overscroll(velocity)
            }
            DeferredAction::SnapBackOverscrolled { chain } => chain.snap_back_overscrolled(),
        }
    }

    /// Starts a snap-back if overscrolled. Returns whether one started.
    pub fn snap_back_if_overscrolled(&self) -> bool {
        self.update(|shared| {
            if shared.is_overscrolled() {
                log::debug!("controller {} is overscrolled, snapping back", self.id);
                shared.start_snap_back();
                return true;
            }
            false
        })
    }

    /// Drops the running animation and any overscroll, returning to idle.
    pub fn cancel_animation(&self) {
        self.update(SharedState::cancel_animation);
    }

    pub fn clear_overscroll(&self) {
        self.update(SharedState::clear_overscroll);
    }

    pub fn flush_repaint_for_overscroll_handoff(&self) {
        self.update(|shared| {
            shared.request_content_repaint();
            shared.publish();
        });
    }

    /// Whether either axis has room to scroll.
    pub fn is_pannable(&self) -> bool {
        self.read(SharedState::is_pannable)
    }

    pub fn is_overscrolled(&self) -> bool {
        self.read(SharedState::is_overscrolled)
    }
}
