use std::sync::Arc;
use std::time::Duration;

use panzoom_geometry::{Point, Rect, Transform2D};
use web_time::Instant;

use super::{PanZoomController, SharedState};
use crate::animation::{AnimationTarget, DeferredActions};
use crate::state::PanZoomState;
use crate::viewport_sync::{AsyncScrollDecision, DelayedTaskHandle};

/// Slack, in content pixels, allowed when testing whether the visible rect
/// is inside the painted one.
const CHECKERBOARD_FUZZ: f32 = 1.0 / 60.0;

/// What the compositor needs to draw one frame of a surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSample {
    /// Current scroll offset in screen pixels.
    pub scroll_offset: Point,
    /// Transform from the last painted content to where it is now.
    pub async_transform: Transform2D,
    /// Stretch applied on top while overscrolled.
    pub overscroll_transform: Option<Transform2D>,
}

impl SharedState {
    /// Steps the running animation to `sample_time`. Returns whether there
    /// was one, along with the follow-up work it produced.
    fn update_animation(&mut self, sample_time: Instant) -> (bool, DeferredActions) {
        // Several layers may share this controller; step once per frame.
        if self.last_sample_time == sample_time {
            return (false, DeferredActions::new());
        }
        let delta = sample_time.saturating_duration_since(self.last_sample_time);
        self.last_sample_time = sample_time;

        let Some(mut animation) = self.animation.take() else {
            return (false, DeferredActions::new());
        };
        let context = Arc::clone(&self.context);
        let config = context.config();
        let outcome = animation.sample(
            AnimationTarget {
                metrics: &mut self.metrics,
                x: &mut self.x,
                y: &mut self.y,
                config,
            },
            delta,
        );

        if outcome.keep_going {
            let interval = animation.repaint_interval(config);
            self.animation = Some(animation);
            let overdue = interval.is_some_and(|interval| {
                self.paint_throttler.time_since_last_request(sample_time) > interval
            });
            if overdue {
                self.request_content_repaint();
            }
        } else {
            log::debug!("{} animation finished", animation.name());
            self.set_state(PanZoomState::Idle);
            self.send_async_scroll_event();
            self.request_content_repaint();
        }
        self.publish();
        (true, outcome.deferred)
    }

    fn current_async_transform(&self) -> Transform2D {
        let painted = &self.last_content_paint;
        let last_paint_offset = painted.scroll_offset;
        let mut current = self.metrics.scroll_offset;

        if !self.context.config().allow_checkerboarding && !painted.display_port.is_empty() {
            let composited = painted.composition_size_css();
            let port = &painted.display_port;
            let min = last_paint_offset + port.origin();
            let max = last_paint_offset
                + Point::new(port.x_most() - composited.width, port.y_most() - composited.height);
            if min.x < max.x {
                current.x = current.x.clamp(min.x, max.x);
            }
            if min.y < max.y {
                current.y = current.y.clamp(min.y, max.y);
            }
        }

        let zoom = self.metrics.zoom;
        let scale = if painted.zoom > 0.0 {
            zoom / painted.zoom
        } else {
            1.0
        };
        let translation = -((current - last_paint_offset) * zoom);
        Transform2D::scale(scale, scale).then(&Transform2D::translation(translation))
    }

    fn overscroll_transform(&self) -> Option<Transform2D> {
        if !self.is_overscrolled() {
            return None;
        }
        let stretch = self.context.config().overscroll_stretch_factor;
        let width = self.x.composition_length(&self.metrics);
        let height = self.y.composition_length(&self.metrics);
        let scale_for = |overscroll: f32, length: f32| {
            if length > 0.0 {
                1.0 + stretch * overscroll.abs() / length
            } else {
                1.0
            }
        };
        let scale_x = scale_for(self.x.overscroll(), width);
        let scale_y = scale_for(self.y.overscroll(), height);

        // The stretch keeps the top-left corner in place; pin the far edge
        // instead when that is the one pulled past.
        let mut translation = Point::ZERO;
        if self.x.is_in_positive_overscroll() {
            translation.x = width - scale_x * width;
        }
        if self.y.is_in_positive_overscroll() {
            translation.y = height - scale_y * height;
        }
        Some(Transform2D::scale(scale_x, scale_y).then(&Transform2D::translation(translation)))
    }

    fn transform_to_last_dispatched_paint(&self) -> Transform2D {
        let painted = &self.last_content_paint;
        let dispatched = &self.last_dispatched_paint;
        let scroll_change = (painted.scroll_offset - dispatched.scroll_offset) * painted.zoom;
        let zoom_change = if dispatched.zoom > 0.0 {
            painted.zoom / dispatched.zoom
        } else {
            1.0
        };
        Transform2D::translation(scroll_change).then(&Transform2D::scale(zoom_change, zoom_change))
    }

    fn is_currently_checkerboarding(&self) -> bool {
        if !self.context.config().allow_checkerboarding {
            return false;
        }
        let painted = self.last_content_paint.painted_rect();
        let painted = Rect::new(
            painted.x - CHECKERBOARD_FUZZ,
            painted.y - CHECKERBOARD_FUZZ,
            painted.width + 2.0 * CHECKERBOARD_FUZZ,
            painted.height + 2.0 * CHECKERBOARD_FUZZ,
        );
        !painted.contains_rect(&self.metrics.composited_rect_css())
    }
}

impl PanZoomController {
    /// Advances the running animation to `sample_time` and runs whatever
    /// hand-off it asked for. Returns true while another frame is needed.
    pub fn advance_animations(&self, sample_time: Instant) -> bool {
        let batch = self.batch_state_changes();
        let (mut request_frame, deferred) = self.update(|shared| {
            let result = shared.update_animation(sample_time);
            let offset = shared.metrics.scroll_offset;
            shared.async_scroll.set_current_offset(offset);
            result
        });

        for action in deferred {
            log::trace!("controller {} running deferred {:?}", self.id, action);
            self.run_deferred(action);
        }
        // A deferred hand-off may have started a new animation here.
        request_frame |= self.read(|shared| shared.animation.is_some());

        let config = self.context.config();
        let decision = self.update(|shared| {
            let decision = shared.async_scroll.on_sample(sample_time, config);
            if decision == AsyncScrollDecision::FireNow {
                shared.send_async_scroll_event();
            }
            decision
        });
        if decision == AsyncScrollDecision::ArmTimeout {
            self.arm_async_scroll_timeout();
        }
        batch.close();
        request_frame
    }

    fn arm_async_scroll_timeout(&self) {
        let Some(content) = self.collaborators().and_then(|collaborators| collaborators.content()) else {
            return;
        };
        let (handle, token) = DelayedTaskHandle::new();
        self.update(|shared| shared.async_scroll.set_timeout(handle));
        let controller = self.self_ref.clone();
        content.post_delayed_task(
            Box::new(move || {
                if token.is_cancelled() {
                    return;
                }
                if let Some(controller) = controller.upgrade() {
                    controller.fire_async_scroll_on_timeout();
                }
            }),
            Duration::from_millis(self.context.config().async_scroll_timeout_ms),
        );
    }

    fn fire_async_scroll_on_timeout(&self) {
        self.update(|shared| {
            if shared.async_scroll.timeout_fired() {
                shared.send_async_scroll_event();
            }
        });
    }

    /// Everything the compositor needs for the current frame. Call after
    /// [`advance_animations`](Self::advance_animations).
    pub fn sample_content_transform_for_frame(&self) -> FrameSample {
        self.read(|shared| FrameSample {
            scroll_offset: shared.metrics.scroll_offset * shared.metrics.zoom,
            async_transform: shared.current_async_transform(),
            overscroll_transform: shared.overscroll_transform(),
        })
    }

    pub fn current_async_transform(&self) -> Transform2D {
        self.read(SharedState::current_async_transform)
    }

    /// Overscroll stretch, if any axis is overscrolled.
    pub fn overscroll_transform(&self) -> Option<Transform2D> {
        self.read(SharedState::overscroll_transform)
    }

    /// Maps what content last painted onto what we last asked it to paint.
    pub fn transform_to_last_dispatched_paint(&self) -> Transform2D {
        self.read(SharedState::transform_to_last_dispatched_paint)
    }

    /// True when part of the visible area was never painted.
    pub fn is_currently_checkerboarding(&self) -> bool {
        self.read(SharedState::is_currently_checkerboarding)
    }
}
