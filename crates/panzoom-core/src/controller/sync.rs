use panzoom_geometry::{Point, Rect};

use super::{Effect, PanZoomController, SharedState};
use crate::animation::{Animation, SmoothScrollAnimation, ZoomAnimation};
use crate::error::ApzError;
use crate::state::PanZoomState;
use crate::viewport::{calculate_pending_display_port, FrameMetrics, ZoomConstraints, COORDINATE_EPSILON};

fn fuzzy_equal(a: f32, b: f32) -> bool {
    (a - b).abs() <= COORDINATE_EPSILON
}

/// Zoom at which `rect` fills `composition`, or `None` when `rect` is empty.
fn zoom_to_fit(composition: &Rect, rect: &Rect) -> Option<f32> {
    if rect.is_empty() {
        return None;
    }
    Some((composition.width / rect.width).min(composition.height / rect.height))
}

impl SharedState {
    fn start_smooth_scroll(&mut self) {
        self.set_state(PanZoomState::SmoothScroll);
        let destination = self.metrics.smooth_scroll_offset;
        let smooth = SmoothScrollAnimation::new(
            &self.metrics,
            self.velocity(),
            destination,
            self.context.config(),
        );
        self.start_animation(Animation::SmoothScroll(smooth));
    }

    fn notify_layers_updated(&mut self, layer: &FrameMetrics, is_first_paint: bool) {
        let was_default = self.metrics.is_default();
        self.last_content_paint = *layer;
        self.metrics.may_have_touch_listeners = layer.may_have_touch_listeners;

        let now = self.context.now();
        if let Some(request) = self.paint_throttler.task_complete(now) {
            self.dispatch_repaint(request);
        }

        let mut need_repaint = false;
        let same_composition = fuzzy_equal(
            layer.composition_bounds.width,
            self.metrics.composition_bounds.width,
        ) && fuzzy_equal(
            layer.composition_bounds.height,
            self.metrics.composition_bounds.height,
        );
        if same_composition {
            // Content has caught up with the composition size, so its
            // viewport can be trusted.
            if self.metrics.viewport.width != layer.viewport.width
                || self.metrics.viewport.height != layer.viewport.height
            {
                need_repaint = true;
            }
            self.metrics.viewport = layer.viewport;
        }

        // Generations filter out updates we already applied.
        let generation_changed = layer.scroll_generation != self.metrics.scroll_generation;
        let mut scroll_offset_updated = layer.scroll_offset_updated && generation_changed;
        let smooth_scroll_requested = layer.do_smooth_scroll && generation_changed;

        if is_first_paint || was_default {
            log::debug!("adopting first paint metrics for scroll id {}", layer.scroll_id);
            let samples = self.context.config().num_paint_duration_samples;
            self.paint_throttler.clear_history();
            self.paint_throttler.set_max_durations(samples);
            self.cancel_animation();
            self.metrics = *layer;
            self.last_dispatched_paint = *layer;
            // Margins inherited from an earlier controller may no longer fit
            // the scrollable rect.
            if !self.metrics.display_port_margins.is_zero() {
                need_repaint = true;
            }
        } else {
            if !fuzzy_equal(
                self.metrics.composition_bounds.width,
                layer.composition_bounds.width,
            ) {
                self.metrics.zoom = layer.zoom;
            }
            if self.metrics.scrollable_rect != layer.scrollable_rect {
                self.metrics.scrollable_rect = layer.scrollable_rect;
                need_repaint = true;
            }
            self.metrics.composition_bounds = layer.composition_bounds;
            self.metrics.is_root = layer.is_root;

            if scroll_offset_updated {
                log::debug!(
                    "content moved scroll offset {:?} -> {:?}",
                    self.metrics.scroll_offset,
                    layer.scroll_offset
                );
                self.metrics.copy_scroll_info_from(layer);
                self.cancel_animation();
                self.last_dispatched_paint = *layer;
                need_repaint = true;
                self.schedule_composite();
            }

            if smooth_scroll_requested {
                log::debug!("content requested smooth scroll to {:?}", layer.smooth_scroll_offset);
                self.metrics.copy_smooth_scroll_info_from(layer);
                self.cancel_animation();
                self.last_dispatched_paint = *layer;
                self.start_smooth_scroll();
                scroll_offset_updated = true;
            }
        }

        if scroll_offset_updated {
            // Content ignores our offsets until it hears this.
            self.outbox.push(Effect::AcknowledgeScrollUpdate {
                scroll_id: layer.scroll_id,
                scroll_generation: layer.scroll_generation,
            });
        }
        if need_repaint {
            self.request_content_repaint();
        }
        self.publish();
    }

    fn zoom_to_rect(&mut self, mut rect: Rect) {
        self.set_state(PanZoomState::AnimatingZoom);

        let composition = self.metrics.composition_bounds;
        let page = self.metrics.scrollable_rect;
        let current_zoom = self.metrics.zoom;
        let mut local_min = self.zoom_constraints.min_zoom;
        if !page.is_empty() {
            local_min = local_min
                .max(composition.width / page.width)
                .max(composition.height / page.height);
        }
        let local_max = self.zoom_constraints.max_zoom;

        let mut target_zoom = current_zoom;
        if !rect.is_empty() {
            rect = rect.intersect(&page);
            if let Some(zoom) = zoom_to_fit(&composition, &rect) {
                target_zoom = zoom;
            }
        }

        // An empty rect, or asking to go past a limit we are already at,
        // means zoom out as far as the page allows.
        if rect.is_empty()
            || (current_zoom == local_max && target_zoom >= local_max)
            || (current_zoom == local_min && target_zoom <= local_min)
        {
            let composited = self.metrics.composition_size_css();
            if composited.width > 0.0 {
                let new_height = page.width * (composited.height / composited.width);
                let dh = composited.height - new_height;
                rect = Rect::new(0.0, self.metrics.scroll_offset.y + dh / 2.0, page.width, new_height)
                    .intersect(&page);
            }
            if let Some(zoom) = zoom_to_fit(&composition, &rect) {
                target_zoom = zoom;
            }
        }
        let target_zoom = target_zoom.max(local_min).min(local_max);

        let mut end = self.metrics;
        end.zoom = target_zoom;
        // Keep the end viewport on the page.
        let size_after_zoom = end.composition_size_css();
        if rect.y + size_after_zoom.height > page.height {
            rect.y = (page.height - size_after_zoom.height).max(0.0);
        }
        if rect.x + size_after_zoom.width > page.width {
            rect.x = (page.width - size_after_zoom.width).max(0.0);
        }
        end.scroll_offset = rect.origin();
        end.display_port_margins =
            calculate_pending_display_port(&end, Point::ZERO, 0.0, self.context.config());
        log::debug!(
            "zooming from {} to {} at {:?}",
            current_zoom,
            target_zoom,
            end.scroll_offset
        );

        let zoom = ZoomAnimation::new(
            self.metrics.scroll_offset,
            current_zoom,
            end.scroll_offset,
            end.zoom,
            self.context.config(),
        );
        self.start_animation(Animation::ZoomTo(zoom));
        // Ask for the end state now so it is painted before the animation lands.
        self.post_repaint(end);
    }
}

impl PanZoomController {
    /// Reconciles our viewport with what content just painted.
    pub fn notify_layers_updated(&self, metrics: &FrameMetrics, is_first_paint: bool) {
        self.update(|shared| shared.notify_layers_updated(metrics, is_first_paint));
    }

    /// Animates so that `rect`, in content pixels, fills the composition
    /// bounds as far as the zoom limits allow.
    pub fn zoom_to_rect(&self, rect: Rect) -> Result<(), ApzError> {
        if !rect.is_finite() {
            log::warn!("ignoring zoom to non-finite rect {:?}", rect);
            return Err(ApzError::NonFiniteZoomRect);
        }
        self.update(|shared| shared.zoom_to_rect(rect));
        Ok(())
    }

    /// Replaces the zoom policy. NaN or negative bounds are rejected and the
    /// previous policy stays in force; other bounds are clamped into
    /// [`MIN_ZOOM`](crate::MIN_ZOOM)..=[`MAX_ZOOM`](crate::MAX_ZOOM).
    pub fn update_zoom_constraints(&self, constraints: ZoomConstraints) -> Result<(), ApzError> {
        let ZoomConstraints {
            min_zoom, max_zoom, ..
        } = constraints;
        if min_zoom.is_nan() || max_zoom.is_nan() || min_zoom < 0.0 || max_zoom < 0.0 {
            log::warn!("rejecting zoom constraints min {} max {}", min_zoom, max_zoom);
            return Err(ApzError::InvalidZoomConstraints {
                min: min_zoom,
                max: max_zoom,
            });
        }
        self.update(|shared| shared.zoom_constraints = constraints.sanitized());
        Ok(())
    }

    pub fn zoom_constraints(&self) -> ZoomConstraints {
        self.read(|shared| shared.zoom_constraints)
    }

    /// Starts animating towards the viewport's smooth-scroll destination.
    pub fn start_smooth_scroll(&self) {
        self.update(SharedState::start_smooth_scroll);
    }
}
