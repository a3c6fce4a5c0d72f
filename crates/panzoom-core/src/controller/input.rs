use std::f32::consts::PI;
use std::sync::{Arc, Weak};
use std::time::Duration;

use panzoom_geometry::Point;
use web_time::Instant;

use super::{PanZoomController, SharedState};
use crate::collaborators::StateChange;
use crate::config::{ApzConfig, AxisLockMode};
use crate::input::{
    EventStatus, InputEvent, Modifiers, MultiTouchInput, MultiTouchKind, PanGestureInput, PanKind,
    PinchGestureInput, PinchKind, TapGestureInput, TapKind,
};
use crate::state::PanZoomState;
use crate::touch_block::{AllowedTouchBehavior, QueueStep};
use crate::viewport::EPSILON;

fn is_close_to_horizontal(angle: f32, threshold: f32) -> bool {
    angle < threshold || angle > PI - threshold
}

fn is_close_to_vertical(angle: f32, threshold: f32) -> bool {
    (angle - PI / 2.0).abs() < threshold
}

/// Pan directions touch-action allows for the block being handled.
#[derive(Clone, Copy, Debug)]
struct PanPermissions {
    xy: bool,
    x: bool,
    y: bool,
}

impl PanPermissions {
    const ALL: PanPermissions = PanPermissions {
        xy: true,
        x: true,
        y: true,
    };
}

impl SharedState {
    /// Picks the panning state for a pan that touch-action may restrict.
    fn handle_panning_with_touch_action(
        &mut self,
        angle: f32,
        permissions: PanPermissions,
        config: &ApzConfig,
    ) {
        if permissions.xy {
            let x_can_scroll = self.x.can_scroll_now(&self.metrics);
            let y_can_scroll = self.y.can_scroll_now(&self.metrics);
            if x_can_scroll && y_can_scroll {
                if is_close_to_horizontal(angle, config.axis_lock_angle) {
                    self.y.set_axis_locked(true);
                    self.set_state(PanZoomState::PanningLockedX);
                } else if is_close_to_vertical(angle, config.axis_lock_angle) {
                    self.x.set_axis_locked(true);
                    self.set_state(PanZoomState::PanningLockedY);
                } else {
                    self.set_state(PanZoomState::Panning);
                }
            } else if x_can_scroll || y_can_scroll {
                self.set_state(PanZoomState::Panning);
            } else {
                self.set_state(PanZoomState::Idle);
            }
        } else if permissions.x {
            if is_close_to_horizontal(angle, config.allowed_direct_pan_angle) {
                self.y.set_axis_locked(true);
                self.set_state(PanZoomState::PanningLockedX);
                self.pan_dir_restricted = true;
            } else {
                self.set_state(PanZoomState::Idle);
            }
        } else if permissions.y {
            if is_close_to_vertical(angle, config.allowed_direct_pan_angle) {
                self.x.set_axis_locked(true);
                self.set_state(PanZoomState::PanningLockedY);
                self.pan_dir_restricted = true;
            } else {
                self.set_state(PanZoomState::Idle);
            }
        } else {
            self.set_state(PanZoomState::Idle);
        }
    }

    fn handle_panning(&mut self, angle: f32, config: &ApzConfig) {
        let x_can_scroll = self.x.can_scroll_now(&self.metrics);
        let y_can_scroll = self.y.can_scroll_now(&self.metrics);
        if !config.cross_slide_enabled && (!x_can_scroll || !y_can_scroll) {
            self.set_state(PanZoomState::Panning);
        } else if is_close_to_horizontal(angle, config.axis_lock_angle) {
            self.y.set_axis_locked(true);
            if x_can_scroll {
                self.set_state(PanZoomState::PanningLockedX);
            } else {
                self.set_state(PanZoomState::CrossSlidingX);
                self.x.set_axis_locked(true);
            }
        } else if is_close_to_vertical(angle, config.axis_lock_angle) {
            self.x.set_axis_locked(true);
            if y_can_scroll {
                self.set_state(PanZoomState::PanningLockedY);
            } else {
                self.set_state(PanZoomState::CrossSlidingY);
                self.y.set_axis_locked(true);
            }
        } else {
            self.set_state(PanZoomState::Panning);
        }
    }

    /// Breaks a sticky axis lock once the finger strays far enough.
    fn handle_panning_update(&mut self, dx: f32, dy: f32, config: &ApzConfig) {
        if config.axis_lock_mode != AxisLockMode::Sticky || self.pan_dir_restricted {
            return;
        }
        let angle = dy.atan2(dx).abs();
        let threshold = config.axis_breakout_threshold_px();
        if dx.abs() <= threshold && dy.abs() <= threshold {
            return;
        }
        match self.state {
            PanZoomState::PanningLockedX | PanZoomState::CrossSlidingX => {
                if !is_close_to_horizontal(angle, config.axis_breakout_angle) {
                    self.y.set_axis_locked(false);
                    self.set_state(PanZoomState::Panning);
                }
            }
            PanZoomState::PanningLockedY | PanZoomState::CrossSlidingY => {
                if !is_close_to_vertical(angle, config.axis_breakout_angle) {
                    self.x.set_axis_locked(false);
                    self.set_state(PanZoomState::Panning);
                }
            }
            _ => {}
        }
    }
}

impl PanZoomController {
    /// Entry point for every input event aimed at this surface.
    ///
    /// Touch events are grouped into blocks that wait for content to decide
    /// whether it prevents them; events of a block that is not ready yet are
    /// buffered and replayed once it is.
    pub fn receive_input_event(&self, event: InputEvent) -> EventStatus {
        match event {
            InputEvent::MultiTouch(touch) => self.receive_touch(touch),
            InputEvent::Pan(_) => {
                self.handle_input_event(&event);
                EventStatus::ConsumeDoDefault
            }
            InputEvent::Pinch(_) | InputEvent::Tap(_) => self.handle_gesture_event(&event),
        }
    }

    fn receive_touch(&self, touch: MultiTouchInput) -> EventStatus {
        let config = self.context.config();
        if touch.kind == MultiTouchKind::Start {
            let chain = self.build_overscroll_handoff_chain();
            let last_is_current = {
                let mut input = self.input.lock();
                input.touch_blocks.start_new_block(
                    Arc::clone(&chain),
                    config.touch_action_enabled,
                    false,
                );
                input.touch_blocks.last_is_current()
            };
            if last_is_current {
                // A finger landing on a fast fling stops it; that is not a tap.
                if self.velocity().length() > config.fling_stop_on_tap_threshold {
                    if let Some(block) = self.input.lock().touch_blocks.last_mut() {
                        block.disallow_single_tap();
                    }
                }
                chain.cancel_animations();
            }
            if self.read(|shared| shared.metrics.may_have_touch_listeners) {
                self.schedule_content_response_timeout();
            } else {
                self.input.lock().touch_blocks.expire_last_block();
            }
        }

        let last_block = {
            let input = self.input.lock();
            input.touch_blocks.last().map(|block| {
                (
                    Arc::clone(block.overscroll_handoff_chain()),
                    block.touch_action_allows_panning_x(),
                    block.touch_action_allows_panning_y(),
                    block.touch_action_allows_pinch_zoom(),
                )
            })
        };
        let Some((chain, allows_x, allows_y, allows_pinch)) = last_block else {
            log::warn!("touch {:?} arrived with no touch block", touch.kind);
            return EventStatus::Ignore;
        };

        // Content may still prevent the block, so this is only a guess at
        // whether we will end up using the touch.
        let consumable = match touch.touches.len() {
            0 => false,
            1 => chain.can_be_panned(self) && (allows_x || allows_y),
            _ => self.read(|shared| shared.zoom_constraints.allow_zoom) && allows_pinch,
        };
        let status = if consumable {
            EventStatus::ConsumeDoDefault
        } else {
            EventStatus::Ignore
        };

        let ready = {
            let mut input = self.input.lock();
            let blocks = &mut input.touch_blocks;
            if blocks.last_is_current() && blocks.has_ready_block() {
                blocks.current().map(|block| block.is_default_prevented())
            } else {
                if let Some(block) = blocks.last_mut() {
                    block.add_event(touch.clone());
                }
                None
            }
        };
        if ready == Some(false) {
            self.handle_input_event(&InputEvent::MultiTouch(touch));
        }
        status
    }

    fn schedule_content_response_timeout(&self) {
        let delay = Duration::from_millis(self.context.config().content_response_timeout_ms);
        match self.collaborators().and_then(|collaborators| collaborators.content()) {
            Some(content) => {
                log::trace!("controller {} waiting {:?} for content", self.id, delay);
                let controller = Weak::clone(&self.self_ref);
                content.post_delayed_task(
                    Box::new(move || {
                        if let Some(controller) = controller.upgrade() {
                            if !controller.is_destroyed() {
                                controller.content_response_timeout();
                            }
                        }
                    }),
                    delay,
                );
            }
            None => self.content_response_timeout(),
        }
    }

    /// Content's verdict on the oldest touch block still waiting for one.
    pub fn content_received_touch(&self, prevent_default: bool) {
        let changed = self.input.lock().touch_blocks.content_received(prevent_default);
        if changed {
            self.process_pending_input_blocks();
        }
    }

    /// Fired when content did not answer in time.
    pub fn content_response_timeout(&self) {
        let changed = self.input.lock().touch_blocks.content_response_timeout();
        if changed {
            self.process_pending_input_blocks();
        }
    }

    pub fn set_allowed_touch_behavior(&self, behaviors: &[AllowedTouchBehavior]) {
        let changed = self.input.lock().touch_blocks.set_allowed_touch_behavior(behaviors);
        if changed {
            self.process_pending_input_blocks();
        }
    }

    fn process_pending_input_blocks(&self) {
        loop {
            let step = self.input.lock().touch_blocks.next_step();
            match step {
                QueueStep::Blocked => break,
                QueueStep::Prevented => {
                    log::debug!("controller {} touch block prevented by content", self.id);
                    self.update(|shared| shared.set_state(PanZoomState::Idle));
                    if let Some(listener) = self.gesture_listener() {
                        listener.cancel_gesture();
                    }
                }
                QueueStep::Replay(event) => {
                    self.handle_input_event(&InputEvent::MultiTouch(event));
                }
                QueueStep::Evicted => {}
            }
        }
    }

    /// Runs an event through the gesture state machine, bypassing the
    /// touch-block queue.
    pub fn handle_input_event(&self, event: &InputEvent) -> EventStatus {
        match event {
            InputEvent::MultiTouch(touch) => {
                if let Some(listener) = self.gesture_listener() {
                    if listener.handle_input_event(touch) == EventStatus::ConsumeNoDefault {
                        return EventStatus::ConsumeNoDefault;
                    }
                }
                match touch.kind {
                    MultiTouchKind::Start => self.on_touch_start(touch),
                    MultiTouchKind::Move => self.on_touch_move(touch),
                    MultiTouchKind::End => self.on_touch_end(touch),
                    MultiTouchKind::Cancel => self.on_touch_cancel(),
                }
            }
            InputEvent::Pan(pan) => match pan.kind {
                PanKind::MayStart => self.on_pan_may_begin(pan),
                PanKind::Cancelled => self.on_pan_cancelled(),
                PanKind::Start => self.on_pan_begin(pan),
                PanKind::Pan => self.on_pan(pan, true),
                PanKind::End => self.on_pan_end(pan),
                PanKind::MomentumStart => self.on_pan_momentum_start(),
                PanKind::MomentumPan => self.on_pan(pan, false),
                PanKind::MomentumEnd => self.on_pan_momentum_end(pan),
            },
            InputEvent::Pinch(_) | InputEvent::Tap(_) => self.handle_gesture_event(event),
        }
    }

    /// Handles recognized gestures: pinches and taps.
    pub fn handle_gesture_event(&self, event: &InputEvent) -> EventStatus {
        match event {
            InputEvent::Pinch(pinch) => match pinch.kind {
                PinchKind::Start => self.on_scale_begin(pinch),
                PinchKind::Scale => self.on_scale(pinch),
                PinchKind::End => self.on_scale_end(),
            },
            InputEvent::Tap(tap) => match tap.kind {
                TapKind::LongTap => self.on_long_press(tap),
                TapKind::LongTapUp => self.on_long_press_up(tap),
                TapKind::SingleTapUp => self.on_single_tap_up(tap),
                TapKind::SingleTapConfirmed => self.generate_single_tap(tap.point, tap.modifiers),
                TapKind::DoubleTap => self.on_double_tap(tap),
                TapKind::CancelTap => EventStatus::Ignore,
            },
            InputEvent::MultiTouch(_) | InputEvent::Pan(_) => {
                log::warn!("raw input passed as a gesture event");
                EventStatus::Ignore
            }
        }
    }

    fn on_touch_start(&self, event: &MultiTouchInput) -> EventStatus {
        let Some(point) = event.first_point() else {
            log::warn!("touch start without touch points");
            return EventStatus::Ignore;
        };
        self.update(|shared| shared.pan_dir_restricted = false);

        match self.state() {
            PanZoomState::Fling
            | PanZoomState::AnimatingZoom
            | PanZoomState::SmoothScroll
            | PanZoomState::SnapBack => {
                match self.current_block_chain() {
                    Some(chain) => chain.cancel_animations(),
                    None => self.cancel_animation(),
                }
                self.begin_touch(point, event.time);
            }
            PanZoomState::Idle => self.begin_touch(point, event.time),
            state => log::warn!("unexpected touch start in state {:?}", state),
        }
        EventStatus::ConsumeNoDefault
    }

    fn begin_touch(&self, point: Point, time: Instant) {
        let can_be_panned = self
            .current_block_chain()
            .is_some_and(|chain| chain.can_be_panned(self));
        self.update(|shared| {
            shared.x.start_touch(point.x, time);
            shared.y.start_touch(point.y, time);
            shared.notify(StateChange::StartTouch, i32::from(can_be_panned));
            shared.set_state(PanZoomState::Touching);
        });
    }

    fn on_touch_move(&self, event: &MultiTouchInput) -> EventStatus {
        let Some(point) = event.first_point() else {
            return EventStatus::Ignore;
        };
        match self.state() {
            PanZoomState::Fling
            | PanZoomState::SmoothScroll
            | PanZoomState::Idle
            | PanZoomState::AnimatingZoom => EventStatus::Ignore,
            PanZoomState::CrossSlidingX | PanZoomState::CrossSlidingY => EventStatus::Ignore,
            PanZoomState::Touching => {
                let config = self.context.config();
                let distance = self.update(|shared| {
                    shared.x.update_with_touch(point.x, event.time, config);
                    shared.y.update_with_touch(point.y, event.time, config);
                    shared.x.pan_distance().hypot(shared.y.pan_distance())
                });
                if distance < config.touch_start_tolerance_px() {
                    return EventStatus::Ignore;
                }
                let allows_xy = self
                    .current_block(|block| block.touch_action_allows_panning_xy())
                    .unwrap_or(true);
                if config.touch_action_enabled && allows_xy {
                    // Claim the block right away so content sees a cancel.
                    self.start_panning(point, event.time);
                    return EventStatus::ConsumeNoDefault;
                }
                self.start_panning(point, event.time)
            }
            PanZoomState::Panning | PanZoomState::PanningLockedX | PanZoomState::PanningLockedY => {
                self.track_touch(point, event.time);
                EventStatus::ConsumeNoDefault
            }
            PanZoomState::Pinching => {
                log::warn!("touch move while pinching");
                EventStatus::Ignore
            }
            PanZoomState::SnapBack => {
                log::warn!("touch move during snap-back");
                EventStatus::ConsumeNoDefault
            }
        }
    }

    /// Commits to a pan once the finger leaves the touch-start tolerance,
    /// choosing the axis lock from the angle travelled so far.
    fn start_panning(&self, point: Point, time: Instant) -> EventStatus {
        let config = self.context.config();
        let permissions = self
            .current_block(|block| PanPermissions {
                xy: block.touch_action_allows_panning_xy(),
                x: block.touch_action_allows_panning_x(),
                y: block.touch_action_allows_panning_y(),
            })
            .unwrap_or(PanPermissions::ALL);

        let anchor = self.update(|shared| {
            let dx = shared.x.pan_distance_to(point.x);
            let dy = shared.y.pan_distance_to(point.y);
            let anchor = Point::new(shared.x.pan_start(), shared.y.pan_start());
            shared.x.start_touch(point.x, time);
            shared.y.start_touch(point.y, time);

            let angle = dy.atan2(dx).abs();
            if config.touch_action_enabled {
                shared.handle_panning_with_touch_action(angle, permissions, config);
            } else if config.axis_lock_mode == AxisLockMode::Free {
                shared.set_state(PanZoomState::Panning);
            } else {
                shared.handle_panning(angle, config);
            }

            if shared.state.is_panning() {
                shared.notify(StateChange::StartPanning, 0);
                Some(anchor)
            } else {
                None
            }
        });

        let Some(anchor) = anchor else {
            return EventStatus::Ignore;
        };
        // The tolerance travel counts towards the scroll.
        if let Some(chain) = self.current_block_chain() {
            self.call_dispatch_scroll(anchor, point, &chain, 0);
        }
        EventStatus::ConsumeNoDefault
    }

    fn track_touch(&self, point: Point, time: Instant) {
        let config = self.context.config();
        let previous = self.update(|shared| {
            let previous = Point::new(shared.x.position(), shared.y.position());
            let dx = shared.x.pan_distance_to(point.x);
            let dy = shared.y.pan_distance_to(point.y);
            shared.handle_panning_update(dx, dy, config);
            shared.x.update_with_touch(point.x, time, config);
            shared.y.update_with_touch(point.y, time, config);
            previous
        });
        if previous != point {
            if let Some(chain) = self.current_block_chain() {
                self.call_dispatch_scroll(previous, point, &chain, 0);
            }
        }
    }

    fn on_touch_end_or_cancel(&self) {
        let single_tap = self
            .current_block(|block| block.single_tap_occurred())
            .unwrap_or(false);
        self.update(|shared| shared.notify(StateChange::EndTouch, i32::from(single_tap)));
    }

    fn on_touch_end(&self, event: &MultiTouchInput) -> EventStatus {
        self.on_touch_end_or_cancel();
        self.update(|shared| {
            // A touch that never did anything produces no scroll event.
            if shared.state != PanZoomState::Idle {
                shared.send_async_scroll_event();
            }
        });

        match self.state() {
            PanZoomState::Fling => {
                log::warn!("touch end during a fling");
                EventStatus::Ignore
            }
            PanZoomState::AnimatingZoom | PanZoomState::SmoothScroll | PanZoomState::Idle => {
                EventStatus::Ignore
            }
            PanZoomState::Touching | PanZoomState::CrossSlidingX | PanZoomState::CrossSlidingY => {
                self.update(|shared| shared.set_state(PanZoomState::Idle));
                EventStatus::Ignore
            }
            PanZoomState::Panning | PanZoomState::PanningLockedX | PanZoomState::PanningLockedY => {
                let Some(chain) = self.current_block_chain() else {
                    self.update(|shared| shared.set_state(PanZoomState::Idle));
                    return EventStatus::ConsumeNoDefault;
                };
                chain.flush_repaints();
                let config = self.context.config();
                let velocity = self.update(|shared| {
                    shared.x.end_touch(event.time, config);
                    shared.y.end_touch(event.time, config);
                    let velocity = shared.velocity();
                    // An accepted fling adds to our velocity, so start from zero.
                    shared.x.set_velocity(0.0);
                    shared.y.set_velocity(0.0);
                    velocity
                });

                // Content hears only the state the fling dispatch settles on.
                let batch = self.batch_state_changes();
                self.update(|shared| shared.set_state(PanZoomState::Idle));
                log::debug!("controller {} releasing pan at {:?}", self.id, velocity);
                if let Some(tree) = self.collaborators().and_then(|collaborators| collaborators.tree()) {
                    tree.dispatch_fling(self, velocity, &chain, false);
                }
                batch.close();
                EventStatus::ConsumeNoDefault
            }
            PanZoomState::Pinching => {
                self.update(|shared| shared.set_state(PanZoomState::Idle));
                log::warn!("touch end while pinching");
                EventStatus::Ignore
            }
            PanZoomState::SnapBack => {
                log::warn!("touch end during snap-back");
                EventStatus::ConsumeNoDefault
            }
        }
    }

    fn on_touch_cancel(&self) -> EventStatus {
        self.on_touch_end_or_cancel();
        self.update(|shared| {
            shared.x.cancel_touch();
            shared.y.cancel_touch();
        });
        self.cancel_animation();
        EventStatus::ConsumeNoDefault
    }

    fn pinch_blocked_by_touch_action(&self) -> bool {
        self.current_block(|block| {
            block.is_ready_for_handling() && !block.touch_action_allows_pinch_zoom()
        })
        .unwrap_or(false)
    }

    fn on_scale_begin(&self, event: &PinchGestureInput) -> EventStatus {
        if self.pinch_blocked_by_touch_action() {
            return EventStatus::Ignore;
        }
        if !self.read(|shared| shared.zoom_constraints.allow_zoom) {
            return EventStatus::ConsumeNoDefault;
        }

        // Pinches can arrive without any touches, so the chain is built here.
        let chain = self.build_overscroll_handoff_chain();
        self.input.lock().pinch_chain = Some(Arc::clone(&chain));

        let batch = self.batch_state_changes();
        chain.cancel_animations();
        if chain.index_of(self).is_none() {
            self.cancel_animation();
        }
        self.update(|shared| {
            shared.set_state(PanZoomState::Pinching);
            shared.last_zoom_focus = event.focus_point - shared.metrics.composition_bounds.origin();
        });
        batch.close();
        EventStatus::ConsumeNoDefault
    }

    fn on_scale(&self, event: &PinchGestureInput) -> EventStatus {
        if self.pinch_blocked_by_touch_action() {
            return EventStatus::Ignore;
        }
        if event.previous_span.abs() <= EPSILON || event.current_span.abs() <= EPSILON {
            return EventStatus::ConsumeNoDefault;
        }
        self.update(|shared| {
            if shared.state != PanZoomState::Pinching {
                return;
            }
            let mut span_ratio = event.current_span / event.previous_span;
            let zoom = shared.metrics.zoom;
            let focus = event.focus_point - shared.metrics.composition_bounds.origin();
            let css_focus = focus / zoom;

            // Follow the focus as it moves, but not off the page.
            let mut focus_change = (shared.last_zoom_focus - focus) / zoom;
            focus_change.x -= shared
                .x
                .displacement_will_overscroll_amount(focus_change.x, &shared.metrics);
            focus_change.y -= shared
                .y
                .displacement_will_overscroll_amount(focus_change.y, &shared.metrics);
            shared.metrics.scroll_by(focus_change);

            let metrics = &shared.metrics;
            let constraints = &shared.zoom_constraints;
            // Never zoom out past the point where the page fills the composition.
            let mut real_min = constraints.min_zoom;
            if metrics.scrollable_rect.width > 0.0 {
                real_min = real_min.max(metrics.composition_bounds.width / metrics.scrollable_rect.width);
            }
            if metrics.scrollable_rect.height > 0.0 {
                real_min = real_min.max(metrics.composition_bounds.height / metrics.scrollable_rect.height);
            }
            let real_max = constraints.max_zoom.max(real_min);

            let do_scale = (span_ratio > 1.0 && zoom < real_max) || (span_ratio < 1.0 && zoom > real_min);
            if do_scale {
                span_ratio = span_ratio.max(real_min / zoom).min(real_max / zoom);
                let needed = Point::new(
                    -shared.x.scale_will_overscroll_amount(span_ratio, css_focus.x, metrics),
                    -shared.y.scale_will_overscroll_amount(span_ratio, css_focus.y, metrics),
                );
                // Keep the content point under the focus fixed on screen.
                shared.metrics.zoom_by(span_ratio);
                shared.metrics.scroll_offset =
                    shared.metrics.scroll_offset + css_focus - css_focus / span_ratio;
                if !needed.is_zero() {
                    shared.metrics.scroll_by(needed);
                }
                shared.schedule_composite();
                shared.publish();
            }
            shared.last_zoom_focus = focus;
        });
        EventStatus::ConsumeNoDefault
    }

    fn on_scale_end(&self) -> EventStatus {
        if self.pinch_blocked_by_touch_action() {
            return EventStatus::Ignore;
        }
        self.update(|shared| shared.set_state(PanZoomState::Idle));
        // A two-finger pan may have left overscroll anywhere along the chain;
        // nothing will snap it back after a pinch.
        let chain = self.input.lock().pinch_chain.take();
        match chain {
            Some(chain) => chain.clear_overscroll(),
            None => self.clear_overscroll(),
        }
        self.update(|shared| {
            shared.schedule_composite();
            shared.request_content_repaint();
            shared.publish();
        });
        EventStatus::ConsumeNoDefault
    }

    fn on_pan_may_begin(&self, event: &PanGestureInput) -> EventStatus {
        self.update(|shared| {
            shared.x.start_touch(event.panning_point.x, event.time);
            shared.y.start_touch(event.panning_point.y, event.time);
        });
        let chain = self.input.lock().pan_gesture_chain.clone();
        match chain {
            Some(chain) => chain.cancel_animations(),
            None => self.cancel_animation(),
        }
        EventStatus::ConsumeNoDefault
    }

    fn on_pan_cancelled(&self) -> EventStatus {
        self.update(|shared| {
            shared.x.cancel_touch();
            shared.y.cancel_touch();
        });
        EventStatus::ConsumeNoDefault
    }

    fn on_pan_begin(&self, event: &PanGestureInput) -> EventStatus {
        if self.state() == PanZoomState::SmoothScroll {
            self.cancel_animation();
        }
        let chain = self.build_overscroll_handoff_chain();
        self.input.lock().pan_gesture_chain = Some(chain);

        let config = self.context.config();
        self.update(|shared| {
            shared.x.start_touch(event.panning_point.x, event.time);
            shared.y.start_touch(event.panning_point.y, event.time);
            if config.axis_lock_mode == AxisLockMode::Free {
                shared.set_state(PanZoomState::Panning);
            } else {
                let angle = event.displacement.y.atan2(event.displacement.x).abs();
                shared.handle_panning(angle, config);
            }
        });
        EventStatus::ConsumeNoDefault
    }

    fn on_pan(&self, event: &PanGestureInput, fingers_on_touchpad: bool) -> EventStatus {
        if self.state() == PanZoomState::SmoothScroll {
            // Momentum must not cut short a scroll content asked for.
            if !fingers_on_touchpad {
                return EventStatus::ConsumeNoDefault;
            }
            self.cancel_animation();
        }

        let config = self.context.config();
        let point = event.panning_point;
        self.update(|shared| {
            shared.x.update_with_touch(point.x, event.time, config);
            shared.y.update_with_touch(point.y, event.time, config);
            shared.handle_panning_update(event.displacement.x, event.displacement.y, config);
        });

        let chain = self.input.lock().pan_gesture_chain.clone();
        if let Some(chain) = chain {
            self.call_dispatch_scroll(point, point + event.displacement, &chain, 0);
        }
        EventStatus::ConsumeNoDefault
    }

    fn on_pan_end(&self, event: &PanGestureInput) -> EventStatus {
        // Some trackpads report their last bit of motion on the end event.
        self.on_pan(event, true);
        self.input.lock().pan_gesture_chain = None;
        let config = self.context.config();
        self.update(|shared| {
            shared.x.end_touch(event.time, config);
            shared.y.end_touch(event.time, config);
            shared.set_state(PanZoomState::Idle);
            shared.request_content_repaint();
        });
        EventStatus::ConsumeNoDefault
    }

    fn on_pan_momentum_start(&self) -> EventStatus {
        if self.state() == PanZoomState::SmoothScroll {
            self.cancel_animation();
        }
        let chain = self.build_overscroll_handoff_chain();
        self.input.lock().pan_gesture_chain = Some(chain);
        EventStatus::ConsumeNoDefault
    }

    fn on_pan_momentum_end(&self, event: &PanGestureInput) -> EventStatus {
        // Same as a pan end: the final event can still carry motion.
        self.on_pan(event, false);
        self.input.lock().pan_gesture_chain = None;
        self.update(|shared| {
            shared.x.cancel_touch();
            shared.y.cancel_touch();
            shared.set_state(PanZoomState::Idle);
            shared.request_content_repaint();
        });
        EventStatus::ConsumeNoDefault
    }

    fn convert_to_content(&self, point: Point) -> Option<Point> {
        let tree = self.collaborators().and_then(|collaborators| collaborators.tree())?;
        Some(tree.convert_to_content(self, point))
    }

    fn on_long_press(&self, event: &TapGestureInput) -> EventStatus {
        let Some(content) = self.collaborators().and_then(|collaborators| collaborators.content()) else {
            return EventStatus::Ignore;
        };
        let Some(point) = self.convert_to_content(event.point) else {
            return EventStatus::Ignore;
        };
        let chain = self.build_overscroll_handoff_chain();
        self.input.lock().touch_blocks.start_new_block(
            chain,
            self.context.config().touch_action_enabled,
            true,
        );
        self.schedule_content_response_timeout();
        content.handle_long_tap(point, event.modifiers, self.guid());
        EventStatus::ConsumeNoDefault
    }

    fn on_long_press_up(&self, event: &TapGestureInput) -> EventStatus {
        let Some(content) = self.collaborators().and_then(|collaborators| collaborators.content()) else {
            return EventStatus::Ignore;
        };
        let Some(point) = self.convert_to_content(event.point) else {
            return EventStatus::Ignore;
        };
        content.handle_long_tap_up(point, event.modifiers, self.guid());
        EventStatus::ConsumeNoDefault
    }

    fn generate_single_tap(&self, point: Point, modifiers: Modifiers) -> EventStatus {
        let Some(content) = self.collaborators().and_then(|collaborators| collaborators.content()) else {
            return EventStatus::Ignore;
        };
        let Some(point) = self.convert_to_content(point) else {
            return EventStatus::Ignore;
        };
        let allowed = self
            .input
            .lock()
            .touch_blocks
            .current_mut()
            .map_or(true, |block| block.set_single_tap_occurred());
        if !allowed {
            return EventStatus::Ignore;
        }
        // Posted so content sees the touch end before the tap.
        let guid = self.guid();
        let target = Arc::downgrade(&content);
        content.post_delayed_task(
            Box::new(move || {
                if let Some(content) = target.upgrade() {
                    content.handle_single_tap(point, modifiers, guid);
                }
            }),
            Duration::ZERO,
        );
        EventStatus::ConsumeNoDefault
    }

    fn double_tap_zoom_allowed(&self) -> bool {
        self.read(|shared| shared.zoom_constraints.allow_double_tap_zoom)
            && self
                .current_block(|block| block.touch_action_allows_double_tap_zoom())
                .unwrap_or(true)
    }

    fn on_single_tap_up(&self, event: &TapGestureInput) -> EventStatus {
        // With double-tap zoom possible, wait for the tap to be confirmed.
        if self.double_tap_zoom_allowed() {
            return EventStatus::Ignore;
        }
        self.generate_single_tap(event.point, event.modifiers)
    }

    fn on_double_tap(&self, event: &TapGestureInput) -> EventStatus {
        let Some(content) = self.collaborators().and_then(|collaborators| collaborators.content()) else {
            return EventStatus::Ignore;
        };
        if self.double_tap_zoom_allowed() {
            if let Some(point) = self.convert_to_content(event.point) {
                content.handle_double_tap(point, event.modifiers, self.guid());
            }
        }
        EventStatus::ConsumeNoDefault
    }
}
