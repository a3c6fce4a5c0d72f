//! Integration tests for single-finger panning and axis locking

use std::time::Duration;

use panzoom_core::{ApzConfig, AxisLockMode, EventStatus, MultiTouchKind, PanZoomState, StateChange};
use panzoom_geometry::{Point, Size};
use panzoom_testing::{touch, PanZoomTestRule};

const STEP: Duration = Duration::from_millis(10);

fn composition() -> Size {
    Size::new(100.0, 100.0)
}

#[test]
fn test_vertical_drag_locks_to_y_and_counts_tolerance_travel() {
    let rule = PanZoomTestRule::default();
    let apzc = rule.scrollable_controller(composition(), Size::new(1000.0, 1000.0));

    let statuses = rule.drag(
        &apzc,
        Point::new(100.0, 100.0),
        Point::new(100.0, 40.0),
        1,
        STEP,
    );

    assert_eq!(statuses[0], EventStatus::ConsumeDoDefault);
    assert_eq!(apzc.state(), PanZoomState::PanningLockedY);
    let offset = apzc.frame_metrics().scroll_offset;
    assert!((offset.y - 60.0).abs() < 1e-3, "Expected ~60, got {}", offset.y);
    assert_eq!(offset.x, 0.0);
}

#[test]
fn test_move_inside_tolerance_keeps_touching() {
    let rule = PanZoomTestRule::default();
    let apzc = rule.scrollable_controller(composition(), Size::new(1000.0, 1000.0));

    // Tolerance is 1/4.5 inch at 160 dpi, just under 36 pixels.
    rule.drag(
        &apzc,
        Point::new(100.0, 100.0),
        Point::new(100.0, 75.0),
        1,
        STEP,
    );

    assert_eq!(apzc.state(), PanZoomState::Touching);
    assert_eq!(apzc.frame_metrics().scroll_offset, Point::ZERO);

    rule.touch_up(&apzc, Point::new(100.0, 75.0));
    assert_eq!(apzc.state(), PanZoomState::Idle);
}

#[test]
fn test_locked_pan_ignores_cross_axis_motion() {
    let rule = PanZoomTestRule::default();
    let apzc = rule.scrollable_controller(composition(), Size::new(1000.0, 1000.0));

    rule.drag(
        &apzc,
        Point::new(100.0, 300.0),
        Point::new(100.0, 200.0),
        1,
        STEP,
    );
    rule.advance(STEP);
    rule.touch_move(&apzc, Point::new(90.0, 150.0));

    assert_eq!(apzc.state(), PanZoomState::PanningLockedY);
    let offset = apzc.frame_metrics().scroll_offset;
    assert_eq!(offset.x, 0.0);
    assert!((offset.y - 150.0).abs() < 1e-3, "Expected ~150, got {}", offset.y);
}

#[test]
fn test_diagonal_drag_pans_freely() {
    let rule = PanZoomTestRule::default();
    let apzc = rule.scrollable_controller(composition(), Size::new(1000.0, 1000.0));

    rule.drag(
        &apzc,
        Point::new(200.0, 200.0),
        Point::new(150.0, 150.0),
        1,
        STEP,
    );

    assert_eq!(apzc.state(), PanZoomState::Panning);
    let offset = apzc.frame_metrics().scroll_offset;
    assert!((offset.x - 50.0).abs() < 1e-3, "Expected ~50, got {}", offset.x);
    assert!((offset.y - 50.0).abs() < 1e-3, "Expected ~50, got {}", offset.y);
}

#[test]
fn test_free_mode_never_locks() {
    let rule = PanZoomTestRule::new(ApzConfig::default().with_axis_lock_mode(AxisLockMode::Free));
    let apzc = rule.scrollable_controller(composition(), Size::new(1000.0, 1000.0));

    rule.drag(
        &apzc,
        Point::new(100.0, 300.0),
        Point::new(100.0, 200.0),
        1,
        STEP,
    );

    assert_eq!(apzc.state(), PanZoomState::Panning);
}

#[test]
fn test_sticky_lock_breaks_out_on_sideways_motion() {
    let rule =
        PanZoomTestRule::new(ApzConfig::default().with_axis_lock_mode(AxisLockMode::Sticky));
    let apzc = rule.scrollable_controller(composition(), Size::new(1000.0, 1000.0));

    rule.drag(
        &apzc,
        Point::new(100.0, 300.0),
        Point::new(100.0, 200.0),
        1,
        STEP,
    );
    assert_eq!(apzc.state(), PanZoomState::PanningLockedY);

    rule.advance(STEP);
    rule.touch_move(&apzc, Point::new(160.0, 150.0));
    assert_eq!(apzc.state(), PanZoomState::Panning);
}

#[test]
fn test_standard_lock_survives_sideways_motion() {
    let rule = PanZoomTestRule::default();
    let apzc = rule.scrollable_controller(composition(), Size::new(1000.0, 1000.0));

    rule.drag(
        &apzc,
        Point::new(100.0, 300.0),
        Point::new(100.0, 200.0),
        1,
        STEP,
    );
    rule.advance(STEP);
    rule.touch_move(&apzc, Point::new(160.0, 150.0));

    assert_eq!(apzc.state(), PanZoomState::PanningLockedY);
}

#[test]
fn test_single_scrollable_axis_pans_without_lock() {
    let rule = PanZoomTestRule::default();
    let apzc = rule.scrollable_controller(composition(), Size::new(100.0, 1000.0));

    rule.drag(
        &apzc,
        Point::new(50.0, 300.0),
        Point::new(50.0, 200.0),
        1,
        STEP,
    );

    assert_eq!(apzc.state(), PanZoomState::Panning);
    assert!((apzc.frame_metrics().scroll_offset.y - 100.0).abs() < 1e-3);
}

#[test]
fn test_cross_slide_on_unscrollable_axis() {
    let rule = PanZoomTestRule::new(ApzConfig::default().with_cross_slide(true));
    let apzc = rule.scrollable_controller(composition(), Size::new(100.0, 1000.0));

    rule.drag(
        &apzc,
        Point::new(200.0, 100.0),
        Point::new(100.0, 100.0),
        1,
        STEP,
    );
    assert_eq!(apzc.state(), PanZoomState::CrossSlidingX);

    rule.advance(STEP);
    rule.touch_move(&apzc, Point::new(50.0, 100.0));
    assert_eq!(apzc.state(), PanZoomState::CrossSlidingX);
    assert_eq!(apzc.frame_metrics().scroll_offset, Point::ZERO);

    rule.touch_up(&apzc, Point::new(50.0, 100.0));
    assert_eq!(apzc.state(), PanZoomState::Idle);
}

#[test]
fn test_pan_notifications_begin_once() {
    let rule = PanZoomTestRule::default();
    let apzc = rule.scrollable_controller(composition(), Size::new(1000.0, 1000.0));
    rule.content().clear();

    rule.drag(
        &apzc,
        Point::new(100.0, 500.0),
        Point::new(100.0, 100.0),
        4,
        STEP,
    );

    assert_eq!(
        rule.content().state_change_kinds(),
        vec![
            StateChange::StartTouch,
            StateChange::TransformBegin,
            StateChange::StartPanning,
        ]
    );
    let (_, start_touch, can_pan) = rule.content().state_changes()[0];
    assert_eq!(start_touch, StateChange::StartTouch);
    assert_eq!(can_pan, 1);
}

#[test]
fn test_pan_publishes_snapshot_and_schedules_composite() {
    let rule = PanZoomTestRule::default();
    let apzc = rule.scrollable_controller(composition(), Size::new(1000.0, 1000.0));
    let composites_before = rule.scheduler().composite_count();

    rule.drag(
        &apzc,
        Point::new(100.0, 100.0),
        Point::new(100.0, 40.0),
        1,
        STEP,
    );

    assert!(rule.scheduler().composite_count() > composites_before);
    let published = rule
        .snapshots()
        .latest(apzc.id())
        .expect("pan publishes the viewport");
    assert!((published.scroll_offset.y - 60.0).abs() < 1e-3);
}

#[test]
fn test_async_transform_follows_pan() {
    let rule = PanZoomTestRule::default();
    let apzc = rule.scrollable_controller(composition(), Size::new(1000.0, 1000.0));

    rule.drag(
        &apzc,
        Point::new(100.0, 100.0),
        Point::new(100.0, 40.0),
        1,
        STEP,
    );
    apzc.advance_animations(rule.now());

    let sample = apzc.sample_content_transform_for_frame();
    let moved = sample.async_transform.transform_point(Point::ZERO);
    assert!((moved.y + 60.0).abs() < 1e-3, "Expected ~-60, got {}", moved.y);
    assert_eq!(sample.overscroll_transform, None);
}

#[test]
fn test_touch_cancel_returns_to_idle() {
    let rule = PanZoomTestRule::default();
    let apzc = rule.scrollable_controller(composition(), Size::new(1000.0, 1000.0));

    rule.drag(
        &apzc,
        Point::new(100.0, 300.0),
        Point::new(100.0, 200.0),
        1,
        STEP,
    );
    let cancel = touch(MultiTouchKind::Cancel, rule.now(), Point::new(100.0, 200.0));
    apzc.receive_input_event(cancel);

    assert_eq!(apzc.state(), PanZoomState::Idle);
    assert_eq!(apzc.velocity(), Point::ZERO);
}
