//! Integration tests for pinch zoom, animated zoom-to-rect and zoom limits

use std::time::Duration;

use panzoom_core::{ApzError, PanZoomState, PinchKind, StateChange, ZoomConstraints};
use panzoom_geometry::{Point, Rect, Size};
use panzoom_testing::{pinch, PanZoomTestRule};

const FRAME: Duration = Duration::from_millis(16);

fn composition() -> Size {
    Size::new(100.0, 100.0)
}

fn zoomable() -> ZoomConstraints {
    ZoomConstraints::new(true, true, 0.25, 4.0)
}

#[test]
fn test_pinch_zooms_about_focus() {
    let rule = PanZoomTestRule::default();
    let apzc = rule.scrollable_controller(composition(), Size::new(1000.0, 1000.0));
    apzc.update_zoom_constraints(zoomable()).expect("valid constraints");
    rule.content().clear();

    let focus = Point::new(50.0, 50.0);
    let before = apzc.screen_to_content(focus);
    apzc.receive_input_event(pinch(PinchKind::Start, rule.now(), focus, 100.0, 100.0));
    assert_eq!(apzc.state(), PanZoomState::Pinching);

    rule.advance_ms(10);
    apzc.receive_input_event(pinch(PinchKind::Scale, rule.now(), focus, 150.0, 100.0));

    let zoom = apzc.frame_metrics().zoom;
    assert!((zoom - 1.5).abs() < 1e-4, "Expected ~1.5, got {}", zoom);
    let after = apzc.screen_to_content(focus);
    assert!((after.x - before.x).abs() < 1e-3, "Expected ~{}, got {}", before.x, after.x);
    assert!((after.y - before.y).abs() < 1e-3, "Expected ~{}, got {}", before.y, after.y);

    apzc.receive_input_event(pinch(PinchKind::End, rule.now(), focus, 150.0, 150.0));
    assert_eq!(apzc.state(), PanZoomState::Idle);
    assert_eq!(
        rule.content().state_change_kinds(),
        vec![StateChange::TransformBegin, StateChange::TransformEnd]
    );
    let repaint = rule.content().last_repaint().expect("pinch end repaints");
    assert!((repaint.zoom - 1.5).abs() < 1e-4);
}

#[test]
fn test_pinch_ignored_without_zoom_permission() {
    let rule = PanZoomTestRule::default();
    let apzc = rule.scrollable_controller(composition(), Size::new(1000.0, 1000.0));

    let focus = Point::new(50.0, 50.0);
    apzc.receive_input_event(pinch(PinchKind::Start, rule.now(), focus, 100.0, 100.0));
    apzc.receive_input_event(pinch(PinchKind::Scale, rule.now(), focus, 200.0, 100.0));

    assert_eq!(apzc.state(), PanZoomState::Idle);
    assert_eq!(apzc.frame_metrics().zoom, 1.0);
}

#[test]
fn test_pinch_stops_at_max_zoom() {
    let rule = PanZoomTestRule::default();
    let apzc = rule.scrollable_controller(composition(), Size::new(1000.0, 1000.0));
    apzc.update_zoom_constraints(zoomable()).expect("valid constraints");

    let focus = Point::new(50.0, 50.0);
    apzc.receive_input_event(pinch(PinchKind::Start, rule.now(), focus, 100.0, 100.0));
    apzc.receive_input_event(pinch(PinchKind::Scale, rule.now(), focus, 1000.0, 100.0));

    let zoom = apzc.frame_metrics().zoom;
    assert!((zoom - 4.0).abs() < 1e-4, "Expected ~4.0, got {}", zoom);
}

#[test]
fn test_pinch_out_stops_when_page_fills_composition() {
    let rule = PanZoomTestRule::default();
    let apzc = rule.scrollable_controller(composition(), Size::new(200.0, 200.0));
    apzc.update_zoom_constraints(zoomable()).expect("valid constraints");

    let focus = Point::new(50.0, 50.0);
    apzc.receive_input_event(pinch(PinchKind::Start, rule.now(), focus, 100.0, 100.0));
    apzc.receive_input_event(pinch(PinchKind::Scale, rule.now(), focus, 10.0, 100.0));

    let metrics = apzc.frame_metrics();
    assert!((metrics.zoom - 0.5).abs() < 1e-4, "Expected ~0.5, got {}", metrics.zoom);
    assert!(metrics.scroll_offset.x.abs() < 1e-3);
    assert!(metrics.scroll_offset.y.abs() < 1e-3);
}

#[test]
fn test_zoom_to_rect_animates_to_target() {
    let rule = PanZoomTestRule::default();
    let apzc = rule.scrollable_controller(composition(), Size::new(1000.0, 1000.0));
    apzc.update_zoom_constraints(zoomable()).expect("valid constraints");
    rule.content().clear();

    apzc.zoom_to_rect(Rect::new(100.0, 200.0, 50.0, 50.0))
        .expect("finite rect");
    assert_eq!(apzc.state(), PanZoomState::AnimatingZoom);

    // Content is asked for the final viewport up front.
    let requested = rule.content().repaints()[0];
    assert!((requested.zoom - 2.0).abs() < 1e-4);
    assert_eq!(requested.scroll_offset, Point::new(100.0, 200.0));

    assert!(rule.frame(&apzc, FRAME));
    let midway = apzc.frame_metrics().zoom;
    assert!(midway > 1.0 && midway < 2.0, "Expected between 1 and 2, got {}", midway);

    rule.run_animation(&apzc, FRAME, 100)
        .expect("zoom settles");
    let metrics = apzc.frame_metrics();
    assert!((metrics.zoom - 2.0).abs() < 1e-4);
    assert_eq!(metrics.scroll_offset, Point::new(100.0, 200.0));
    assert_eq!(apzc.state(), PanZoomState::Idle);
}

#[test]
fn test_zoom_to_rect_rejects_non_finite_rect() {
    let rule = PanZoomTestRule::default();
    let apzc = rule.scrollable_controller(composition(), Size::new(1000.0, 1000.0));

    let result = apzc.zoom_to_rect(Rect::new(f32::NAN, 0.0, 50.0, 50.0));

    assert_eq!(result, Err(ApzError::NonFiniteZoomRect));
    assert_eq!(apzc.state(), PanZoomState::Idle);
}

#[test]
fn test_invalid_zoom_constraints_keep_previous() {
    let rule = PanZoomTestRule::default();
    let apzc = rule.scrollable_controller(composition(), Size::new(1000.0, 1000.0));
    apzc.update_zoom_constraints(zoomable()).expect("valid constraints");

    let nan = apzc.update_zoom_constraints(ZoomConstraints::new(true, true, f32::NAN, 4.0));
    assert!(matches!(nan, Err(ApzError::InvalidZoomConstraints { .. })));
    let negative = apzc.update_zoom_constraints(ZoomConstraints::new(true, true, -1.0, 4.0));
    assert!(matches!(negative, Err(ApzError::InvalidZoomConstraints { .. })));

    assert_eq!(apzc.zoom_constraints(), zoomable());
}

#[test]
fn test_zoom_constraints_clamped_to_hard_limits() {
    let rule = PanZoomTestRule::default();
    let apzc = rule.scrollable_controller(composition(), Size::new(1000.0, 1000.0));

    apzc.update_zoom_constraints(ZoomConstraints::new(true, false, 0.01, f32::INFINITY))
        .expect("finite-or-infinite bounds are clamped");

    let constraints = apzc.zoom_constraints();
    assert_eq!(constraints.min_zoom, panzoom_core::MIN_ZOOM);
    assert_eq!(constraints.max_zoom, panzoom_core::MAX_ZOOM);
}

#[test]
fn test_repeated_sample_time_is_ignored() {
    let rule = PanZoomTestRule::default();
    let apzc = rule.scrollable_controller(composition(), Size::new(1000.0, 1000.0));
    apzc.update_zoom_constraints(zoomable()).expect("valid constraints");
    apzc.zoom_to_rect(Rect::new(100.0, 200.0, 50.0, 50.0))
        .expect("finite rect");

    let sample_time = rule.advance(FRAME);
    apzc.advance_animations(sample_time);
    let first = apzc.frame_metrics();
    apzc.advance_animations(sample_time);

    assert_eq!(apzc.frame_metrics(), first);
    assert_eq!(apzc.state(), PanZoomState::AnimatingZoom);
}
