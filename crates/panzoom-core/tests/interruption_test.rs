//! Integration tests for new gestures stopping animations along the hand-off chain

use std::sync::Arc;
use std::time::Duration;

use panzoom_core::{ApzConfig, FrameMetrics, PanZoomController, PanZoomState, PinchKind, ZoomConstraints};
use panzoom_geometry::{Point, Rect, Size};
use panzoom_testing::{pinch, PanZoomTestRule};

const STEP: Duration = Duration::from_millis(10);
const FRAME: Duration = Duration::from_millis(16);

fn composition() -> Size {
    Size::new(100.0, 100.0)
}

fn page() -> Size {
    Size::new(1000.0, 1000.0)
}

fn zoomable() -> ZoomConstraints {
    ZoomConstraints::new(true, true, 0.25, 4.0)
}

fn overscrolling_rule() -> PanZoomTestRule {
    PanZoomTestRule::new(ApzConfig::default().with_overscroll(true))
}

fn start_fling(rule: &PanZoomTestRule, apzc: &PanZoomController) {
    rule.swipe(
        apzc,
        Point::new(50.0, 500.0),
        Point::new(50.0, 100.0),
        4,
        STEP,
    );
    assert_eq!(apzc.state(), PanZoomState::Fling);
    rule.frame(apzc, FRAME);
}

fn start_zoom_animation(rule: &PanZoomTestRule, apzc: &PanZoomController) {
    apzc.zoom_to_rect(Rect::new(100.0, 200.0, 50.0, 50.0))
        .expect("finite rect");
    assert_eq!(apzc.state(), PanZoomState::AnimatingZoom);
    rule.frame(apzc, FRAME);
}

fn start_smooth_scroll(rule: &PanZoomTestRule, apzc: &PanZoomController) {
    let request = FrameMetrics {
        do_smooth_scroll: true,
        smooth_scroll_offset: Point::new(0.0, 500.0),
        scroll_generation: 1,
        ..apzc.frame_metrics()
    };
    apzc.notify_layers_updated(&request, false);
    assert_eq!(apzc.state(), PanZoomState::SmoothScroll);
    rule.frame(apzc, FRAME);
}

/// Pulls the top edge down, lets go, and waits for the spring to take over.
fn start_snap_back(rule: &PanZoomTestRule, apzc: &PanZoomController) {
    rule.drag(
        apzc,
        Point::new(50.0, 100.0),
        Point::new(50.0, 160.0),
        1,
        STEP,
    );
    rule.advance_ms(200);
    rule.touch_up(apzc, Point::new(50.0, 160.0));
    for _ in 0..5 {
        if apzc.state() == PanZoomState::SnapBack {
            break;
        }
        rule.frame(apzc, FRAME);
    }
    assert_eq!(apzc.state(), PanZoomState::SnapBack);
    assert!(apzc.is_overscrolled());
}

/// Asserts `apzc` is no longer animating: a frame changes nothing.
fn assert_stopped(rule: &PanZoomTestRule, apzc: &PanZoomController) {
    let before = apzc.frame_metrics();
    let overscroll = apzc.overscroll();
    assert!(!rule.frame(apzc, FRAME));
    let after = apzc.frame_metrics();
    assert_eq!(after.scroll_offset, before.scroll_offset);
    assert_eq!(after.zoom, before.zoom);
    assert_eq!(apzc.overscroll(), overscroll);
}

fn pinch_start(rule: &PanZoomTestRule, apzc: &PanZoomController) {
    let focus = Point::new(50.0, 50.0);
    apzc.receive_input_event(pinch(PinchKind::Start, rule.now(), focus, 100.0, 100.0));
}

fn zoomable_controller(rule: &PanZoomTestRule, page: Size) -> Arc<PanZoomController> {
    let apzc = rule.scrollable_controller(composition(), page);
    apzc.update_zoom_constraints(zoomable()).expect("valid constraints");
    apzc
}

#[test]
fn test_pinch_start_stops_fling() {
    let rule = PanZoomTestRule::default();
    let apzc = zoomable_controller(&rule, Size::new(100.0, 100_000.0));
    start_fling(&rule, &apzc);

    pinch_start(&rule, &apzc);

    assert_eq!(apzc.state(), PanZoomState::Pinching);
    assert_eq!(apzc.velocity(), Point::ZERO);
    assert_stopped(&rule, &apzc);
    assert_eq!(apzc.state(), PanZoomState::Pinching);
}

#[test]
fn test_pinch_start_stops_zoom_animation() {
    let rule = PanZoomTestRule::default();
    let apzc = zoomable_controller(&rule, page());
    start_zoom_animation(&rule, &apzc);

    pinch_start(&rule, &apzc);

    assert_eq!(apzc.state(), PanZoomState::Pinching);
    assert_stopped(&rule, &apzc);
}

#[test]
fn test_pinch_start_stops_smooth_scroll() {
    let rule = PanZoomTestRule::default();
    let apzc = zoomable_controller(&rule, page());
    start_smooth_scroll(&rule, &apzc);

    pinch_start(&rule, &apzc);

    assert_eq!(apzc.state(), PanZoomState::Pinching);
    assert_stopped(&rule, &apzc);
}

#[test]
fn test_pinch_start_stops_snap_back() {
    let rule = overscrolling_rule();
    let apzc = zoomable_controller(&rule, page());
    start_snap_back(&rule, &apzc);

    pinch_start(&rule, &apzc);

    assert_eq!(apzc.state(), PanZoomState::Pinching);
    assert!(!apzc.is_overscrolled());
    assert_stopped(&rule, &apzc);
}

#[test]
fn test_pinch_start_stops_parent_fling() {
    let rule = PanZoomTestRule::default();
    let parent = rule.scrollable_controller(composition(), Size::new(100.0, 100_000.0));
    let child = rule.scrollable_child(&parent, composition(), page());
    child.update_zoom_constraints(zoomable()).expect("valid constraints");
    start_fling(&rule, &parent);

    pinch_start(&rule, &child);

    assert_eq!(child.state(), PanZoomState::Pinching);
    assert_eq!(parent.state(), PanZoomState::Idle);
    assert_stopped(&rule, &parent);
}

#[test]
fn test_pinch_start_without_zoom_leaves_fling_running() {
    let rule = PanZoomTestRule::default();
    let apzc = rule.scrollable_controller(composition(), Size::new(100.0, 100_000.0));
    start_fling(&rule, &apzc);

    pinch_start(&rule, &apzc);

    assert_eq!(apzc.state(), PanZoomState::Fling);
}

#[test]
fn test_touch_start_stops_snap_back() {
    let rule = overscrolling_rule();
    let apzc = rule.scrollable_controller(composition(), page());
    start_snap_back(&rule, &apzc);

    rule.touch_down(&apzc, Point::new(50.0, 50.0));

    assert_eq!(apzc.state(), PanZoomState::Touching);
    assert!(!apzc.is_overscrolled());
    assert_stopped(&rule, &apzc);
}

#[test]
fn test_touch_start_on_child_stops_parent_zoom_animation() {
    let rule = PanZoomTestRule::default();
    let parent = zoomable_controller(&rule, page());
    let child = rule.scrollable_child(&parent, composition(), page());
    start_zoom_animation(&rule, &parent);

    rule.touch_down(&child, Point::new(50.0, 50.0));

    assert_eq!(child.state(), PanZoomState::Touching);
    assert_eq!(parent.state(), PanZoomState::Idle);
    assert_stopped(&rule, &parent);
}

#[test]
fn test_touch_start_on_child_stops_parent_snap_back() {
    let rule = overscrolling_rule();
    let parent = rule.scrollable_controller(composition(), page());
    let child = rule.scrollable_child(&parent, composition(), page());
    start_snap_back(&rule, &parent);

    rule.touch_down(&child, Point::new(50.0, 50.0));

    assert_eq!(child.state(), PanZoomState::Touching);
    assert_eq!(parent.state(), PanZoomState::Idle);
    assert!(!parent.is_overscrolled());
    assert_stopped(&rule, &parent);
}
