use super::*;
use panzoom_geometry::Rect;

fn metrics(offset_y: f32) -> FrameMetrics {
    FrameMetrics {
        scroll_offset: Point::new(0.0, offset_y),
        composition_bounds: Rect::new(0.0, 0.0, 100.0, 100.0),
        scrollable_rect: Rect::new(0.0, 0.0, 100.0, 1000.0),
        ..FrameMetrics::default()
    }
}

fn vertical() -> AxisTracker {
    AxisTracker::new(AxisKind::Vertical, &ApzConfig::default())
}

#[test]
fn displacement_within_bounds_is_accepted_whole() {
    let m = metrics(400.0);
    for requested in [-300.0, -12.5, 0.0, 0.25, 99.0, 500.0] {
        let mut axis = vertical();
        axis.set_velocity(3.0);
        let adjusted = axis.adjust_displacement(requested, &m);
        assert_eq!(adjusted.accepted, requested);
        assert_eq!(adjusted.overscroll, 0.0);
        assert_eq!(axis.velocity(), 3.0);
    }
}

#[test]
fn displacement_past_end_splits_and_stops_velocity() {
    let m = metrics(850.0);
    let mut axis = vertical();
    axis.set_velocity(2.0);
    let adjusted = axis.adjust_displacement(80.0, &m);
    assert!((adjusted.accepted - 50.0).abs() < 1e-4, "got {:?}", adjusted);
    assert!((adjusted.overscroll - 30.0).abs() < 1e-4, "got {:?}", adjusted);
    assert_eq!(adjusted.accepted + adjusted.overscroll, 80.0);
    assert_eq!(axis.velocity(), 0.0);

    let m = metrics(10.0);
    let mut axis = vertical();
    axis.set_velocity(-2.0);
    let adjusted = axis.adjust_displacement(-25.0, &m);
    assert!((adjusted.accepted + 10.0).abs() < 1e-4);
    assert!((adjusted.overscroll + 15.0).abs() < 1e-4);
    assert_eq!(axis.velocity(), 0.0);
}

#[test]
fn displacement_is_scaled_by_zoom() {
    let mut m = metrics(850.0);
    m.zoom = 2.0;
    // Composition is 50 content pixels tall, so 100 content pixels remain.
    let mut axis = vertical();
    let adjusted = axis.adjust_displacement(300.0, &m);
    assert!((adjusted.accepted - 200.0).abs() < 1e-3, "got {:?}", adjusted);
    assert!((adjusted.overscroll - 100.0).abs() < 1e-3, "got {:?}", adjusted);
}

#[test]
fn locked_axis_accepts_nothing() {
    let m = metrics(400.0);
    let mut axis = vertical();
    axis.set_axis_locked(true);
    assert_eq!(axis.adjust_displacement(40.0, &m), AdjustedDisplacement::default());
    assert!(!axis.can_scroll_now(&m));
    assert!(axis.can_scroll(&m));
}

#[test]
fn opposite_overscroll_is_consumed_first() {
    let m = metrics(900.0);
    let mut axis = vertical();
    axis.overscroll_by(20.0, &m);
    let stretched = axis.overscroll();
    assert!(stretched > 0.0);

    let adjusted = axis.adjust_displacement(-5.0, &m);
    assert!(adjusted.consumed_overscroll);
    assert_eq!(adjusted.accepted, 0.0);
    assert!((axis.overscroll() - (stretched - 5.0)).abs() < 1e-4);
}

#[test]
fn negative_overscroll_is_relieved_before_scrolling() {
    let m = metrics(0.0);
    let mut axis = vertical();
    axis.overscroll_by(-10.0, &m);
    let stretched = axis.overscroll();
    assert!(stretched < 0.0);

    let adjusted = axis.adjust_displacement(4.0, &m);
    assert!(adjusted.consumed_overscroll);
    assert_eq!(adjusted.accepted, 0.0);
    assert_eq!(adjusted.overscroll, 0.0);
    assert!((axis.overscroll() - (stretched + 4.0)).abs() < 1e-4);

    // Whatever is left after the stretch is gone scrolls normally.
    let remaining = -axis.overscroll();
    let adjusted = axis.adjust_displacement(remaining + 7.0, &m);
    assert_eq!(axis.overscroll(), 0.0);
    assert!((adjusted.accepted - 7.0).abs() < 1e-4, "got {:?}", adjusted);
}

#[test]
fn overscroll_only_at_an_exhausted_edge() {
    let mut axis = vertical();
    axis.overscroll_by(10.0, &metrics(400.0));
    assert!(!axis.is_overscrolled());

    axis.overscroll_by(-10.0, &metrics(0.0));
    assert!(axis.overscroll() < 0.0);
    assert!(!axis.is_in_positive_overscroll());
}

#[test]
fn overscroll_resistance_grows_with_stretch() {
    let m = metrics(900.0);
    let mut axis = vertical();
    axis.overscroll_by(50.0, &m);
    assert_eq!(axis.overscroll(), 50.0);
    axis.overscroll_by(50.0, &m);
    // Factor is 1 - 50/100 so only half of the second request lands.
    assert!((axis.overscroll() - 75.0).abs() < 1e-4, "got {}", axis.overscroll());
}

#[test]
fn cannot_scroll_when_page_fits() {
    let mut m = metrics(0.0);
    m.scrollable_rect = Rect::new(0.0, 0.0, 100.0, 100.0);
    assert!(!vertical().can_scroll(&m));
}

#[test]
fn fling_friction_stops_at_threshold() {
    let mut axis = vertical();
    axis.set_velocity(2.0);
    let mut frames = 0;
    while axis.apply_fling_friction(Duration::from_millis(16), 0.05, 0.01) {
        assert!(axis.velocity().abs() > 0.0);
        frames += 1;
        assert!(frames < 1000);
    }
    assert_eq!(axis.velocity(), 0.0);
    assert!(frames > 0);
}

#[test]
fn velocity_from_touch_moves() {
    let config = ApzConfig::default();
    let start = Instant::now();
    let mut axis = vertical();
    axis.start_touch(100.0, start);
    axis.update_with_touch(90.0, start + Duration::from_millis(10), &config);
    assert!((axis.velocity() - 1.0).abs() < 1e-3, "got {}", axis.velocity());
    axis.update_with_touch(70.0, start + Duration::from_millis(20), &config);
    assert!((axis.velocity() - 2.0).abs() < 1e-3);
    assert_eq!(axis.pan_distance(), 30.0);

    axis.end_touch(start + Duration::from_millis(25), &config);
    assert!((axis.velocity() - 1.5).abs() < 1e-3, "got {}", axis.velocity());
}

#[test]
fn max_velocity_caps_samples() {
    let config = ApzConfig {
        max_velocity_inches_per_ms: 0.01,
        ..ApzConfig::default()
    };
    let start = Instant::now();
    let mut axis = vertical();
    axis.start_touch(500.0, start);
    axis.update_with_touch(100.0, start + Duration::from_millis(10), &config);
    assert!((axis.velocity() - 1.6).abs() < 1e-4, "got {}", axis.velocity());
}

#[test]
fn locked_axis_tracks_zero_velocity() {
    let config = ApzConfig::default();
    let start = Instant::now();
    let mut axis = vertical();
    axis.start_touch(100.0, start);
    axis.set_axis_locked(true);
    axis.update_with_touch(50.0, start + Duration::from_millis(10), &config);
    assert_eq!(axis.velocity(), 0.0);
    assert_eq!(axis.position(), 50.0);
}

#[test]
fn snap_back_settles_exactly_at_zero() {
    let m = metrics(900.0);
    let spring = SpringSpec::default();
    let mut axis = vertical();
    axis.overscroll_by(40.0, &m);

    let mut previous = axis.overscroll();
    let mut frames = 0;
    while axis.sample_snap_back(Duration::from_millis(16), &spring) {
        assert!(axis.overscroll() <= previous, "snap-back moved outward");
        assert!(axis.overscroll() > 0.0);
        previous = axis.overscroll();
        frames += 1;
        assert!(frames < 1000);
    }
    assert_eq!(axis.overscroll(), 0.0);
    assert_eq!(axis.velocity(), 0.0);
}

#[test]
fn scale_overscroll_amounts() {
    let mut m = metrics(0.0);
    m.scrollable_rect = Rect::new(0.0, 0.0, 1000.0, 1000.0);
    let axis = vertical();
    // Zooming out about the top edge from offset 0 pulls the origin negative.
    assert!(axis.scale_will_overscroll_amount(0.5, 100.0, &m) < 0.0);
    // Zooming in never leaves the page from the middle.
    assert_eq!(axis.scale_will_overscroll_amount(2.0, 50.0, &m), 0.0);
    assert!(axis.scale_will_overscroll_both_sides(0.05, &m));
    assert!(!axis.scale_will_overscroll_both_sides(1.0, &m));
}
