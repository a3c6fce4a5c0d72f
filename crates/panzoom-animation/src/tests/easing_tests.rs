use super::*;

#[test]
fn ease_endpoints_are_fixed() {
    let ease = Easing::ease();
    assert_eq!(ease.transform(0.0), 0.0);
    assert_eq!(ease.transform(1.0), 1.0);
    assert_eq!(ease.transform(-0.5), 0.0);
    assert_eq!(ease.transform(1.5), 1.0);
}

#[test]
fn css_ease_front_loads_progress() {
    let mid = Easing::ease().transform(0.5);
    // cubic-bezier(0.25, 0.1, 0.25, 1.0) evaluates to ~0.8024 at x = 0.5.
    assert!((mid - 0.8024).abs() < 0.01, "Expected ~0.8024, got {}", mid);
}

#[test]
fn ease_is_monotonic() {
    let ease = Easing::ease();
    let mut last = 0.0;
    for i in 1..=100 {
        let value = ease.transform(i as f32 / 100.0);
        assert!(value >= last - 1e-5, "regressed at {}: {} < {}", i, value, last);
        last = value;
    }
}

#[test]
fn diagonal_control_points_give_linear_progress() {
    let linear = Easing::cubic_bezier(0.25, 0.25, 0.75, 0.75);
    for fraction in [0.1, 0.33, 0.5, 0.9] {
        assert!((linear.transform(fraction) - fraction).abs() < 1e-4);
    }
}

#[test]
fn tween_finishes_at_its_duration() {
    let tween = Tween::new(Duration::from_millis(200), Easing::ease());
    assert_eq!(tween.progress(Duration::ZERO), 0.0);
    assert!(!tween.is_finished(Duration::from_millis(199)));
    assert!(tween.is_finished(Duration::from_millis(200)));
    assert_eq!(tween.progress(Duration::from_millis(400)), 1.0);
}

#[test]
fn zero_duration_tween_completes_immediately() {
    let tween = Tween::new(Duration::ZERO, Easing::ease());
    assert!(tween.is_finished(Duration::ZERO));
    assert_eq!(tween.progress(Duration::ZERO), 1.0);
}
