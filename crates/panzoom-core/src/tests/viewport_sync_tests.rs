use super::*;

fn request(offset_y: f32) -> FrameMetrics {
    FrameMetrics {
        scroll_offset: Point::new(0.0, offset_y),
        ..FrameMetrics::default()
    }
}

#[test]
fn second_request_waits_for_the_first() {
    let start = Instant::now();
    let mut throttler = PaintThrottler::new(start, Duration::from_millis(500));

    assert_eq!(throttler.post(request(1.0), start), Some(request(1.0)));
    assert!(throttler.is_outstanding());

    let later = start + Duration::from_millis(10);
    assert_eq!(throttler.post(request(2.0), later), None);
    assert_eq!(throttler.post(request(3.0), later), None);
    assert!(throttler.has_queued());

    let done = start + Duration::from_millis(40);
    assert_eq!(throttler.task_complete(done), Some(request(3.0)));
    assert!(throttler.is_outstanding());
    assert_eq!(throttler.average_duration(), Duration::from_millis(40));

    assert_eq!(throttler.task_complete(done + Duration::from_millis(20)), None);
    assert!(!throttler.is_outstanding());
    assert_eq!(throttler.average_duration(), Duration::from_millis(30));
}

#[test]
fn stale_outstanding_request_does_not_block() {
    let start = Instant::now();
    let mut throttler = PaintThrottler::new(start, Duration::from_millis(500));
    throttler.post(request(1.0), start);
    let late = start + Duration::from_millis(600);
    assert_eq!(throttler.post(request(2.0), late), Some(request(2.0)));
    assert!(!throttler.has_queued());
}

#[test]
fn duration_window_is_bounded() {
    let start = Instant::now();
    let mut throttler = PaintThrottler::new(start, Duration::from_millis(500));
    throttler.set_max_durations(2);
    let mut now = start;
    for ms in [10, 20, 60] {
        throttler.post(request(0.0), now);
        now += Duration::from_millis(ms);
        throttler.task_complete(now);
    }
    assert_eq!(throttler.average_duration(), Duration::from_millis(40));
    throttler.clear_history();
    assert_eq!(throttler.average_duration(), Duration::ZERO);
}

#[test]
fn completion_without_outstanding_request_is_ignored() {
    let start = Instant::now();
    let mut throttler = PaintThrottler::new(start, Duration::from_millis(500));
    assert_eq!(throttler.task_complete(start), None);
    assert_eq!(throttler.average_duration(), Duration::ZERO);
}

#[test]
fn dropping_handle_cancels_task() {
    let (handle, token) = DelayedTaskHandle::new();
    assert!(!token.is_cancelled());
    drop(handle);
    assert!(token.is_cancelled());

    let (handle, token) = DelayedTaskHandle::new();
    handle.cancel();
    assert!(token.is_cancelled());
}

#[test]
fn async_scroll_fires_after_throttle_interval() {
    let config = ApzConfig::default();
    let start = Instant::now();
    let mut throttle = AsyncScrollThrottle::new(start);

    throttle.set_current_offset(Point::new(0.0, 10.0));
    assert_eq!(
        throttle.on_sample(start + Duration::from_millis(50), &config),
        AsyncScrollDecision::ArmTimeout
    );
    assert_eq!(
        throttle.on_sample(start + Duration::from_millis(150), &config),
        AsyncScrollDecision::FireNow
    );
    // Offset unchanged since the last notification.
    assert_eq!(
        throttle.on_sample(start + Duration::from_millis(400), &config),
        AsyncScrollDecision::ArmTimeout
    );
}

#[test]
fn new_timer_replaces_pending_one() {
    let start = Instant::now();
    let mut throttle = AsyncScrollThrottle::new(start);
    let (first, first_token) = DelayedTaskHandle::new();
    throttle.set_timeout(first);
    let (second, second_token) = DelayedTaskHandle::new();
    throttle.set_timeout(second);
    assert!(first_token.is_cancelled());
    assert!(!second_token.is_cancelled());

    throttle.on_sample(start, &ApzConfig::default());
    assert!(second_token.is_cancelled());
}
