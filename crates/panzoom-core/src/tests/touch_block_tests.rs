use super::*;
use crate::input::MultiTouchKind;
use panzoom_geometry::Point;
use web_time::Instant;

fn chain() -> Arc<OverscrollHandoffChain> {
    Arc::new(OverscrollHandoffChain::new())
}

fn new_block(touch_action_enabled: bool) -> TouchBlockState {
    TouchBlockState::new(chain(), touch_action_enabled)
}

fn touch(kind: MultiTouchKind, y: f32) -> MultiTouchInput {
    MultiTouchInput::single(kind, Instant::now(), Point::new(10.0, y))
}

#[test]
fn block_is_ready_once_content_answers() {
    let mut block = new_block(false);
    assert!(!block.is_ready_for_handling());
    assert!(block.set_content_response(true));
    assert!(block.is_ready_for_handling());
    assert!(block.is_default_prevented());
    assert!(!block.set_content_response(false));
    assert!(block.is_default_prevented());
}

#[test]
fn late_response_does_not_override_timeout() {
    let mut block = new_block(false);
    assert!(block.timeout_content_response());
    assert!(!block.timeout_content_response());
    assert!(block.set_content_response(true));
    assert!(!block.is_default_prevented());
}

#[test]
fn touch_action_needs_allowed_behaviors() {
    let mut block = new_block(true);
    block.set_content_response(false);
    assert!(!block.is_ready_for_handling());
    assert!(block.set_allowed_touch_behaviors(&[AllowedTouchBehavior::VERTICAL_PAN]));
    assert!(block.is_ready_for_handling());
    assert!(!block.set_allowed_touch_behaviors(&[AllowedTouchBehavior::HORIZONTAL_PAN]));

    assert!(block.touch_action_allows_panning_y());
    assert!(!block.touch_action_allows_panning_x());
    assert!(!block.touch_action_allows_panning_xy());
    assert!(!block.touch_action_allows_pinch_zoom());
}

#[test]
fn timeout_applies_default_behaviors() {
    let mut block = new_block(true);
    block.timeout_content_response();
    assert!(block.is_ready_for_handling());
    assert!(block.touch_action_allows_panning_xy());
    assert!(block.touch_action_allows_pinch_zoom());
}

#[test]
fn pinch_requires_every_touch_to_allow_it() {
    let mut block = new_block(true);
    block.set_allowed_touch_behaviors(&[
        AllowedTouchBehavior::default_behavior(),
        AllowedTouchBehavior::VERTICAL_PAN,
    ]);
    assert!(!block.touch_action_allows_pinch_zoom());
    assert!(block.touch_action_allows_panning_xy());
}

#[test]
fn without_touch_action_everything_is_allowed() {
    let mut block = new_block(false);
    block.set_allowed_touch_behaviors(&[AllowedTouchBehavior::empty()]);
    assert!(block.touch_action_allows_pinch_zoom());
    assert!(block.touch_action_allows_double_tap_zoom());
    assert!(block.touch_action_allows_panning_x());
}

#[test]
fn disallowed_single_tap_is_refused() {
    let mut block = new_block(false);
    block.disallow_single_tap();
    assert!(!block.set_single_tap_occurred());
    assert!(!block.single_tap_occurred());
}

#[test]
fn replays_buffered_events_in_order_once() {
    let mut queue = TouchBlockQueue::new();
    queue.start_new_block(chain(), false, false);
    let events = [
        touch(MultiTouchKind::Start, 100.0),
        touch(MultiTouchKind::Move, 90.0),
        touch(MultiTouchKind::Move, 80.0),
    ];
    for event in &events {
        if let Some(block) = queue.last_mut() {
            block.add_event(event.clone());
        }
    }
    assert_eq!(queue.next_step(), QueueStep::Blocked);

    assert!(queue.content_received(false));
    let mut replayed = Vec::new();
    loop {
        match queue.next_step() {
            QueueStep::Replay(event) => replayed.push(event),
            QueueStep::Blocked => break,
            other => panic!("unexpected step {:?}", other),
        }
    }
    assert_eq!(replayed, events.to_vec());
    assert_eq!(queue.next_step(), QueueStep::Blocked);
    assert_eq!(queue.len(), 1);
}

#[test]
fn prevented_block_drops_events_and_reports_once() {
    let mut queue = TouchBlockQueue::new();
    queue.start_new_block(chain(), false, false);
    if let Some(block) = queue.last_mut() {
        block.add_event(touch(MultiTouchKind::Start, 100.0));
    }
    queue.content_received(true);

    assert_eq!(queue.next_step(), QueueStep::Prevented);
    assert_eq!(queue.next_step(), QueueStep::Blocked);
    assert!(!queue.current().is_some_and(TouchBlockState::has_events));
}

#[test]
fn resolved_head_is_evicted_when_newer_block_exists() {
    let mut queue = TouchBlockQueue::new();
    queue.start_new_block(chain(), false, false);
    queue.start_new_block(chain(), false, false);
    assert_eq!(queue.len(), 2);

    queue.content_received(false);
    assert_eq!(queue.next_step(), QueueStep::Evicted);
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.next_step(), QueueStep::Blocked);
}

#[test]
fn new_block_evicts_drained_head() {
    let mut queue = TouchBlockQueue::new();
    queue.start_new_block(chain(), false, false);
    queue.content_response_timeout();
    queue.start_new_block(chain(), false, false);
    assert_eq!(queue.len(), 1);
    assert!(!queue.has_ready_block());
}

#[test]
fn balance_pairs_timeouts_with_responses() {
    let mut queue = TouchBlockQueue::new();
    queue.start_new_block(chain(), false, false);
    queue.start_new_block(chain(), false, false);

    // Block 1 times out, then its late response arrives.
    assert!(queue.content_response_timeout());
    assert!(!queue.content_received(true));
    // Block 2 hears from content first, then its timer fires.
    assert!(queue.content_received(true));
    assert!(!queue.content_response_timeout());

    assert_eq!(queue.next_step(), QueueStep::Evicted);
    assert!(queue.current().is_some_and(TouchBlockState::is_default_prevented));
}

#[test]
fn surplus_callbacks_are_ignored() {
    let mut queue = TouchBlockQueue::new();
    assert!(!queue.content_received(false));
    assert!(!queue.set_allowed_touch_behavior(&[AllowedTouchBehavior::VERTICAL_PAN]));
}

#[test]
fn copies_allowed_behaviors_from_current_block() {
    let mut queue = TouchBlockQueue::new();
    queue.start_new_block(chain(), true, false);
    queue.set_allowed_touch_behavior(&[AllowedTouchBehavior::HORIZONTAL_PAN]);
    queue.start_new_block(chain(), true, true);
    assert!(!queue.set_allowed_touch_behavior(&[AllowedTouchBehavior::VERTICAL_PAN]));
}

#[test]
fn expiring_newest_block_skips_older_waiting_block() {
    let mut queue = TouchBlockQueue::new();
    queue.start_new_block(chain(), false, false);
    queue.start_new_block(chain(), false, false);
    queue.expire_last_block();

    assert!(!queue.has_ready_block());
    assert!(queue.last().is_some_and(TouchBlockState::is_ready_for_handling));
    // The late answer for the expired block is absorbed by the balance.
    assert!(!queue.content_received(false));
    assert!(queue.content_response_timeout());
    assert!(queue.has_ready_block());
}
