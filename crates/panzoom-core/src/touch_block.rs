//! Touch blocks waiting on content's verdict.
//!
//! A touch block is every event from the first finger down to the last
//! finger up. Content may cancel the default action of a block, and with
//! touch-action enabled it also tells us which behaviors are allowed; until
//! both answers are known the block's events are buffered.

use std::collections::VecDeque;
use std::sync::Arc;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::handoff::OverscrollHandoffChain;
use crate::input::MultiTouchInput;

bitflags! {
    /// Behaviors touch-action permits for one touch point.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AllowedTouchBehavior: u32 {
        const VERTICAL_PAN = 1 << 0;
        const HORIZONTAL_PAN = 1 << 1;
        const PINCH_ZOOM = 1 << 2;
        const DOUBLE_TAP_ZOOM = 1 << 3;
        const UNKNOWN = 1 << 4;
    }
}

impl AllowedTouchBehavior {
    /// Used when content never answers.
    pub fn default_behavior() -> Self {
        Self::VERTICAL_PAN | Self::HORIZONTAL_PAN | Self::PINCH_ZOOM | Self::DOUBLE_TAP_ZOOM
    }
}

pub type TouchBehaviorList = SmallVec<[AllowedTouchBehavior; 2]>;

#[derive(Debug)]
pub struct TouchBlockState {
    chain: Arc<OverscrollHandoffChain>,
    touch_action_enabled: bool,
    allowed_behaviors_set: bool,
    allowed_behaviors: TouchBehaviorList,
    prevent_default: bool,
    content_responded: bool,
    content_response_timer_expired: bool,
    single_tap_disallowed: bool,
    single_tap_occurred: bool,
    prevent_reported: bool,
    events: VecDeque<MultiTouchInput>,
}

impl TouchBlockState {
    /// Without touch-action there is nothing to wait for on the behavior side.
    pub fn new(chain: Arc<OverscrollHandoffChain>, touch_action_enabled: bool) -> Self {
        Self {
            chain,
            touch_action_enabled,
            allowed_behaviors_set: !touch_action_enabled,
            allowed_behaviors: TouchBehaviorList::new(),
            prevent_default: false,
            content_responded: false,
            content_response_timer_expired: false,
            single_tap_disallowed: false,
            single_tap_occurred: false,
            prevent_reported: false,
            events: VecDeque::new(),
        }
    }

    /// Hand-off chain frozen when the block started.
    pub fn overscroll_handoff_chain(&self) -> &Arc<OverscrollHandoffChain> {
        &self.chain
    }

    /// Records content's answer. Returns false if one was already recorded.
    /// An answer arriving after the timeout no longer changes the outcome.
    pub fn set_content_response(&mut self, prevent_default: bool) -> bool {
        if self.content_responded {
            return false;
        }
        log::trace!("touch block content response, prevented: {}", prevent_default);
        if !self.content_response_timer_expired {
            self.prevent_default = prevent_default;
        }
        self.content_responded = true;
        true
    }

    /// Records that content took too long. Returns false if already timed out.
    pub fn timeout_content_response(&mut self) -> bool {
        if self.content_response_timer_expired {
            return false;
        }
        if !self.content_responded {
            self.prevent_default = false;
        }
        self.content_response_timer_expired = true;
        if !self.allowed_behaviors_set {
            self.allowed_behaviors.push(AllowedTouchBehavior::default_behavior());
            self.allowed_behaviors_set = true;
        }
        true
    }

    pub fn set_allowed_touch_behaviors(&mut self, behaviors: &[AllowedTouchBehavior]) -> bool {
        if self.allowed_behaviors_set {
            return false;
        }
        self.allowed_behaviors.extend_from_slice(behaviors);
        self.allowed_behaviors_set = true;
        true
    }

    pub fn copy_allowed_touch_behaviors_from(&mut self, other: &TouchBlockState) -> bool {
        let behaviors = other.allowed_behaviors.clone();
        self.set_allowed_touch_behaviors(&behaviors)
    }

    pub fn is_ready_for_handling(&self) -> bool {
        self.allowed_behaviors_set && (self.content_responded || self.content_response_timer_expired)
    }

    pub fn is_default_prevented(&self) -> bool {
        self.prevent_default
    }

    pub fn disallow_single_tap(&mut self) {
        self.single_tap_disallowed = true;
    }

    /// Returns false when single taps were disallowed for this block.
    pub fn set_single_tap_occurred(&mut self) -> bool {
        if self.single_tap_disallowed {
            return false;
        }
        self.single_tap_occurred = true;
        true
    }

    pub fn single_tap_occurred(&self) -> bool {
        self.single_tap_occurred
    }

    pub fn add_event(&mut self, event: MultiTouchInput) {
        self.events.push_back(event);
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn remove_first_event(&mut self) -> Option<MultiTouchInput> {
        self.events.pop_front()
    }

    pub fn drop_events(&mut self) {
        self.events.clear();
    }

    pub fn touch_action_allows_pinch_zoom(&self) -> bool {
        !self.touch_action_enabled
            || self
                .allowed_behaviors
                .iter()
                .all(|behavior| behavior.contains(AllowedTouchBehavior::PINCH_ZOOM))
    }

    pub fn touch_action_allows_double_tap_zoom(&self) -> bool {
        !self.touch_action_enabled
            || self
                .allowed_behaviors
                .iter()
                .all(|behavior| behavior.contains(AllowedTouchBehavior::DOUBLE_TAP_ZOOM))
    }

    // Panning follows the first touch point only.
    fn first_allows(&self, flags: AllowedTouchBehavior) -> bool {
        if !self.touch_action_enabled {
            return true;
        }
        match self.allowed_behaviors.first() {
            Some(behavior) => behavior.contains(flags),
            None => true,
        }
    }

    pub fn touch_action_allows_panning_x(&self) -> bool {
        self.first_allows(AllowedTouchBehavior::HORIZONTAL_PAN)
    }

    pub fn touch_action_allows_panning_y(&self) -> bool {
        self.first_allows(AllowedTouchBehavior::VERTICAL_PAN)
    }

    pub fn touch_action_allows_panning_xy(&self) -> bool {
        self.first_allows(AllowedTouchBehavior::HORIZONTAL_PAN | AllowedTouchBehavior::VERTICAL_PAN)
    }
}

/// One step of draining the queue, performed by the controller without the
/// queue lock held.
#[derive(Debug, PartialEq)]
pub enum QueueStep {
    /// The head block is still waiting, or is the only (still open) block.
    Blocked,
    /// The head block was prevented; its buffered events were dropped.
    Prevented,
    /// Dispatch this buffered event.
    Replay(MultiTouchInput),
    /// The drained head block was removed; keep going.
    Evicted,
}

#[derive(Debug, Default)]
pub struct TouchBlockQueue {
    blocks: VecDeque<TouchBlockState>,
    /// Timeouts minus content responses seen so far.
    content_response_balance: i32,
}

impl TouchBlockQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Appends a block for a new touch gesture, first dropping head blocks
    /// that are resolved and drained.
    pub fn start_new_block(
        &mut self,
        chain: Arc<OverscrollHandoffChain>,
        touch_action_enabled: bool,
        copy_allowed_from_current: bool,
    ) {
        let mut block = TouchBlockState::new(chain, touch_action_enabled);
        if touch_action_enabled && copy_allowed_from_current {
            if let Some(current) = self.blocks.front() {
                block.copy_allowed_touch_behaviors_from(current);
            }
        }
        while let Some(head) = self.blocks.front() {
            if head.is_ready_for_handling() && !head.has_events() {
                self.blocks.pop_front();
            } else {
                break;
            }
        }
        self.blocks.push_back(block);
    }

    pub fn current(&self) -> Option<&TouchBlockState> {
        self.blocks.front()
    }

    pub fn current_mut(&mut self) -> Option<&mut TouchBlockState> {
        self.blocks.front_mut()
    }

    pub fn last(&self) -> Option<&TouchBlockState> {
        self.blocks.back()
    }

    pub fn last_mut(&mut self) -> Option<&mut TouchBlockState> {
        self.blocks.back_mut()
    }

    /// True when the newest block is also the one being handled.
    pub fn last_is_current(&self) -> bool {
        self.blocks.len() == 1
    }

    pub fn has_ready_block(&self) -> bool {
        self.current().is_some_and(TouchBlockState::is_ready_for_handling)
    }

    /// Applies a content-response timeout. Returns true when a block changed
    /// and the queue should be drained.
    pub fn content_response_timeout(&mut self) -> bool {
        self.content_response_balance += 1;
        if self.content_response_balance <= 0 {
            // Content already answered for this block.
            return false;
        }
        let found = self
            .blocks
            .iter_mut()
            .any(TouchBlockState::timeout_content_response);
        if !found {
            log::warn!("content response timeout with no block waiting for one");
        }
        found
    }

    /// Expires the newest block at once, for content that cannot prevent it.
    /// Counts as a fired timer so content's eventual answer still balances.
    pub fn expire_last_block(&mut self) {
        self.content_response_balance += 1;
        if let Some(block) = self.blocks.back_mut() {
            block.timeout_content_response();
        }
    }

    /// Applies content's answer. Returns true when a block changed.
    pub fn content_received(&mut self, prevent_default: bool) -> bool {
        self.content_response_balance -= 1;
        if self.content_response_balance >= 0 {
            // The block already timed out.
            return false;
        }
        let found = self
            .blocks
            .iter_mut()
            .any(|block| block.set_content_response(prevent_default));
        if !found {
            log::warn!("content response with no block waiting for one");
        }
        found
    }

    pub fn set_allowed_touch_behavior(&mut self, behaviors: &[AllowedTouchBehavior]) -> bool {
        let found = self
            .blocks
            .iter_mut()
            .any(|block| block.set_allowed_touch_behaviors(behaviors));
        if !found {
            log::warn!("allowed touch behaviors with no block waiting for them");
        }
        found
    }

    pub fn next_step(&mut self) -> QueueStep {
        let Some(head) = self.blocks.front_mut() else {
            return QueueStep::Blocked;
        };
        if !head.is_ready_for_handling() {
            return QueueStep::Blocked;
        }
        if head.is_default_prevented() {
            head.drop_events();
            if !head.prevent_reported {
                head.prevent_reported = true;
                return QueueStep::Prevented;
            }
        } else if let Some(event) = head.remove_first_event() {
            return QueueStep::Replay(event);
        }
        if self.blocks.len() == 1 {
            return QueueStep::Blocked;
        }
        self.blocks.pop_front();
        QueueStep::Evicted
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
        self.content_response_balance = 0;
    }
}

#[cfg(test)]
#[path = "tests/touch_block_tests.rs"]
mod tests;
