//! Outgoing repaint and scroll-notification policy.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use panzoom_geometry::Point;
use web_time::Instant;

use crate::config::ApzConfig;
use crate::viewport::FrameMetrics;

/// Keeps at most one repaint request in flight.
///
/// While a request is outstanding, newer requests replace each other in a
/// single queued slot. Completing the outstanding request records how long
/// the round trip took and releases the queued one, if any. A request that
/// has been outstanding for longer than `max_wait` no longer holds back new
/// ones.
#[derive(Debug)]
pub struct PaintThrottler {
    outstanding: bool,
    queued: Option<FrameMetrics>,
    start_time: Instant,
    durations: VecDeque<Duration>,
    max_durations: usize,
    max_wait: Duration,
}

impl PaintThrottler {
    pub fn new(now: Instant, max_wait: Duration) -> Self {
        Self {
            outstanding: false,
            queued: None,
            start_time: now,
            durations: VecDeque::new(),
            max_durations: 3,
            max_wait,
        }
    }

    /// Offers a request. Returns it back when it should be dispatched now;
    /// otherwise it is queued behind the outstanding one.
    pub fn post(&mut self, request: FrameMetrics, now: Instant) -> Option<FrameMetrics> {
        if self.outstanding {
            if self.time_since_last_request(now) < self.max_wait {
                self.queued = Some(request);
                return None;
            }
            self.queued = None;
        }
        self.start_time = now;
        self.outstanding = true;
        Some(request)
    }

    /// Marks the outstanding request as painted. Returns the queued request
    /// when one is waiting and should be dispatched now.
    pub fn task_complete(&mut self, now: Instant) -> Option<FrameMetrics> {
        if !self.outstanding {
            return None;
        }
        if self.max_durations > 0 {
            if self.durations.len() >= self.max_durations {
                self.durations.pop_front();
            }
            self.durations
                .push_back(now.saturating_duration_since(self.start_time));
        }
        match self.queued.take() {
            Some(request) => {
                self.start_time = now;
                Some(request)
            }
            None => {
                self.outstanding = false;
                None
            }
        }
    }

    pub fn average_duration(&self) -> Duration {
        if self.durations.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.durations.iter().sum();
        total / self.durations.len() as u32
    }

    pub fn time_since_last_request(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.start_time)
    }

    pub fn clear_history(&mut self) {
        self.durations.clear();
    }

    pub fn set_max_durations(&mut self, max_durations: usize) {
        if max_durations != self.max_durations {
            self.max_durations = max_durations;
            self.durations.clear();
        }
    }

    pub fn is_outstanding(&self) -> bool {
        self.outstanding
    }

    pub fn has_queued(&self) -> bool {
        self.queued.is_some()
    }
}

/// Observed by a posted task to learn whether it was cancelled.
#[derive(Clone, Debug)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Owner side of a posted delayed task. Cancelling, or dropping the handle,
/// turns the task into a no-op when it eventually runs.
#[derive(Debug)]
pub struct DelayedTaskHandle {
    cancelled: Option<Arc<AtomicBool>>,
}

impl DelayedTaskHandle {
    pub fn new() -> (Self, CancelToken) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Self {
                cancelled: Some(Arc::clone(&flag)),
            },
            CancelToken(flag),
        )
    }

    pub fn cancel(mut self) {
        if let Some(flag) = self.cancelled.take() {
            flag.store(true, Ordering::Release);
        }
    }
}

impl Drop for DelayedTaskHandle {
    fn drop(&mut self) {
        if let Some(flag) = self.cancelled.take() {
            flag.store(true, Ordering::Release);
        }
    }
}

/// What to do about the async scroll notification after a sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AsyncScrollDecision {
    /// Notify content now.
    FireNow,
    /// Arm the fallback timer.
    ArmTimeout,
}

/// Throttles scroll notifications sent to content while the offset changes
/// asynchronously.
#[derive(Debug)]
pub struct AsyncScrollThrottle {
    last_time: Instant,
    last_offset: Point,
    current_offset: Point,
    timeout: Option<DelayedTaskHandle>,
}

impl AsyncScrollThrottle {
    pub fn new(now: Instant) -> Self {
        Self {
            last_time: now,
            last_offset: Point::ZERO,
            current_offset: Point::ZERO,
            timeout: None,
        }
    }

    pub fn current_offset(&self) -> Point {
        self.current_offset
    }

    pub fn set_current_offset(&mut self, offset: Point) {
        self.current_offset = offset;
    }

    /// Called once per sample. Any pending timer is cancelled; the caller
    /// either notifies immediately or arms a fresh timer.
    pub fn on_sample(&mut self, now: Instant, config: &ApzConfig) -> AsyncScrollDecision {
        if let Some(timeout) = self.timeout.take() {
            timeout.cancel();
        }
        let elapsed = now.saturating_duration_since(self.last_time);
        if elapsed > Duration::from_millis(config.async_scroll_throttle_ms)
            && self.current_offset != self.last_offset
        {
            self.last_time = now;
            self.last_offset = self.current_offset;
            AsyncScrollDecision::FireNow
        } else {
            AsyncScrollDecision::ArmTimeout
        }
    }

    pub fn set_timeout(&mut self, handle: DelayedTaskHandle) {
        if let Some(previous) = self.timeout.replace(handle) {
            previous.cancel();
        }
    }

    /// The fallback timer fired. Returns whether content still needs to hear
    /// about an offset change.
    pub fn timeout_fired(&mut self) -> bool {
        self.timeout = None;
        self.current_offset != self.last_offset
    }

    pub fn cancel_timeout(&mut self) {
        if let Some(timeout) = self.timeout.take() {
            timeout.cancel();
        }
    }
}

#[cfg(test)]
#[path = "tests/viewport_sync_tests.rs"]
mod tests;
