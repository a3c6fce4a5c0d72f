//! Short history of per-move velocities for release-velocity estimation.

use std::collections::VecDeque;
use std::time::Duration;

use web_time::Instant;

#[derive(Clone, Copy, Debug)]
struct VelocitySample {
    time: Instant,
    velocity: f32,
}

/// Bounded FIFO of velocity samples.
///
/// Every touch move pushes the instantaneous velocity. On release the
/// samples younger than the relevance window are averaged, which smooths
/// out the jitter of the last few moves without reacting to a finger that
/// paused before lifting.
#[derive(Clone, Debug)]
pub struct VelocityQueue {
    samples: VecDeque<VelocitySample>,
    capacity: usize,
}

impl VelocityQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Appends a sample, dropping the oldest when full.
    pub fn push(&mut self, time: Instant, velocity: f32) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(VelocitySample { time, velocity });
    }

    /// Mean of the samples recorded less than `relevance` before `now`.
    /// Returns 0.0 when none qualify.
    pub fn average_since(&self, now: Instant, relevance: Duration) -> f32 {
        let mut count = 0;
        let mut total = 0.0;
        for sample in &self.samples {
            if now.saturating_duration_since(sample.time) < relevance {
                total += sample.velocity;
                count += 1;
            }
        }
        if count == 0 {
            0.0
        } else {
            total / count as f32
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
