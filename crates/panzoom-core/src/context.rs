//! Process-wide state shared by every controller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use web_time::Instant;

use crate::config::ApzConfig;

/// Owns what would otherwise be global: configuration, the controller id
/// counter and the frame-time override used to make sampling deterministic.
///
/// Created once by whoever owns the controller tree and shared through an
/// `Arc`. Dropping the last reference tears it down; there is nothing else
/// to release.
pub struct ApzContext {
    config: ApzConfig,
    next_id: AtomicU64,
    frame_time: Mutex<Option<Instant>>,
}

impl ApzContext {
    pub fn new(config: ApzConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            next_id: AtomicU64::new(1),
            frame_time: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &ApzConfig {
        &self.config
    }

    /// Allocates a new controller identifier. Identifiers are never reused.
    pub fn next_controller_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Current time: the override if one is set, otherwise the wall clock.
    pub fn now(&self) -> Instant {
        match *self.frame_time.lock() {
            Some(instant) => instant,
            None => Instant::now(),
        }
    }

    pub fn set_frame_time(&self, instant: Instant) {
        *self.frame_time.lock() = Some(instant);
    }

    pub fn clear_frame_time(&self) {
        *self.frame_time.lock() = None;
    }
}

impl Default for ApzContext {
    fn default() -> Self {
        Self {
            config: ApzConfig::default(),
            next_id: AtomicU64::new(1),
            frame_time: Mutex::new(None),
        }
    }
}
