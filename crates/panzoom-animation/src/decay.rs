/// Per-millisecond exponential friction used by flings.
///
/// Each frame the velocity is multiplied by `(1 - friction)^dt_ms`. Once the
/// magnitude has dropped to `stopped_threshold` the velocity snaps to zero
/// and the fling is considered over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrictionDecay {
    pub friction: f32,
    pub stopped_threshold: f32,
}

impl FrictionDecay {
    pub fn new(friction: f32, stopped_threshold: f32) -> Self {
        Self {
            friction,
            stopped_threshold,
        }
    }

    /// Returns the decayed velocity, or `None` when the fling should stop.
    pub fn apply(&self, velocity: f32, dt_ms: f32) -> Option<f32> {
        if velocity.abs() <= self.stopped_threshold {
            return None;
        }
        Some(velocity * (1.0 - self.friction).powf(dt_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slow_velocity_stops() {
        let decay = FrictionDecay::new(0.002, 0.01);
        assert_eq!(decay.apply(0.005, 16.0), None);
        assert_eq!(decay.apply(-0.01, 16.0), None);
    }

    #[test]
    fn velocity_decays_exponentially() {
        let decay = FrictionDecay::new(0.002, 0.01);
        let v = decay.apply(1.0, 100.0).unwrap();
        assert!((v - 0.998f32.powf(100.0)).abs() < 1e-5, "got {}", v);

        // Two half steps equal one whole step.
        let half = decay.apply(decay.apply(1.0, 50.0).unwrap(), 50.0).unwrap();
        assert!((half - v).abs() < 1e-5);
    }
}
