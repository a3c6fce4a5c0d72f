//! Motion primitives for panzoom animations
//!
//! Provides easing curves, the snap-back spring, a fixed-step mass-spring-damper
//! axis model and exponential fling friction. Everything here is a pure
//! function of its inputs; the controller owns the clock.

mod decay;
mod easing;
mod spring;

pub use decay::*;
pub use easing::*;
pub use spring::*;
