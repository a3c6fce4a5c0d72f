//! Spring physics used by overscroll snap-back and smooth scrolling.

use std::time::Duration;

/// Damped spring parameters for the overscroll snap-back.
///
/// The spring pulls the overscroll displacement back towards zero. Unlike a
/// closed-form spring, it is stepped explicitly once per frame so that the
/// caller can clamp the result against the zero crossing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringSpec {
    /// Force per unit of displacement.
    pub stiffness: f32,
    /// Force per unit of velocity.
    pub friction: f32,
    pub mass: f32,
}

impl SpringSpec {
    pub fn new(stiffness: f32, friction: f32, mass: f32) -> Self {
        Self {
            stiffness,
            friction,
            mass,
        }
    }

    /// One explicit Euler step. Returns the new velocity; position advances by
    /// `new_velocity * dt_ms`.
    pub fn step_velocity(&self, displacement: f32, velocity: f32, dt_ms: f32) -> f32 {
        let force = -self.stiffness * displacement - self.friction * velocity;
        let acceleration = if self.mass > 0.0 { force / self.mass } else { 0.0 };
        velocity + acceleration * dt_ms
    }
}

impl Default for SpringSpec {
    fn default() -> Self {
        Self::new(0.6, 0.1, 1000.0)
    }
}

/// Fixed integration step of [`MassSpringDamper`], in seconds.
pub const PHYSICS_TIMESTEP: f64 = 1.0 / 120.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct State {
    position: f64,
    velocity: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Derivative {
    dp: f64,
    dv: f64,
}

/// One-dimensional critically tunable spring integrated with RK4 at a fixed
/// rate of 120 Hz.
///
/// Frames are decoupled from the integration rate: `simulate` accumulates
/// fractional steps, and `position` interpolates between the last two
/// integrated states.
#[derive(Debug, Clone)]
pub struct MassSpringDamper {
    prev: State,
    next: State,
    progress: f64,
    destination: f64,
    spring_constant: f64,
    spring_constant_sqrt_x_two: f64,
    damping_ratio: f64,
}

impl MassSpringDamper {
    pub fn new(
        position: f64,
        destination: f64,
        velocity: f64,
        spring_constant: f64,
        damping_ratio: f64,
    ) -> Self {
        let state = State { position, velocity };
        Self {
            prev: state,
            next: state,
            progress: 1.0,
            destination,
            spring_constant,
            spring_constant_sqrt_x_two: spring_constant.sqrt() * 2.0,
            damping_ratio,
        }
    }

    pub fn simulate(&mut self, delta: Duration) {
        self.progress += delta.as_secs_f64() / PHYSICS_TIMESTEP;
        while self.progress > 1.0 {
            self.progress -= 1.0;
            self.integrate(PHYSICS_TIMESTEP);
        }
    }

    pub fn position(&self) -> f64 {
        let t = self.progress.clamp(0.0, 1.0);
        self.prev.position + (self.next.position - self.prev.position) * t
    }

    pub fn velocity(&self) -> f64 {
        let t = self.progress.clamp(0.0, 1.0);
        self.prev.velocity + (self.next.velocity - self.prev.velocity) * t
    }

    pub fn set_position(&mut self, position: f64) {
        self.prev.position = position;
        self.next.position = position;
    }

    pub fn set_velocity(&mut self, velocity: f64) {
        self.prev.velocity = velocity;
        self.next.velocity = velocity;
    }

    pub fn destination(&self) -> f64 {
        self.destination
    }

    pub fn set_destination(&mut self, destination: f64) {
        self.destination = destination;
    }

    /// Finished once both the remaining distance and the velocity are below
    /// what a single frame at 60 Hz could render.
    pub fn is_finished(&self, smallest_visible_increment: f64) -> bool {
        let final_distance = (self.destination - self.position()).abs();
        let final_velocity = self.velocity().abs();
        final_distance <= smallest_visible_increment
            && final_velocity <= smallest_visible_increment * 60.0
    }

    fn integrate(&mut self, dt: f64) {
        self.prev = self.next;
        let a = self.evaluate(self.next, 0.0, Derivative::default());
        let b = self.evaluate(self.next, dt * 0.5, a);
        let c = self.evaluate(self.next, dt * 0.5, b);
        let d = self.evaluate(self.next, dt, c);

        let dpdt = (a.dp + 2.0 * (b.dp + c.dp) + d.dp) / 6.0;
        let dvdt = (a.dv + 2.0 * (b.dv + c.dv) + d.dv) / 6.0;
        self.next.position += dpdt * dt;
        self.next.velocity += dvdt * dt;
    }

    fn evaluate(&self, initial: State, dt: f64, derivative: Derivative) -> Derivative {
        let state = State {
            position: initial.position + derivative.dp * dt,
            velocity: initial.velocity + derivative.dv * dt,
        };
        Derivative {
            dp: state.velocity,
            dv: self.acceleration(state),
        }
    }

    fn acceleration(&self, state: State) -> f64 {
        // Simple spring, no mass term.
        (self.spring_constant * (self.destination - state.position))
            - (self.spring_constant_sqrt_x_two * self.damping_ratio * state.velocity)
    }
}

#[cfg(test)]
#[path = "tests/spring_tests.rs"]
mod tests;
