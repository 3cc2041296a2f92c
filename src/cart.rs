//! The cart-centering task: push a cart on a frictionless track so that it comes to rest at the
//! origin as quickly as possible.

use crate::ga::Environment;
use rand::Rng;

/// Range of the initial position and velocity.
const INITIAL_RANGE: f64 = 0.75;
/// Position and velocity magnitudes below which the cart counts as centered.
const TOLERANCE: f64 = 0.05;
const MAX_STEPS: usize = 500;
const DT: f64 = 0.02;
const MASS: f64 = 1.0;
const FORCE: f64 = 1.0;

/// A cart on a one dimensional track.
///
/// Observations are `(position, velocity)`. Every step costs a reward of -1, so the best
/// controllers center the cart in the fewest steps.
#[derive(Clone, Debug, Default)]
pub struct CartCentering {
    x: f64,
    v: f64,
    steps: usize,
}

impl CartCentering {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place the cart at a given state, e.g. for a scripted episode.
    pub fn with_state(x: f64, v: f64) -> Self {
        CartCentering { x, v, steps: 0 }
    }

    pub fn position(&self) -> f64 {
        self.x
    }

    pub fn velocity(&self) -> f64 {
        self.v
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    fn render(&self) -> String {
        const WIDTH: usize = 41;
        let half = (WIDTH / 2) as f64;
        let col = ((self.x / (2.0 * INITIAL_RANGE)) * half + half)
            .round()
            .max(0.0)
            .min((WIDTH - 1) as f64) as usize;
        let mut track: Vec<char> = std::iter::repeat('-').take(WIDTH).collect();
        track[WIDTH / 2] = '|';
        track[col] = '#';
        track.into_iter().collect()
    }
}

impl Environment for CartCentering {
    fn reset<R: Rng>(&mut self, rng: &mut R) {
        self.x = rng.gen_range(-INITIAL_RANGE..=INITIAL_RANGE);
        self.v = rng.gen_range(-INITIAL_RANGE..=INITIAL_RANGE);
        self.steps = 0;
    }

    fn is_terminal(&self) -> bool {
        let centered = self.x.abs() < TOLERANCE && self.v.abs() < TOLERANCE;
        centered || self.steps >= MAX_STEPS
    }

    /// The action is truncated toward zero and clamped to `[-1, 1]` before being applied as a
    /// force.
    fn update(&mut self, action: f64, animate: bool) -> f64 {
        let force = action.trunc().max(-1.0).min(1.0) * FORCE;
        self.v += force / MASS * DT;
        self.x += self.v * DT;
        self.steps += 1;
        if animate {
            log::trace!("{} x={:+.3} v={:+.3}", self.render(), self.x, self.v);
        }
        -1.0
    }

    fn observation(&self) -> (f64, f64) {
        (self.x, self.v)
    }
}
