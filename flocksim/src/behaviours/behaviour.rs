use crate::{Agent, Vec2f};
use rand::RngCore;

/// Steering contributions computed for one agent in one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Forces {
    pub separation: Vec2f,
    pub alignment: Vec2f,
    pub cohesion: Vec2f,
}

impl Default for Forces {
    fn default() -> Self {
        Self {
            separation: Vec2f::zeros(),
            alignment: Vec2f::zeros(),
            cohesion: Vec2f::zeros(),
        }
    }
}

impl Forces {
    pub fn new(separation: Vec2f, alignment: Vec2f, cohesion: Vec2f) -> Self {
        Self {
            separation,
            alignment,
            cohesion,
        }
    }

    /// Velocity delta to apply this tick
    pub fn total(&self) -> Vec2f {
        self.separation + self.alignment + self.cohesion
    }
}

/// Turns the neighbour list of an agent into a velocity change. Any
/// randomness must be drawn from `rng` so runs can be reproduced.
pub trait Behaviour {
    fn steering(&self, agent: &Agent, neighbours: &[Agent], rng: &mut dyn RngCore) -> Forces;
}
