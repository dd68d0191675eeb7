use crate::behaviours::behaviour::{Behaviour, Forces};
use crate::behaviours::flock::{FlockBehaviour, FlockWeights};
use crate::{Agent, Vec2f};

use rand::{Rng, RngCore};

/// Flocks loosely and drifts: adds a small push along the current heading,
/// turned by a random angle, on top of the alignment force.
#[derive(Clone, Debug)]
pub struct WanderBehaviour {
    flock: FlockBehaviour,
    jitter_strength: f64,
    /// Largest random turn in radians, either side of the heading
    max_turn: f64,
}

impl WanderBehaviour {
    pub fn new(flock: FlockBehaviour, jitter_strength: f64, max_turn: f64) -> Self {
        Self {
            flock,
            jitter_strength,
            max_turn: max_turn.abs(),
        }
    }
}

impl Default for WanderBehaviour {
    fn default() -> Self {
        Self::new(
            FlockBehaviour::new(FlockWeights::new(1.2, 0.5, 0.6)),
            0.02,
            25f64.to_radians(),
        )
    }
}

impl Behaviour for WanderBehaviour {
    fn steering(&self, agent: &Agent, neighbours: &[Agent], rng: &mut dyn RngCore) -> Forces {
        let mut forces = self.flock.steering(agent, neighbours, rng);

        let heading = agent.velocity.y.atan2(agent.velocity.x);
        let turn = if self.max_turn > 0f64 {
            rng.gen_range(-self.max_turn..self.max_turn)
        } else {
            0f64
        };
        let angle = heading + turn;
        forces.alignment += Vec2f::new(angle.cos(), angle.sin()) * self.jitter_strength;
        forces
    }
}
