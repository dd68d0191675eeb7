use crate::behaviours::behaviour::{Behaviour, Forces};
use crate::{Agent, Vec2f};

use rand::RngCore;

const DESIRED_SPEED: f64 = 2.0;
const MAX_FORCE: f64 = 0.03;
const SEPARATION_DISTANCE: f64 = 25.0;
const FLOCK_DISTANCE: f64 = 50.0;

/// Relative strength of the three classic flocking rules.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlockWeights {
    pub separation: f64,
    pub alignment: f64,
    pub cohesion: f64,
}

impl FlockWeights {
    pub fn new(separation: f64, alignment: f64, cohesion: f64) -> Self {
        Self {
            separation,
            alignment,
            cohesion,
        }
    }

    pub fn standard() -> Self {
        Self::new(1.5, 1.0, 1.0)
    }
}

impl Default for FlockWeights {
    fn default() -> Self {
        Self::standard()
    }
}

/// Computes the steering force that turns `velocity` towards `direction` at
/// the desired cruising speed, limited to `MAX_FORCE`. Zero if `direction`
/// has no length.
fn steer(direction: Vec2f, velocity: &Vec2f) -> Vec2f {
    let magnitude = direction.norm();
    if magnitude <= 0f64 {
        return Vec2f::zeros();
    }
    let steering = direction * (DESIRED_SPEED / magnitude) - velocity;
    let force = steering.norm();
    if force > MAX_FORCE {
        steering * (MAX_FORCE / force)
    } else {
        steering
    }
}

/// Separation, alignment and cohesion over the neighbours handed in by the
/// spatial index.
#[derive(Clone, Debug, Default)]
pub struct FlockBehaviour {
    weights: FlockWeights,
}

impl FlockBehaviour {
    pub fn new(weights: FlockWeights) -> Self {
        Self { weights }
    }

    fn separation(&self, agent: &Agent, neighbours: &[Agent]) -> Vec2f {
        let mut away = Vec2f::zeros();
        let mut count = 0usize;
        for neighbour in neighbours {
            let offset = agent.position - neighbour.position;
            let distance = offset.norm();
            if distance > 0f64 && distance < SEPARATION_DISTANCE {
                away += offset / distance;
                count += 1;
            }
        }
        if count == 0 {
            return Vec2f::zeros();
        }
        steer(away / count as f64, &agent.velocity) * self.weights.separation
    }

    fn alignment(&self, agent: &Agent, neighbours: &[Agent]) -> Vec2f {
        let mut heading = Vec2f::zeros();
        let mut count = 0usize;
        for neighbour in neighbours {
            let distance = (agent.position - neighbour.position).norm();
            if distance > 0f64 && distance < FLOCK_DISTANCE {
                heading += neighbour.velocity;
                count += 1;
            }
        }
        if count == 0 {
            return Vec2f::zeros();
        }
        steer(heading / count as f64, &agent.velocity) * self.weights.alignment
    }

    fn cohesion(&self, agent: &Agent, neighbours: &[Agent]) -> Vec2f {
        let mut centre = Vec2f::zeros();
        let mut count = 0usize;
        for neighbour in neighbours {
            let distance = (agent.position - neighbour.position).norm();
            if distance > 0f64 && distance < FLOCK_DISTANCE {
                centre += neighbour.position;
                count += 1;
            }
        }
        if count == 0 {
            return Vec2f::zeros();
        }
        steer(centre / count as f64 - agent.position, &agent.velocity) * self.weights.cohesion
    }
}

impl Behaviour for FlockBehaviour {
    fn steering(&self, agent: &Agent, neighbours: &[Agent], _rng: &mut dyn RngCore) -> Forces {
        if neighbours.is_empty() {
            return Forces::default();
        }
        Forces::new(
            self.separation(agent, neighbours),
            self.alignment(agent, neighbours),
            self.cohesion(agent, neighbours),
        )
    }
}
