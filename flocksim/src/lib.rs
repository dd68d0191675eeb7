use std::collections::HashMap;
use std::time::{Duration, Instant};
pub extern crate nalgebra as na;
use na::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub mod behaviours;
pub mod config;
pub mod error;
pub mod spatial_index;

pub use crate::behaviours::{Behaviour, FlockBehaviour, Forces, NoBehaviour, WanderBehaviour};
pub use crate::config::{BenchConfig, SimulationConfig, WorldConfig};
pub use crate::error::ConfigError;
use crate::error::Result;
pub use crate::spatial_index::{IndexKind, SpatialIndex};

/// Agent  ID
pub type AgentId = usize;

/// Point
pub type Point = Vector2<f64>;

/// 2-vector
pub type Vec2f = Vector2<f64>;

/// Speed new agents start with
const INITIAL_SPEED: f64 = 2.0;

/// Selects the behaviour an agent steers with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoidType {
    Standard,
    Wanderer,
}

/// Data representing an individual agent
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Agent {
    /// Unique Agent ID
    pub agent_id: AgentId,
    /// Position of a point
    pub position: Point,
    /// Velocity of agent
    pub velocity: Vec2f,
    /// Behaviour group
    pub boid_type: BoidType,
}

impl Agent {
    /// A standard agent at rest
    pub fn new(agent_id: AgentId, position: Point) -> Self {
        Self {
            agent_id,
            position,
            velocity: Vec2f::zeros(),
            boid_type: BoidType::Standard,
        }
    }
}

/// A representation of a simulation session
pub struct Simulation<T: SpatialIndex, R: Rng = StdRng> {
    /// List of all active agents. An agent's id is its position in this list.
    agents: Vec<Agent>,
    /// Spatial Index. Rebuilt from scratch every step.
    spatial_index: T,
    /// Steering strategy per agent type
    behaviours: HashMap<BoidType, Box<dyn Behaviour>>,
    /// Placement and jitter randomness
    rng: R,
    world: WorldConfig,
    neighbour_radius: f64,
    wander_share: f64,
    max_speed: f64,
    last_tick_duration: Duration,
}

impl<T: SpatialIndex> Simulation<T, StdRng> {
    /// Builds a simulation from `config`, seeded from `config.seed` (or from
    /// entropy when unset), and populates it with `config.boid_count` agents.
    pub fn from_config(config: &SimulationConfig, spatial_index: T) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut simulation = Self::new(config.world, spatial_index, rng)?;
        simulation.neighbour_radius = config.neighbour_radius;
        simulation.wander_share = config.wander_share;
        simulation.max_speed = config.max_speed;
        simulation.set_boid_count(config.boid_count);
        Ok(simulation)
    }
}

impl<T: SpatialIndex, R: Rng> Simulation<T, R> {
    /// Create a new, empty simulation environment
    pub fn new(world: WorldConfig, spatial_index: T, rng: R) -> Result<Self> {
        world.validate()?;
        let defaults = SimulationConfig::default();
        let mut behaviours: HashMap<BoidType, Box<dyn Behaviour>> = HashMap::new();
        behaviours.insert(BoidType::Standard, Box::new(FlockBehaviour::default()));
        behaviours.insert(BoidType::Wanderer, Box::new(WanderBehaviour::default()));

        tracing::debug!(
            width = world.width,
            height = world.height,
            index = spatial_index.name(),
            "simulation created"
        );
        Ok(Self {
            agents: vec![],
            spatial_index,
            behaviours,
            rng,
            world,
            neighbour_radius: defaults.neighbour_radius,
            wander_share: defaults.wander_share,
            max_speed: defaults.max_speed,
            last_tick_duration: Duration::ZERO,
        })
    }

    /// Replace the strategy used by every agent of `boid_type`
    pub fn register_behaviour(&mut self, boid_type: BoidType, behaviour: Box<dyn Behaviour>) {
        self.behaviours.insert(boid_type, behaviour);
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn boid_count(&self) -> usize {
        self.agents.len()
    }

    pub fn count_by_type(&self, boid_type: BoidType) -> usize {
        self.agents
            .iter()
            .filter(|agent| agent.boid_type == boid_type)
            .count()
    }

    pub fn index_name(&self) -> &'static str {
        self.spatial_index.name()
    }

    pub fn neighbour_radius(&self) -> f64 {
        self.neighbour_radius
    }

    pub fn set_neighbour_radius(&mut self, radius: f64) {
        self.neighbour_radius = radius;
    }

    pub fn wander_share(&self) -> f64 {
        self.wander_share
    }

    /// Sets the wanderer fraction, clamped to `[0, 1]`, and reassigns the
    /// types of the current population accordingly.
    pub fn set_wander_share(&mut self, share: f64) {
        self.wander_share = if share.is_nan() { 0f64 } else { share.clamp(0f64, 1f64) };
        self.set_boid_count(self.agents.len());
    }

    /// Wall time spent in the most recent `step`
    pub fn last_tick_duration(&self) -> Duration {
        self.last_tick_duration
    }

    /// Add one agent, choosing its type so the wanderer share is kept.
    pub fn add_boid(&mut self) -> AgentId {
        let future_size = self.agents.len() + 1;
        let desired_wanderers = (future_size as f64 * self.wander_share).round() as usize;
        if self.count_by_type(BoidType::Wanderer) < desired_wanderers {
            self.add_boid_of(BoidType::Wanderer)
        } else {
            self.add_boid_of(BoidType::Standard)
        }
    }

    /// Add one agent of `boid_type` at a random position.
    pub fn add_boid_of(&mut self, boid_type: BoidType) -> AgentId {
        let agent_id = self.agents.len();
        let position = self.random_position();
        let velocity = self.random_velocity();
        self.agents.push(Agent {
            agent_id,
            position,
            velocity,
            boid_type,
        });
        agent_id
    }

    /// Resize the population to `count`. Surviving agents keep their
    /// positions, new ones are placed at random, and the first
    /// `round(count * wander_share)` agents become wanderers.
    pub fn set_boid_count(&mut self, count: usize) {
        let wander_target = (count as f64 * self.wander_share).round() as usize;
        self.agents.truncate(count);
        while self.agents.len() < count {
            self.add_boid_of(BoidType::Standard);
        }
        for (i, agent) in self.agents.iter_mut().enumerate() {
            agent.boid_type = if i < wander_target {
                BoidType::Wanderer
            } else {
                BoidType::Standard
            };
        }
        tracing::debug!(count, wanderers = wander_target, "population resized");
    }

    /// Advance the simulation by one tick.
    ///
    /// The index is rebuilt from the current positions, then every agent
    /// queries its neighbours and steers. Velocity changes apply straight
    /// away, so later agents may see the new velocities of earlier ones, but
    /// positions only move once everyone has steered.
    pub fn step(&mut self) {
        let start = Instant::now();

        self.spatial_index.rebuild(&self.agents);

        let mut neighbours = Vec::<Agent>::new();
        for i in 0..self.agents.len() {
            let agent = self.agents[i];
            let neighbour_ids = self
                .spatial_index
                .neighbours_in_radius(&agent, self.neighbour_radius);
            neighbours.clear();
            neighbours.extend(neighbour_ids.iter().map(|id| self.agents[*id]));

            let delta = match self.behaviours.get(&agent.boid_type) {
                Some(behaviour) => behaviour
                    .steering(&agent, &neighbours, &mut self.rng)
                    .total(),
                None => Vec2f::zeros(),
            };

            let mut velocity = agent.velocity + delta;
            let speed = velocity.norm();
            if speed > self.max_speed {
                velocity *= self.max_speed / speed;
            }
            self.agents[i].velocity = velocity;
        }

        let (width, height) = (self.world.width, self.world.height);
        for agent in self.agents.iter_mut() {
            let moved = agent.position + agent.velocity;
            agent.position = Point::new(wrap(moved.x, width), wrap(moved.y, height));
        }

        self.last_tick_duration = start.elapsed();
        tracing::trace!(
            agents = self.agents.len(),
            index = self.spatial_index.name(),
            elapsed_us = self.last_tick_duration.as_micros() as u64,
            "tick"
        );
    }

    fn random_position(&mut self) -> Point {
        Point::new(
            self.rng.gen_range(0f64..self.world.width),
            self.rng.gen_range(0f64..self.world.height),
        )
    }

    fn random_velocity(&mut self) -> Vec2f {
        let heading = self.rng.gen_range(0f64..std::f64::consts::TAU);
        Vec2f::new(heading.cos(), heading.sin()) * INITIAL_SPEED
    }
}

/// Maps `value` into `[0, extent)`, wrapping around the edges.
fn wrap(value: f64, extent: f64) -> f64 {
    let wrapped = value.rem_euclid(extent);
    // rem_euclid can round up to `extent` for tiny negative inputs
    if wrapped >= extent {
        0f64
    } else {
        wrapped
    }
}
