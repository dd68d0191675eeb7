use crate::{Agent, AgentId, Point};

/// Position and identity of one agent as seen by an index during a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IndexedPoint {
    pub agent_id: AgentId,
    pub position: Point,
}

impl From<&Agent> for IndexedPoint {
    fn from(agent: &Agent) -> Self {
        Self {
            agent_id: agent.agent_id,
            position: agent.position,
        }
    }
}

/// A per-tick neighbour index. The simulation clears it, inserts every agent,
/// calls `finish` and then issues read-only queries until the next tick.
pub trait SpatialIndex {
    /// Drop everything inserted so far. Configuration (bounds, cell size,
    /// capacity) is kept.
    fn clear(&mut self);

    /// Add one agent's position for the current tick.
    fn insert(&mut self, agent: &Agent);

    /// Called once all agents of a tick are inserted. Indexes that build
    /// lazily do their work here.
    fn finish(&mut self) {
        // Do nothing
    }

    /// Ids of every stored agent other than `agent` whose distance to
    /// `agent.position` is strictly below `radius`. Order is unspecified.
    fn neighbours_in_radius(&self, agent: &Agent, radius: f64) -> Vec<AgentId>;

    /// Label used when reporting
    fn name(&self) -> &'static str;

    /// Clear, insert all of `agents` and finish.
    fn rebuild(&mut self, agents: &[Agent]) {
        self.clear();
        for agent in agents {
            self.insert(agent);
        }
        self.finish();
    }
}

impl<T: SpatialIndex + ?Sized> SpatialIndex for Box<T> {
    fn clear(&mut self) {
        (**self).clear()
    }

    fn insert(&mut self, agent: &Agent) {
        (**self).insert(agent)
    }

    fn finish(&mut self) {
        (**self).finish()
    }

    fn neighbours_in_radius(&self, agent: &Agent, radius: f64) -> Vec<AgentId> {
        (**self).neighbours_in_radius(agent, radius)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
