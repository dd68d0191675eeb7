use crate::spatial_index::geometry::{radius_squared, within};
use crate::spatial_index::spatial_index::{IndexedPoint, SpatialIndex};
use crate::{Agent, AgentId};

/// Flat list of every inserted agent, queried by full scan. Slow but
/// obviously correct, which makes it the reference the other indexes are
/// tested against.
#[derive(Debug, Default)]
pub struct NaiveIndex {
    points: Vec<IndexedPoint>,
}

impl NaiveIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl SpatialIndex for NaiveIndex {
    fn clear(&mut self) {
        self.points.clear();
    }

    fn insert(&mut self, agent: &Agent) {
        self.points.push(agent.into());
    }

    fn neighbours_in_radius(&self, agent: &Agent, radius: f64) -> Vec<AgentId> {
        let Some(radius_sq) = radius_squared(radius) else {
            return vec![];
        };
        self.points
            .iter()
            .filter(|p| p.agent_id != agent.agent_id && within(&p.position, &agent.position, radius_sq))
            .map(|p| p.agent_id)
            .collect()
    }

    fn name(&self) -> &'static str {
        "Naive O(n²)"
    }
}
