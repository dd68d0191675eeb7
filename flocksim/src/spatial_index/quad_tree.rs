use crate::error::{check_dimension, ConfigError, Result};
use crate::spatial_index::geometry::{radius_squared, within, Aabb};
use crate::spatial_index::spatial_index::{IndexedPoint, SpatialIndex};
use crate::{Agent, AgentId};

#[cfg(test)]
use std::cell::Cell;

type NodeId = u32;

#[derive(Debug)]
struct QuadNode {
    bounds: Aabb,
    depth: u32,
    /// Agents held directly. Always empty once the node has children.
    points: Vec<IndexedPoint>,
    /// Children live at `first_child..first_child + 4`, ordered like
    /// [`Aabb::quadrants`]
    first_child: Option<NodeId>,
}

impl QuadNode {
    fn leaf(bounds: Aabb, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            points: vec![],
            first_child: None,
        }
    }
}

/// Region quadtree over a fixed world rectangle, rebuilt every tick.
///
/// Leaves hold up to `capacity` agents; the next insert splits the leaf into
/// four equal quadrants and pushes its agents down. A leaf stops splitting
/// at [`QuadTreeIndex::MAX_DEPTH`] or when all of its agents sit on the same
/// coordinate, and keeps growing past capacity instead.
#[derive(Debug)]
pub struct QuadTreeIndex {
    nodes: Vec<QuadNode>,
    bounds: Aabb,
    capacity: usize,
    /// Agents outside `bounds`, scanned on every query
    outliers: Vec<IndexedPoint>,
    len: usize,
    overflow_reported: bool,
    /// Nodes entered by searches, pruned or not
    #[cfg(test)]
    visits: Cell<usize>,
}

impl QuadTreeIndex {
    pub const DEFAULT_CAPACITY: usize = 4;
    pub const MAX_DEPTH: u32 = 16;

    pub fn new(width: f64, height: f64) -> Result<Self> {
        Self::with_capacity(width, height, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(width: f64, height: f64, capacity: usize) -> Result<Self> {
        check_dimension("width", width)?;
        check_dimension("height", height)?;
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity(capacity));
        }
        tracing::debug!(width, height, capacity, "quadtree index created");

        let bounds = Aabb::from_size(width, height);
        let mut tree = Self {
            nodes: vec![],
            bounds,
            capacity,
            outliers: vec![],
            len: 0,
            overflow_reported: false,
            #[cfg(test)]
            visits: Cell::new(0),
        };
        tree.reset();
        Ok(tree)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of nodes, internal and leaf, including the root
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Deepest node level, the root being 0
    pub fn max_node_depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    fn reset(&mut self) {
        self.nodes.clear();
        self.nodes.push(QuadNode::leaf(self.bounds, 0));
        self.outliers.clear();
        self.len = 0;
        self.overflow_reported = false;
    }

    fn insert_from(&mut self, start: usize, point: IndexedPoint) {
        let mut node = start;
        loop {
            if let Some(first) = self.nodes[node].first_child {
                node = first as usize + self.nodes[node].bounds.quadrant_of(&point.position);
                continue;
            }

            let leaf = &self.nodes[node];
            if leaf.points.len() < self.capacity {
                self.nodes[node].points.push(point);
                return;
            }

            let inseparable = leaf
                .points
                .iter()
                .all(|p| p.position == point.position);
            if inseparable || leaf.depth >= Self::MAX_DEPTH {
                if !self.overflow_reported {
                    tracing::warn!(
                        depth = leaf.depth,
                        held = leaf.points.len() + 1,
                        "quadtree leaf kept past capacity"
                    );
                    self.overflow_reported = true;
                }
                self.nodes[node].points.push(point);
                return;
            }

            self.subdivide(node);
        }
    }

    /// Turns leaf `node` into an internal node and redistributes its agents.
    fn subdivide(&mut self, node: usize) {
        let first = self.nodes.len();
        let depth = self.nodes[node].depth + 1;
        for quadrant in self.nodes[node].bounds.quadrants() {
            self.nodes.push(QuadNode::leaf(quadrant, depth));
        }
        self.nodes[node].first_child = Some(first as NodeId);

        let held = std::mem::take(&mut self.nodes[node].points);
        for point in held {
            self.insert_from(node, point);
        }
    }

    fn search(&self, node: usize, agent: &Agent, radius_sq: f64, out: &mut Vec<AgentId>) {
        #[cfg(test)]
        self.visits.set(self.visits.get() + 1);
        let current = &self.nodes[node];
        if !current.bounds.intersects_circle(&agent.position, radius_sq) {
            return;
        }

        match current.first_child {
            Some(first) => {
                let first = first as usize;
                for child in first..first + 4 {
                    self.search(child, agent, radius_sq, out);
                }
            }
            None => {
                let inliers = current
                    .points
                    .iter()
                    .filter(|p| {
                        p.agent_id != agent.agent_id
                            && within(&p.position, &agent.position, radius_sq)
                    })
                    .map(|p| p.agent_id);
                out.extend(inliers);
            }
        }
    }
}

impl SpatialIndex for QuadTreeIndex {
    fn clear(&mut self) {
        self.reset();
    }

    fn insert(&mut self, agent: &Agent) {
        let point = IndexedPoint::from(agent);
        self.len += 1;
        if self.bounds.contains(&point.position) {
            self.insert_from(0, point);
        } else {
            self.outliers.push(point);
        }
    }

    fn neighbours_in_radius(&self, agent: &Agent, radius: f64) -> Vec<AgentId> {
        let Some(radius_sq) = radius_squared(radius) else {
            return vec![];
        };

        let mut out = vec![];
        self.search(0, agent, radius_sq, &mut out);
        out.extend(
            self.outliers
                .iter()
                .filter(|p| {
                    p.agent_id != agent.agent_id && within(&p.position, &agent.position, radius_sq)
                })
                .map(|p| p.agent_id),
        );
        out
    }

    fn name(&self) -> &'static str {
        "QuadTree"
    }
}
