use crate::spatial_index::geometry::{radius_squared, within};
use crate::spatial_index::spatial_index::{IndexedPoint, SpatialIndex};
use crate::{Agent, AgentId, Point};

#[cfg(test)]
use std::cell::Cell;

type NodeId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn for_depth(depth: usize) -> Self {
        if depth % 2 == 0 {
            Axis::X
        } else {
            Axis::Y
        }
    }

    #[inline]
    fn of(self, p: &Point) -> f64 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct KdNode {
    point: IndexedPoint,
    axis: Axis,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

/// Balanced 2D KD-tree, rebuilt from scratch every tick.
///
/// Inserts are buffered; [`SpatialIndex::finish`] partitions the buffer around
/// the median of alternating axes and lays the nodes out in an arena. Queries
/// descend towards the query point first and only cross a splitting line when
/// the query circle reaches over it.
#[derive(Debug, Default)]
pub struct KdTreeIndex {
    pending: Vec<IndexedPoint>,
    /// Reused partitioning buffer
    scratch: Vec<IndexedPoint>,
    nodes: Vec<KdNode>,
    root: Option<NodeId>,
    /// Set by `insert`, cleared once the tree reflects `pending`
    dirty: bool,
    /// Nodes entered by searches
    #[cfg(test)]
    visits: Cell<usize>,
}

impl KdTreeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Height of the built tree, 0 when empty
    pub fn depth(&self) -> usize {
        fn height(nodes: &[KdNode], node: Option<NodeId>) -> usize {
            match node {
                None => 0,
                Some(id) => {
                    let node = &nodes[id as usize];
                    1 + height(nodes, node.left).max(height(nodes, node.right))
                }
            }
        }
        height(&self.nodes, self.root)
    }

    fn build(&mut self) {
        self.nodes.clear();
        self.nodes.reserve(self.pending.len());
        self.scratch.clear();
        self.scratch.extend_from_slice(&self.pending);
        self.root = Self::build_recursive(&mut self.nodes, &mut self.scratch, 0);
        self.dirty = false;
    }

    fn build_recursive(
        nodes: &mut Vec<KdNode>,
        entries: &mut [IndexedPoint],
        depth: usize,
    ) -> Option<NodeId> {
        if entries.is_empty() {
            return None;
        }

        let axis = Axis::for_depth(depth);
        let median = entries.len() / 2;
        entries.select_nth_unstable_by(median, |a, b| {
            axis.of(&a.position).total_cmp(&axis.of(&b.position))
        });

        let id = nodes.len() as NodeId;
        nodes.push(KdNode {
            point: entries[median],
            axis,
            left: None,
            right: None,
        });

        let (left, rest) = entries.split_at_mut(median);
        let left = Self::build_recursive(nodes, left, depth + 1);
        let right = Self::build_recursive(nodes, &mut rest[1..], depth + 1);
        let node = &mut nodes[id as usize];
        node.left = left;
        node.right = right;
        Some(id)
    }

    fn search(
        &self,
        node: Option<NodeId>,
        agent: &Agent,
        radius: f64,
        radius_sq: f64,
        out: &mut Vec<AgentId>,
    ) {
        let Some(id) = node else {
            return;
        };
        #[cfg(test)]
        self.visits.set(self.visits.get() + 1);
        let node = &self.nodes[id as usize];
        if node.point.agent_id != agent.agent_id
            && within(&node.point.position, &agent.position, radius_sq)
        {
            out.push(node.point.agent_id);
        }

        // Left holds values <= split, right holds values >= split
        let diff = node.axis.of(&agent.position) - node.axis.of(&node.point.position);
        let (near, far) = if diff < 0f64 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        self.search(near, agent, radius, radius_sq, out);
        if diff.abs() < radius {
            self.search(far, agent, radius, radius_sq, out);
        }
    }
}

impl SpatialIndex for KdTreeIndex {
    fn clear(&mut self) {
        self.pending.clear();
        self.nodes.clear();
        self.root = None;
        self.dirty = false;
    }

    fn insert(&mut self, agent: &Agent) {
        self.pending.push(agent.into());
        self.dirty = true;
    }

    fn finish(&mut self) {
        if self.dirty {
            self.build();
        }
    }

    fn neighbours_in_radius(&self, agent: &Agent, radius: f64) -> Vec<AgentId> {
        let Some(radius_sq) = radius_squared(radius) else {
            return vec![];
        };

        if self.dirty {
            // Inserted since the last build: the tree is stale, scan instead
            return self
                .pending
                .iter()
                .filter(|p| {
                    p.agent_id != agent.agent_id && within(&p.position, &agent.position, radius_sq)
                })
                .map(|p| p.agent_id)
                .collect();
        }

        let mut out = vec![];
        self.search(self.root, agent, radius, radius_sq, &mut out);
        out
    }

    fn name(&self) -> &'static str {
        "KD-Tree"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial_index::naive::NaiveIndex;
    use std::collections::HashSet;

    fn spiral(n: usize) -> Vec<Agent> {
        (0..n)
            .map(|i| {
                let t = i as f64 * 0.37f64;
                Agent::new(i, Point::new(300f64 + t.cos() * t * 3f64, 200f64 + t.sin() * t * 3f64))
            })
            .collect()
    }

    #[test]
    fn test_tree_is_balanced() {
        let mut tree = KdTreeIndex::new();
        tree.rebuild(&spiral(1000));
        assert_eq!(tree.len(), 1000);
        // ceil(log2(1001)) = 10
        assert_eq!(tree.depth(), 10);
    }

    #[test]
    fn test_matches_naive() {
        let agents = spiral(400);
        let mut tree = KdTreeIndex::new();
        let mut naive = NaiveIndex::new();
        tree.rebuild(&agents);
        naive.rebuild(&agents);

        for query in agents.iter().step_by(7) {
            for radius in [0.5f64, 5f64, 20f64, 80f64] {
                let expected: HashSet<_> = naive.neighbours_in_radius(query, radius).into_iter().collect();
                let found: HashSet<_> = tree.neighbours_in_radius(query, radius).into_iter().collect();
                assert_eq!(found, expected, "agent {} radius {}", query.agent_id, radius);
            }
        }
    }

    #[test]
    fn test_search_skips_far_subtrees() {
        let agents = spiral(1000);
        let mut tree = KdTreeIndex::new();
        let mut naive = NaiveIndex::new();
        tree.rebuild(&agents);
        naive.rebuild(&agents);

        for query in [&agents[10], &agents[500], &agents[999]] {
            tree.visits.set(0);
            let found: HashSet<_> = tree.neighbours_in_radius(query, 1f64).into_iter().collect();
            let visits = tree.visits.get();
            assert!(visits < 100, "agent {} entered {} of 1000 nodes", query.agent_id, visits);
            let expected: HashSet<_> = naive.neighbours_in_radius(query, 1f64).into_iter().collect();
            assert_eq!(found, expected);
        }

        // A radius covering everything has nothing to prune
        tree.visits.set(0);
        tree.neighbours_in_radius(&agents[0], 1e9f64);
        assert_eq!(tree.visits.get(), 1000);
    }

    #[test]
    fn test_stale_tree_answers_correctly() {
        let agents = spiral(20);
        let mut tree = KdTreeIndex::new();
        tree.rebuild(&agents[..10]);
        for agent in &agents[10..] {
            tree.insert(agent);
        }
        // No finish: must still see all 20
        assert_eq!(tree.neighbours_in_radius(&agents[0], 1e9f64).len(), 19);
        tree.finish();
        assert_eq!(tree.neighbours_in_radius(&agents[0], 1e9f64).len(), 19);
    }

    #[test]
    fn test_empty_and_single() {
        let mut tree = KdTreeIndex::new();
        tree.finish();
        let a = Agent::new(0, Point::new(1f64, 1f64));
        assert!(tree.neighbours_in_radius(&a, 10f64).is_empty());
        assert_eq!(tree.depth(), 0);

        tree.rebuild(&[a]);
        assert_eq!(tree.depth(), 1);
        assert!(tree.neighbours_in_radius(&a, 10f64).is_empty());
    }

    #[test]
    fn test_split_value_duplicates_on_both_sides() {
        // Many agents share x, so equal split values land on both sides
        let agents: Vec<Agent> = (0..31)
            .map(|i| Agent::new(i, Point::new(10f64, i as f64)))
            .collect();
        let mut tree = KdTreeIndex::new();
        tree.rebuild(&agents);
        let found: HashSet<_> = tree.neighbours_in_radius(&agents[15], 2.5f64).into_iter().collect();
        assert_eq!(found, HashSet::from([13, 14, 16, 17]));
    }
}
