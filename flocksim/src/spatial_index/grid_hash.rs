use crate::error::{check_dimension, ConfigError, Result};
use crate::spatial_index::geometry::{radius_squared, within};
use crate::spatial_index::spatial_index::{IndexedPoint, SpatialIndex};
use crate::{Agent, AgentId, Point};

use std::collections::HashMap;

/// Upper bound on buckets reserved up front, whatever the world size.
const MAX_PRESIZED_BUCKETS: usize = 1 << 16;

/// A sparse 2D grid with list of agents in each occupied cell.
/// Buckets are keyed by signed cell coordinates so agents slightly outside
/// the world (or at negative coordinates) still land somewhere. Queries scan
/// the `(2k + 1)^2` block of cells around the agent where
/// `k = ceil(radius / cell_size)`, clamped to the occupied extent, and run
/// the exact distance test on everything they find.
#[derive(Debug)]
pub struct GridHashIndex {
    cells: HashMap<(i64, i64), Vec<IndexedPoint>>,
    /// Resolution of width of each cell
    cell_size: f64,
    /// Inclusive bounds of the occupied cells, `None` when empty
    occupied: Option<CellRange>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CellRange {
    min: (i64, i64),
    max: (i64, i64),
}

impl CellRange {
    fn single(cell: (i64, i64)) -> Self {
        Self {
            min: cell,
            max: cell,
        }
    }

    fn grow(&mut self, cell: (i64, i64)) {
        self.min = (self.min.0.min(cell.0), self.min.1.min(cell.1));
        self.max = (self.max.0.max(cell.0), self.max.1.max(cell.1));
    }
}

impl GridHashIndex {
    /// Creates a new GridHashIndex instance
    /// # Arguments
    /// * `width` - Width of the world
    /// * `height`- Height of the world
    /// * `cell_size` - Each cell will be of `cell_size`x`cell_size` dimensions in whatever units
    /// the width and height are. Should be about the neighbour radius.
    pub fn new(width: f64, height: f64, cell_size: f64) -> Result<Self> {
        check_dimension("width", width)?;
        check_dimension("height", height)?;
        if !(cell_size.is_finite() && cell_size > 0f64) {
            return Err(ConfigError::InvalidCellSize(cell_size));
        }

        let columns = (width / cell_size).ceil();
        let rows = (height / cell_size).ceil();
        let buckets = (columns * rows).min(MAX_PRESIZED_BUCKETS as f64) as usize;
        tracing::debug!(width, height, cell_size, buckets, "grid hash index created");

        Ok(Self {
            cells: HashMap::with_capacity(buckets),
            cell_size,
            occupied: None,
        })
    }

    /// Number of buckets currently holding at least one agent
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    fn location_to_xy_signed_idx(&self, point: &Point) -> (i64, i64) {
        let x_idx = (point.x / self.cell_size).floor() as i64;
        let y_idx = (point.y / self.cell_size).floor() as i64;
        (x_idx, y_idx)
    }

    /// Inclusive cell block a query of `radius` around `position` has to
    /// visit, clamped to the occupied cells. `None` if nothing can match.
    fn get_bounds(&self, radius: f64, position: &Point) -> Option<CellRange> {
        let occupied = self.occupied?;
        let (x_idx, y_idx) = self.location_to_xy_signed_idx(position);
        // Saturating float-to-int cast keeps huge radii finite
        let k = (radius / self.cell_size).ceil() as i64;

        let range = CellRange {
            min: (
                x_idx.saturating_sub(k).max(occupied.min.0),
                y_idx.saturating_sub(k).max(occupied.min.1),
            ),
            max: (
                x_idx.saturating_add(k).min(occupied.max.0),
                y_idx.saturating_add(k).min(occupied.max.1),
            ),
        };
        if range.min.0 > range.max.0 || range.min.1 > range.max.1 {
            return None;
        }
        Some(range)
    }
}

impl SpatialIndex for GridHashIndex {
    fn clear(&mut self) {
        self.cells.clear();
        self.occupied = None;
    }

    fn insert(&mut self, agent: &Agent) {
        let cell = self.location_to_xy_signed_idx(&agent.position);
        self.cells.entry(cell).or_default().push(agent.into());
        match self.occupied.as_mut() {
            Some(range) => range.grow(cell),
            None => self.occupied = Some(CellRange::single(cell)),
        }
    }

    fn neighbours_in_radius(&self, agent: &Agent, radius: f64) -> Vec<AgentId> {
        let Some(radius_sq) = radius_squared(radius) else {
            return vec![];
        };
        let Some(bounds) = self.get_bounds(radius, &agent.position) else {
            return vec![];
        };

        let mut agents = vec![];
        for x_idx in bounds.min.0..=bounds.max.0 {
            for y_idx in bounds.min.1..=bounds.max.1 {
                // Unpopulated cells are simply absent
                if let Some(bucket) = self.cells.get(&(x_idx, y_idx)) {
                    let inliers = bucket
                        .iter()
                        .filter(|p| {
                            p.agent_id != agent.agent_id
                                && within(&p.position, &agent.position, radius_sq)
                        })
                        .map(|p| p.agent_id);
                    agents.extend(inliers);
                }
            }
        }
        agents
    }

    fn name(&self) -> &'static str {
        "Spatial Hashing"
    }
}

#[cfg(test)]
mod tests {
    // Note this useful idiom: importing names from outer (for mod tests) scope.
    use super::*;
    use std::collections::HashSet;

    fn naive_radius_search(radius: f64, query: &Agent, points: &[Agent]) -> HashSet<AgentId> {
        points
            .iter()
            .filter(|p| p.agent_id != query.agent_id && (p.position - query.position).norm() < radius)
            .map(|p| p.agent_id)
            .collect()
    }

    fn lattice() -> Vec<Agent> {
        let mut agents = vec![];
        let mut id = 0usize;
        for x in 0..10 {
            for y in 0..10 {
                agents.push(Agent::new(id, Point::new(x as f64 + 0.5f64, y as f64 + 0.5f64)));
                id += 1;
            }
        }
        agents
    }

    #[test]
    fn test_rejects_invalid_configuration() {
        assert!(matches!(
            GridHashIndex::new(10f64, 10f64, 0f64),
            Err(ConfigError::InvalidCellSize(_))
        ));
        assert!(matches!(
            GridHashIndex::new(10f64, 10f64, -1f64),
            Err(ConfigError::InvalidCellSize(_))
        ));
        assert!(matches!(
            GridHashIndex::new(0f64, 10f64, 1f64),
            Err(ConfigError::InvalidDimension { name: "width", .. })
        ));
        assert!(matches!(
            GridHashIndex::new(10f64, -3f64, 1f64),
            Err(ConfigError::InvalidDimension { name: "height", .. })
        ));
    }

    #[test]
    fn test_radius_search() {
        let mut grid = GridHashIndex::new(10f64, 10f64, 0.5f64).unwrap();
        let agents = lattice();
        grid.rebuild(&agents);

        for (query, radius) in [(44usize, 1.1f64), (0, 2.5), (99, 0.9), (55, 4.0)] {
            let query = &agents[query];
            let expected = naive_radius_search(radius, query, &agents);
            let found: HashSet<AgentId> =
                grid.neighbours_in_radius(query, radius).into_iter().collect();
            assert_eq!(found, expected);
        }
    }

    #[test]
    fn test_radius_larger_than_cell() {
        // k = ceil(radius / cell) rings must be scanned, not just 3x3
        let mut grid = GridHashIndex::new(100f64, 100f64, 1f64).unwrap();
        let a = Agent::new(0, Point::new(10f64, 10f64));
        let b = Agent::new(1, Point::new(14.5f64, 10f64));
        grid.insert(&a);
        grid.insert(&b);
        assert_eq!(grid.neighbours_in_radius(&a, 5f64), vec![1]);
    }

    #[test]
    fn test_negative_coordinates() {
        let mut grid = GridHashIndex::new(10f64, 10f64, 2f64).unwrap();
        let a = Agent::new(0, Point::new(-0.5f64, -0.5f64));
        let b = Agent::new(1, Point::new(0.5f64, 0.5f64));
        grid.insert(&a);
        grid.insert(&b);
        assert_eq!(grid.location_to_xy_signed_idx(&a.position), (-1, -1));
        assert_eq!(grid.neighbours_in_radius(&b, 2f64), vec![0]);
    }

    #[test]
    fn test_queries_do_not_create_buckets() {
        let mut grid = GridHashIndex::new(100f64, 100f64, 10f64).unwrap();
        let agents = [
            Agent::new(0, Point::new(5f64, 5f64)),
            Agent::new(1, Point::new(95f64, 95f64)),
        ];
        grid.rebuild(&agents);
        assert_eq!(grid.occupied_cells(), 2);

        grid.neighbours_in_radius(&agents[0], 200f64);
        assert_eq!(grid.occupied_cells(), 2);
    }

    #[test]
    fn test_infinite_radius_returns_everyone_else() {
        let mut grid = GridHashIndex::new(10f64, 10f64, 1f64).unwrap();
        let agents = lattice();
        grid.rebuild(&agents);
        assert_eq!(grid.neighbours_in_radius(&agents[3], f64::INFINITY).len(), 99);
    }

    #[test]
    fn test_clear() {
        let mut grid = GridHashIndex::new(10f64, 10f64, 1f64).unwrap();
        let agents = lattice();
        grid.rebuild(&agents);
        grid.clear();
        assert_eq!(grid.occupied_cells(), 0);
        assert!(grid.neighbours_in_radius(&agents[0], 100f64).is_empty());
    }
}
