pub mod geometry;
pub mod grid_hash;
pub mod kd_tree;
pub mod naive;
pub mod quad_tree;
pub mod spatial_index;

use std::fmt;
use std::str::FromStr;

use crate::config::WorldConfig;
use crate::error::{ConfigError, Result};

pub use grid_hash::GridHashIndex;
pub use kd_tree::KdTreeIndex;
pub use naive::NaiveIndex;
pub use quad_tree::QuadTreeIndex;
pub use spatial_index::{IndexedPoint, SpatialIndex};

/// The four interchangeable neighbour index strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexKind {
    Naive,
    KdTree,
    GridHash,
    QuadTree,
}

impl IndexKind {
    /// In the order they are reported
    pub const ALL: [IndexKind; 4] = [
        IndexKind::Naive,
        IndexKind::KdTree,
        IndexKind::GridHash,
        IndexKind::QuadTree,
    ];

    /// Short identifier accepted by `FromStr` and configuration files
    pub fn key(self) -> &'static str {
        match self {
            IndexKind::Naive => "naive",
            IndexKind::KdTree => "kdtree",
            IndexKind::GridHash => "grid",
            IndexKind::QuadTree => "quadtree",
        }
    }

    /// Constructs a fresh, empty index of this kind for `world`.
    pub fn build(self, world: &WorldConfig) -> Result<Box<dyn SpatialIndex>> {
        Ok(match self {
            IndexKind::Naive => Box::new(NaiveIndex::new()),
            IndexKind::KdTree => Box::new(KdTreeIndex::new()),
            IndexKind::GridHash => Box::new(GridHashIndex::new(
                world.width,
                world.height,
                world.cell_size,
            )?),
            IndexKind::QuadTree => Box::new(QuadTreeIndex::new(world.width, world.height)?),
        })
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for IndexKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "naive" | "brute" | "bruteforce" => Ok(IndexKind::Naive),
            "kdtree" | "kd-tree" | "kd" => Ok(IndexKind::KdTree),
            "grid" | "hash" | "spatial-hash" | "gridhash" => Ok(IndexKind::GridHash),
            "quadtree" | "quad" => Ok(IndexKind::QuadTree),
            _ => Err(ConfigError::UnknownIndex(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_keys() {
        for kind in IndexKind::ALL {
            assert_eq!(kind.key().parse::<IndexKind>().unwrap(), kind);
        }
        assert!(matches!(
            "octree".parse::<IndexKind>(),
            Err(ConfigError::UnknownIndex(_))
        ));
    }

    #[test]
    fn test_build_labels() {
        let world = WorldConfig::default();
        let names: Vec<&str> = IndexKind::ALL
            .iter()
            .map(|kind| kind.build(&world).unwrap().name())
            .collect();
        assert_eq!(names, vec!["Naive O(n²)", "KD-Tree", "Spatial Hashing", "QuadTree"]);
    }

    #[test]
    fn test_build_propagates_invalid_world() {
        let world = WorldConfig {
            cell_size: 0f64,
            ..WorldConfig::default()
        };
        assert!(IndexKind::GridHash.build(&world).is_err());
        assert!(IndexKind::Naive.build(&world).is_ok());
    }
}
