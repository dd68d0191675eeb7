//! Simulation and benchmark configuration.
//!
//! Everything can be loaded from YAML. Missing keys fall back to the
//! defaults below; a key that is present with the wrong type or an
//! out-of-range value is an error.
//!
//! ```yaml
//! world:
//!   width: 1200
//!   height: 800
//!   cell_size: 60
//! simulation:
//!   boid_count: 1500
//!   neighbour_radius: 60
//!   wander_share: 0.0
//!   max_speed: 4.0
//!   seed: 7
//! bench:
//!   warmup_iterations: 75
//!   measured_iterations: 300
//!   indexes: [naive, kdtree, grid, quadtree]
//! ```

use std::path::Path;

use yaml_rust::{Yaml, YamlLoader};

use crate::error::{check_dimension, ConfigError, Result};
use crate::spatial_index::IndexKind;

/// World extent and grid resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldConfig {
    pub width: f64,
    pub height: f64,
    /// Cell size of the grid hash index, about the neighbour radius
    pub cell_size: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 1200f64,
            height: 800f64,
            cell_size: 60f64,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<()> {
        check_dimension("width", self.width)?;
        check_dimension("height", self.height)?;
        if !(self.cell_size.is_finite() && self.cell_size > 0f64) {
            return Err(ConfigError::InvalidCellSize(self.cell_size));
        }
        Ok(())
    }

    fn apply_yaml(&mut self, node: &Yaml) -> Result<()> {
        if let Some(width) = read_f64(node, "width")? {
            self.width = width;
        }
        if let Some(height) = read_f64(node, "height")? {
            self.height = height;
        }
        if let Some(cell_size) = read_f64(node, "cell_size")? {
            self.cell_size = cell_size;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    pub world: WorldConfig,
    pub boid_count: usize,
    pub neighbour_radius: f64,
    /// Fraction of the population using the wander behaviour
    pub wander_share: f64,
    pub max_speed: f64,
    /// Seed for placement and wander jitter. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            boid_count: 300,
            neighbour_radius: 50f64,
            wander_share: 0.25f64,
            max_speed: 4f64,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        self.world.validate()?;
        if !(self.neighbour_radius >= 0f64 && self.neighbour_radius.is_finite()) {
            return Err(ConfigError::invalid_value(
                "neighbour_radius",
                format!("{} is not a finite non-negative radius", self.neighbour_radius),
            ));
        }
        if !(0f64..=1f64).contains(&self.wander_share) {
            return Err(ConfigError::invalid_value(
                "wander_share",
                format!("{} is outside [0, 1]", self.wander_share),
            ));
        }
        if !(self.max_speed > 0f64 && self.max_speed.is_finite()) {
            return Err(ConfigError::invalid_value(
                "max_speed",
                format!("{} must be finite and > 0", self.max_speed),
            ));
        }
        Ok(())
    }

    pub fn from_yaml_str(yaml_str: &str) -> Result<Self> {
        let doc = load_document(yaml_str)?;
        let mut config = Self::default();
        config.apply_yaml(&doc)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_yaml_str(&std::fs::read_to_string(path)?)
    }

    fn apply_yaml(&mut self, doc: &Yaml) -> Result<()> {
        self.world.apply_yaml(&doc["world"])?;
        let node = &doc["simulation"];
        if let Some(boid_count) = read_usize(node, "boid_count")? {
            self.boid_count = boid_count;
        }
        if let Some(radius) = read_f64(node, "neighbour_radius")? {
            self.neighbour_radius = radius;
        }
        if let Some(share) = read_f64(node, "wander_share")? {
            self.wander_share = share;
        }
        if let Some(max_speed) = read_f64(node, "max_speed")? {
            self.max_speed = max_speed;
        }
        if let Some(seed) = read_u64(node, "seed")? {
            self.seed = Some(seed);
        }
        Ok(())
    }
}

/// Settings of the index comparison run.
#[derive(Clone, Debug, PartialEq)]
pub struct BenchConfig {
    pub simulation: SimulationConfig,
    pub warmup_iterations: usize,
    pub measured_iterations: usize,
    pub indexes: Vec<IndexKind>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig {
                boid_count: 1500,
                neighbour_radius: 60f64,
                wander_share: 0f64,
                seed: Some(1),
                ..SimulationConfig::default()
            },
            warmup_iterations: 75,
            measured_iterations: 300,
            indexes: IndexKind::ALL.to_vec(),
        }
    }
}

impl BenchConfig {
    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;
        if self.measured_iterations == 0 {
            return Err(ConfigError::invalid_value(
                "measured_iterations",
                "at least one measured iteration is required",
            ));
        }
        if self.indexes.is_empty() {
            return Err(ConfigError::invalid_value("indexes", "no index selected"));
        }
        Ok(())
    }

    pub fn from_yaml_str(yaml_str: &str) -> Result<Self> {
        let doc = load_document(yaml_str)?;
        let mut config = Self::default();
        config.simulation.apply_yaml(&doc)?;

        let node = &doc["bench"];
        if let Some(warmup) = read_usize(node, "warmup_iterations")? {
            config.warmup_iterations = warmup;
        }
        if let Some(measured) = read_usize(node, "measured_iterations")? {
            config.measured_iterations = measured;
        }
        match &node["indexes"] {
            Yaml::BadValue | Yaml::Null => {}
            Yaml::Array(items) => {
                config.indexes = items
                    .iter()
                    .map(|item| -> Result<IndexKind> {
                        item.as_str()
                            .ok_or_else(|| ConfigError::invalid_value("indexes", "expected index names"))?
                            .parse()
                    })
                    .collect::<Result<_>>()?;
            }
            other => {
                return Err(ConfigError::invalid_value(
                    "indexes",
                    format!("expected a list, found {:?}", other),
                ))
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_yaml_str(&std::fs::read_to_string(path)?)
    }
}

fn load_document(yaml_str: &str) -> Result<Yaml> {
    let mut docs = YamlLoader::load_from_str(yaml_str)?;
    if docs.is_empty() {
        // An empty file means all defaults
        return Ok(Yaml::Null);
    }
    Ok(docs.swap_remove(0))
}

fn read_f64(node: &Yaml, key: &str) -> Result<Option<f64>> {
    match &node[key] {
        Yaml::BadValue | Yaml::Null => Ok(None),
        Yaml::Integer(value) => Ok(Some(*value as f64)),
        value @ Yaml::Real(_) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| ConfigError::invalid_value(key, "malformed number")),
        other => Err(ConfigError::invalid_value(
            key,
            format!("expected a number, found {:?}", other),
        )),
    }
}

fn read_u64(node: &Yaml, key: &str) -> Result<Option<u64>> {
    match &node[key] {
        Yaml::BadValue | Yaml::Null => Ok(None),
        Yaml::Integer(value) => u64::try_from(*value)
            .map(Some)
            .map_err(|_| ConfigError::invalid_value(key, format!("{} is negative", value))),
        other => Err(ConfigError::invalid_value(
            key,
            format!("expected an integer, found {:?}", other),
        )),
    }
}

fn read_usize(node: &Yaml, key: &str) -> Result<Option<usize>> {
    read_u64(node, key)?
        .map(|value| {
            usize::try_from(value)
                .map_err(|_| ConfigError::invalid_value(key, format!("{} is too large", value)))
        })
        .transpose()
}
