//! Error types for the flock simulation.

/// Result type alias using ConfigError
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Construction-time failures. Once an index or simulation is built, every
/// operation on it is total.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// World width or height is zero, negative or not finite
    #[error("invalid world dimension {name} = {value}: must be finite and > 0")]
    InvalidDimension { name: &'static str, value: f64 },

    /// Grid cell size is zero, negative or not finite
    #[error("invalid cell size {0}: must be finite and > 0")]
    InvalidCellSize(f64),

    /// Quadtree node capacity of zero
    #[error("invalid node capacity {0}: must be at least 1")]
    InvalidCapacity(usize),

    /// Any other out-of-range configuration value
    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue { key: String, reason: String },

    /// Index label that does not name a known index
    #[error("unknown spatial index `{0}` (expected naive, kdtree, grid or quadtree)")]
    UnknownIndex(String),

    /// YAML could not be scanned
    #[error("YAML error: {0}")]
    Yaml(#[from] yaml_rust::ScanError),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn invalid_value(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Checks that a world dimension is usable as a bounding extent.
pub(crate) fn check_dimension(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0f64 {
        Ok(())
    } else {
        Err(ConfigError::InvalidDimension { name, value })
    }
}
