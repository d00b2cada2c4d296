use thiserror::Error;

/// Errors reported at the octree boundary. Tree walks themselves never fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OctreeError {
    #[error("invalid bounds on axis {axis}: min {min} is not <= max {max}")]
    InvalidBounds { axis: usize, min: f64, max: f64 },
    #[error("item at ({x}, {y}, {z}) lies outside the root bounds")]
    OutOfBounds { x: f64, y: f64, z: f64 },
    #[error("invalid octree settings: {0}")]
    InvalidSettings(String),
}
