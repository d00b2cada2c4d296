pub mod bounds;
pub mod error;
pub mod octree;
pub mod settings;
pub mod shared;
pub mod stats;

pub use bounds::Bounds;
pub use error::OctreeError;
pub use octree::{MassDistribution, Node, Octree};
pub use settings::{OctreeSettings, OutOfBoundsPolicy};
pub use shared::{Float, Item, PointMass};
pub use stats::{QueryStats, TreeStats};
