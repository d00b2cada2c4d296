use crate::error::OctreeError;

pub const DEFAULT_MAX_ITEMS: usize = 1;
pub const DEFAULT_MAX_DEPTH: usize = 32;
/// Largest accepted `max_depth`. Insertion recurses once per level, and an
/// f64 box has collapsed to a point long before this many halvings.
pub const MAX_DEPTH_LIMIT: usize = 256;

/// What to do with an item whose position lies outside the root bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutOfBoundsPolicy {
    /// Refuse the item with [`OctreeError::OutOfBounds`].
    #[default]
    Reject,
    /// Route it by midpoint comparisons into the nearest octant. Range queries
    /// may miss such items because their leaf's bounds do not contain them.
    Accept,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OctreeSettings {
    /// A leaf subdivides once it holds more than this many items.
    pub max_items: usize,
    /// Depth of the deepest allowed node, the root being at depth 1. Leaves at
    /// this depth never subdivide and may hold any number of items.
    pub max_depth: usize,
    pub out_of_bounds: OutOfBoundsPolicy,
}

impl Default for OctreeSettings {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            max_depth: DEFAULT_MAX_DEPTH,
            out_of_bounds: OutOfBoundsPolicy::default(),
        }
    }
}

impl OctreeSettings {
    pub fn validate(&self) -> Result<(), OctreeError> {
        if self.max_depth == 0 {
            return Err(OctreeError::InvalidSettings(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(OctreeError::InvalidSettings(format!(
                "max_depth {} exceeds the limit of {}",
                self.max_depth, MAX_DEPTH_LIMIT
            )));
        }
        Ok(())
    }
}
