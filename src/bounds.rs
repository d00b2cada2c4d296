use nalgebra::Vector3;

use crate::{
    error::OctreeError,
    shared::{Float, to_f64},
};

pub const OCTANTS: usize = 8;

#[inline]
pub fn midpoint<F: Float>(a: F, b: F) -> F {
    (a + b) / (F::one() + F::one())
}

/// Axis-aligned box, inclusive on all six faces.
///
/// Octant indices encode one bit per axis: bit 0 selects the upper half on X,
/// bit 1 on Y and bit 2 on Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<F: Float> {
    min: Vector3<F>,
    max: Vector3<F>,
}

impl<F: Float> Bounds<F> {
    /// Builds a box without checking `min <= max`; see [`Bounds::try_new`].
    pub fn new(min: Vector3<F>, max: Vector3<F>) -> Self {
        Self { min, max }
    }

    pub fn try_new(min: Vector3<F>, max: Vector3<F>) -> Result<Self, OctreeError> {
        let bounds = Self::new(min, max);
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn cube(center: Vector3<F>, half_width: F) -> Self {
        let offset = Vector3::repeat(half_width);
        Self::new(center - offset, center + offset)
    }

    pub fn validate(&self) -> Result<(), OctreeError> {
        for axis in 0..3 {
            if !(self.min[axis] <= self.max[axis]) {
                return Err(OctreeError::InvalidBounds {
                    axis,
                    min: to_f64(self.min[axis]),
                    max: to_f64(self.max[axis]),
                });
            }
        }
        Ok(())
    }

    pub fn min(&self) -> &Vector3<F> {
        &self.min
    }

    pub fn max(&self) -> &Vector3<F> {
        &self.max
    }

    pub fn center(&self) -> Vector3<F> {
        Vector3::new(
            midpoint(self.min.x, self.max.x),
            midpoint(self.min.y, self.max.y),
            midpoint(self.min.z, self.max.z),
        )
    }

    /// Index of the octant `point` belongs to. A coordinate exactly on the
    /// midpoint goes to the upper half, so placement is deterministic.
    pub fn sub_octant_index(&self, point: &Vector3<F>) -> usize {
        let mut index = 0;
        for axis in 0..3 {
            if point[axis] >= midpoint(self.min[axis], self.max[axis]) {
                index |= 1 << axis;
            }
        }
        index
    }

    pub fn sub_octant_bounds(&self, index: usize) -> Self {
        debug_assert!(index < OCTANTS);
        let mut min = self.min;
        let mut max = self.max;
        for axis in 0..3 {
            let mid = midpoint(self.min[axis], self.max[axis]);
            if index & (1 << axis) != 0 {
                min[axis] = mid;
            } else {
                max[axis] = mid;
            }
        }
        Self::new(min, max)
    }

    pub fn octants(&self) -> [Self; OCTANTS] {
        std::array::from_fn(|i| self.sub_octant_bounds(i))
    }

    pub fn contains(&self, point: &Vector3<F>) -> bool {
        (0..3).all(|axis| self.min[axis] <= point[axis] && point[axis] <= self.max[axis])
    }

    /// True when the boxes share at least one point. Touching faces count, and
    /// a box containing the other on an axis overlaps it on that axis.
    pub fn overlaps(&self, other: &Self) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis])
    }
}
