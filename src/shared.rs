// This file defines the scalar and point-mass abstractions shared by the bounds helpers and the tree.

use nalgebra::{RealField, Vector3};

pub trait Float: RealField + Copy {}

impl<T: RealField + Copy> Float for T {}

/// Lossy conversion used when reporting coordinates in errors.
pub(crate) fn to_f64<F: Float>(value: F) -> f64 {
    nalgebra::try_convert(value).unwrap_or(f64::NAN)
}

/// Anything the octree can store: a position in space carrying a scalar mass.
pub trait PointMass<F: Float> {
    fn position(&self) -> &Vector3<F>;
    fn mass(&self) -> F;
}

impl<F: Float, T: PointMass<F>> PointMass<F> for &T {
    fn position(&self) -> &Vector3<F> {
        (**self).position()
    }

    fn mass(&self) -> F {
        (**self).mass()
    }
}

/// An immutable point mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Item<F: Float> {
    position: Vector3<F>,
    mass: F,
}

impl<F: Float> Item<F> {
    pub fn new(position: Vector3<F>, mass: F) -> Self {
        Self { position, mass }
    }

    pub fn at(x: F, y: F, z: F, mass: F) -> Self {
        Self::new(Vector3::new(x, y, z), mass)
    }
}

impl<F: Float> PointMass<F> for Item<F> {
    fn position(&self) -> &Vector3<F> {
        &self.position
    }

    fn mass(&self) -> F {
        self.mass
    }
}
