//! Common types and traits for pallet geometry.
//!
//! All lengths are centimetres, all weights kilograms.

use std::f64::consts::PI;
use std::ops::Add;

/// Global numerical tolerance for floating-point comparisons.
///
/// Used when grouping coordinates into columns, rows and layers.
pub const EPSILON_GENERAL: f64 = 1e-6;

/// Represents a 3D vector or point in pallet-local space.
///
/// `x` runs along the pallet length, `y` along its width and `z` upwards from the
/// top of the riser.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new 3D vector.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a zero vector (origin).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Converts to tuple format for API compatibility.
    #[inline]
    pub const fn as_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }

    /// Calculates the volume (product of all components).
    #[inline]
    pub fn volume(&self) -> f64 {
        self.x * self.y * self.z
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl From<Vec3> for (f64, f64, f64) {
    #[inline]
    fn from(vec: Vec3) -> Self {
        vec.as_tuple()
    }
}

/// Trait for objects with a 3D extent.
pub trait Dimensional {
    /// Returns the bounding dimensions (length, width, height).
    fn dimensions(&self) -> Vec3;

    /// Calculates the volume. Round shapes override this.
    fn volume(&self) -> f64 {
        self.dimensions().volume()
    }
}

/// Trait for objects that carry a weight.
pub trait Weighted {
    /// Returns the weight in kg.
    fn weight(&self) -> f64;
}

/// Volume of an upright cylinder.
#[inline]
pub fn cylinder_volume(diameter: f64, height: f64) -> f64 {
    let radius = diameter / 2.0;
    PI * radius * radius * height
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec3_volume() {
        let dims = Vec3::new(30.0, 20.0, 15.0);
        assert_eq!(dims.volume(), 9000.0);
    }

    #[test]
    fn vec3_addition_gives_far_corner() {
        let corner = Vec3::new(10.0, 5.0, 0.0) + Vec3::new(30.0, 20.0, 15.0);
        assert_eq!(corner.as_tuple(), (40.0, 25.0, 15.0));
        assert_eq!(Vec3::zero() + corner, corner);
    }

    #[test]
    fn cylinder_volume_matches_formula() {
        let v = cylinder_volume(20.0, 10.0);
        assert!((v - PI * 100.0 * 10.0).abs() < EPSILON_GENERAL);
    }
}
