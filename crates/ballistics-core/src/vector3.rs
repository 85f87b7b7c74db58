//! Immutable 3-D vector arithmetic used throughout the workspace.
//!
//! Axis convention (spec §3): `x` is downrange along the sight line, `y` is
//! vertical (gravity acts as `-|g| * ŷ`), `z` is lateral windage.

use std::ops::{Add, Div, Mul, Neg, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 3-component vector. Cheap to copy; every operation returns a new value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Vectors with magnitude below this are treated as "no direction" by
/// [`Vector3::normalize`] — it returns the input unchanged rather than
/// dividing by (near) zero.
const NORMALIZE_EPSILON: f64 = 1e-10;

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 { x: 0.0, y: 0.0, z: 0.0 };

    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    fn to_nalgebra(self) -> nalgebra::Vector3<f64> {
        nalgebra::Vector3::new(self.x, self.y, self.z)
    }

    #[inline]
    fn from_nalgebra(v: nalgebra::Vector3<f64>) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }

    #[inline]
    pub fn dot(self, rhs: Vector3) -> f64 {
        self.to_nalgebra().dot(&rhs.to_nalgebra())
    }

    #[inline]
    pub fn magnitude(self) -> f64 {
        self.to_nalgebra().norm()
    }

    #[inline]
    pub fn magnitude_squared(self) -> f64 {
        self.to_nalgebra().norm_squared()
    }

    /// Unit vector in the same direction, or `self` unchanged when the
    /// magnitude is below [`NORMALIZE_EPSILON`] — never divides by (near)
    /// zero and never produces NaN.
    #[inline]
    pub fn normalize(self) -> Self {
        let mag = self.magnitude();
        if mag < NORMALIZE_EPSILON {
            self
        } else {
            Self::from_nalgebra(self.to_nalgebra() / mag)
        }
    }
}

impl Add for Vector3 {
    type Output = Vector3;
    #[inline]
    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::from_nalgebra(self.to_nalgebra() + rhs.to_nalgebra())
    }
}

impl Sub for Vector3 {
    type Output = Vector3;
    #[inline]
    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::from_nalgebra(self.to_nalgebra() - rhs.to_nalgebra())
    }
}

impl Mul<f64> for Vector3 {
    type Output = Vector3;
    #[inline]
    fn mul(self, k: f64) -> Vector3 {
        Vector3::from_nalgebra(self.to_nalgebra() * k)
    }
}

impl Div<f64> for Vector3 {
    type Output = Vector3;
    #[inline]
    fn div(self, k: f64) -> Vector3 {
        Vector3::from_nalgebra(self.to_nalgebra() / k)
    }
}

impl Neg for Vector3 {
    type Output = Vector3;
    #[inline]
    fn neg(self) -> Vector3 {
        Vector3::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn addition_is_associative() {
        let u = Vector3::new(1.0, 2.0, 3.0);
        let v = Vector3::new(-4.0, 0.5, 9.0);
        let w = Vector3::new(2.5, -1.0, 0.0);
        let lhs = (u + v) + w;
        let rhs = u + (v + w);
        assert_relative_eq!(lhs.x, rhs.x, epsilon = 1e-12);
        assert_relative_eq!(lhs.y, rhs.y, epsilon = 1e-12);
        assert_relative_eq!(lhs.z, rhs.z, epsilon = 1e-12);
    }

    #[test]
    fn scalar_mul_scales_magnitude() {
        let v = Vector3::new(3.0, 4.0, 0.0);
        let k = -2.5;
        assert_relative_eq!((v * k).magnitude(), k.abs() * v.magnitude(), epsilon = 1e-12);
    }

    #[test]
    fn normalize_round_trips_magnitude() {
        let v = Vector3::new(3.0, -4.0, 12.0);
        let mag = v.magnitude();
        let n = v.normalize();
        assert_relative_eq!(n.x * mag, v.x, epsilon = 1e-10);
        assert_relative_eq!(n.y * mag, v.y, epsilon = 1e-10);
        assert_relative_eq!(n.z * mag, v.z, epsilon = 1e-10);
        assert_relative_eq!(n.magnitude(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn normalize_near_zero_is_unchanged() {
        let v = Vector3::new(1e-12, -2e-13, 0.0);
        assert_eq!(v.normalize(), v);
    }

    #[test]
    fn dot_of_perpendicular_axes_is_zero() {
        let x = Vector3::new(1.0, 0.0, 0.0);
        let y = Vector3::new(0.0, 1.0, 0.0);
        assert_relative_eq!(x.dot(y), 0.0, epsilon = 1e-15);
    }
}
