//! Optional Coriolis acceleration: flat-fire (lateral-only) or full 3-D.

use crate::vector3::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Earth's sidereal rotation rate, rad/s.
pub const EARTH_OMEGA_RAD_S: f64 = 7.292_115_9e-5;

/// Precomputed sines/cosines of shooter latitude (and, for the full model,
/// firing azimuth) used to add a Coriolis acceleration term each step.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coriolis {
    sin_lat: f64,
    cos_lat: f64,
    sin_az: f64,
    cos_az: f64,
    full: bool,
}

impl Coriolis {
    /// Flat-fire approximation: only the lateral (`z`) deflection term from
    /// the vertical component of Earth's rotation is modeled.
    pub fn flat_fire(latitude_rad: f64) -> Self {
        Self {
            sin_lat: latitude_rad.sin(),
            cos_lat: latitude_rad.cos(),
            sin_az: 0.0,
            cos_az: 0.0,
            full: false,
        }
    }

    /// Full 3-D model: latitude and firing azimuth (measured clockwise from
    /// north) are both known, so the complete `-2*Omega x v` term is used.
    pub fn full(latitude_rad: f64, azimuth_rad: f64) -> Self {
        Self {
            sin_lat: latitude_rad.sin(),
            cos_lat: latitude_rad.cos(),
            sin_az: azimuth_rad.sin(),
            cos_az: azimuth_rad.cos(),
            full: true,
        }
    }

    /// Coriolis acceleration to add to gravity + drag at the given velocity.
    pub fn acceleration(&self, velocity: Vector3) -> Vector3 {
        if self.full {
            let omega = Vector3::new(
                EARTH_OMEGA_RAD_S * self.cos_lat * self.cos_az,
                EARTH_OMEGA_RAD_S * self.sin_lat,
                -EARTH_OMEGA_RAD_S * self.cos_lat * self.sin_az,
            );
            cross(omega, velocity) * -2.0
        } else {
            let omega_y = EARTH_OMEGA_RAD_S * self.sin_lat;
            Vector3::new(0.0, 0.0, 2.0 * omega_y * velocity.x)
        }
    }
}

fn cross(a: Vector3, b: Vector3) -> Vector3 {
    Vector3::new(
        a.y * b.z - a.z * b.y,
        a.z * b.x - a.x * b.z,
        a.x * b.y - a.y * b.x,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn flat_fire_deflects_laterally_with_downrange_speed() {
        let c = Coriolis::flat_fire(45f64.to_radians());
        let v = Vector3::new(2700.0, 0.0, 0.0);
        let a = c.acceleration(v);
        assert_relative_eq!(a.x, 0.0, epsilon = 1e-15);
        assert_relative_eq!(a.y, 0.0, epsilon = 1e-15);
        assert!(a.z != 0.0);
    }

    #[test]
    fn zero_latitude_has_no_vertical_spin_component() {
        let c = Coriolis::flat_fire(0.0);
        let v = Vector3::new(2700.0, 0.0, 0.0);
        let a = c.acceleration(v);
        assert_relative_eq!(a.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn full_model_matches_flat_fire_lateral_sign_at_zero_azimuth() {
        let flat = Coriolis::flat_fire(30f64.to_radians());
        let full = Coriolis::full(30f64.to_radians(), 0.0);
        let v = Vector3::new(2700.0, 0.0, 0.0);
        let a_flat = flat.acceleration(v);
        let a_full = full.acceleration(v);
        assert_eq!(a_flat.z.signum(), a_full.z.signum());
    }
}
