//! ICAO-style standard atmosphere: density ratio and local speed of sound.
//!
//! An [`Atmosphere`] is built once at a reference altitude (station pressure,
//! temperature, humidity) and caches the density ratio and speed of sound
//! there. [`Atmosphere::density_factor_and_mach_at`] re-derives both at any
//! other altitude using the standard troposphere lapse rate, without
//! mutating the cached reference values (spec §3, §4.C).

use crate::error::{BallisticError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Standard temperature, °F.
pub const T_STD_F: f64 = 59.0;
/// Standard pressure, inHg.
pub const P_STD_INHG: f64 = 29.92;
/// Standard sea-level density, lb/ft^3.
pub const RHO_STD_LB_FT3: f64 = 0.076_474;
/// Standard troposphere lapse rate, °F per foot.
pub const LAPSE_RATE_F_PER_FT: f64 = -3.566_16e-3;
/// Speed-of-sound coefficient, fps per sqrt(°R).
pub const SPEED_OF_SOUND_COEFF: f64 = 49.0223;
/// 0 °F in Rankine.
pub const ICAO_FREEZE_R: f64 = 459.67;
/// Standard temperature in Rankine.
pub const ICAO_T_STD_R: f64 = 518.67;
/// Barometric pressure-ratio exponent.
pub const PRESSURE_EXPONENT: f64 = -5.255_876;
/// Temperature floor, °F. Computed values below this are clamped and a
/// warning is logged (spec §3 invariant).
pub const TEMPERATURE_FLOOR_F: f64 = -130.0;
/// Density ratio below this is flagged as physically implausible.
const IMPLAUSIBLE_DENSITY_RATIO: f64 = 0.05;
/// Radius, in feet, within which `density_factor_and_mach_at` returns the
/// cached reference-altitude values verbatim instead of recomputing.
const CACHE_RADIUS_FT: f64 = 30.0;

/// Humidity correction polynomial coefficients (spec §6).
const A0: f64 = 1.248_71;
const A1: f64 = 0.098_843_8;
const A2: f64 = 1.529_07e-3;
const A3: f64 = -3.070_31e-6;
const A4: f64 = 4.213_29e-7;
const A5: f64 = 3.342e-4;

/// Saturation-vapor-pressure polynomial in Fahrenheit, evaluated by Horner's
/// method, used only to scale the (small) humidity correction to density.
fn water_vapor_polynomial(temp_f: f64) -> f64 {
    A0 + temp_f * (A1 + temp_f * (A2 + temp_f * (A3 + temp_f * A4)))
}

/// `h_corr` in spec §3: the multiplicative correction to dry-air density
/// ratio for the partial pressure of water vapor at `humidity` (0..1).
fn humidity_density_correction(temp_f: f64, pressure_inhg: f64, humidity: f64) -> f64 {
    let vp = water_vapor_polynomial(temp_f);
    1.0 - A5 * humidity * vp / pressure_inhg
}

fn fahrenheit_to_rankine(f: f64) -> f64 {
    f + ICAO_FREEZE_R
}

/// Clamp a computed temperature to the physical floor, logging once if the
/// clamp fires. Returns `(clamped_temp_f, was_clamped)`.
fn clamp_temperature(temp_f: f64) -> (f64, bool) {
    if temp_f < TEMPERATURE_FLOOR_F {
        log::warn!(
            "atmosphere: computed temperature {temp_f:.1}F below floor {TEMPERATURE_FLOOR_F}F, clamping"
        );
        (TEMPERATURE_FLOOR_F, true)
    } else {
        (temp_f, false)
    }
}

fn density_ratio_and_mach(temp_f: f64, pressure_inhg: f64, humidity: f64) -> (f64, f64) {
    let t_r = fahrenheit_to_rankine(temp_f);
    let h_corr = humidity_density_correction(temp_f, pressure_inhg, humidity);
    let density_ratio = (pressure_inhg / P_STD_INHG) * (ICAO_T_STD_R / t_r) * h_corr;
    if density_ratio < IMPLAUSIBLE_DENSITY_RATIO {
        log::warn!("atmosphere: density ratio {density_ratio:.4} is implausibly low, continuing with clamped value");
    }
    let mach_ref_fps = t_r.sqrt() * SPEED_OF_SOUND_COEFF;
    (density_ratio, mach_ref_fps)
}

/// A fixed atmospheric reference point plus the machinery to re-derive
/// density ratio and local speed of sound at any other altitude.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Atmosphere {
    altitude_ft: f64,
    pressure_inhg: f64,
    temperature_f: f64,
    humidity: f64,
    density_ratio: f64,
    mach_ref_fps: f64,
    /// Set if construction clamped the supplied temperature to the floor.
    pub clamped: bool,
}

impl Atmosphere {
    /// ICAO standard atmosphere at sea level, zero humidity.
    pub fn icao_standard() -> Self {
        Self::new(0.0, P_STD_INHG, T_STD_F, 0.0).expect("ICAO standard atmosphere is always valid")
    }

    /// Construct at `altitude_ft` given local station `pressure_inhg`,
    /// `temperature_f`, and `humidity` in `[0, 1]`.
    pub fn new(altitude_ft: f64, pressure_inhg: f64, temperature_f: f64, humidity: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&humidity) {
            return Err(BallisticError::config(format!(
                "humidity {humidity} outside [0, 1]"
            )));
        }
        if pressure_inhg <= 0.0 {
            return Err(BallisticError::config(format!(
                "pressure {pressure_inhg} inHg must be positive"
            )));
        }
        let (temperature_f, clamped) = clamp_temperature(temperature_f);
        let (density_ratio, mach_ref_fps) = density_ratio_and_mach(temperature_f, pressure_inhg, humidity);
        Ok(Self {
            altitude_ft,
            pressure_inhg,
            temperature_f,
            humidity,
            density_ratio,
            mach_ref_fps,
            clamped,
        })
    }

    pub fn altitude_ft(&self) -> f64 {
        self.altitude_ft
    }

    /// Station pressure at the construction altitude, inHg.
    pub fn pressure_inhg(&self) -> f64 {
        self.pressure_inhg
    }

    /// Station temperature at the construction altitude, °F (post-clamp).
    pub fn temperature_f(&self) -> f64 {
        self.temperature_f
    }

    /// Density ratio and speed of sound (fps) at the construction altitude.
    pub fn reference(&self) -> (f64, f64) {
        (self.density_ratio, self.mach_ref_fps)
    }

    /// Density ratio and local speed of sound (fps) at `altitude_ft`,
    /// extrapolated from the reference altitude via the standard lapse rate
    /// and barometric pressure-ratio exponent. Within `CACHE_RADIUS_FT` of
    /// the reference altitude, returns the cached reference values exactly.
    pub fn density_factor_and_mach_at(&self, altitude_ft: f64) -> (f64, f64) {
        if (altitude_ft - self.altitude_ft).abs() < CACHE_RADIUS_FT {
            return self.reference();
        }

        let delta_ft = altitude_ft - self.altitude_ft;
        let (temp_f, _clamped) = clamp_temperature(self.temperature_f + LAPSE_RATE_F_PER_FT * delta_ft);

        let t_ref_r = fahrenheit_to_rankine(self.temperature_f);
        let t_new_r = fahrenheit_to_rankine(temp_f);
        let pressure_inhg = self.pressure_inhg * (t_ref_r / t_new_r).powf(PRESSURE_EXPONENT);

        density_ratio_and_mach(temp_f, pressure_inhg, self.humidity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn reference_matches_density_factor_at_same_altitude() {
        let atmo = Atmosphere::new(1500.0, 28.5, 70.0, 0.4).unwrap();
        let (dr, mach) = atmo.density_factor_and_mach_at(1500.0);
        let (dr_ref, mach_ref) = atmo.reference();
        assert_relative_eq!(dr, dr_ref, epsilon = 1e-15);
        assert_relative_eq!(mach, mach_ref, epsilon = 1e-15);
    }

    #[test]
    fn icao_standard_density_ratio_is_near_one() {
        let atmo = Atmosphere::icao_standard();
        let (dr, _mach) = atmo.reference();
        assert_relative_eq!(dr, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn density_decreases_with_altitude() {
        let atmo = Atmosphere::icao_standard();
        let (dr_low, _) = atmo.density_factor_and_mach_at(0.0);
        let (dr_high, _) = atmo.density_factor_and_mach_at(10_000.0);
        assert!(dr_high < dr_low);
    }

    #[test]
    fn mach_reference_decreases_with_altitude_cooling() {
        let atmo = Atmosphere::icao_standard();
        let (_, a_low) = atmo.density_factor_and_mach_at(0.0);
        let (_, a_high) = atmo.density_factor_and_mach_at(20_000.0);
        assert!(a_high < a_low);
    }

    #[test]
    fn rejects_humidity_out_of_range() {
        assert!(Atmosphere::new(0.0, P_STD_INHG, T_STD_F, 1.5).is_err());
        assert!(Atmosphere::new(0.0, P_STD_INHG, T_STD_F, -0.1).is_err());
    }

    #[test]
    fn clamps_extreme_cold_to_floor() {
        let atmo = Atmosphere::new(0.0, P_STD_INHG, -200.0, 0.0).unwrap();
        assert!(atmo.clamped);
        assert_relative_eq!(atmo.temperature_f, TEMPERATURE_FLOOR_F, epsilon = 1e-12);
    }
}
