//! Shot input types and the precomputed, immutable `ShotProps` view the
//! integrator consumes (spec §3 DATA MODEL / §4.E).

use ballistics_core::{Atmosphere, BallisticError, Coriolis, WindSegment};
use ballistics_models::DragCurve;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Linear powder-temperature sensitivity: muzzle velocity shifts by
/// `fps_per_f` for every degree Fahrenheit away from `reference_temp_f`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TempSensitivity {
    pub reference_temp_f: f64,
    pub fps_per_f: f64,
}

impl TempSensitivity {
    pub fn adjusted_muzzle_velocity(&self, base_fps: f64, powder_temp_f: f64) -> f64 {
        base_fps + self.fps_per_f * (powder_temp_f - self.reference_temp_f)
    }
}

/// Firing geometry and environment (spec §6 `Shot`).
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Shot {
    pub atmosphere: Atmosphere,
    pub winds: Vec<WindSegment>,
    pub look_angle_rad: f64,
    pub cant_angle_rad: f64,
    pub relative_angle_rad: f64,
    pub azimuth_rad: Option<f64>,
    pub latitude_rad: Option<f64>,
}

/// Weapon-fixed properties (spec §6 `Weapon`).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Weapon {
    pub sight_height_ft: f64,
    pub twist_in_signed: f64,
    pub zero_elevation_rad: f64,
}

/// Projectile and load properties (spec §6 `Ammo`). The drag curve is built
/// by the caller via `ballistics-models` (standard table or multi-BC) and
/// handed in ready to evaluate.
#[derive(Clone, Debug)]
pub struct Ammo {
    pub bc: f64,
    pub drag_curve: DragCurve,
    pub weight_gr: f64,
    pub length_in: f64,
    pub diameter_in: f64,
    pub muzzle_velocity_fps: f64,
    pub powder_temp_f: Option<f64>,
    pub temp_sensitivity: Option<TempSensitivity>,
}

/// Immutable, precomputed scalar view of a shot (spec §4.E). Built once by
/// [`ShotProps::new`] and never mutated afterward; the integrator only reads
/// from it.
#[derive(Clone, Debug)]
pub struct ShotProps {
    pub bc: f64,
    pub drag_curve: DragCurve,
    pub atmosphere: Atmosphere,
    pub look_angle_rad: f64,
    pub twist_in: f64,
    pub length_in: f64,
    pub diameter_in: f64,
    pub weight_gr: f64,
    pub barrel_elevation_rad: f64,
    pub barrel_azimuth_rad: f64,
    pub sight_height_ft: f64,
    pub cant_cos: f64,
    pub cant_sin: f64,
    pub alt0_ft: f64,
    pub calc_step_ft: f64,
    pub muzzle_velocity_fps: f64,
    pub stability_coefficient: f64,
    pub coriolis: Option<Coriolis>,
    pub winds: Vec<WindSegment>,
}

/// Muzzle velocities below this are rejected at construction: an MV this
/// low cannot be driven by any ammo/atmosphere combination the core models.
const MIN_PLAUSIBLE_MUZZLE_VELOCITY_FPS: f64 = 1.0;

impl ShotProps {
    pub fn new(
        shot: &Shot,
        weapon: &Weapon,
        ammo: &Ammo,
        calc_step_ft: f64,
    ) -> Result<Self, BallisticError> {
        if ammo.bc <= 0.0 {
            return Err(BallisticError::config("ballistic coefficient must be positive"));
        }
        if calc_step_ft <= 0.0 {
            return Err(BallisticError::config("calc_step_ft must be positive"));
        }

        let muzzle_velocity_fps = match (ammo.powder_temp_f, ammo.temp_sensitivity) {
            (Some(temp), Some(sensitivity)) => {
                sensitivity.adjusted_muzzle_velocity(ammo.muzzle_velocity_fps, temp)
            }
            _ => ammo.muzzle_velocity_fps,
        };
        if muzzle_velocity_fps < MIN_PLAUSIBLE_MUZZLE_VELOCITY_FPS {
            return Err(BallisticError::config(format!(
                "muzzle velocity {muzzle_velocity_fps} fps is not physically plausible"
            )));
        }

        let cant_cos = shot.cant_angle_rad.cos();
        let cant_sin = shot.cant_angle_rad.sin();
        let barrel_elevation_rad = shot.look_angle_rad + shot.relative_angle_rad + weapon.zero_elevation_rad;
        let barrel_azimuth_rad = shot.azimuth_rad.unwrap_or(0.0);

        let coriolis = shot.latitude_rad.map(|lat| match shot.azimuth_rad {
            Some(az) => Coriolis::full(lat, az),
            None => Coriolis::flat_fire(lat),
        });

        let stability_coefficient = miller_stability_coefficient(
            weapon.twist_in_signed,
            ammo.length_in,
            ammo.diameter_in,
            ammo.weight_gr,
            muzzle_velocity_fps,
            shot.atmosphere.pressure_inhg(),
            shot.atmosphere.temperature_f(),
        );

        Ok(Self {
            bc: ammo.bc,
            drag_curve: ammo.drag_curve.clone(),
            atmosphere: shot.atmosphere,
            look_angle_rad: shot.look_angle_rad,
            twist_in: weapon.twist_in_signed,
            length_in: ammo.length_in,
            diameter_in: ammo.diameter_in,
            weight_gr: ammo.weight_gr,
            barrel_elevation_rad,
            barrel_azimuth_rad,
            sight_height_ft: weapon.sight_height_ft,
            cant_cos,
            cant_sin,
            alt0_ft: shot.atmosphere.altitude_ft(),
            calc_step_ft,
            muzzle_velocity_fps,
            stability_coefficient,
            coriolis,
            winds: shot.winds.clone(),
        })
    }

    /// Lateral spin-drift displacement (ft) at time `t` (spec §4.E). Zero
    /// whenever twist, length, or diameter is zero.
    pub fn spin_drift_ft(&self, t_s: f64) -> f64 {
        if self.twist_in == 0.0 || self.length_in == 0.0 || self.diameter_in == 0.0 {
            return 0.0;
        }
        self.twist_in.signum() * 1.25 * (self.stability_coefficient + 1.2) * t_s.powf(1.83) / 12.0
    }
}

/// Miller twist-rate stability coefficient (spec §4.E):
/// `Sd = 30*w / (T^2 * d^3 * L * (1+L^2))`, `Fv = (mv/2800)^(1/3)`,
/// `Ftp = ((T_F+460)/519) * (29.92/P_inHg)`, `coeff = Sd*Fv*Ftp`.
/// Returns `1.0` when twist, length, or diameter is zero (spec: no spin
/// correction applied).
fn miller_stability_coefficient(
    twist_in_signed: f64,
    length_in: f64,
    diameter_in: f64,
    weight_gr: f64,
    muzzle_velocity_fps: f64,
    pressure_inhg: f64,
    temperature_f: f64,
) -> f64 {
    if twist_in_signed == 0.0 || length_in == 0.0 || diameter_in == 0.0 {
        return 1.0;
    }
    let twist_calibers = twist_in_signed.abs() / diameter_in;
    let length_calibers = length_in / diameter_in;
    let sd = 30.0 * weight_gr
        / (twist_calibers.powi(2) * diameter_in.powi(3) * length_calibers * (1.0 + length_calibers.powi(2)));
    let fv = (muzzle_velocity_fps / 2800.0).cbrt();
    let ftp = ((temperature_f + 460.0) / 519.0) * (29.92 / pressure_inhg);
    sd * fv * ftp
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballistics_models::{DragCurve, StandardDrag};

    fn icao_shot() -> (Shot, Weapon, Ammo) {
        let shot = Shot {
            atmosphere: Atmosphere::icao_standard(),
            winds: vec![],
            look_angle_rad: 0.0,
            cant_angle_rad: 0.0,
            relative_angle_rad: 0.0,
            azimuth_rad: None,
            latitude_rad: None,
        };
        let weapon = Weapon { sight_height_ft: 2.0 / 12.0, twist_in_signed: 11.24, zero_elevation_rad: 0.0 };
        let ammo = Ammo {
            bc: 0.223,
            drag_curve: DragCurve::standard(StandardDrag::G7, 0.223).unwrap(),
            weight_gr: 168.0,
            length_in: 1.21,
            diameter_in: 0.308,
            muzzle_velocity_fps: 2750.0,
            powder_temp_f: None,
            temp_sensitivity: None,
        };
        (shot, weapon, ammo)
    }

    #[test]
    fn rejects_nonpositive_bc_and_step() {
        let (shot, weapon, mut ammo) = icao_shot();
        ammo.bc = 0.0;
        assert!(ShotProps::new(&shot, &weapon, &ammo, 10.0).is_err());

        let (shot, weapon, ammo) = icao_shot();
        assert!(ShotProps::new(&shot, &weapon, &ammo, 0.0).is_err());
    }

    #[test]
    fn stability_coefficient_is_one_without_twist() {
        let (shot, mut weapon, ammo) = icao_shot();
        weapon.twist_in_signed = 0.0;
        let props = ShotProps::new(&shot, &weapon, &ammo, 10.0).unwrap();
        assert_eq!(props.stability_coefficient, 1.0);
        assert_eq!(props.spin_drift_ft(2.0), 0.0);
    }

    #[test]
    fn spin_drift_grows_with_time_and_follows_twist_sign() {
        let (shot, weapon, ammo) = icao_shot();
        let right_twist = ShotProps::new(&shot, &weapon, &ammo, 10.0).unwrap();
        assert!(right_twist.spin_drift_ft(1.0) > 0.0);
        assert!(right_twist.spin_drift_ft(2.0) > right_twist.spin_drift_ft(1.0));

        let (shot, mut weapon, ammo) = icao_shot();
        weapon.twist_in_signed = -11.24;
        let left_twist = ShotProps::new(&shot, &weapon, &ammo, 10.0).unwrap();
        assert!(left_twist.spin_drift_ft(1.0) < 0.0);
    }

    #[test]
    fn powder_sensitivity_shifts_muzzle_velocity() {
        let (shot, weapon, mut ammo) = icao_shot();
        ammo.powder_temp_f = Some(30.0);
        ammo.temp_sensitivity = Some(TempSensitivity { reference_temp_f: 70.0, fps_per_f: 1.5 });
        let props = ShotProps::new(&shot, &weapon, &ammo, 10.0).unwrap();
        assert!((props.muzzle_velocity_fps - (2750.0 - 40.0 * 1.5)).abs() < 1e-9);
    }
}
