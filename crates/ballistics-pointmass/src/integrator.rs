//! Fixed-step Euler/RK4 integration of the point-mass equations of motion
//! (spec §3/§4.F). Wind and atmosphere are sampled once at the start of each
//! step and held fixed across every RK4 stage — a deliberate accuracy
//! trade-off preserved from the reference behaviour, not a bug.

use ballistics_core::{Vector3, WindSock, GRAVITY_FPS2};

use crate::sequence::{RawTrajPoint, TrajectorySequence};
use crate::shot::ShotProps;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fixed-step integration scheme (spec §4.F).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Engine {
    Euler,
    #[default]
    Rk4,
}

/// Why integration stopped (spec §3, §7).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TerminationReason {
    #[default]
    None,
    MinVelocity,
    MaxDrop,
    MinAltitude,
    RangeLimit,
}

impl TerminationReason {
    /// Stable string tag (spec §6).
    pub fn as_str(self) -> &'static str {
        match self {
            TerminationReason::None => "none",
            TerminationReason::MinVelocity => "min_velocity",
            TerminationReason::MaxDrop => "max_drop",
            TerminationReason::MinAltitude => "min_altitude",
            TerminationReason::RangeLimit => "range_limit",
        }
    }
}

/// Below this speed the projectile is considered to have lost flight (spec §4.F).
pub const MIN_VELOCITY_FPS: f64 = 50.0;
/// This far below the sightline, integration gives up (spec §4.F).
pub const MAX_DROP_FT: f64 = -15_000.0;
/// Default `calc_step_ft` time-step multiplier (spec §4.F / SPEC_FULL §10.3).
pub const DEFAULT_STEP_MULTIPLIER: f64 = 0.5;
/// `vx` is clamped to at least this magnitude before dividing to get `Δt`.
const MIN_VX_FOR_STEP_FPS: f64 = 1e-6;
/// Defensive bound on step count so a misconfigured shot can't loop forever.
const MAX_STEPS: usize = 5_000_000;

/// Runs one shot's integration to completion, appending every step to a
/// fresh [`TrajectorySequence`] (spec §4.F).
pub struct Integrator<'a> {
    shot: &'a ShotProps,
    engine: Engine,
    step_multiplier: f64,
    max_step_s: Option<f64>,
    min_altitude_ft: f64,
}

impl<'a> Integrator<'a> {
    pub fn new(
        shot: &'a ShotProps,
        engine: Engine,
        step_multiplier: f64,
        max_step_s: Option<f64>,
        min_altitude_ft: f64,
    ) -> Self {
        Self { shot, engine, step_multiplier, max_step_s, min_altitude_ft }
    }

    /// Integrate from the shot's initial state out to `range_limit_ft` (one
    /// extra step past it), returning the raw buffer and why it stopped.
    pub fn run(&self, range_limit_ft: f64) -> (TrajectorySequence, TerminationReason) {
        log::debug!(
            "integrator: engine={:?} mv={:.1}fps elev={:.5}rad range_limit={range_limit_ft:.1}ft",
            self.engine,
            self.shot.muzzle_velocity_fps,
            self.shot.barrel_elevation_rad,
        );

        let mut sequence = TrajectorySequence::new();
        let mut wind_sock = WindSock::new(&self.shot.winds);

        let (sin_elev, cos_elev) = self.shot.barrel_elevation_rad.sin_cos();
        let (sin_az, cos_az) = self.shot.barrel_azimuth_rad.sin_cos();

        let mut position = Vector3::new(
            0.0,
            -self.shot.cant_cos * self.shot.sight_height_ft,
            -self.shot.cant_sin * self.shot.sight_height_ft,
        );
        let mut velocity = Vector3::new(
            self.shot.muzzle_velocity_fps * cos_elev * cos_az,
            self.shot.muzzle_velocity_fps * sin_elev,
            self.shot.muzzle_velocity_fps * cos_elev * sin_az,
        );
        let (_, mach_ref) = self.shot.atmosphere.density_factor_and_mach_at(self.shot.alt0_ft + position.y);
        sequence.push(RawTrajPoint {
            time_s: 0.0,
            position,
            velocity,
            mach_ratio: velocity.magnitude() / mach_ref,
        });

        let mut t = 0.0;
        let mut steps = 0;
        let reason = loop {
            let wind_vec = wind_sock.vector_for_range(position.x);
            let (rho_ratio, a_fps) = self.shot.atmosphere.density_factor_and_mach_at(self.shot.alt0_ft + position.y);
            let accel = |v: Vector3| self.acceleration(v, wind_vec, rho_ratio, a_fps);

            let vx_safe = velocity.x.abs().max(MIN_VX_FOR_STEP_FPS);
            let mut dt = self.step_multiplier * self.shot.calc_step_ft / vx_safe;
            if let Some(cap) = self.max_step_s {
                dt = dt.min(cap);
            }

            let (next_position, next_velocity) = match self.engine {
                Engine::Euler => (position + velocity * dt, velocity + accel(velocity) * dt),
                Engine::Rk4 => rk4_step(position, velocity, dt, accel),
            };
            t += dt;
            position = next_position;
            velocity = next_velocity;
            steps += 1;

            let v_rel = velocity - wind_vec;
            let (_, mach_ref_now) = self.shot.atmosphere.density_factor_and_mach_at(self.shot.alt0_ft + position.y);
            let mach_ratio = v_rel.magnitude() / mach_ref_now;
            sequence.push(RawTrajPoint { time_s: t, position, velocity, mach_ratio });

            if position.x > range_limit_ft + self.shot.calc_step_ft {
                break TerminationReason::RangeLimit;
            }
            if velocity.magnitude() < MIN_VELOCITY_FPS {
                break TerminationReason::MinVelocity;
            }
            if position.y < MAX_DROP_FT {
                break TerminationReason::MaxDrop;
            }
            if self.shot.alt0_ft + position.y < self.min_altitude_ft {
                break TerminationReason::MinAltitude;
            }
            if steps >= MAX_STEPS {
                log::warn!("integrator: hit defensive step cap {MAX_STEPS} without a natural termination");
                break TerminationReason::RangeLimit;
            }
        };

        log::debug!("integrator: terminated reason={} after {steps} steps, t={t:.4}s", reason.as_str());
        (sequence, reason)
    }

    fn acceleration(&self, velocity: Vector3, wind: Vector3, rho_ratio: f64, a_fps: f64) -> Vector3 {
        let v_rel = velocity - wind;
        let speed_rel = v_rel.magnitude().max(1e-9);
        let mach = speed_rel / a_fps;
        let drag_coeff = self.shot.drag_curve.drag(mach);
        let drag_accel = v_rel * (-(rho_ratio * speed_rel * drag_coeff));
        let gravity = Vector3::new(0.0, GRAVITY_FPS2, 0.0);
        let coriolis_accel = self.shot.coriolis.map_or(Vector3::ZERO, |c| c.acceleration(velocity));
        drag_accel + gravity + coriolis_accel
    }
}

/// Classic RK4 for the coupled `(position, velocity)` system, where
/// `dp/dt = v` and `dv/dt = accel(v)` (acceleration doesn't depend on
/// position because wind/atmosphere are frozen for the whole step).
fn rk4_step(
    position: Vector3,
    velocity: Vector3,
    dt: f64,
    accel: impl Fn(Vector3) -> Vector3,
) -> (Vector3, Vector3) {
    let k1v = accel(velocity);
    let k1p = velocity;

    let v2 = velocity + k1v * (0.5 * dt);
    let k2v = accel(v2);
    let k2p = v2;

    let v3 = velocity + k2v * (0.5 * dt);
    let k3v = accel(v3);
    let k3p = v3;

    let v4 = velocity + k3v * dt;
    let k4v = accel(v4);
    let k4p = v4;

    let next_velocity = velocity + (k1v + k2v * 2.0 + k3v * 2.0 + k4v) * (dt / 6.0);
    let next_position = position + (k1p + k2p * 2.0 + k3p * 2.0 + k4p) * (dt / 6.0);
    (next_position, next_velocity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballistics_core::Atmosphere;
    use ballistics_models::{DragCurve, StandardDrag};
    use approx::assert_relative_eq;

    fn vacuum_shot(elevation_rad: f64, mv_fps: f64) -> ShotProps {
        ShotProps {
            bc: 1.0e9, // effectively no drag: see vacuum_sanity test comment
            drag_curve: DragCurve::standard(StandardDrag::G7, 1.0e9).unwrap(),
            atmosphere: Atmosphere::icao_standard(),
            look_angle_rad: 0.0,
            twist_in: 0.0,
            length_in: 0.0,
            diameter_in: 0.0,
            weight_gr: 168.0,
            barrel_elevation_rad: elevation_rad,
            barrel_azimuth_rad: 0.0,
            sight_height_ft: 0.0,
            cant_cos: 1.0,
            cant_sin: 0.0,
            alt0_ft: 0.0,
            calc_step_ft: 1.0,
            muzzle_velocity_fps: mv_fps,
            stability_coefficient: 1.0,
            coriolis: None,
            winds: vec![],
        }
    }

    #[test]
    fn vacuum_sanity_matches_v_squared_over_g() {
        let shot = vacuum_shot(45f64.to_radians(), 1000.0);
        let integrator = Integrator::new(&shot, Engine::Rk4, DEFAULT_STEP_MULTIPLIER, None, -1.0e9);
        let (seq, reason) = integrator.run(100_000.0);
        assert!(reason == TerminationReason::RangeLimit || reason == TerminationReason::MaxDrop);
        let apex_height = seq.iter().map(|p| p.position.y).fold(f64::MIN, f64::max);
        let expected_apex = (1000.0 * 45f64.to_radians().sin()).powi(2) / (2.0 * 32.17405);
        assert_relative_eq!(apex_height, expected_apex, max_relative = 0.01);
    }

    #[test]
    fn min_velocity_and_max_drop_terminations_fire_as_expected() {
        let mut shot = vacuum_shot(-80f64.to_radians(), 200.0);
        shot.bc = 0.2;
        shot.drag_curve = DragCurve::standard(StandardDrag::G1, 0.2).unwrap();
        let integrator = Integrator::new(&shot, Engine::Rk4, DEFAULT_STEP_MULTIPLIER, None, -1.0e9);
        let (_, reason) = integrator.run(1_000_000.0);
        assert!(reason == TerminationReason::MaxDrop || reason == TerminationReason::MinVelocity);
    }

    #[test]
    fn rk4_and_euler_roughly_agree_at_short_range() {
        let shot = vacuum_shot(1f64.to_radians(), 2750.0);
        let rk4 = Integrator::new(&shot, Engine::Rk4, DEFAULT_STEP_MULTIPLIER, None, -1.0e9).run(500.0);
        let euler = Integrator::new(&shot, Engine::Euler, DEFAULT_STEP_MULTIPLIER, None, -1.0e9).run(500.0);
        let y_rk4 = rk4.0.last().unwrap().position.y;
        let y_euler = euler.0.last().unwrap().position.y;
        assert!((y_rk4 - y_euler).abs() < 1.0);
    }
}
