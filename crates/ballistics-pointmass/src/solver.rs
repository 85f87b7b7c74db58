//! Zero-angle and max-range search over the integrator (spec §4.I).
//!
//! Every search works on a scratch [`ShotProps`] clone with `barrel_elevation_rad`
//! overridden for the candidate angle; nothing here mutates the caller's shot.

use ballistics_core::BallisticError;

use crate::integrator::{DEFAULT_STEP_MULTIPLIER, Engine, Integrator};
use crate::sequence::{Key, RawTrajPoint, TrajectorySequence};
use crate::shot::ShotProps;

/// Zero-finding converges once the slant-height error is within this many feet.
pub const ZERO_ACCURACY_FT: f64 = 5e-6;
/// Zero-finding and max-range search both give up after this many iterations.
pub const MAX_ITERATIONS: u32 = 20;
/// Golden-section max-range search stops once the elevation bracket is this narrow.
pub const APEX_IS_MAX_RANGE_RADIANS: f64 = 1e-5;

fn run_with_elevation(
    shot: &ShotProps,
    elevation_rad: f64,
    engine: Engine,
    max_step_s: Option<f64>,
    min_altitude_ft: f64,
    range_limit_ft: f64,
) -> (TrajectorySequence, crate::integrator::TerminationReason) {
    let mut candidate = shot.clone();
    candidate.barrel_elevation_rad = elevation_rad;
    Integrator::new(&candidate, engine, DEFAULT_STEP_MULTIPLIER, max_step_s, min_altitude_ft).run(range_limit_ft)
}

/// Horizontal-range reach of a trajectory: the farthest `x` the buffer covers.
fn terminal_range_ft(sequence: &TrajectorySequence) -> f64 {
    sequence.last().map_or(0.0, |p| p.position.x)
}

/// Slant-height error (ft) of the trajectory at the horizontal range that
/// corresponds to `slant_distance_ft` along the sighted line. Positive means
/// the shot crosses above the line of sight at that point.
fn slant_height_error(
    shot: &ShotProps,
    elevation_rad: f64,
    slant_distance_ft: f64,
    range_limit_ft: f64,
) -> Result<f64, BallisticError> {
    let (sequence, _) = run_with_elevation(shot, elevation_rad, Engine::Rk4, None, -1.0e9, range_limit_ft);
    let horizontal_target_ft = slant_distance_ft * shot.look_angle_rad.cos();
    let point = sequence.get_at(Key::Px, horizontal_target_ft, None)?;
    let (sin_l, cos_l) = shot.look_angle_rad.sin_cos();
    Ok(point.position.y * cos_l - point.position.x * sin_l)
}

/// Barrel elevation (rad) that zeros the shot at `slant_distance_ft` along
/// the line of sight. `lofted` selects the high-angle solution of the two
/// elevations that can zero at a given distance (spec §4.I).
pub fn zero_angle(shot: &ShotProps, slant_distance_ft: f64, lofted: bool) -> Result<f64, BallisticError> {
    let range_limit_ft = slant_distance_ft.abs() * 1.5 + 1_000.0;
    let (max_range_ft, _) = find_max_range(shot, shot.look_angle_rad, 80f64.to_radians())?;
    if slant_distance_ft > max_range_ft * shot.look_angle_rad.cos() {
        return Err(BallisticError::OutOfRange {
            requested_ft: slant_distance_ft,
            max_range_ft,
            look_angle_rad: shot.look_angle_rad,
        });
    }

    let (mut e0, mut e1) = if lofted {
        (45f64.to_radians(), 50f64.to_radians())
    } else {
        (shot.look_angle_rad, shot.look_angle_rad + 0.01)
    };
    let mut err0 = slant_height_error(shot, e0, slant_distance_ft, range_limit_ft)?;
    let mut err1 = slant_height_error(shot, e1, slant_distance_ft, range_limit_ft)?;

    for iteration in 1..=MAX_ITERATIONS {
        if err1.abs() < ZERO_ACCURACY_FT {
            return Ok(e1);
        }
        let denom = err1 - err0;
        if denom.abs() < 1e-15 {
            return Err(BallisticError::ZeroFinding {
                last_angle_rad: e1,
                last_error_ft: err1,
                iterations: iteration,
            });
        }
        let e2 = e1 - err1 * (e1 - e0) / denom;
        e0 = e1;
        err0 = err1;
        e1 = e2;
        err1 = slant_height_error(shot, e1, slant_distance_ft, range_limit_ft)?;
    }

    Err(BallisticError::ZeroFinding {
        last_angle_rad: e1,
        last_error_ft: err1,
        iterations: MAX_ITERATIONS,
    })
}

/// Golden-section search for the elevation (within `[low_rad, high_rad]`)
/// maximizing terminal horizontal range, returning `(range_ft, elevation_rad)`.
pub fn find_max_range(shot: &ShotProps, low_rad: f64, high_rad: f64) -> Result<(f64, f64), BallisticError> {
    const GOLDEN: f64 = 0.618_033_988_749_895;
    let range_limit_ft = 1.0e6;

    let mut lo = low_rad;
    let mut hi = high_rad;
    let range_at = |e: f64| -> f64 {
        let (sequence, _) = run_with_elevation(shot, e, Engine::Rk4, None, -1.0e9, range_limit_ft);
        terminal_range_ft(&sequence)
    };

    let mut c = hi - GOLDEN * (hi - lo);
    let mut d = lo + GOLDEN * (hi - lo);
    let mut fc = range_at(c);
    let mut fd = range_at(d);

    while (hi - lo).abs() > APEX_IS_MAX_RANGE_RADIANS {
        if fc < fd {
            lo = c;
            c = d;
            fc = fd;
            d = lo + GOLDEN * (hi - lo);
            fd = range_at(d);
        } else {
            hi = d;
            d = c;
            fd = fc;
            c = hi - GOLDEN * (hi - lo);
            fc = range_at(c);
        }
    }

    let best_elevation = (lo + hi) / 2.0;
    Ok((range_at(best_elevation), best_elevation))
}

/// The trajectory's apex: the first upward-to-downward crossing of vertical
/// velocity (spec §4.H), run out far enough to guarantee one exists.
pub fn find_apex(shot: &ShotProps) -> Result<RawTrajPoint, BallisticError> {
    let (sequence, _) = run_with_elevation(shot, shot.barrel_elevation_rad, Engine::Rk4, None, -1.0e9, 1.0e6);
    sequence
        .find_and_interpolate(|p| p.velocity.y, 0.0)
        .ok_or_else(|| BallisticError::numeric("trajectory never reaches an apex"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballistics_core::Atmosphere;
    use ballistics_models::{DragCurve, StandardDrag};

    fn flat_shot() -> ShotProps {
        ShotProps {
            bc: 0.223,
            drag_curve: DragCurve::standard(StandardDrag::G7, 0.223).unwrap(),
            atmosphere: Atmosphere::icao_standard(),
            look_angle_rad: 0.0,
            twist_in: 0.0,
            length_in: 0.0,
            diameter_in: 0.0,
            weight_gr: 168.0,
            barrel_elevation_rad: 0.0,
            barrel_azimuth_rad: 0.0,
            sight_height_ft: 2.0 / 12.0,
            cant_cos: 1.0,
            cant_sin: 0.0,
            alt0_ft: 0.0,
            calc_step_ft: 1.0,
            muzzle_velocity_fps: 2750.0,
            stability_coefficient: 1.0,
            coriolis: None,
            winds: vec![],
        }
    }

    #[test]
    fn zero_angle_converges_to_a_small_positive_elevation_at_100_yards() {
        let shot = flat_shot();
        let elevation = zero_angle(&shot, 300.0, false).unwrap();
        assert!(elevation > 0.0 && elevation < 5f64.to_radians());
    }

    #[test]
    fn zero_angle_rejects_distances_beyond_max_range() {
        let shot = flat_shot();
        let err = zero_angle(&shot, 1.0e7, false).unwrap_err();
        assert!(matches!(err, BallisticError::OutOfRange { .. }));
    }

    #[test]
    fn find_max_range_returns_a_positive_elevation_and_range() {
        let shot = flat_shot();
        let (range_ft, elevation) = find_max_range(&shot, 0.0, 80f64.to_radians()).unwrap();
        assert!(elevation > 0.0);
        assert!(range_ft > 1000.0);
    }

    #[test]
    fn apex_has_near_zero_vertical_velocity() {
        let mut shot = flat_shot();
        shot.barrel_elevation_rad = 5f64.to_radians();
        let apex = find_apex(&shot).unwrap();
        assert!(apex.velocity.y.abs() < 5.0);
        assert!(apex.position.x > 0.0);
    }
}
