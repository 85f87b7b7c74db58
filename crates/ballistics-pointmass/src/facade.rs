//! The single entry point callers use: build a shot, fire it, and read the
//! result back (spec §4.J).

use ballistics_core::BallisticError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::events::{self, EnrichedRow, EventFlag, SEPARATE_ROW_TIME_DELTA};
use crate::integrator::{DEFAULT_STEP_MULTIPLIER, Engine, Integrator, TerminationReason};
use crate::sequence::{Key, RawTrajPoint, TrajectorySequence};
use crate::shot::{Ammo, Shot, ShotProps, Weapon};

/// Per-call request: how far to integrate, how densely to sample range rows,
/// and which event/row kinds to emit (spec §6 `Call`).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Call {
    pub range_limit_ft: f64,
    pub range_step_ft: f64,
    pub time_step_s: f64,
    pub flags: EventFlag,
}

/// Everything about *how* a shot is computed that isn't part of the physical
/// scenario: engine choice, step policy, and the flags the source used to
/// keep as process-wide globals (spec §9 DESIGN NOTES: "no process
/// singleton").
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    pub engine: Engine,
    pub c_step_multiplier: f64,
    pub max_step_s: Option<f64>,
    pub min_altitude_ft: f64,
    pub apply_powder_sensitivity: bool,
    pub calc_step_ft: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: Engine::default(),
            c_step_multiplier: DEFAULT_STEP_MULTIPLIER,
            max_step_s: None,
            min_altitude_ft: -100_000.0,
            apply_powder_sensitivity: true,
            calc_step_ft: 0.5,
        }
    }
}

/// The full output of one [`fire`] call: the enriched rows requested by the
/// caller's flags plus read-only access to the raw trajectory buffer behind
/// them (spec §3 `HitResult`). Dropping a `HitResult` releases the buffer.
#[derive(Clone, Debug)]
pub struct HitResult {
    raw: TrajectorySequence,
    rows: Vec<EnrichedRow>,
    termination_reason: TerminationReason,
    look_angle_rad: f64,
}

impl HitResult {
    pub fn rows(&self) -> &[EnrichedRow] {
        &self.rows
    }

    pub fn termination_reason(&self) -> TerminationReason {
        self.termination_reason
    }

    /// Rows flagged `ZeroUp` or `ZeroDown`, in time order (empty unless the
    /// originating call requested them).
    pub fn zeros(&self) -> impl Iterator<Item = &EnrichedRow> {
        self.rows.iter().filter(|r| r.flags.intersects(EventFlag::ZERO))
    }

    /// Interpolates a raw point at `key = value` directly from the
    /// underlying trajectory buffer, independent of which rows were emitted.
    pub fn get_at(&self, key: Key, value: f64) -> Result<RawTrajPoint, BallisticError> {
        self.raw.get_at(key, value, None)
    }

    /// The trajectory's apex (`vy = 0`), read from the raw buffer regardless
    /// of whether `Apex` was requested in the originating call.
    pub fn apex(&self) -> Result<RawTrajPoint, BallisticError> {
        self.raw
            .find_and_interpolate(|p| p.velocity.y, 0.0)
            .ok_or_else(|| BallisticError::numeric("apex: trajectory never reaches an apex"))
    }

    /// Range interval `(near_ft, far_ft)`, measured along the line of sight,
    /// over which the trajectory stays within `target_height_ft / 2` of its
    /// slant height at `at_range_ft` (spec §3: danger space).
    pub fn danger_space(&self, at_range_ft: f64, target_height_ft: f64) -> Result<(f64, f64), BallisticError> {
        if self.raw.len() < 3 {
            return Err(BallisticError::numeric("danger_space: trajectory too short to search"));
        }
        let center = self.raw.get_at(Key::Px, at_range_ft, None)?;
        let (sin_l, cos_l) = self.look_angle_rad.sin_cos();
        let slant = |p: &RawTrajPoint| p.position.y * cos_l - p.position.x * sin_l;
        let s0 = slant(&center);
        let half = target_height_ft.abs() / 2.0;

        let points: Vec<&RawTrajPoint> = self.raw.iter().collect();
        let center_idx = points.iter().position(|p| p.position.x >= at_range_ft).unwrap_or(points.len() - 1);

        let near_ft = scan_for_crossing(&points, center_idx, s0, half, slant, false)?;
        let far_ft = scan_for_crossing(&points, center_idx, s0, half, slant, true)?;
        Ok((near_ft, far_ft))
    }
}

fn scan_for_crossing(
    points: &[&RawTrajPoint],
    center_idx: usize,
    s0: f64,
    half: f64,
    slant: impl Fn(&RawTrajPoint) -> f64,
    forward: bool,
) -> Result<f64, BallisticError> {
    let g = |p: &RawTrajPoint| (slant(p) - s0).abs();
    if forward {
        for i in center_idx..points.len().saturating_sub(1) {
            let (a, b) = (g(points[i]), g(points[i + 1]));
            if (a <= half && half <= b) || (b <= half && half <= a) {
                return Ok(lerp(points[i].position.x, a, points[i + 1].position.x, b, half));
            }
        }
    } else {
        let mut i = center_idx;
        while i > 0 {
            let (a, b) = (g(points[i - 1]), g(points[i]));
            if (a <= half && half <= b) || (b <= half && half <= a) {
                return Ok(lerp(points[i - 1].position.x, a, points[i].position.x, b, half));
            }
            i -= 1;
        }
    }
    Err(BallisticError::numeric("danger_space: no crossing found in either direction"))
}

fn lerp(x0: f64, y0: f64, x1: f64, y1: f64, target: f64) -> f64 {
    if (y1 - y0).abs() < 1e-15 {
        return x0;
    }
    x0 + (target - y0) * (x1 - x0) / (y1 - y0)
}

/// Computes a shot end to end: builds `ShotProps`, integrates, runs the
/// event filter, and appends the terminal raw point if it wasn't already
/// captured by a requested row (spec §4.J).
pub fn fire(shot: &Shot, weapon: &Weapon, ammo: &Ammo, call: Call, config: &Config) -> Result<HitResult, BallisticError> {
    log::debug!(
        "fire: range_limit={}ft range_step={}ft time_step={}s flags={:?}",
        call.range_limit_ft,
        call.range_step_ft,
        call.time_step_s,
        call.flags,
    );

    let mut effective_ammo = ammo.clone();
    if !config.apply_powder_sensitivity {
        effective_ammo.temp_sensitivity = None;
    }

    let props = ShotProps::new(shot, weapon, &effective_ammo, config.calc_step_ft)?;
    let integrator = Integrator::new(&props, config.engine, config.c_step_multiplier, config.max_step_s, config.min_altitude_ft);
    let (raw, termination_reason) = integrator.run(call.range_limit_ft);

    let mut rows = events::run(&props, &raw, call.flags, call.range_step_ft, call.time_step_s);

    if let Some(last) = raw.last() {
        let already_captured =
            rows.last().is_some_and(|r| (r.time_s - last.time_s).abs() < SEPARATE_ROW_TIME_DELTA);
        if !already_captured {
            rows.push(events::enrich_terminal(&props, last));
        }
    }

    Ok(HitResult { raw, rows, termination_reason, look_angle_rad: props.look_angle_rad })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballistics_core::Atmosphere;
    use ballistics_models::{DragCurve, StandardDrag};

    fn scenario() -> (Shot, Weapon, Ammo) {
        let shot = Shot {
            atmosphere: Atmosphere::icao_standard(),
            winds: vec![],
            look_angle_rad: 0.0,
            cant_angle_rad: 0.0,
            relative_angle_rad: 0.0,
            azimuth_rad: None,
            latitude_rad: None,
        };
        let weapon = Weapon { sight_height_ft: 2.0 / 12.0, twist_in_signed: 11.24, zero_elevation_rad: 0.00123 };
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
    fn fire_produces_rows_ordered_by_increasing_time() {
        let (shot, weapon, ammo) = scenario();
        let call = Call { range_limit_ft: 3000.0, range_step_ft: 300.0, time_step_s: 0.0, flags: EventFlag::ALL };
        let result = fire(&shot, &weapon, &ammo, call, &Config::default()).unwrap();
        assert!(!result.rows().is_empty());
        for pair in result.rows().windows(2) {
            assert!(pair[1].time_s >= pair[0].time_s);
        }
    }

    #[test]
    fn apex_and_danger_space_are_available_without_requesting_apex_flag() {
        let (shot, weapon, ammo) = scenario();
        let call = Call { range_limit_ft: 3000.0, range_step_ft: 0.0, time_step_s: 0.0, flags: EventFlag::empty() };
        let result = fire(&shot, &weapon, &ammo, call, &Config::default()).unwrap();
        assert!(result.rows().is_empty());
        let apex = result.apex().unwrap();
        assert!(apex.velocity.y.abs() < 5.0);
        let (near, far) = result.danger_space(apex.position.x, 18.0 / 12.0).unwrap();
        assert!(near < apex.position.x && apex.position.x < far);
    }
}
