//! Event detection: walks the raw trajectory buffer once, emitting enriched
//! rows at Zero-Up/Down, Mach-1, Apex crossings and at fixed range steps
//! (spec §3/§4.H).

use ballistics_core::WindSock;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::sequence::{RawTrajPoint, TrajectorySequence};
use crate::shot::ShotProps;

bitflags::bitflags! {
    /// Which event/row kinds a [`crate::facade::fire`] call should emit
    /// (spec §3, wire-stable bit values per spec §6).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct EventFlag: u8 {
        const ZERO_UP = 1;
        const ZERO_DOWN = 2;
        const MACH = 4;
        const RANGE = 8;
        const APEX = 16;
        const ZERO = Self::ZERO_UP.bits() | Self::ZERO_DOWN.bits();
        const ALL = Self::RANGE.bits() | Self::ZERO.bits() | Self::MACH.bits() | Self::APEX.bits();
    }
}

/// Minimum time separation between an event row and an adjacent range row
/// before they're treated as coincident and merged (spec §4.H, §9 Open
/// Question #2).
pub const SEPARATE_ROW_TIME_DELTA: f64 = 1e-5;

/// A raw point augmented with derived ballistic quantities and the set of
/// events it satisfies (spec §3).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EnrichedRow {
    pub time_s: f64,
    pub range_ft: f64,
    pub height_ft: f64,
    pub windage_ft: f64,
    pub velocity_fps: f64,
    pub mach_ratio: f64,
    pub slant_height_ft: f64,
    pub drop_ft: f64,
    pub drop_angle_rad: f64,
    pub windage_angle_rad: f64,
    pub energy_ft_lb: f64,
    pub optimal_game_weight_lb: f64,
    pub angle_of_velocity_rad: f64,
    pub density_ratio: f64,
    pub drag_magnitude_fps2: f64,
    pub flags: EventFlag,
}

/// Foot-pound energy constant: `E = weight_gr * v_fps^2 / 450_400` (spec §3).
const ENERGY_CONSTANT: f64 = 450_400.0;
/// Optimal-game-weight constant: `w^2 * v^3 * 1.5e-12` (spec §3).
const OPTIMAL_GAME_WEIGHT_CONSTANT: f64 = 1.5e-12;

fn enrich(
    shot: &ShotProps,
    wind_sock: &mut WindSock<'_>,
    p: &RawTrajPoint,
    flags: EventFlag,
) -> EnrichedRow {
    let (sin_look, cos_look) = shot.look_angle_rad.sin_cos();
    let tan_look = sin_look / cos_look;

    let slant_height_ft = p.position.y * cos_look - p.position.x * sin_look;
    let height_above_los = p.position.y - p.position.x * tan_look;
    let drop_ft = -height_above_los;
    let drop_angle_rad = (height_above_los / p.position.x.max(1e-9)).atan();
    let windage_angle_rad = (p.position.z / p.position.x.max(1e-9)).atan();

    let (density_ratio, _mach_ref) = shot.atmosphere.density_factor_and_mach_at(shot.alt0_ft + p.position.y);
    let wind = wind_sock.vector_for_range(p.position.x);
    let v_rel = p.velocity - wind;
    let v_rel_mag = v_rel.magnitude();
    let drag_magnitude_fps2 = density_ratio * shot.drag_curve.drag(p.mach_ratio) * v_rel_mag * v_rel_mag;

    let velocity_fps = p.velocity.magnitude();
    let angle_of_velocity_rad = p.velocity.y.atan2(p.velocity.x);

    EnrichedRow {
        time_s: p.time_s,
        range_ft: p.position.x,
        height_ft: p.position.y,
        windage_ft: p.position.z,
        velocity_fps,
        mach_ratio: p.mach_ratio,
        slant_height_ft,
        drop_ft,
        drop_angle_rad,
        windage_angle_rad,
        energy_ft_lb: shot.weight_gr * velocity_fps * velocity_fps / ENERGY_CONSTANT,
        optimal_game_weight_lb: shot.weight_gr * shot.weight_gr * velocity_fps.powi(3) * OPTIMAL_GAME_WEIGHT_CONSTANT,
        angle_of_velocity_rad,
        density_ratio,
        drag_magnitude_fps2,
        flags,
    }
}

/// Enriches a single point with no event flags set, for use by the facade
/// when the integrator's final raw point wasn't already captured by a
/// requested event or range row.
pub(crate) fn enrich_terminal(shot: &ShotProps, p: &RawTrajPoint) -> EnrichedRow {
    let mut wind_sock = WindSock::new(&shot.winds);
    enrich(shot, &mut wind_sock, p, EventFlag::empty())
}

/// Tracks which zero crossings have already been observed this shot.
/// Transitions are monotonic within a shot: no state ever rewinds
/// (spec §9 DESIGN NOTES).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SeenZero {
    None,
    UpSeen,
    DownSeen,
    Both,
}

impl SeenZero {
    fn mark_up(self) -> Self {
        match self {
            SeenZero::None | SeenZero::UpSeen => SeenZero::UpSeen,
            SeenZero::DownSeen | SeenZero::Both => SeenZero::Both,
        }
    }

    fn mark_down(self) -> Self {
        match self {
            SeenZero::None | SeenZero::DownSeen => SeenZero::DownSeen,
            SeenZero::UpSeen | SeenZero::Both => SeenZero::Both,
        }
    }
}

/// Walks `raw` once, producing the flagged, time-sorted rows requested by
/// `flags` (spec §4.H).
pub fn run(
    shot: &ShotProps,
    raw: &TrajectorySequence,
    flags: EventFlag,
    range_step_ft: f64,
    time_step_s: f64,
) -> Vec<EnrichedRow> {
    let mut rows: Vec<EnrichedRow> = Vec::new();
    if raw.is_empty() {
        return rows;
    }
    log::debug!("events::run: {} raw points, flags={flags:?}", raw.len());

    let mut wind_sock = WindSock::new(&shot.winds);
    let tan_look = shot.look_angle_rad.tan();

    let first = raw.first().unwrap();
    let mut seen_zero = if first.position.y - first.position.x * tan_look >= 0.0 {
        SeenZero::None.mark_up()
    } else {
        SeenZero::None
    };

    let mut next_record_distance = range_step_ft;
    let mut last_recorded_time = f64::NEG_INFINITY;
    let mut pending: Vec<EnrichedRow> = Vec::new();

    let points: Vec<&RawTrajPoint> = raw.iter().collect();
    for window in points.windows(2) {
        let (prev, curr) = (window[0], window[1]);

        if flags.contains(EventFlag::RANGE)
            && range_step_ft > 0.0
            && curr.position.x >= next_record_distance
            && curr.time_s - last_recorded_time >= time_step_s
        {
            if let Some(row) = raw.find_and_interpolate(|p| p.position.x, next_record_distance) {
                last_recorded_time = row.time_s;
                pending.push(enrich(shot, &mut wind_sock, &row, EventFlag::RANGE));
                next_record_distance += range_step_ft;
            }
        }

        if flags.intersects(EventFlag::ZERO) {
            let f_prev = prev.position.y - prev.position.x * tan_look;
            let f_curr = curr.position.y - curr.position.x * tan_look;
            if f_prev.signum() != f_curr.signum() && f_prev != 0.0 {
                if f_prev > 0.0 && seen_zero != SeenZero::Both && seen_zero != SeenZero::DownSeen {
                    if flags.contains(EventFlag::ZERO_DOWN) {
                        if let Some(row) = raw.find_and_interpolate(|p| p.position.y - p.position.x * tan_look, 0.0) {
                            pending.push(enrich(shot, &mut wind_sock, &row, EventFlag::ZERO_DOWN));
                        }
                    }
                    seen_zero = seen_zero.mark_down();
                } else if f_prev < 0.0 && seen_zero != SeenZero::Both && seen_zero != SeenZero::UpSeen {
                    if flags.contains(EventFlag::ZERO_UP) {
                        if let Some(row) = raw.find_and_interpolate(|p| p.position.y - p.position.x * tan_look, 0.0) {
                            pending.push(enrich(shot, &mut wind_sock, &row, EventFlag::ZERO_UP));
                        }
                    }
                    seen_zero = seen_zero.mark_up();
                }
            }
        }

        if flags.contains(EventFlag::MACH) {
            let f_prev = prev.mach_ratio - 1.0;
            let f_curr = curr.mach_ratio - 1.0;
            if f_prev.signum() != f_curr.signum() && f_prev != 0.0 {
                if let Some(row) = raw.find_and_interpolate(|p| p.mach_ratio, 1.0) {
                    pending.push(enrich(shot, &mut wind_sock, &row, EventFlag::MACH));
                }
            }
        }

        if flags.contains(EventFlag::APEX) {
            let (f_prev, f_curr) = (prev.velocity.y, curr.velocity.y);
            if f_prev.signum() != f_curr.signum() && f_prev > 0.0 {
                if let Some(row) = raw.find_and_interpolate(|p| p.velocity.y, 0.0) {
                    pending.push(enrich(shot, &mut wind_sock, &row, EventFlag::APEX));
                }
            }
        }
    }

    pending.sort_by(|a, b| a.time_s.partial_cmp(&b.time_s).expect("row times are never NaN"));
    merge_coincident_rows(pending, &mut rows);
    rows
}

/// Rows within [`SEPARATE_ROW_TIME_DELTA`] of each other are collapsed into
/// one, OR-ing their flag bits (spec §5 ordering guarantees, §9 Open
/// Question #2).
fn merge_coincident_rows(sorted: Vec<EnrichedRow>, out: &mut Vec<EnrichedRow>) {
    for row in sorted {
        match out.last_mut() {
            Some(prev) if (row.time_s - prev.time_s).abs() < SEPARATE_ROW_TIME_DELTA => {
                prev.flags |= row.flags;
            }
            _ => out.push(row),
        }
    }
}
