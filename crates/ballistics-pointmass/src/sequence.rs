//! The raw, append-only trajectory buffer and the monotone-key lookups used
//! to locate events and sampled rows in it (spec §3/§4.G).

use ballistics_core::{BallisticError, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Starting capacity of a fresh [`TrajectorySequence`]; it doubles from here
/// as points are appended (spec §5 resource ownership).
pub const INITIAL_CAPACITY: usize = 256;

/// One integrator step's worth of raw state.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawTrajPoint {
    pub time_s: f64,
    pub position: Vector3,
    pub velocity: Vector3,
    pub mach_ratio: f64,
}

/// A field the sequence can be searched or interpolated on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Time,
    Mach,
    Px,
    Py,
    Pz,
    Vx,
    Vy,
    Vz,
}

impl Key {
    fn extract(self, p: &RawTrajPoint) -> f64 {
        match self {
            Key::Time => p.time_s,
            Key::Mach => p.mach_ratio,
            Key::Px => p.position.x,
            Key::Py => p.position.y,
            Key::Pz => p.position.z,
            Key::Vx => p.velocity.x,
            Key::Vy => p.velocity.y,
            Key::Vz => p.velocity.z,
        }
    }
}

/// Append-only buffer of [`RawTrajPoint`], owned exclusively by the
/// integrator during integration and handed read-only to the event filter
/// and solver afterward (spec §3 Lifecycle).
#[derive(Clone, Debug, Default)]
pub struct TrajectorySequence {
    points: Vec<RawTrajPoint>,
}

impl TrajectorySequence {
    pub fn new() -> Self {
        Self { points: Vec::with_capacity(INITIAL_CAPACITY) }
    }

    pub fn push(&mut self, point: RawTrajPoint) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Indexes like a Python-style list: negative indices count from the end.
    pub fn at(&self, index: isize) -> Option<&RawTrajPoint> {
        let len = self.points.len() as isize;
        let i = if index < 0 { len + index } else { index };
        if i < 0 || i >= len {
            None
        } else {
            self.points.get(i as usize)
        }
    }

    pub fn first(&self) -> Option<&RawTrajPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&RawTrajPoint> {
        self.points.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawTrajPoint> {
        self.points.iter()
    }

    /// Locate the center index `i` (`1 <= i <= len-2`) such that
    /// `buf[i-1], buf[i], buf[i+1]` bracket `value` along `key`, honoring
    /// whichever of increasing/decreasing direction applies locally.
    /// Returns `-1` (as `None`) if fewer than three points exist or no
    /// bracket contains `value`.
    pub fn bisect_center_idx(&self, key: Key, value: f64) -> Option<usize> {
        self.bisect_center_idx_with(|p| key.extract(p), value)
    }

    fn bisect_center_idx_with(&self, key_fn: impl Fn(&RawTrajPoint) -> f64, value: f64) -> Option<usize> {
        let len = self.points.len();
        if len < 3 {
            return None;
        }
        for j in 0..len - 1 {
            let a = key_fn(&self.points[j]);
            let b = key_fn(&self.points[j + 1]);
            let brackets = (a <= value && value <= b) || (b <= value && value <= a);
            if !brackets {
                continue;
            }
            if j >= 1 {
                return Some(j);
            }
            if j + 2 < len {
                return Some(j + 1);
            }
        }
        None
    }

    /// Locate and interpolate a row at `key_fn = value` in one step, using
    /// an arbitrary scalar key rather than one of the built-in [`Key`]s.
    /// Used internally by the event filter for crossing detection (zero
    /// height, Mach=1, `vy=0`) where the key is a small expression rather
    /// than a raw field.
    pub(crate) fn find_and_interpolate(
        &self,
        key_fn: impl Fn(&RawTrajPoint) -> f64 + Copy,
        value: f64,
    ) -> Option<RawTrajPoint> {
        let idx = self.bisect_center_idx_with(key_fn, value)?;
        self.interpolate_at_with(idx, key_fn, value).ok()
    }

    /// Interpolate a full row at `key = value` using the three neighbours
    /// centered on `idx` (as returned by [`Self::bisect_center_idx`]).
    pub fn interpolate_at(&self, idx: usize, key: Key, value: f64) -> Result<RawTrajPoint, BallisticError> {
        self.interpolate_at_with(idx, |p| key.extract(p), value)
    }

    fn interpolate_at_with(
        &self,
        idx: usize,
        key_fn: impl Fn(&RawTrajPoint) -> f64,
        value: f64,
    ) -> Result<RawTrajPoint, BallisticError> {
        if idx == 0 || idx + 1 >= self.points.len() {
            return Err(BallisticError::numeric("interpolate_at: index has no two neighbours"));
        }
        let p0 = &self.points[idx - 1];
        let p1 = &self.points[idx];
        let p2 = &self.points[idx + 1];
        let k0 = key_fn(p0);
        let k1 = key_fn(p1);
        let k2 = key_fn(p2);

        let time_s = interpolate_field(k0, p0.time_s, k1, p1.time_s, k2, p2.time_s, value)?;
        let px = interpolate_field(k0, p0.position.x, k1, p1.position.x, k2, p2.position.x, value)?;
        let py = interpolate_field(k0, p0.position.y, k1, p1.position.y, k2, p2.position.y, value)?;
        let pz = interpolate_field(k0, p0.position.z, k1, p1.position.z, k2, p2.position.z, value)?;
        let vx = interpolate_field(k0, p0.velocity.x, k1, p1.velocity.x, k2, p2.velocity.x, value)?;
        let vy = interpolate_field(k0, p0.velocity.y, k1, p1.velocity.y, k2, p2.velocity.y, value)?;
        let vz = interpolate_field(k0, p0.velocity.z, k1, p1.velocity.z, k2, p2.velocity.z, value)?;
        let mach_ratio = interpolate_field(k0, p0.mach_ratio, k1, p1.mach_ratio, k2, p2.mach_ratio, value)?;

        Ok(RawTrajPoint {
            time_s,
            position: Vector3::new(px, py, pz),
            velocity: Vector3::new(vx, vy, vz),
            mach_ratio,
        })
    }

    /// Search for the first bracket containing `value` along `key`, starting
    /// from the index whose time first reaches `start_time_hint` (or the
    /// start of the buffer), scanning forward then, failing that, backward.
    pub fn get_at(&self, key: Key, value: f64, start_time_hint: Option<f64>) -> Result<RawTrajPoint, BallisticError> {
        self.get_at_with(|p| key.extract(p), value, start_time_hint)
    }

    /// Same as [`Self::get_at`], but keyed on the slant height
    /// `py*cos(look) - px*sin(look)` rather than one of the built-in [`Key`]s.
    pub fn get_at_slant_height(
        &self,
        look_angle_rad: f64,
        value: f64,
        start_time_hint: Option<f64>,
    ) -> Result<RawTrajPoint, BallisticError> {
        let (sin_l, cos_l) = look_angle_rad.sin_cos();
        self.get_at_with(
            |p| p.position.y * cos_l - p.position.x * sin_l,
            value,
            start_time_hint,
        )
    }

    fn get_at_with(
        &self,
        key_fn: impl Fn(&RawTrajPoint) -> f64,
        value: f64,
        start_time_hint: Option<f64>,
    ) -> Result<RawTrajPoint, BallisticError> {
        let len = self.points.len();
        if len < 3 {
            return Err(BallisticError::numeric("get_at: fewer than three points in sequence"));
        }
        let start = match start_time_hint {
            Some(t) => self.points.iter().position(|p| p.time_s >= t).unwrap_or(len - 1),
            None => 0,
        };

        if let Some(idx) = self.find_bracket_from(&key_fn, value, start, true) {
            return self.interpolate_at_with(idx, &key_fn, value);
        }
        if let Some(idx) = self.find_bracket_from(&key_fn, value, start, false) {
            return self.interpolate_at_with(idx, &key_fn, value);
        }
        Err(BallisticError::numeric(format!("get_at: value {value} not bracketed in sequence")))
    }

    fn find_bracket_from(
        &self,
        key_fn: impl Fn(&RawTrajPoint) -> f64,
        value: f64,
        start: usize,
        forward: bool,
    ) -> Option<usize> {
        let len = self.points.len();
        let range: Box<dyn Iterator<Item = usize>> =
            if forward { Box::new(start..len.saturating_sub(1)) } else { Box::new((0..start).rev()) };
        for j in range {
            if j + 1 >= len {
                continue;
            }
            let a = key_fn(&self.points[j]);
            let b = key_fn(&self.points[j + 1]);
            let brackets = (a <= value && value <= b) || (b <= value && value <= a);
            if !brackets {
                continue;
            }
            if j >= 1 {
                return Some(j);
            }
            if j + 2 < len {
                return Some(j + 1);
            }
        }
        None
    }
}

/// Local three-point monotone Hermite interpolation of one scalar field
/// against a key axis, used by [`TrajectorySequence::interpolate_at`].
/// Interior slope uses the Fritsch-Carlson weighted harmonic mean; the two
/// endpoint slopes are the adjoining one-sided secants.
fn interpolate_field(
    k0: f64,
    f0: f64,
    k1: f64,
    f1: f64,
    k2: f64,
    f2: f64,
    value: f64,
) -> Result<f64, BallisticError> {
    let h0 = k1 - k0;
    let h1 = k2 - k1;
    if h0 == 0.0 || h1 == 0.0 {
        return Err(BallisticError::numeric("interpolate_field: identical abscissae"));
    }
    let d0 = (f1 - f0) / h0;
    let d1 = (f2 - f1) / h1;
    let m1 = if d0 == 0.0 || d1 == 0.0 || d0.signum() != d1.signum() {
        0.0
    } else {
        let w0 = 2.0 * h1 + h0;
        let w1 = h1 + 2.0 * h0;
        (w0 + w1) / (w0 / d0 + w1 / d1)
    };

    let in_first = (k0 <= value && value <= k1) || (k1 <= value && value <= k0);
    if in_first {
        Ok(cubic_hermite(k0, f0, d0, k1, f1, m1, value))
    } else {
        Ok(cubic_hermite(k1, f1, m1, k2, f2, d1, value))
    }
}

/// Standard two-point cubic Hermite evaluated at `value` in `[k_a, k_b]`.
fn cubic_hermite(k_a: f64, f_a: f64, m_a: f64, k_b: f64, f_b: f64, m_b: f64, value: f64) -> f64 {
    let h = k_b - k_a;
    let t = (value - k_a) / h;
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    h00 * f_a + h10 * h * m_a + h01 * f_b + h11 * h * m_b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(t: f64, x: f64, y: f64) -> RawTrajPoint {
        RawTrajPoint { time_s: t, position: Vector3::new(x, y, 0.0), velocity: Vector3::new(100.0, -t, 0.0), mach_ratio: 1.0 - 0.01 * t }
    }

    fn sample_sequence() -> TrajectorySequence {
        let mut seq = TrajectorySequence::new();
        for i in 0..10 {
            let t = i as f64 * 0.1;
            seq.push(point(t, t * 100.0, 10.0 - t * t));
        }
        seq
    }

    #[test]
    fn bisect_returns_none_below_three_points() {
        let mut seq = TrajectorySequence::new();
        seq.push(point(0.0, 0.0, 0.0));
        seq.push(point(0.1, 10.0, 9.9));
        assert_eq!(seq.bisect_center_idx(Key::Time, 0.05), None);
    }

    #[test]
    fn interpolate_at_time_recovers_position() {
        let seq = sample_sequence();
        let idx = seq.bisect_center_idx(Key::Time, 0.35).unwrap();
        let row = seq.interpolate_at(idx, Key::Time, 0.35).unwrap();
        assert!((row.time_s - 0.35).abs() < 1e-9);
        assert!((row.position.x - 35.0).abs() < 1e-6);
    }

    #[test]
    fn get_at_finds_value_without_hint() {
        let seq = sample_sequence();
        let row = seq.get_at(Key::Px, 250.0, None).unwrap();
        assert!((row.position.x - 250.0).abs() < 1e-6);
    }

    #[test]
    fn get_at_slant_height_uses_synthetic_key() {
        let seq = sample_sequence();
        // at look=0, slant height is just py
        let row = seq.get_at_slant_height(0.0, 9.0, None).unwrap();
        assert!((row.position.y - 9.0).abs() < 1e-6);
    }

    #[test]
    fn get_at_reports_numeric_error_outside_range() {
        let seq = sample_sequence();
        assert!(seq.get_at(Key::Px, 10_000.0, None).is_err());
    }

    #[test]
    fn negative_indexing_reaches_the_end() {
        let seq = sample_sequence();
        assert_eq!(seq.at(-1), seq.last());
        assert_eq!(seq.at(0), seq.first());
    }
}
