//! Piecewise-constant wind segments and the per-shot cursor over them.

use crate::vector3::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One leg of a piecewise-constant wind field.
///
/// `from_direction_rad = 0` means the wind blows toward the shooter
/// (headwind); `π/2` means it blows from the shooter's left. Only the
/// horizontal component is modeled — vertical wind is out of scope.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WindSegment {
    /// Downrange distance (ft) at which this segment ends.
    pub until_distance_ft: f64,
    pub velocity_fps: f64,
    pub from_direction_rad: f64,
}

/// Distance beyond which a `WindSegment` list's last entry is treated as
/// extending indefinitely, matching the spec's `1e8 ft` sentinel.
pub const WIND_SENTINEL_FT: f64 = 1.0e8;

impl WindSegment {
    pub fn new(until_distance_ft: f64, velocity_fps: f64, from_direction_rad: f64) -> Self {
        Self { until_distance_ft, velocity_fps, from_direction_rad }
    }

    /// The wind vector in the sight frame: `(v*cos(theta), 0, v*sin(theta))`.
    pub fn vector(&self) -> Vector3 {
        let (sin_t, cos_t) = self.from_direction_rad.sin_cos();
        Vector3::new(self.velocity_fps * cos_t, 0.0, self.velocity_fps * sin_t)
    }
}

/// A per-call, per-shot cursor over a shot's wind segments.
///
/// Owns no segment data (it borrows); `ShotProps` holds the immutable
/// segment list, the integrator owns a fresh `WindSock` scratch cursor per
/// run so that concurrent shots never share mutable wind state (spec §5, §9).
pub struct WindSock<'a> {
    segments: &'a [WindSegment],
    idx: usize,
}

impl<'a> WindSock<'a> {
    pub fn new(segments: &'a [WindSegment]) -> Self {
        Self { segments, idx: 0 }
    }

    /// The wind vector for the range last passed to `vector_for_range`, or
    /// the first segment's vector (or zero, if there are none) initially.
    pub fn current_vector(&self) -> Vector3 {
        self.segments.get(self.idx).map_or(Vector3::ZERO, WindSegment::vector)
    }

    /// Advance the cursor monotonically to cover `range_ft`, recomputing
    /// only when a segment boundary is crossed, and return the wind vector
    /// there. An empty segment list always returns zero.
    pub fn vector_for_range(&mut self, range_ft: f64) -> Vector3 {
        while self.idx + 1 < self.segments.len() && range_ft >= self.segments[self.idx].until_distance_ft {
            self.idx += 1;
        }
        self.current_vector()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use core::f64::consts::FRAC_PI_2;

    #[test]
    fn empty_segments_is_always_zero() {
        let mut sock = WindSock::new(&[]);
        assert_eq!(sock.current_vector(), Vector3::ZERO);
        assert_eq!(sock.vector_for_range(5000.0), Vector3::ZERO);
    }

    #[test]
    fn headwind_direction_convention() {
        let seg = WindSegment::new(WIND_SENTINEL_FT, 10.0, 0.0);
        let v = seg.vector();
        assert_relative_eq!(v.x, 10.0, epsilon = 1e-12);
        assert_relative_eq!(v.z, 0.0, epsilon = 1e-12);

        let left = WindSegment::new(WIND_SENTINEL_FT, 10.0, FRAC_PI_2);
        let v2 = left.vector();
        assert_relative_eq!(v2.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v2.z, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn cursor_advances_monotonically_across_segments() {
        let segs = [
            WindSegment::new(300.0, 5.0, 0.0),
            WindSegment::new(600.0, 10.0, FRAC_PI_2),
            WindSegment::new(WIND_SENTINEL_FT, 0.0, 0.0),
        ];
        let mut sock = WindSock::new(&segs);
        assert_relative_eq!(sock.vector_for_range(100.0).x, 5.0, epsilon = 1e-12);
        assert_relative_eq!(sock.vector_for_range(450.0).z, 10.0, epsilon = 1e-12);
        // Once past the second segment, the third (zero) segment applies.
        let v = sock.vector_for_range(900.0);
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.z, 0.0, epsilon = 1e-12);
    }
}
