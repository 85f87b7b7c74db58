//! Monotone cubic (PCHIP / Fritsch-Carlson) interpolation over a
//! `(Mach, Cd)` table, with linear extrapolation beyond the table's ends.

use ballistics_core::BallisticError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One published `(Mach, Cd)` table entry. The table must be strictly
/// increasing in `mach`; `mach = 0` is permitted as the first point.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MachCdPoint {
    pub mach: f64,
    pub cd: f64,
}

impl MachCdPoint {
    pub fn new(mach: f64, cd: f64) -> Self {
        Self { mach, cd }
    }
}

#[derive(Clone, Copy, Debug)]
struct Segment {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
}

/// A monotone cubic interpolant over a `(Mach, Cd)` table: the core of
/// component B (spec §4.B). Stores the per-segment cubic coefficients and
/// the boundary slopes used for linear extrapolation outside the table.
#[derive(Clone, Debug)]
pub struct PchipCurve {
    knots: Vec<f64>,
    values: Vec<f64>,
    segments: Vec<Segment>,
    slope_first: f64,
    slope_last: f64,
}

impl PchipCurve {
    /// Build a PCHIP interpolant from a table with at least two points,
    /// strictly increasing in Mach.
    pub fn build(points: &[MachCdPoint]) -> Result<Self, BallisticError> {
        if points.len() < 2 {
            return Err(BallisticError::config(format!(
                "drag table needs at least 2 points, got {}",
                points.len()
            )));
        }
        for w in points.windows(2) {
            if w[1].mach <= w[0].mach {
                return Err(BallisticError::config(format!(
                    "drag table Mach values must be strictly increasing: {} then {}",
                    w[0].mach, w[1].mach
                )));
            }
        }

        let knots: Vec<f64> = points.iter().map(|p| p.mach).collect();
        let values: Vec<f64> = points.iter().map(|p| p.cd).collect();
        let slopes = pchip_slopes(&knots, &values);

        let n = knots.len();
        let mut segments = Vec::with_capacity(n - 1);
        for i in 0..n - 1 {
            let h = knots[i + 1] - knots[i];
            let delta = (values[i + 1] - values[i]) / h;
            let m0 = slopes[i];
            let m1 = slopes[i + 1];
            segments.push(Segment {
                d: values[i],
                c: m0,
                b: (3.0 * delta - 2.0 * m0 - m1) / h,
                a: (m0 + m1 - 2.0 * delta) / (h * h),
            });
        }

        Ok(Self {
            knots,
            values,
            segments,
            slope_first: slopes[0],
            slope_last: slopes[n - 1],
        })
    }

    pub fn mach_min(&self) -> f64 {
        self.knots[0]
    }

    pub fn mach_max(&self) -> f64 {
        *self.knots.last().expect("validated non-empty in build")
    }

    /// Evaluate the interpolant at `mach`. Outside `[mach_min, mach_max]`
    /// this is a linear extension using the boundary PCHIP slope. At an
    /// exact interior knot, ties resolve to the segment on the left.
    pub fn evaluate(&self, mach: f64) -> f64 {
        if mach < self.mach_min() {
            let delta = mach - self.mach_min();
            return self.values[0] + self.slope_first * delta;
        }
        if mach > self.mach_max() {
            let last = self.values.len() - 1;
            let delta = mach - self.knots[last];
            return self.values[last] + self.slope_last * delta;
        }

        let seg_idx = self.segment_index_for(mach);
        let seg = &self.segments[seg_idx];
        let delta = mach - self.knots[seg_idx];
        seg.d + delta * (seg.c + delta * (seg.b + delta * seg.a))
    }

    /// Rightmost segment index whose left knot is `<= mach`, with exact
    /// knot ties resolved to the segment on the left (spec §4.B).
    fn segment_index_for(&self, mach: f64) -> usize {
        let idx = match self
            .knots
            .binary_search_by(|probe| probe.partial_cmp(&mach).expect("Mach is never NaN"))
        {
            Ok(i) if i > 0 => i - 1,
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        idx.min(self.segments.len() - 1)
    }
}

/// Fritsch-Carlson monotone slopes (the weighted-harmonic-mean formulation)
/// for a strictly increasing `x` with matching `y`.
fn pchip_slopes(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let h: Vec<f64> = (0..n - 1).map(|i| x[i + 1] - x[i]).collect();
    let delta: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

    let mut m = vec![0.0; n];

    if n == 2 {
        m[0] = delta[0];
        m[1] = delta[0];
        return m;
    }

    for i in 1..n - 1 {
        let d0 = delta[i - 1];
        let d1 = delta[i];
        if d0 == 0.0 || d1 == 0.0 || d0.signum() != d1.signum() {
            m[i] = 0.0;
        } else {
            let w1 = 2.0 * h[i] + h[i - 1];
            let w2 = h[i] + 2.0 * h[i - 1];
            m[i] = (w1 + w2) / (w1 / d0 + w2 / d1);
        }
    }

    m[0] = end_slope(h[0], h[1], delta[0], delta[1]);
    let last = n - 1;
    m[last] = end_slope(h[last - 1], h[last - 2], delta[last - 1], delta[last - 2]);

    m
}

/// Shape-preserving one-sided three-point endpoint slope (Fritsch-Carlson).
fn end_slope(h0: f64, h1: f64, d0: f64, d1: f64) -> f64 {
    let mut m = ((2.0 * h0 + h1) * d0 - h0 * d1) / (h0 + h1);
    if m.signum() != d0.signum() {
        m = 0.0;
    } else if d0.signum() != d1.signum() && m.abs() > (3.0 * d0).abs() {
        m = 3.0 * d0;
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn table(points: &[(f64, f64)]) -> PchipCurve {
        let pts: Vec<MachCdPoint> = points.iter().map(|&(m, c)| MachCdPoint::new(m, c)).collect();
        PchipCurve::build(&pts).unwrap()
    }

    #[test]
    fn evaluates_knots_exactly() {
        let curve = table(&[(0.0, 0.3), (0.5, 0.25), (1.0, 0.5), (1.5, 0.35), (2.0, 0.28)]);
        for &(m, c) in &[(0.0, 0.3), (0.5, 0.25), (1.0, 0.5), (1.5, 0.35), (2.0, 0.28)] {
            assert_relative_eq!(curve.evaluate(m), c, epsilon = 1e-12);
        }
    }

    #[test]
    fn monotone_input_gives_monotone_segment() {
        // strictly increasing table -> PCHIP must not overshoot between knots
        let curve = table(&[(0.0, 0.1), (1.0, 0.4), (2.0, 0.9), (3.0, 1.6)]);
        let mut prev = curve.evaluate(0.0);
        let mut m = 0.05;
        while m <= 3.0 {
            let v = curve.evaluate(m);
            assert!(v + 1e-9 >= prev, "non-monotone at mach={m}: {v} < {prev}");
            prev = v;
            m += 0.05;
        }
    }

    #[test]
    fn rejects_short_or_unsorted_tables() {
        assert!(PchipCurve::build(&[MachCdPoint::new(0.0, 0.3)]).is_err());
        assert!(PchipCurve::build(&[
            MachCdPoint::new(1.0, 0.3),
            MachCdPoint::new(0.5, 0.2),
        ])
        .is_err());
    }

    #[test]
    fn extrapolates_linearly_past_the_ends() {
        let curve = table(&[(0.5, 0.3), (1.0, 0.5), (1.5, 0.35)]);
        let below = curve.evaluate(0.2);
        let at_min = curve.evaluate(0.5);
        // linear extension uses the boundary slope, so it's a straight
        // continuation, not clamped to the endpoint value.
        assert!((below - at_min).abs() > 1e-6);

        let above = curve.evaluate(2.0);
        let at_max = curve.evaluate(1.5);
        assert!((above - at_max).abs() > 1e-6);
    }
}
