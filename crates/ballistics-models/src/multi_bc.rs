//! Multi-BC composition: several `(BC, velocity)` anchors folded into a
//! single effective `Cd(Mach)` curve, cached once at construction rather
//! than rescaled on every integration step (spec §4.B).

use ballistics_core::BallisticError;

use crate::pchip::{MachCdPoint, PchipCurve};
use crate::tables::StandardDrag;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One `(velocity_fps, ballistic_coefficient)` breakpoint of a multi-BC
/// table, highest velocity first.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BcAnchor {
    pub velocity_fps: f64,
    pub bc: f64,
}

impl BcAnchor {
    pub fn new(velocity_fps: f64, bc: f64) -> Self {
        Self { velocity_fps, bc }
    }
}

/// A velocity-interpolated BC curve composed against a single underlying
/// standard drag shape, pre-baked into one `Cd_eff(Mach)` PCHIP curve so the
/// integrator never re-derives BC per step.
#[derive(Clone, Debug)]
pub struct MultiBc {
    effective: PchipCurve,
}

impl MultiBc {
    /// `anchors` must be sorted by descending velocity and non-empty.
    /// `mach_ref_fps` converts each anchor's velocity into the Mach domain
    /// of `drag.points()` using the reference speed of sound at the time
    /// the shot is built (spec §4.B: BC is resolved against the shot's
    /// standard table, not re-derived per atmosphere sample).
    pub fn build(
        drag: StandardDrag,
        anchors: &[BcAnchor],
        mach_ref_fps: f64,
    ) -> Result<Self, BallisticError> {
        if anchors.is_empty() {
            return Err(BallisticError::config("multi-BC table must have at least one anchor"));
        }
        if anchors.iter().any(|a| a.bc <= 0.0) {
            return Err(BallisticError::config("multi-BC anchors must have positive BC"));
        }
        for w in anchors.windows(2) {
            if w[1].velocity_fps >= w[0].velocity_fps {
                return Err(BallisticError::config(
                    "multi-BC anchors must be sorted by strictly descending velocity",
                ));
            }
        }
        if mach_ref_fps <= 0.0 {
            return Err(BallisticError::config("mach reference speed must be positive"));
        }

        let base = PchipCurve::build(&drag.points())?;
        let bc_at_velocity = |v: f64| -> f64 { interpolate_bc(anchors, v) };

        // Resample the base Cd(Mach) curve at its own knots, scaling by the
        // BC appropriate to the velocity each knot represents, then rebuild
        // a PCHIP curve over the resulting effective Cd values.
        let mut effective_points = Vec::new();
        let mut mach = drag.points().first().unwrap().mach.max(0.0);
        let mach_max = drag.points().last().unwrap().mach;
        let mach_step = ((mach_max - mach) / 80.0).max(1e-6);
        while mach <= mach_max + mach_step * 0.5 {
            let velocity_fps = mach * mach_ref_fps;
            let bc = bc_at_velocity(velocity_fps);
            let cd = base.evaluate(mach) / bc;
            effective_points.push(MachCdPoint::new(mach, cd));
            mach += mach_step;
        }

        Ok(Self { effective: PchipCurve::build(&effective_points)? })
    }

    /// Effective drag coefficient at `mach`, already BC-normalized.
    pub fn cd_effective(&self, mach: f64) -> f64 {
        self.effective.evaluate(mach)
    }
}

/// Piecewise-linear BC(v), clamped to the endpoint BC outside the anchor
/// range; `anchors` is sorted by descending velocity.
fn interpolate_bc(anchors: &[BcAnchor], velocity_fps: f64) -> f64 {
    if velocity_fps >= anchors[0].velocity_fps {
        return anchors[0].bc;
    }
    let last = anchors.len() - 1;
    if velocity_fps <= anchors[last].velocity_fps {
        return anchors[last].bc;
    }
    for w in anchors.windows(2) {
        let (hi, lo) = (w[0], w[1]);
        if velocity_fps <= hi.velocity_fps && velocity_fps >= lo.velocity_fps {
            let t = (velocity_fps - lo.velocity_fps) / (hi.velocity_fps - lo.velocity_fps);
            return lo.bc + t * (hi.bc - lo.bc);
        }
    }
    anchors[last].bc
}
