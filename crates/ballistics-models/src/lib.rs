//! Drag modeling: standard `(Mach, Cd)` tables, PCHIP interpolation, and
//! multi-BC composition, producing a unit drag acceleration coefficient
//! for the integrator in `ballistics-pointmass`.

#![forbid(unsafe_code)]

pub mod multi_bc;
pub mod pchip;
pub mod tables;

use ballistics_core::BallisticError;

pub use multi_bc::{BcAnchor, MultiBc};
pub use pchip::{MachCdPoint, PchipCurve};
pub use tables::StandardDrag;

/// Converts a dimensionless `Cd` into the retardation coefficient used by
/// the point-mass equations of motion (spec §6): `a_drag = drag(mach) * rho_ratio * v^2`.
pub const DRAG_CONSTANT: f64 = 2.08551e-4;

/// A built drag model: either a plain standard table scaled by a single BC,
/// or a multi-BC table whose effective Cd already folds BC in.
#[derive(Clone, Debug)]
pub enum DragCurve {
    StandardTable { curve: PchipCurve, bc: f64 },
    Multi(MultiBc),
}

impl DragCurve {
    /// A standard table (e.g. G1/G7) with a single, velocity-independent BC.
    pub fn standard(drag: StandardDrag, bc: f64) -> Result<Self, BallisticError> {
        if bc <= 0.0 {
            return Err(BallisticError::config("ballistic coefficient must be positive"));
        }
        let curve = PchipCurve::build(&drag.points())?;
        Ok(Self::StandardTable { curve, bc })
    }

    /// A multi-BC table resolved against a standard drag shape.
    pub fn multi_bc(
        drag: StandardDrag,
        anchors: &[BcAnchor],
        mach_ref_fps: f64,
    ) -> Result<Self, BallisticError> {
        Ok(Self::Multi(MultiBc::build(drag, anchors, mach_ref_fps)?))
    }

    /// BC-normalized drag coefficient at the given Mach number.
    pub fn cd_effective(&self, mach: f64) -> f64 {
        match self {
            DragCurve::StandardTable { curve, bc } => curve.evaluate(mach) / bc,
            DragCurve::Multi(multi) => multi.cd_effective(mach),
        }
    }

    /// Retardation coefficient `drag(mach) = cd_effective(mach) * DRAG_CONSTANT`,
    /// the quantity the integrator multiplies by `rho_ratio * v^2` each step.
    pub fn drag(&self, mach: f64) -> f64 {
        self.cd_effective(mach) * DRAG_CONSTANT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_rejects_nonpositive_bc() {
        assert!(DragCurve::standard(StandardDrag::G7, 0.0).is_err());
        assert!(DragCurve::standard(StandardDrag::G7, -0.4).is_err());
    }

    #[test]
    fn higher_bc_yields_lower_drag_at_the_same_mach() {
        let low_bc = DragCurve::standard(StandardDrag::G7, 0.300).unwrap();
        let high_bc = DragCurve::standard(StandardDrag::G7, 0.600).unwrap();
        assert!(high_bc.drag(1.5) < low_bc.drag(1.5));
    }

    #[test]
    fn multi_bc_curve_produces_finite_positive_drag_across_the_table() {
        let anchors = [
            BcAnchor::new(2800.0, 0.450),
            BcAnchor::new(2000.0, 0.430),
            BcAnchor::new(1200.0, 0.400),
        ];
        let curve = DragCurve::multi_bc(StandardDrag::G7, &anchors, 1116.0).unwrap();
        for i in 0..20 {
            let mach = i as f64 * 0.2;
            let d = curve.drag(mach);
            assert!(d.is_finite() && d > 0.0, "drag at mach={mach} was {d}");
        }
    }
}
