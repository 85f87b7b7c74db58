//! Shared math and environment primitives for the ballistics workspace.
//!
//! This crate owns the pieces of the exterior-ballistics core that every
//! solver crate needs and that carry no drag-model or integration policy of
//! their own:
//!
//! - [`vector3::Vector3`] — immutable 3-D arithmetic (downrange/up/windage).
//! - [`atmosphere::Atmosphere`] — ICAO-style density ratio and local Mach.
//! - [`wind::WindSegment`] / [`wind::WindSock`] — piecewise-constant wind.
//! - [`coriolis::Coriolis`] — optional flat-fire / full Coriolis deflection.
//! - [`error::BallisticError`] — the error taxonomy shared by every crate.
//!
//! All scalars are in the fixed internal unit system: feet, feet/second,
//! seconds, grains, Fahrenheit/Rankine, inches of mercury. Converting to or
//! from a caller's preferred units is the job of an external unit/dimension
//! system; this crate never sees a unit object.

pub mod atmosphere;
pub mod coriolis;
pub mod error;
pub mod vector3;
pub mod wind;

pub use atmosphere::Atmosphere;
pub use coriolis::Coriolis;
pub use error::{BallisticError, Result};
pub use vector3::Vector3;
pub use wind::{WindSegment, WindSock};

/// Gravitational acceleration, y-axis, ft/s^2.
pub const GRAVITY_FPS2: f64 = -32.17405;
