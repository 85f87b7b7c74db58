//! Point-mass exterior-ballistics solver.
//!
//! Builds on [`ballistics_core`] (vectors, atmosphere, wind, Coriolis) and
//! [`ballistics_models`] (drag curves) to integrate a single shot's
//! trajectory, detect zero/Mach/apex/range events along it, and search for
//! zero angles and maximum range.
//!
//! Module layout mirrors the pipeline a shot goes through:
//! [`shot`] (inputs) -> [`integrator`] (raw trajectory) -> [`sequence`]
//! (the buffer and its lookups) -> [`events`] (flagged, enriched rows) ->
//! [`solver`] (angle search) -> [`facade`] (the `fire` entry point).

#![forbid(unsafe_code)]

pub mod error;
pub mod events;
pub mod facade;
pub mod integrator;
pub mod sequence;
pub mod shot;
pub mod solver;

pub use error::{Error, Result};
pub use events::{EnrichedRow, EventFlag};
pub use facade::{Call, Config, HitResult, fire};
pub use integrator::{Engine, TerminationReason};
pub use sequence::{Key, RawTrajPoint, TrajectorySequence};
pub use shot::{Ammo, Shot, ShotProps, TempSensitivity, Weapon};
pub use solver::{find_apex, find_max_range, zero_angle};
