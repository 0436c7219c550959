//! Parametric extruder mounting bracket.
//!
//! The bracket is a plate with two wings, a bridge along its back edge and
//! a triangular rib under the bridge. Keyhole slots, pilot holes, rows of
//! cable-routing holes, a hexagonal vent and a fan pocket are then cut into
//! it. Every dimension lives in [`BracketParams`]; [`build`] runs the stages
//! on a single [`planecad::Workplane`] and returns the part with a per-stage
//! [`BuildReport`].
//!
//! ```no_run
//! use extruder_support::{build, BracketParams};
//!
//! let bracket = build(&BracketParams::default())?;
//! bracket.part.write_stl("bracket.stl")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

mod error;
pub mod helpers;
mod params;
mod pipeline;

pub use error::{BuildError, Stage};
pub use params::BracketParams;
pub use pipeline::{build, AuxHoleReport, Bracket, BuildReport, StageReport};
