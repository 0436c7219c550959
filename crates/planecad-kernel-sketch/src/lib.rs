#![warn(missing_docs)]

//! Sketch-based operations for the planecad kernel.
//!
//! Provides closed 2D profiles made of lines and circular arcs, and the
//! extrude operation that sweeps them into prisms along the sketch normal.
//!
//! # Example
//!
//! ```
//! use planecad_kernel_sketch::{extrude, SketchProfile};
//! use planecad_kernel_math::{Plane, Point2};
//!
//! // 10 x 5 rectangle centered on the XY plane
//! let profile = SketchProfile::rectangle(Plane::xy(), Point2::origin(), 10.0, 5.0).unwrap();
//!
//! // Extrude 20 along +Z
//! let prism = extrude(&profile, 0.0, 20.0, 32).unwrap();
//! assert_eq!(prism.boundary().len(), 6);
//! ```

mod extrude;
mod profile;
mod triangulate;

pub use extrude::{extrude, Prism};
pub use profile::{SketchProfile, SketchSegment};
pub use triangulate::{ear_clip, is_convex, signed_area};

use thiserror::Error;

/// Default number of facets used for a full turn of an arc.
pub const DEFAULT_RESOLUTION: u32 = 32;

/// Errors from sketch-based operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SketchError {
    /// The profile is not closed (gap between first and last segment).
    #[error("profile is not closed: gap of {0:.6} mm")]
    NotClosed(f64),

    /// A segment is degenerate (zero length).
    #[error("degenerate segment at index {0}")]
    DegenerateSegment(usize),

    /// Extrusion distance is zero.
    #[error("extrusion distance is zero")]
    ZeroExtrusion,

    /// The three points of an arc lie on one line.
    #[error("arc points are collinear")]
    CollinearArc,

    /// A rectangle, polygon or circle with a non-positive size.
    #[error("invalid sketch dimension: {0}")]
    InvalidDimension(f64),

    /// A regular polygon needs at least three sides.
    #[error("polygon needs at least 3 sides, got {0}")]
    TooFewSides(usize),

    /// The polygonized outline has no area.
    #[error("profile outline has zero area")]
    ZeroArea,

    /// Profile has no segments.
    #[error("profile has no segments")]
    EmptyProfile,
}
