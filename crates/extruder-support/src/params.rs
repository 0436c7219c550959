//! Bracket dimensions.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::BuildError;

/// Every dimension of the bracket, in millimeters.
///
/// Missing fields in a parameter file fall back to [`Default`], so a file
/// only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BracketParams {
    /// Plate width along X.
    pub main_plate_size_x: f64,
    /// Plate depth along Y.
    pub main_plate_size_y: f64,
    /// Plate thickness along Z; also the wing thickness.
    pub main_plate_thickness: f64,

    /// Wing width.
    pub wing_size_x: f64,
    /// Wing edge length; the diagonal drops twice this.
    pub wing_size_y: f64,

    /// Bridge height above the plate.
    pub bridge_depth: f64,
    /// Bridge thickness along Y.
    pub bridge_width: f64,

    /// Leg length of the triangular rib.
    pub support_depth: f64,

    /// Distance from the bridge top to the slot arc center.
    pub cutout_depth: f64,
    /// Radius of the first slot.
    pub cutout_rad: f64,
    /// Radius step between slots.
    pub cutout_offset: f64,

    /// Center distance of the two extruder holes.
    pub extruder_hole_spacing: f64,

    /// M4 pilot hole diameter.
    pub m4_predrill: f64,
    /// M3 pilot hole diameter.
    pub m3_predrill: f64,
    /// M3 counterbore diameter.
    pub m3_cbore: f64,

    /// Side of the square of counterbored mounting holes.
    pub mounting_hole_spacing: f64,

    /// Depth of cable-routing holes.
    pub aux_hole_depth: f64,
    /// Hole spacing inside one group.
    pub aux_hole_spacing: f64,
    /// Holes per group.
    pub aux_hole_n: usize,
    /// Groups on the bottom and overhang faces.
    pub aux_hole_groups: usize,

    /// Circumscribed diameter of the vent polygon.
    pub vent_diameter: f64,
    /// Corners of the vent polygon.
    pub vent_sides: usize,
    /// Side of the square fan pocket.
    pub fan_pocket_size: f64,
    /// Side of the square of fan screw holes.
    pub fan_hole_spacing: f64,

    /// Arc facets per full turn.
    pub resolution: u32,
}

impl Default for BracketParams {
    fn default() -> Self {
        Self {
            main_plate_size_x: 50.0,
            main_plate_size_y: 67.0,
            main_plate_thickness: 10.0,
            wing_size_x: 10.0,
            wing_size_y: 10.0,
            bridge_depth: 35.0,
            bridge_width: 10.0,
            support_depth: 18.0,
            cutout_depth: 15.0,
            cutout_rad: 8.0,
            cutout_offset: 2.0,
            extruder_hole_spacing: 50.0,
            m4_predrill: 3.7,
            m3_predrill: 2.5,
            m3_cbore: 5.0,
            mounting_hole_spacing: 28.0,
            aux_hole_depth: 6.0,
            aux_hole_spacing: 5.0,
            aux_hole_n: 2,
            aux_hole_groups: 3,
            vent_diameter: 30.0,
            vent_sides: 6,
            fan_pocket_size: 35.0,
            fan_hole_spacing: 25.0,
            resolution: 32,
        }
    }
}

impl BracketParams {
    /// Parse from TOML and validate.
    pub fn from_toml_str(s: &str) -> Result<Self, BuildError> {
        let params: Self = toml::from_str(s)?;
        params.validate()?;
        Ok(params)
    }

    /// Read a TOML parameter file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BuildError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loading parameters");
        Self::from_toml_str(&text)
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, BuildError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Span of the hole groups on the bottom and overhang faces.
    pub fn aux_span(&self) -> f64 {
        self.main_plate_size_x * 2.0 / 3.0
    }

    /// Check that every dimension can produce a valid solid.
    pub fn validate(&self) -> Result<(), BuildError> {
        let lengths = [
            ("main_plate_size_x", self.main_plate_size_x),
            ("main_plate_size_y", self.main_plate_size_y),
            ("main_plate_thickness", self.main_plate_thickness),
            ("wing_size_x", self.wing_size_x),
            ("wing_size_y", self.wing_size_y),
            ("bridge_depth", self.bridge_depth),
            ("bridge_width", self.bridge_width),
            ("support_depth", self.support_depth),
            ("cutout_depth", self.cutout_depth),
            ("cutout_rad", self.cutout_rad),
            ("extruder_hole_spacing", self.extruder_hole_spacing),
            ("m4_predrill", self.m4_predrill),
            ("m3_predrill", self.m3_predrill),
            ("m3_cbore", self.m3_cbore),
            ("mounting_hole_spacing", self.mounting_hole_spacing),
            ("aux_hole_depth", self.aux_hole_depth),
            ("aux_hole_spacing", self.aux_hole_spacing),
            ("vent_diameter", self.vent_diameter),
            ("fan_pocket_size", self.fan_pocket_size),
            ("fan_hole_spacing", self.fan_hole_spacing),
        ];
        for (name, value) in lengths {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(name, format!("must be a positive length, got {value}")));
            }
        }
        if !(self.cutout_offset.is_finite() && self.cutout_offset >= 0.0) {
            return Err(invalid(
                "cutout_offset",
                format!("must not be negative, got {}", self.cutout_offset),
            ));
        }
        if self.aux_hole_n < 1 {
            return Err(invalid("aux_hole_n", "needs at least one hole per group".into()));
        }
        if self.aux_hole_groups < 2 {
            return Err(invalid(
                "aux_hole_groups",
                format!("needs at least two groups, got {}", self.aux_hole_groups),
            ));
        }
        if self.vent_sides < 3 {
            return Err(invalid(
                "vent_sides",
                format!("needs at least three sides, got {}", self.vent_sides),
            ));
        }
        if self.resolution < 8 {
            return Err(invalid(
                "resolution",
                format!("needs at least 8 facets per turn, got {}", self.resolution),
            ));
        }
        if self.m3_cbore <= self.m3_predrill {
            return Err(invalid(
                "m3_cbore",
                "counterbore must be wider than the pilot hole".into(),
            ));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, reason: String) -> BuildError {
    BuildError::InvalidParameter { name, reason }
}
