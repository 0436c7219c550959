//! The seven modeling stages, run in order on one threaded workplane.

use planecad::planecad_kernel::Face;
use planecad::{Part, Workplane, WorkplaneError};
use serde::Serialize;
use tracing::{debug, info};

use crate::helpers::{add_wing, make_aux_holes, make_slot, move_to_center};
use crate::{BracketParams, BuildError, Stage};

const NO_OFFSET: [f64; 3] = [0.0; 3];

/// State of the part after one stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    /// Which stage.
    pub stage: Stage,
    /// Part volume after the stage.
    pub volume: f64,
    /// Boundary polygon count after the stage.
    pub polygons: usize,
    /// Holes drilled during the stage.
    pub holes_drilled: usize,
}

/// One call of the aux-hole routine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuxHoleReport {
    /// Where the group row was placed.
    pub placement: &'static str,
    /// Number of groups.
    pub groups: usize,
    /// Holes actually drilled by the call.
    pub holes: usize,
    /// Material the row cut away.
    pub volume_removed: f64,
}

/// What happened during a build.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildReport {
    /// One entry per stage, in order.
    pub stages: Vec<StageReport>,
    /// One entry per aux-hole row, in order.
    pub aux_holes: Vec<AuxHoleReport>,
    /// Top edge length measured for the bridge.
    pub bridge_length: f64,
    /// Group span used on the plate sides.
    pub hole_sep: f64,
}

impl BuildReport {
    fn record(&mut self, stage: Stage, wp: &Workplane) {
        let drilled_before: usize = self.stages.iter().map(|s| s.holes_drilled).sum();
        let part = wp.part();
        let report = StageReport {
            stage,
            volume: part.volume(),
            polygons: part.solid().polygons().len(),
            holes_drilled: wp.holes_drilled() - drilled_before,
        };
        info!(
            %stage,
            volume = report.volume,
            polygons = report.polygons,
            holes = report.holes_drilled,
            "stage complete"
        );
        self.stages.push(report);
    }

    /// Report for one stage, if it ran.
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == stage)
    }
}

/// A finished bracket.
#[derive(Debug, Clone)]
pub struct Bracket {
    /// The solid and its construction history.
    pub part: Part,
    /// Per-stage figures.
    pub report: BuildReport,
}

/// Plate side faces captured before the wings cover them.
struct PlateSides {
    right: Face,
    left: Face,
}

/// Build the bracket.
pub fn build(params: &BracketParams) -> Result<Bracket, BuildError> {
    params.validate()?;
    let p = params;
    let mut report = BuildReport::default();

    let wp = run(Stage::Plate, plate(p))?;
    report.record(Stage::Plate, &wp);

    let (wp, sides) = run(Stage::Wings, wings(p, wp))?;
    report.record(Stage::Wings, &wp);

    let wp = run(Stage::Bridge, bridge(p, wp, &mut report))?;
    report.record(Stage::Bridge, &wp);

    let wp = run(Stage::Rib, rib(p, wp))?;
    report.record(Stage::Rib, &wp);

    let wp = run(Stage::Slots, slots(p, wp, &mut report))?;
    report.record(Stage::Slots, &wp);

    let wp = run(Stage::AuxHoles, side_holes(p, wp, &sides, &mut report))?;
    report.record(Stage::AuxHoles, &wp);

    let wp = run(Stage::Vent, vent(p, wp))?;
    report.record(Stage::Vent, &wp);

    let part = wp.into_part();
    info!(
        volume = part.volume(),
        triangles = part.num_triangles(),
        holes = report.stages.iter().map(|s| s.holes_drilled).sum::<usize>(),
        "bracket complete"
    );
    Ok(Bracket { part, report })
}

fn run<T>(stage: Stage, result: Result<T, WorkplaneError>) -> Result<T, BuildError> {
    result.map_err(|source| BuildError::Stage { stage, source })
}

fn plate(p: &BracketParams) -> Result<Workplane, WorkplaneError> {
    Workplane::new("front")?
        .with_name("extruder-support")
        .with_resolution(p.resolution)
        .box_centered(p.main_plate_size_x, p.main_plate_size_y, p.main_plate_thickness)
}

fn wings(p: &BracketParams, wp: Workplane) -> Result<(Workplane, PlateSides), WorkplaneError> {
    let wp = add_wing(wp.faces("<Z")?.vertices(">XY")?, p, 1.0)?;
    let right = wp.clone().faces(">X[1]")?.face()?;

    let wp = add_wing(wp.faces("<Z")?.vertices(">Y")?.vertices("<X")?, p, -1.0)?;
    let left = wp.clone().faces("<X[1]")?.face()?;

    debug!(right = ?right.center, left = ?left.center, "captured plate sides");
    Ok((wp, PlateSides { right, left }))
}

fn bridge(
    p: &BracketParams,
    wp: Workplane,
    report: &mut BuildReport,
) -> Result<Workplane, WorkplaneError> {
    let top_edge = wp.faces(">Z")?.edges(">Y")?;
    let length = top_edge.edge()?.length();
    report.bridge_length = length;
    debug!(length, "bridge length");

    top_edge
        .vertices("<X")?
        .workplane()?
        .h_line(length)?
        .v_line(-p.bridge_width)?
        .h_line(-length)?
        .close()?
        .extrude(p.bridge_depth)
}

fn rib(p: &BracketParams, wp: Workplane) -> Result<Workplane, WorkplaneError> {
    let plate_top = wp.faces(">Z[1]")?;
    let bridge_foot = plate_top.clone().edges(">Y")?.edge()?;
    let d = p.support_depth;

    move_to_center(plate_top.workplane()?, &bridge_foot)?
        .transformed([0.0, 90.0, 0.0], NO_OFFSET)?
        .v_line(-d)?
        .line(-d, d)?
        .close()?
        .extrude_both(p.main_plate_size_x / 2.0)
}

fn slots(
    p: &BracketParams,
    wp: Workplane,
    report: &mut BuildReport,
) -> Result<Workplane, WorkplaneError> {
    let back = wp.faces(">Y")?;
    let back_top = back.clone().edges(">Z")?.edge()?;
    let wp = move_to_center(back.workplane()?, &back_top)?;

    let mut radius = p.cutout_rad;
    let wp = make_slot(wp, p, radius, None)?;
    radius += p.cutout_offset;
    let wp = make_slot(wp, p, radius, Some(-p.main_plate_thickness / 2.0))?;

    let half = p.extruder_hole_spacing / 2.0;
    let wp = wp
        .push_points(&[(-half, -p.cutout_depth), (half, -p.cutout_depth)])?
        .hole(p.m4_predrill, None)?;

    radius += 3.0 * p.cutout_offset;
    let behind = wp
        .move_to(0.0, 0.0)?
        .workplane_offset(-p.main_plate_thickness)?;
    let wp = make_slot(behind, p, radius, None)?;

    radius -= 2.0 * p.cutout_offset;
    let quarter = p.main_plate_thickness / 4.0;
    let wp = wp
        .faces(">Z")?
        .workplane()?
        .push_points(&[(-radius, -quarter), (radius, -quarter)])?
        .hole(p.m3_predrill, None)?;

    aux_row(p, wp, p.main_plate_size_x, 2, "front", report)
}

fn side_holes(
    p: &BracketParams,
    wp: Workplane,
    sides: &PlateSides,
    report: &mut BuildReport,
) -> Result<Workplane, WorkplaneError> {
    let span = p.aux_span();
    let groups = p.aux_hole_groups;

    let wp = aux_row(p, wp.faces("<Y")?.workplane()?, span, groups, "bottom", report)?;

    let overhang = wp.faces("<X")?.workplane()?.transformed([90.0, 0.0, 0.0], NO_OFFSET)?;
    let wp = aux_row(p, overhang, span, groups, "left overhang", report)?;

    let overhang = wp.faces(">X")?.workplane()?.transformed([90.0, 0.0, 0.0], NO_OFFSET)?;
    let wp = aux_row(p, overhang, span, groups, "right overhang", report)?;

    // Both plate sides use the right side's area.
    let hole_sep = 0.5 * sides.right.area / p.main_plate_thickness;
    report.hole_sep = hole_sep;

    let corner = wp.faces("|X")?.edges("<Y")?.edges(">X")?.workplane()?;
    let right = move_to_center(corner, &sides.right)?.transformed([90.0, 0.0, 0.0], NO_OFFSET)?;
    let wp = aux_row(p, right, hole_sep, 2, "right plate side", report)?;

    let corner = wp.faces("|X")?.edges("<Y")?.edges("<X")?.workplane()?;
    let left = move_to_center(corner, &sides.left)?.transformed([0.0, 180.0, 0.0], NO_OFFSET)?;
    aux_row(p, left, hole_sep, 2, "left plate side", report)
}

fn vent(p: &BracketParams, wp: Workplane) -> Result<Workplane, WorkplaneError> {
    let seat_depth = p.bridge_depth + p.m3_cbore / 2.0;
    wp.faces("<Z[1]")?
        .workplane_offset(p.bridge_depth)?
        .transformed([0.0, 0.0, 90.0], NO_OFFSET)?
        .polygon(p.vent_sides, p.vent_diameter)?
        .cut_thru_all()?
        .move_to(0.0, 0.0)?
        .construction_rect(p.mounting_hole_spacing, p.mounting_hole_spacing)?
        .cbore_hole(p.m3_predrill, p.m3_cbore, seat_depth, None)?
        .transformed([0.0, 0.0, 45.0], NO_OFFSET)?
        .rect(p.fan_pocket_size, p.fan_pocket_size)?
        .cut_blind(-p.bridge_depth)?
        .construction_rect(p.fan_hole_spacing, p.fan_hole_spacing)?
        .hole(p.m3_predrill, None)
}

fn aux_row(
    p: &BracketParams,
    wp: Workplane,
    span: f64,
    groups: usize,
    placement: &'static str,
    report: &mut BuildReport,
) -> Result<Workplane, WorkplaneError> {
    let before = wp.holes_drilled();
    let volume_before = wp.part().volume();
    let wp = make_aux_holes(wp, p, span, groups)?;
    let holes = wp.holes_drilled() - before;
    let volume_removed = volume_before - wp.part().volume();
    debug!(placement, groups, holes, volume_removed, origin = ?wp.plane().origin, "aux holes");
    report.aux_holes.push(AuxHoleReport {
        placement,
        groups,
        holes,
        volume_removed,
    });
    Ok(wp)
}
