//! Small sketch routines reused across the pipeline.

use planecad::{Centroid, Workplane, WorkplaneError};

use crate::BracketParams;

/// Move the workplane origin to the centroid of `target`, projected onto
/// the plane.
pub fn move_to_center(wp: Workplane, target: &impl Centroid) -> Result<Workplane, WorkplaneError> {
    let plane = wp.plane();
    let offset = target.centroid() - plane.origin;
    let x = plane.x_dir.dot(&offset);
    let y = plane.y_dir.dot(&offset);
    wp.center(x, y)
}

/// Extrude a wing tab from the selected plate corner. `sign` is `1.0` for
/// the right wing and `-1.0` for the left one.
pub fn add_wing(
    wp: Workplane,
    params: &BracketParams,
    sign: f64,
) -> Result<Workplane, WorkplaneError> {
    wp.workplane()?
        .h_line(sign * params.wing_size_x)?
        .v_line(-params.wing_size_y)?
        .line(-sign * params.wing_size_x, -2.0 * params.wing_size_y)?
        .close()?
        .extrude(params.main_plate_thickness)
}

/// Cut a keyhole slot hanging down from the plane origin: an arc of
/// `radius` centered `cutout_depth` below it with straight sides up to the
/// origin line. `None` cuts through everything behind the plane.
pub fn make_slot(
    wp: Workplane,
    params: &BracketParams,
    radius: f64,
    depth: Option<f64>,
) -> Result<Workplane, WorkplaneError> {
    let d = params.cutout_depth;
    let wp = wp
        .move_to(radius, -d)?
        .three_point_arc((0.0, -d - radius), (-radius, -d))?
        .v_line_to(0.0)?
        .h_line_to(radius)?
        .close()?;
    match depth {
        None => wp.cut_thru_all(),
        Some(depth) => wp.cut_blind(depth),
    }
}

/// Drill `groups` evenly spaced groups of blind pilot holes along the local
/// X axis, spanning `span` and centered on the origin. The workplane ends on
/// the last group.
pub fn make_aux_holes(
    wp: Workplane,
    params: &BracketParams,
    span: f64,
    groups: usize,
) -> Result<Workplane, WorkplaneError> {
    if groups < 2 {
        return Err(WorkplaneError::InvalidArgument {
            what: "hole groups",
            value: groups as f64,
        });
    }
    let step = span / (groups - 1) as f64;
    let mut wp = drill_group(wp.move_to(-span / 2.0, 0.0)?, params)?;
    for _ in 1..groups {
        wp = drill_group(wp.move_to(step, 0.0)?, params)?;
    }
    Ok(wp)
}

fn drill_group(wp: Workplane, params: &BracketParams) -> Result<Workplane, WorkplaneError> {
    wp.workplane()?
        .rarray(params.aux_hole_spacing, 1.0, params.aux_hole_n, 1)?
        .hole(params.m3_predrill, Some(params.aux_hole_depth))
}
