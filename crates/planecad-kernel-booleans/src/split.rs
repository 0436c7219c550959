//! Fragmenting polygons along the boundary of another polygon set.
//!
//! After [`split_against`] no fragment crosses the interior of any cutter,
//! so each fragment is either entirely inside, entirely outside, or lying
//! on the surface of the solid the cutters bound.

use planecad_kernel_math::{Point3, Vec3};

use crate::bbox::Aabb3;
use crate::polygon::{Polygon, PolygonPlane, PLANE_EPSILON};

/// Relation of a cutter polygon to the plane of the polygon being split.
enum CutterRelation {
    /// Entirely on one side; no effect.
    Clear,
    /// Lies in the same plane (either orientation).
    Coplanar,
    /// Crosses or touches the plane along a segment.
    Crossing,
}

fn relation(cutter: &Polygon, plane: &PolygonPlane) -> CutterRelation {
    let d = cutter.distances(plane);
    let above = d.iter().any(|&x| x > PLANE_EPSILON);
    let below = d.iter().any(|&x| x < -PLANE_EPSILON);
    match (above, below) {
        (false, false) => CutterRelation::Coplanar,
        (true, true) => CutterRelation::Crossing,
        _ if d.iter().filter(|x| x.abs() <= PLANE_EPSILON).count() >= 2 => {
            CutterRelation::Crossing
        }
        _ => CutterRelation::Clear,
    }
}

/// Split every polygon in `polygons` against the cutter set.
///
/// Cutters are prefiltered by bounding box. A crossing cutter splits a
/// fragment along its plane, but only where the two polygons actually
/// meet; a coplanar cutter splits along the planes through its edges.
pub fn split_against(polygons: &[Polygon], cutters: &[Polygon]) -> Vec<Polygon> {
    let cutter_boxes: Vec<Aabb3> = cutters
        .iter()
        .map(|c| c.aabb().expanded(PLANE_EPSILON))
        .collect();

    let mut out = Vec::with_capacity(polygons.len());
    for polygon in polygons {
        let bounds = polygon.aabb();
        let mut fragments = vec![polygon.clone()];
        for (cutter, cbox) in cutters.iter().zip(&cutter_boxes) {
            if !cbox.overlaps(&bounds) {
                continue;
            }
            match relation(cutter, &polygon.plane) {
                CutterRelation::Clear => {}
                CutterRelation::Crossing => {
                    let Some(line) = cutter.chord(&polygon.plane) else {
                        continue;
                    };
                    fragments = split_along(fragments, &cutter.plane, cbox, line);
                }
                CutterRelation::Coplanar => {
                    let normal = cutter.plane.normal;
                    let n = cutter.vertices.len();
                    for i in 0..n {
                        let (a, b) = (cutter.vertices[i], cutter.vertices[(i + 1) % n]);
                        let Some(edge_plane) =
                            PolygonPlane::from_point_normal(&a, (b - a).cross(&normal))
                        else {
                            continue;
                        };
                        fragments = split_along(fragments, &edge_plane, cbox, (a, b));
                    }
                }
            }
        }
        out.extend(fragments);
    }
    out
}

/// Split the fragments that straddle `plane` and whose chord on it
/// overlaps the `reach` segment.
fn split_along(
    fragments: Vec<Polygon>,
    plane: &PolygonPlane,
    cbox: &Aabb3,
    reach: (Point3, Point3),
) -> Vec<Polygon> {
    let mut out = Vec::with_capacity(fragments.len() + 1);
    for fragment in fragments {
        if !fragment.aabb().overlaps(cbox) {
            out.push(fragment);
            continue;
        }
        let Some(chord) = fragment.chord(plane) else {
            out.push(fragment);
            continue;
        };
        if !segments_overlap(reach, chord) {
            out.push(fragment);
            continue;
        }
        match fragment.split(plane) {
            Some((front, back)) => {
                out.push(front);
                out.push(back);
            }
            None => out.push(fragment),
        }
    }
    out
}

/// Overlap test for two segments known to lie on (nearly) the same line.
fn segments_overlap(a: (Point3, Point3), b: (Point3, Point3)) -> bool {
    let dir: Vec3 = {
        let d = a.1 - a.0;
        if d.norm() > PLANE_EPSILON {
            d
        } else {
            b.1 - b.0
        }
    };
    let len = dir.norm();
    if len < PLANE_EPSILON {
        return (a.0 - b.0).norm() < PLANE_EPSILON;
    }
    let dir = dir / len;
    let project = |p: &Point3| (p - a.0).dot(&dir);
    let (a0, a1) = minmax(project(&a.0), project(&a.1));
    let (b0, b1) = minmax(project(&b.0), project(&b.1));
    a0 < b1 - PLANE_EPSILON && b0 < a1 - PLANE_EPSILON
}

fn minmax(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
