#![warn(missing_docs)]

//! CSG boolean operations on polygon boundaries for the planecad kernel.
//!
//! Implements union and difference of closed, outward-facing polygon sets.
//!
//! The boolean pipeline has 4 stages:
//! 1. **Region filter**: only polygons touching the shared bounding region
//!    take part; the rest are outside the other operand
//! 2. **Split**: near polygons are fragmented against each other
//! 3. **Classification**: fragments are labelled IN/OUT/ON by exact point
//!    membership of the other solid
//! 4. **Selection**: fragments are kept (and tool fragments reversed)
//!    according to the operation

mod api;
pub mod bbox;
pub mod classify;
mod pipeline;
pub mod polygon;
pub mod split;

pub use api::{boolean_op, BooleanOp, Operand};
pub use bbox::Aabb3;
pub use classify::{FaceClassification, PointMembership};
pub use polygon::{Polygon, PolygonPlane, SurfaceTag};

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use planecad_kernel_math::Point3;

    /// Outward-facing boundary of an axis-aligned box.
    fn box_polygons(min: [f64; 3], max: [f64; 3]) -> Vec<Polygon> {
        let p = |x: usize, y: usize, z: usize| {
            Point3::new(
                if x == 0 { min[0] } else { max[0] },
                if y == 0 { min[1] } else { max[1] },
                if z == 0 { min[2] } else { max[2] },
            )
        };
        let quads = [
            [p(0, 0, 0), p(0, 1, 0), p(1, 1, 0), p(1, 0, 0)], // -Z
            [p(0, 0, 1), p(1, 0, 1), p(1, 1, 1), p(0, 1, 1)], // +Z
            [p(0, 0, 0), p(1, 0, 0), p(1, 0, 1), p(0, 0, 1)], // -Y
            [p(0, 1, 0), p(0, 1, 1), p(1, 1, 1), p(1, 1, 0)], // +Y
            [p(0, 0, 0), p(0, 0, 1), p(0, 1, 1), p(0, 1, 0)], // -X
            [p(1, 0, 0), p(1, 1, 0), p(1, 1, 1), p(1, 0, 1)], // +X
        ];
        quads
            .iter()
            .map(|q| Polygon::new(q.to_vec(), SurfaceTag::planar()).unwrap())
            .collect()
    }

    fn box_membership(min: [f64; 3], max: [f64; 3]) -> impl Fn(&Point3) -> bool {
        move |p: &Point3| {
            (0..3).all(|i| p[i] > min[i] && p[i] < max[i])
        }
    }

    fn bounds(min: [f64; 3], max: [f64; 3]) -> Aabb3 {
        Aabb3::new(
            Point3::new(min[0], min[1], min[2]),
            Point3::new(max[0], max[1], max[2]),
        )
    }

    /// Divergence-theorem volume of a closed polygon set.
    fn volume(polys: &[Polygon]) -> f64 {
        polys
            .iter()
            .map(|p| p.centroid().coords.dot(&p.plane.normal) * p.area() / 3.0)
            .sum()
    }

    fn run(
        (amin, amax): ([f64; 3], [f64; 3]),
        (bmin, bmax): ([f64; 3], [f64; 3]),
        op: BooleanOp,
    ) -> Vec<Polygon> {
        let (pa, pb) = (box_polygons(amin, amax), box_polygons(bmin, bmax));
        let (ma, mb) = (box_membership(amin, amax), box_membership(bmin, bmax));
        boolean_op(
            Operand {
                polygons: &pa,
                bounds: bounds(amin, amax),
                membership: &ma,
            },
            Operand {
                polygons: &pb,
                bounds: bounds(bmin, bmax),
                membership: &mb,
            },
            op,
        )
    }

    #[test]
    fn test_box_volume_helper() {
        let polys = box_polygons([0.0; 3], [1.0, 2.0, 3.0]);
        assert_relative_eq!(volume(&polys), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_union_overlapping() {
        let out = run(
            ([0.0; 3], [2.0; 3]),
            ([1.0; 3], [3.0; 3]),
            BooleanOp::Union,
        );
        assert_relative_eq!(volume(&out), 15.0, epsilon = 1e-6);
    }

    #[test]
    fn test_difference_corner() {
        let out = run(
            ([0.0; 3], [2.0; 3]),
            ([1.0; 3], [3.0; 3]),
            BooleanOp::Difference,
        );
        assert_relative_eq!(volume(&out), 7.0, epsilon = 1e-6);
    }

    #[test]
    fn test_difference_through_pocket() {
        // Square hole straight through a slab; the cut openings are flush.
        let out = run(
            ([0.0, 0.0, 0.0], [4.0, 4.0, 1.0]),
            ([1.0, 1.0, -1.0], [2.0, 2.0, 2.0]),
            BooleanOp::Difference,
        );
        assert_relative_eq!(volume(&out), 15.0, epsilon = 1e-6);
    }

    #[test]
    fn test_union_face_adjacent() {
        let out = run(
            ([0.0; 3], [1.0; 3]),
            ([1.0, 0.0, 0.0], [2.0, 1.0, 1.0]),
            BooleanOp::Union,
        );
        assert_relative_eq!(volume(&out), 2.0, epsilon = 1e-6);
        // The shared wall is dropped from both sides.
        assert!(out
            .iter()
            .all(|p| !(p.plane.normal.x.abs() > 0.5 && (p.centroid().x - 1.0).abs() < 1e-9)));
    }

    #[test]
    fn test_difference_flush_top() {
        // Pocket from the top face: the tool's top is coplanar with the target's.
        let out = run(
            ([0.0; 3], [4.0, 4.0, 2.0]),
            ([1.0, 1.0, 1.0], [3.0, 3.0, 2.0]),
            BooleanOp::Difference,
        );
        assert_relative_eq!(volume(&out), 28.0, epsilon = 1e-6);
    }

    #[test]
    fn test_disjoint_and_empty() {
        let out = run(
            ([0.0; 3], [1.0; 3]),
            ([5.0; 3], [6.0; 3]),
            BooleanOp::Union,
        );
        assert_eq!(out.len(), 12);
        let out = run(
            ([0.0; 3], [1.0; 3]),
            ([5.0; 3], [6.0; 3]),
            BooleanOp::Difference,
        );
        assert_eq!(out.len(), 6);

        let pb = box_polygons([0.0; 3], [1.0; 3]);
        let mb = box_membership([0.0; 3], [1.0; 3]);
        let empty = |_: &Point3| false;
        let a = Operand {
            polygons: &[],
            bounds: Aabb3::empty(),
            membership: &empty,
        };
        let b = Operand {
            polygons: &pb,
            bounds: bounds([0.0; 3], [1.0; 3]),
            membership: &mb,
        };
        assert_eq!(boolean_op(a, b, BooleanOp::Union).len(), 6);
        assert!(boolean_op(a, b, BooleanOp::Difference).is_empty());
        assert_eq!(boolean_op(b, a, BooleanOp::Difference).len(), 6);
    }
}
