//! Fragment classification for boolean operations.
//!
//! After splitting, each fragment is classified as IN, OUT, ON_SAME or
//! ON_OPPOSITE relative to the other solid. The boolean operation then
//! selects which fragments to keep.

use planecad_kernel_math::Point3;

use crate::polygon::Polygon;
use crate::BooleanOp;

/// Distance the probe points are pushed off a fragment along its normal.
pub const PROBE_OFFSET: f64 = 1e-4;

/// Exact point membership of a solid.
///
/// Implemented by the kernel's solid type so classification can query the
/// constructive tree directly instead of ray casting a tessellation.
pub trait PointMembership {
    /// True if `p` lies strictly inside the solid.
    fn contains(&self, p: &Point3) -> bool;
}

impl<F: Fn(&Point3) -> bool> PointMembership for F {
    fn contains(&self, p: &Point3) -> bool {
        self(p)
    }
}

/// Classification of a fragment relative to another solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceClassification {
    /// Fragment is outside the other solid.
    Outside,
    /// Fragment is inside the other solid.
    Inside,
    /// Fragment is on the other solid's boundary, normals agree.
    OnSame,
    /// Fragment is on the other solid's boundary, normals oppose.
    OnOpposite,
}

/// Classify one fragment by probing just in front of and just behind it.
pub fn classify_fragment(fragment: &Polygon, other: &dyn PointMembership) -> FaceClassification {
    let sample = fragment.vertex_mean();
    let n = fragment.plane.normal;
    let front = other.contains(&(sample + PROBE_OFFSET * n));
    let back = other.contains(&(sample - PROBE_OFFSET * n));
    match (front, back) {
        (false, false) => FaceClassification::Outside,
        (true, true) => FaceClassification::Inside,
        (false, true) => FaceClassification::OnSame,
        (true, false) => FaceClassification::OnOpposite,
    }
}

/// Should a fragment of the first operand survive `op`?
pub fn keep_from_a(op: BooleanOp, class: FaceClassification) -> bool {
    match op {
        BooleanOp::Union => {
            matches!(class, FaceClassification::Outside | FaceClassification::OnSame)
        }
        BooleanOp::Difference => matches!(
            class,
            FaceClassification::Outside | FaceClassification::OnOpposite
        ),
    }
}

/// Should a fragment of the second operand survive `op`?
///
/// Surviving fragments of a difference tool are reversed by the caller.
pub fn keep_from_b(op: BooleanOp, class: FaceClassification) -> bool {
    match op {
        BooleanOp::Union => matches!(class, FaceClassification::Outside),
        BooleanOp::Difference => matches!(class, FaceClassification::Inside),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::SurfaceTag;

    fn unit_cube(p: &Point3) -> bool {
        let open = |v: f64| v > 0.0 && v < 1.0;
        open(p.x) && open(p.y) && open(p.z)
    }

    fn square_at(z: f64, flip: bool) -> Polygon {
        let poly = Polygon::new(
            vec![
                Point3::new(0.25, 0.25, z),
                Point3::new(0.75, 0.25, z),
                Point3::new(0.75, 0.75, z),
                Point3::new(0.25, 0.75, z),
            ],
            SurfaceTag::planar(),
        )
        .unwrap();
        if flip {
            poly.flipped()
        } else {
            poly
        }
    }

    #[test]
    fn test_classify_inside_outside() {
        assert_eq!(
            classify_fragment(&square_at(0.5, false), &unit_cube),
            FaceClassification::Inside
        );
        assert_eq!(
            classify_fragment(&square_at(2.0, false), &unit_cube),
            FaceClassification::Outside
        );
    }

    #[test]
    fn test_classify_on_boundary() {
        // Top face of the cube, facing +Z: the cube is behind it.
        assert_eq!(
            classify_fragment(&square_at(1.0, false), &unit_cube),
            FaceClassification::OnSame
        );
        assert_eq!(
            classify_fragment(&square_at(1.0, true), &unit_cube),
            FaceClassification::OnOpposite
        );
    }

    #[test]
    fn test_selection_rules() {
        use FaceClassification::*;
        assert!(keep_from_a(BooleanOp::Union, OnSame));
        assert!(!keep_from_b(BooleanOp::Union, OnSame));
        assert!(!keep_from_a(BooleanOp::Union, OnOpposite));
        assert!(!keep_from_b(BooleanOp::Union, OnOpposite));
        assert!(keep_from_a(BooleanOp::Difference, OnOpposite));
        assert!(!keep_from_a(BooleanOp::Difference, OnSame));
        assert!(keep_from_b(BooleanOp::Difference, Inside));
        assert!(!keep_from_b(BooleanOp::Difference, OnOpposite));
    }
}
