//! Public API types and entry point for boolean operations.

use crate::bbox::Aabb3;
use crate::classify::PointMembership;
use crate::pipeline::{disjoint_boolean, split_classify_select};
use crate::polygon::Polygon;

/// CSG boolean operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    /// Union: combine both solids.
    Union,
    /// Difference: subtract the tool from the target.
    Difference,
}

/// One side of a boolean operation.
///
/// The boundary polygons describe the surface; `membership` answers exact
/// inside/outside queries for the same solid.
#[derive(Clone, Copy)]
pub struct Operand<'a> {
    /// Closed boundary of the solid, outward facing.
    pub polygons: &'a [Polygon],
    /// Bounds of `polygons`.
    pub bounds: Aabb3,
    /// Point membership of the solid.
    pub membership: &'a dyn PointMembership,
}

impl std::fmt::Debug for Operand<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operand")
            .field("polygons", &self.polygons.len())
            .field("bounds", &self.bounds)
            .finish()
    }
}

/// Perform a CSG boolean operation on two closed polygon boundaries.
///
/// Empty and disjoint operands are handled without splitting. Otherwise
/// polygons near the shared region are split against each other,
/// classified by exact membership, and selected according to `op`.
pub fn boolean_op(a: Operand<'_>, b: Operand<'_>, op: BooleanOp) -> Vec<Polygon> {
    if a.polygons.is_empty() {
        return match op {
            BooleanOp::Union => b.polygons.to_vec(),
            BooleanOp::Difference => Vec::new(),
        };
    }
    if b.polygons.is_empty() {
        return a.polygons.to_vec();
    }
    if !a.bounds.overlaps(&b.bounds) {
        return disjoint_boolean(a, b, op);
    }
    split_classify_select(a, b, op)
}
