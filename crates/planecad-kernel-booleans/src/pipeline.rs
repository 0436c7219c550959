//! Boolean pipeline: region filter, split, classify, select.

use crate::api::{BooleanOp, Operand};
use crate::bbox::Aabb3;
use crate::classify::{classify_fragment, keep_from_a, keep_from_b, FaceClassification};
use crate::polygon::{Polygon, PLANE_EPSILON};
use crate::split::split_against;

/// Debug logging for the boolean pipeline, gated by the `tracing` filter.
macro_rules! debug_bool {
    ($($arg:tt)*) => {
        tracing::debug!(target: "planecad::booleans", $($arg)*)
    };
}

/// Combine operands whose bounding boxes do not touch.
pub(crate) fn disjoint_boolean(a: Operand<'_>, b: Operand<'_>, op: BooleanOp) -> Vec<Polygon> {
    match op {
        BooleanOp::Union => {
            let mut out = Vec::with_capacity(a.polygons.len() + b.polygons.len());
            out.extend_from_slice(a.polygons);
            out.extend_from_slice(b.polygons);
            out
        }
        BooleanOp::Difference => a.polygons.to_vec(),
    }
}

/// Partition polygons by whether they touch `region`.
fn partition(polygons: &[Polygon], region: &Aabb3) -> (Vec<Polygon>, Vec<Polygon>) {
    polygons
        .iter()
        .cloned()
        .partition(|p| p.aabb().overlaps(region))
}

pub(crate) fn split_classify_select(
    a: Operand<'_>,
    b: Operand<'_>,
    op: BooleanOp,
) -> Vec<Polygon> {
    let region = a.bounds.intersection(&b.bounds).expanded(PLANE_EPSILON);

    // Far polygons cannot meet the other solid, so they are outside it.
    let (a_near, a_far) = partition(a.polygons, &region);
    let (b_near, b_far) = partition(b.polygons, &region);
    debug_bool!(
        a_near = a_near.len(),
        a_far = a_far.len(),
        b_near = b_near.len(),
        b_far = b_far.len(),
        ?op,
        "boolean region filter"
    );

    let a_frags = split_against(&a_near, &b_near);
    let b_frags = split_against(&b_near, &a_near);
    debug_bool!(
        a_frags = a_frags.len(),
        b_frags = b_frags.len(),
        "split complete"
    );

    let mut out = a_far;
    if op == BooleanOp::Union {
        out.extend(b_far);
    }

    let mut counts = [0usize; 4];
    for frag in a_frags {
        let class = classify_fragment(&frag, b.membership);
        counts[class_index(class)] += 1;
        if keep_from_a(op, class) {
            out.push(frag);
        }
    }
    for frag in b_frags {
        let class = classify_fragment(&frag, a.membership);
        if keep_from_b(op, class) {
            out.push(match op {
                BooleanOp::Union => frag,
                BooleanOp::Difference => frag.flipped(),
            });
        }
    }
    debug_bool!(
        outside = counts[0],
        inside = counts[1],
        on_same = counts[2],
        on_opposite = counts[3],
        result = out.len(),
        "classified fragments of A"
    );
    out
}

fn class_index(class: FaceClassification) -> usize {
    match class {
        FaceClassification::Outside => 0,
        FaceClassification::Inside => 1,
        FaceClassification::OnSame => 2,
        FaceClassification::OnOpposite => 3,
    }
}
