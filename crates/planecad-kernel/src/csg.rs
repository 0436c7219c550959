//! Constructive tree behind every solid, used for exact queries.

use std::sync::Arc;

use planecad_kernel_booleans::BooleanOp;
use planecad_kernel_sketch::Prism;

use crate::Solid;

/// Intervals shorter than this are dropped.
const INTERVAL_EPSILON: f64 = 1e-9;

/// How a solid was built.
#[derive(Debug, Clone)]
pub(crate) enum CsgTree {
    /// No material.
    Empty,
    /// A single extruded profile.
    Prism(Arc<Prism>),
    /// Boolean combination of two solids.
    Boolean {
        op: BooleanOp,
        left: Solid,
        right: Solid,
    },
}

/// Merge two sorted interval lists into their union.
pub(crate) fn union_intervals(a: Vec<(f64, f64)>, b: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    let mut all = a;
    all.extend(b);
    all.sort_by(|x, y| x.0.total_cmp(&y.0));
    let mut out: Vec<(f64, f64)> = Vec::with_capacity(all.len());
    for (t0, t1) in all {
        match out.last_mut() {
            Some(last) if t0 <= last.1 + INTERVAL_EPSILON => last.1 = last.1.max(t1),
            _ => out.push((t0, t1)),
        }
    }
    out
}

/// Remove the intervals in `b` from the intervals in `a`.
pub(crate) fn subtract_intervals(a: Vec<(f64, f64)>, b: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut out = Vec::with_capacity(a.len());
    for (mut t0, t1) in a {
        for &(c0, c1) in b {
            if c1 <= t0 || c0 >= t1 {
                continue;
            }
            if c0 > t0 {
                out.push((t0, c0));
            }
            t0 = t0.max(c1);
            if t0 >= t1 {
                break;
            }
        }
        if t1 - t0 > INTERVAL_EPSILON {
            out.push((t0, t1));
        }
    }
    out.retain(|(t0, t1)| t1 - t0 > INTERVAL_EPSILON);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_intervals() {
        let u = union_intervals(vec![(0.0, 1.0), (3.0, 4.0)], vec![(0.5, 2.0)]);
        assert_eq!(u, vec![(0.0, 2.0), (3.0, 4.0)]);
    }

    #[test]
    fn test_subtract_intervals() {
        let d = subtract_intervals(vec![(0.0, 10.0)], &[(2.0, 3.0), (5.0, 6.0)]);
        assert_eq!(d, vec![(0.0, 2.0), (3.0, 5.0), (6.0, 10.0)]);
        let d = subtract_intervals(vec![(0.0, 1.0)], &[(-1.0, 2.0)]);
        assert!(d.is_empty());
    }
}
