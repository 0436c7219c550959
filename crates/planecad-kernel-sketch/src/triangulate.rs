//! Convexity tests and ear clipping for profile caps.

use planecad_kernel_math::Point2;

/// Twice the signed area; positive for counter-clockwise loops.
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    let mut acc = 0.0;
    for i in 0..n {
        let (a, b) = (points[i], points[(i + 1) % n]);
        acc += a.x * b.y - b.x * a.y;
    }
    acc * 0.5
}

fn turn(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// True if a counter-clockwise loop has no reflex vertex.
pub fn is_convex(points: &[Point2]) -> bool {
    let n = points.len();
    (0..n).all(|i| turn(&points[i], &points[(i + 1) % n], &points[(i + 2) % n]) >= -1e-12)
}

fn in_triangle(p: &Point2, a: &Point2, b: &Point2, c: &Point2) -> bool {
    turn(a, b, p) > 0.0 && turn(b, c, p) > 0.0 && turn(c, a, p) > 0.0
}

/// Triangulate a simple counter-clockwise loop by ear clipping.
///
/// Returns index triples into `points`. Loops that cannot be clipped
/// cleanly (self-intersecting input) fall back to a fan over the rest.
pub fn ear_clip(points: &[Point2]) -> Vec<[usize; 3]> {
    let mut remaining: Vec<usize> = (0..points.len()).collect();
    let mut triangles = Vec::with_capacity(points.len().saturating_sub(2));

    while remaining.len() > 3 {
        let n = remaining.len();
        let ear = (0..n).find(|&i| {
            let (ia, ib, ic) = (remaining[(i + n - 1) % n], remaining[i], remaining[(i + 1) % n]);
            let (a, b, c) = (&points[ia], &points[ib], &points[ic]);
            if turn(a, b, c) <= 1e-12 {
                return false;
            }
            remaining
                .iter()
                .filter(|&&j| j != ia && j != ib && j != ic)
                .all(|&j| !in_triangle(&points[j], a, b, c))
        });
        let Some(i) = ear else {
            break;
        };
        triangles.push([remaining[(i + n - 1) % n], remaining[i], remaining[(i + 1) % n]]);
        remaining.remove(i);
    }

    for k in 1..remaining.len().saturating_sub(1) {
        triangles.push([remaining[0], remaining[k], remaining[k + 1]]);
    }
    triangles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area_of(points: &[Point2], tris: &[[usize; 3]]) -> f64 {
        tris.iter()
            .map(|t| signed_area(&[points[t[0]], points[t[1]], points[t[2]]]))
            .sum()
    }

    #[test]
    fn test_convexity() {
        let square = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(is_convex(&square));
        assert!((signed_area(&square) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ear_clip_l_shape() {
        let l = [
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        assert!(!is_convex(&l));
        let tris = ear_clip(&l);
        assert_eq!(tris.len(), 4);
        assert!((area_of(&l, &tris) - 3.0).abs() < 1e-12);
        for t in &tris {
            assert!(signed_area(&[l[t[0]], l[t[1]], l[t[2]]]) > 0.0);
        }
    }
}
