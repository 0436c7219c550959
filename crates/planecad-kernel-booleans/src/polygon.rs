//! Convex boundary polygons and the planes that carry them.

use std::sync::atomic::{AtomicU64, Ordering};

use planecad_kernel_math::{Point3, Vec3};

use crate::bbox::Aabb3;

/// Distance below which a vertex counts as lying on a plane.
pub const PLANE_EPSILON: f64 = 1e-6;

/// Fragments with less area than this are discarded after a split.
pub const MIN_FRAGMENT_AREA: f64 = 1e-10;

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies the sketch surface a polygon was generated from.
///
/// Every planar wall and cap of an extrusion gets its own tag; all facets
/// of one arc wall share a single `curved` tag so that topology extraction
/// can reassemble them into one face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceTag {
    /// Process-unique surface id.
    pub id: u64,
    /// True when the polygon is a facet of a curved surface.
    pub curved: bool,
}

impl SurfaceTag {
    /// Allocate a tag for a planar surface.
    pub fn planar() -> Self {
        Self {
            id: NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed),
            curved: false,
        }
    }

    /// Allocate a tag for a faceted curved surface.
    pub fn curved() -> Self {
        Self {
            id: NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed),
            curved: true,
        }
    }
}

/// An oriented plane `normal · p = w`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonPlane {
    /// Unit normal.
    pub normal: Vec3,
    /// Signed offset from the origin along `normal`.
    pub w: f64,
}

impl PolygonPlane {
    /// Plane through `point` with the given normal (normalized here).
    pub fn from_point_normal(point: &Point3, normal: Vec3) -> Option<Self> {
        let len = normal.norm();
        if len < 1e-12 {
            return None;
        }
        let normal = normal / len;
        Some(Self {
            normal,
            w: normal.dot(&point.coords),
        })
    }

    /// Best-fit plane of a vertex loop (Newell's method).
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let mut n = Vec3::zeros();
        let mut centroid = Vec3::zeros();
        for (i, a) in points.iter().enumerate() {
            let b = &points[(i + 1) % points.len()];
            n.x += (a.y - b.y) * (a.z + b.z);
            n.y += (a.z - b.z) * (a.x + b.x);
            n.z += (a.x - b.x) * (a.y + b.y);
            centroid += a.coords;
        }
        centroid /= points.len() as f64;
        Self::from_point_normal(&Point3::from(centroid), n)
    }

    /// Signed distance of `p` from the plane (positive in front).
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) - self.w
    }

    /// The same plane facing the other way.
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            w: -self.w,
        }
    }

    /// True if both planes are the same surface with the same orientation.
    pub fn coincident(&self, other: &PolygonPlane, tol: f64) -> bool {
        self.normal.dot(&other.normal) > 1.0 - 1e-9 && (self.w - other.w).abs() < tol
    }
}

/// A convex planar polygon on the boundary of a solid.
///
/// Vertices wind counter-clockwise when viewed from the front of `plane`,
/// so the plane normal points out of the solid.
#[derive(Debug, Clone)]
pub struct Polygon {
    /// Vertex loop.
    pub vertices: Vec<Point3>,
    /// Supporting plane. Fragments produced by splitting keep their parent's plane.
    pub plane: PolygonPlane,
    /// Surface the polygon belongs to.
    pub tag: SurfaceTag,
}

impl Polygon {
    /// Build a polygon, computing its plane from the vertices.
    pub fn new(vertices: Vec<Point3>, tag: SurfaceTag) -> Option<Self> {
        let plane = PolygonPlane::from_points(&vertices)?;
        Some(Self {
            vertices,
            plane,
            tag,
        })
    }

    /// Reverse orientation.
    pub fn flipped(&self) -> Self {
        let mut vertices = self.vertices.clone();
        vertices.reverse();
        Self {
            vertices,
            plane: self.plane.flipped(),
            tag: self.tag,
        }
    }

    /// Bounding box of the vertices.
    pub fn aabb(&self) -> Aabb3 {
        Aabb3::from_points(&self.vertices)
    }

    /// Vector area (normal times area) of the loop.
    fn vector_area(&self) -> Vec3 {
        let mut acc = Vec3::zeros();
        let v0 = self.vertices[0];
        for i in 1..self.vertices.len().saturating_sub(1) {
            acc += (self.vertices[i] - v0).cross(&(self.vertices[i + 1] - v0));
        }
        acc * 0.5
    }

    /// Area of the polygon.
    pub fn area(&self) -> f64 {
        if self.vertices.len() < 3 {
            return 0.0;
        }
        self.vector_area().dot(&self.plane.normal).abs()
    }

    /// Area-weighted centroid.
    pub fn centroid(&self) -> Point3 {
        let v0 = self.vertices[0];
        let mut weighted = Vec3::zeros();
        let mut total = 0.0;
        for i in 1..self.vertices.len().saturating_sub(1) {
            let (a, b) = (self.vertices[i], self.vertices[i + 1]);
            let area = (a - v0).cross(&(b - v0)).norm() * 0.5;
            weighted += area * (v0.coords + a.coords + b.coords) / 3.0;
            total += area;
        }
        if total < 1e-15 {
            return self.vertex_mean();
        }
        Point3::from(weighted / total)
    }

    /// Mean of the vertices; interior for any convex polygon.
    pub fn vertex_mean(&self) -> Point3 {
        let sum: Vec3 = self.vertices.iter().map(|v| v.coords).sum();
        Point3::from(sum / self.vertices.len() as f64)
    }

    /// Signed distances of every vertex from `plane`.
    pub fn distances(&self, plane: &PolygonPlane) -> Vec<f64> {
        self.vertices
            .iter()
            .map(|v| plane.signed_distance(v))
            .collect()
    }

    /// Split by `plane` when the polygon straddles it.
    ///
    /// Returns `(front, back)` only if both pieces have non-trivial area;
    /// otherwise the polygon lies on one side and `None` is returned.
    pub fn split(&self, plane: &PolygonPlane) -> Option<(Polygon, Polygon)> {
        let d = self.distances(plane);
        let has_front = d.iter().any(|&x| x > PLANE_EPSILON);
        let has_back = d.iter().any(|&x| x < -PLANE_EPSILON);
        if !(has_front && has_back) {
            return None;
        }

        let n = self.vertices.len();
        let mut front = Vec::with_capacity(n + 1);
        let mut back = Vec::with_capacity(n + 1);
        for i in 0..n {
            let j = (i + 1) % n;
            let (vi, vj) = (self.vertices[i], self.vertices[j]);
            let (di, dj) = (d[i], d[j]);
            let si = side(di);
            let sj = side(dj);
            if si >= 0 {
                front.push(vi);
            }
            if si <= 0 {
                back.push(vi);
            }
            if si * sj < 0 {
                let t = di / (di - dj);
                let v = vi + (vj - vi) * t;
                front.push(v);
                back.push(v);
            }
        }

        let front = self.fragment(front);
        let back = self.fragment(back);
        match (front, back) {
            (Some(f), Some(b)) => Some((f, b)),
            _ => None,
        }
    }

    /// Wrap a vertex loop cut from `self`, dropping slivers.
    fn fragment(&self, vertices: Vec<Point3>) -> Option<Polygon> {
        let vertices = dedup_loop(vertices);
        if vertices.len() < 3 {
            return None;
        }
        let piece = Polygon {
            vertices,
            plane: self.plane,
            tag: self.tag,
        };
        (piece.area() > MIN_FRAGMENT_AREA).then_some(piece)
    }

    /// Where the polygon boundary crosses `plane`, as a segment.
    ///
    /// Only meaningful for convex polygons that straddle the plane.
    pub fn chord(&self, plane: &PolygonPlane) -> Option<(Point3, Point3)> {
        let d = self.distances(plane);
        let n = self.vertices.len();
        let mut hits = Vec::with_capacity(2);
        for i in 0..n {
            let j = (i + 1) % n;
            let (di, dj) = (d[i], d[j]);
            if di.abs() <= PLANE_EPSILON {
                hits.push(self.vertices[i]);
            } else if side(di) * side(dj) < 0 {
                let t = di / (di - dj);
                hits.push(self.vertices[i] + (self.vertices[j] - self.vertices[i]) * t);
            }
        }
        let first = *hits.first()?;
        // The two hits furthest apart bound the chord.
        let far = hits
            .iter()
            .copied()
            .max_by(|a, b| {
                (a - first)
                    .norm()
                    .partial_cmp(&(b - first).norm())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(first);
        let start = hits
            .iter()
            .copied()
            .max_by(|a, b| {
                (a - far)
                    .norm()
                    .partial_cmp(&(b - far).norm())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(first);
        Some((start, far))
    }
}

fn side(d: f64) -> i32 {
    if d > PLANE_EPSILON {
        1
    } else if d < -PLANE_EPSILON {
        -1
    } else {
        0
    }
}

fn dedup_loop(mut vertices: Vec<Point3>) -> Vec<Point3> {
    vertices.dedup_by(|a, b| (*a - *b).norm() < PLANE_EPSILON);
    while vertices.len() > 1 {
        let (first, last) = (vertices[0], vertices[vertices.len() - 1]);
        if (first - last).norm() < PLANE_EPSILON {
            vertices.pop();
        } else {
            break;
        }
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(z: f64) -> Polygon {
        Polygon::new(
            vec![
                Point3::new(0.0, 0.0, z),
                Point3::new(2.0, 0.0, z),
                Point3::new(2.0, 2.0, z),
                Point3::new(0.0, 2.0, z),
            ],
            SurfaceTag::planar(),
        )
        .unwrap()
    }

    #[test]
    fn test_plane_from_ccw_points() {
        let sq = square(3.0);
        assert_relative_eq!(sq.plane.normal, Vec3::z(), epsilon = 1e-12);
        assert_relative_eq!(sq.plane.w, 3.0, epsilon = 1e-12);
        assert_relative_eq!(sq.area(), 4.0, epsilon = 1e-12);
        assert_relative_eq!(sq.centroid(), Point3::new(1.0, 1.0, 3.0), epsilon = 1e-12);
    }

    #[test]
    fn test_flip_reverses_plane() {
        let sq = square(1.0).flipped();
        assert_relative_eq!(sq.plane.normal, -Vec3::z(), epsilon = 1e-12);
        assert_relative_eq!(sq.plane.w, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_split_spanning() {
        let sq = square(0.0);
        let cut = PolygonPlane::from_point_normal(&Point3::new(0.5, 0.0, 0.0), Vec3::x()).unwrap();
        let (front, back) = sq.split(&cut).unwrap();
        assert_relative_eq!(front.area(), 3.0, epsilon = 1e-9);
        assert_relative_eq!(back.area(), 1.0, epsilon = 1e-9);
        assert_eq!(front.tag, sq.tag);
        assert_eq!(front.plane, sq.plane);
    }

    #[test]
    fn test_split_through_vertex() {
        let sq = square(0.0);
        let cut = PolygonPlane::from_point_normal(
            &Point3::origin(),
            Vec3::new(1.0, -1.0, 0.0),
        )
        .unwrap();
        let (front, back) = sq.split(&cut).unwrap();
        assert_eq!(front.vertices.len(), 3);
        assert_eq!(back.vertices.len(), 3);
        assert_relative_eq!(front.area() + back.area(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_split_touching_is_none() {
        let sq = square(0.0);
        let cut = PolygonPlane::from_point_normal(&Point3::origin(), Vec3::x()).unwrap();
        assert!(sq.split(&cut).is_none());
    }

    #[test]
    fn test_chord() {
        let sq = square(0.0);
        let cut = PolygonPlane::from_point_normal(&Point3::new(1.0, 0.0, 0.0), Vec3::x()).unwrap();
        let (a, b) = sq.chord(&cut).unwrap();
        assert_relative_eq!((a - b).norm(), 2.0, epsilon = 1e-9);
        assert_relative_eq!(a.x, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_surface_tags_unique() {
        let a = SurfaceTag::planar();
        let b = SurfaceTag::curved();
        assert_ne!(a.id, b.id);
        assert!(b.curved && !a.curved);
    }
}
