#![warn(missing_docs)]

//! High-level solid facade for the planecad kernel.
//!
//! Provides the [`Solid`] type: an immutable, cheaply clonable body that
//! keeps both its constructive tree (for exact point and ray queries) and
//! its boundary polygons (for export, mass properties and topology).
//!
//! # Example
//!
//! ```
//! use planecad_kernel::Solid;
//! use planecad_kernel_math::{Plane, Point2};
//! use planecad_kernel_sketch::SketchProfile;
//!
//! let profile = SketchProfile::rectangle(Plane::xy(), Point2::origin(), 10.0, 20.0).unwrap();
//! let block = Solid::extrude(&profile, 0.0, 30.0, 32).unwrap();
//! assert!((block.volume() - 6000.0).abs() < 1e-6);
//! assert_eq!(block.faces().len(), 6);
//! ```

mod csg;
mod mesh;
mod topo;

pub use planecad_kernel_booleans;
pub use planecad_kernel_math;
pub use planecad_kernel_sketch;

pub use mesh::TriangleMesh;
pub use topo::{Edge, EdgeId, Face, FaceId, Topology, Vertex, VertexId, EDGE_EPSILON};

use std::sync::{Arc, OnceLock};

use planecad_kernel_booleans::{boolean_op, Aabb3, BooleanOp, Operand, PointMembership, Polygon};
use planecad_kernel_math::{Point3, Vec3};
use planecad_kernel_sketch::{SketchError, SketchProfile};

use csg::{subtract_intervals, union_intervals, CsgTree};

#[derive(Debug)]
struct SolidInner {
    tree: CsgTree,
    polygons: Vec<Polygon>,
    bounds: Aabb3,
    topology: OnceLock<Topology>,
}

/// A 3D solid geometry object.
///
/// Solids are created by extruding sketch profiles and combined with
/// union and difference. Cloning is a reference-count bump.
#[derive(Debug, Clone)]
pub struct Solid {
    inner: Arc<SolidInner>,
}

impl Solid {
    // =========================================================================
    // Constructors
    // =========================================================================

    fn from_parts(tree: CsgTree, polygons: Vec<Polygon>) -> Self {
        let bounds = Aabb3::from_points(polygons.iter().flat_map(|p| p.vertices.iter()));
        Self {
            inner: Arc::new(SolidInner {
                tree,
                polygons,
                bounds,
                topology: OnceLock::new(),
            }),
        }
    }

    /// Create an empty solid.
    pub fn empty() -> Self {
        Self::from_parts(CsgTree::Empty, Vec::new())
    }

    /// Extrude a closed profile between two offsets along its normal.
    pub fn extrude(
        profile: &SketchProfile,
        start: f64,
        end: f64,
        resolution: u32,
    ) -> Result<Self, SketchError> {
        let prism = planecad_kernel_sketch::extrude(profile, start, end, resolution)?;
        let polygons = prism.boundary();
        Ok(Self::from_parts(CsgTree::Prism(Arc::new(prism)), polygons))
    }

    // =========================================================================
    // CSG boolean operations
    // =========================================================================

    /// Boolean union (self ∪ other).
    pub fn union(&self, other: &Solid) -> Solid {
        self.boolean(other, BooleanOp::Union)
    }

    /// Boolean difference (self − other).
    pub fn difference(&self, other: &Solid) -> Solid {
        self.boolean(other, BooleanOp::Difference)
    }

    fn boolean(&self, other: &Solid, op: BooleanOp) -> Solid {
        match (self.is_empty(), other.is_empty(), op) {
            (true, _, BooleanOp::Union) => return other.clone(),
            (true, _, BooleanOp::Difference) => return Solid::empty(),
            (false, true, _) => return self.clone(),
            _ => {}
        }
        let polygons = boolean_op(self.operand(), other.operand(), op);
        tracing::debug!(
            ?op,
            left = self.inner.polygons.len(),
            right = other.inner.polygons.len(),
            result = polygons.len(),
            "solid boolean"
        );
        Self::from_parts(
            CsgTree::Boolean {
                op,
                left: self.clone(),
                right: other.clone(),
            },
            polygons,
        )
    }

    fn operand(&self) -> Operand<'_> {
        Operand {
            polygons: &self.inner.polygons,
            bounds: self.inner.bounds,
            membership: self,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Check if the solid is empty (has no geometry).
    pub fn is_empty(&self) -> bool {
        self.inner.polygons.is_empty()
    }

    /// Boundary polygons, outward facing.
    pub fn polygons(&self) -> &[Polygon] {
        &self.inner.polygons
    }

    /// Bounding box of the boundary.
    pub fn bounds(&self) -> Aabb3 {
        self.inner.bounds
    }

    /// True if `p` lies strictly inside the solid.
    pub fn contains(&self, p: &Point3) -> bool {
        if !self.inner.bounds.contains_point(p) {
            return false;
        }
        match &self.inner.tree {
            CsgTree::Empty => false,
            CsgTree::Prism(prism) => prism.contains(p),
            CsgTree::Boolean { op, left, right } => match op {
                BooleanOp::Union => left.contains(p) || right.contains(p),
                BooleanOp::Difference => left.contains(p) && !right.contains(p),
            },
        }
    }

    /// Distances along the ray `origin + t * dir` (with `dir` normalized)
    /// at which it is inside the solid, as sorted `[t0, t1]` intervals.
    pub fn ray_intervals(&self, origin: &Point3, dir: &Vec3) -> Vec<(f64, f64)> {
        let len = dir.norm();
        if len < 1e-12 {
            tracing::warn!("ray query with zero-length direction");
            return Vec::new();
        }
        self.intervals(origin, &(dir / len))
    }

    fn intervals(&self, origin: &Point3, dir: &Vec3) -> Vec<(f64, f64)> {
        if self.inner.bounds.ray_range(origin, dir).is_none() {
            return Vec::new();
        }
        match &self.inner.tree {
            CsgTree::Empty => Vec::new(),
            CsgTree::Prism(prism) => prism.ray_intervals(origin, dir),
            CsgTree::Boolean { op, left, right } => {
                let a = left.intervals(origin, dir);
                match op {
                    BooleanOp::Union => union_intervals(a, right.intervals(origin, dir)),
                    BooleanOp::Difference => {
                        if a.is_empty() {
                            a
                        } else {
                            subtract_intervals(a, &right.intervals(origin, dir))
                        }
                    }
                }
            }
        }
    }

    /// Faces, edges and vertices, computed on first use.
    pub fn topology(&self) -> &Topology {
        self.inner
            .topology
            .get_or_init(|| Topology::from_polygons(&self.inner.polygons))
    }

    /// Snapshot of every face.
    pub fn faces(&self) -> Vec<Face> {
        self.topology().faces.values().cloned().collect()
    }

    /// Snapshot of every edge.
    pub fn edges(&self) -> Vec<Edge> {
        self.topology().edges.values().cloned().collect()
    }

    /// Snapshot of every vertex.
    pub fn vertices(&self) -> Vec<Vertex> {
        self.topology().vertices.values().copied().collect()
    }

    /// Get the triangle mesh representation.
    pub fn to_mesh(&self) -> TriangleMesh {
        TriangleMesh::from_polygons(&self.inner.polygons)
    }

    /// Volume enclosed by the boundary (divergence theorem).
    pub fn volume(&self) -> f64 {
        self.inner
            .polygons
            .iter()
            .map(|p| p.centroid().coords.dot(&p.plane.normal) * p.area() / 3.0)
            .sum()
    }

    /// Total boundary area.
    pub fn surface_area(&self) -> f64 {
        self.inner.polygons.iter().map(Polygon::area).sum()
    }

    /// Compute the axis-aligned bounding box as `(min, max)`.
    pub fn bounding_box(&self) -> ([f64; 3], [f64; 3]) {
        let b = &self.inner.bounds;
        if b.is_empty() {
            return ([0.0; 3], [0.0; 3]);
        }
        ([b.min.x, b.min.y, b.min.z], [b.max.x, b.max.y, b.max.z])
    }

    /// Compute the geometric centroid (volume-weighted center of mass).
    pub fn center_of_mass(&self) -> [f64; 3] {
        let mut weighted = Vec3::zeros();
        let mut total = 0.0;
        for poly in &self.inner.polygons {
            let v0 = poly.vertices[0].coords;
            for w in poly.vertices[1..].windows(2) {
                let (v1, v2) = (w[0].coords, w[1].coords);
                let vol = v0.dot(&v1.cross(&v2)) / 6.0;
                weighted += vol * (v0 + v1 + v2) / 4.0;
                total += vol;
            }
        }
        if total.abs() < 1e-12 {
            return [0.0; 3];
        }
        let c = weighted / total;
        [c.x, c.y, c.z]
    }

    /// Number of triangles in the tessellated mesh.
    pub fn num_triangles(&self) -> usize {
        self.to_mesh().num_triangles()
    }
}

impl PointMembership for Solid {
    fn contains(&self, p: &Point3) -> bool {
        Solid::contains(self, p)
    }
}

impl Default for Solid {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use planecad_kernel_math::{Plane, Point2};

    fn block(cx: f64, cy: f64, w: f64, h: f64, z0: f64, z1: f64) -> Solid {
        let profile = SketchProfile::rectangle(Plane::xy(), Point2::new(cx, cy), w, h).unwrap();
        Solid::extrude(&profile, z0, z1, 32).unwrap()
    }

    fn cylinder(cx: f64, cy: f64, r: f64, z0: f64, z1: f64) -> Solid {
        let profile = SketchProfile::circle(Plane::xy(), Point2::new(cx, cy), r).unwrap();
        Solid::extrude(&profile, z0, z1, 32).unwrap()
    }

    #[test]
    fn test_block_mass_properties() {
        let b = block(0.0, 0.0, 2.0, 4.0, 0.0, 3.0);
        assert_relative_eq!(b.volume(), 24.0, epsilon = 1e-9);
        assert_relative_eq!(b.surface_area(), 2.0 * (8.0 + 6.0 + 12.0), epsilon = 1e-9);
        let com = b.center_of_mass();
        assert_relative_eq!(com[2], 1.5, epsilon = 1e-9);
        assert_eq!(b.num_triangles(), 12);
        assert_eq!(b.to_mesh().num_triangles(), 12);
        assert_eq!(b.bounding_box(), ([-1.0, -2.0, 0.0], [1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_union_and_difference_volumes() {
        let a = block(0.0, 0.0, 4.0, 4.0, 0.0, 2.0);
        let b = block(2.0, 0.0, 4.0, 4.0, 0.0, 2.0);
        let u = a.union(&b);
        assert_relative_eq!(u.volume(), 48.0, epsilon = 1e-6);
        let d = a.difference(&b);
        assert_relative_eq!(d.volume(), 16.0, epsilon = 1e-6);
        // Coplanar tops merge into a single face after the union.
        let tops = u
            .faces()
            .into_iter()
            .filter(|f| f.normal.map_or(false, |n| n.z > 0.5))
            .count();
        assert_eq!(tops, 1);
        assert_eq!(u.faces().len(), 6);
    }

    #[test]
    fn test_drilled_plate_queries() {
        let plate = block(0.0, 0.0, 10.0, 10.0, 0.0, 2.0);
        let drilled = plate.difference(&cylinder(0.0, 0.0, 1.0, -1.0, 3.0));
        assert!(!drilled.contains(&Point3::new(0.0, 0.0, 1.0)));
        assert!(drilled.contains(&Point3::new(3.0, 0.0, 1.0)));

        // Vertical probe through the hole meets nothing.
        let hits = drilled.ray_intervals(&Point3::new(0.0, 0.0, 10.0), &-Vec3::z());
        assert!(hits.is_empty());

        // Horizontal probe crosses the plate twice around the hole.
        let hits = drilled.ray_intervals(&Point3::new(-10.0, 0.0, 1.0), &Vec3::x());
        assert_eq!(hits.len(), 2);
        assert_relative_eq!(hits[0].0, 5.0, epsilon = 1e-9);
        assert_relative_eq!(hits[1].1, 15.0, epsilon = 1e-9);

        let expected = 200.0 - drilled_hole_area() * 2.0;
        assert_relative_eq!(drilled.volume(), expected, epsilon = 1e-6);
        assert_eq!(drilled.faces().iter().filter(|f| !f.is_planar()).count(), 1);
    }

    /// Area of a 32-gon inscribed in the unit circle.
    fn drilled_hole_area() -> f64 {
        let n = 32.0;
        0.5 * n * (std::f64::consts::TAU / n).sin()
    }

    #[test]
    fn test_empty_fast_paths() {
        let e = Solid::empty();
        let b = block(0.0, 0.0, 1.0, 1.0, 0.0, 1.0);
        assert!(e.is_empty());
        assert_relative_eq!(e.union(&b).volume(), 1.0, epsilon = 1e-9);
        assert!(e.difference(&b).is_empty());
        assert_relative_eq!(b.difference(&e).volume(), 1.0, epsilon = 1e-9);
        assert_eq!(e.bounding_box(), ([0.0; 3], [0.0; 3]));
    }

    /// Directed mesh edges without a reverse twin, vertices keyed at 1e-4.
    fn open_edges(mesh: &TriangleMesh) -> usize {
        use std::collections::HashMap;

        let key = |i: u32| {
            let i = i as usize * 3;
            let q = |c: f32| (c as f64 * 1e4).round() as i64;
            (q(mesh.vertices[i]), q(mesh.vertices[i + 1]), q(mesh.vertices[i + 2]))
        };
        let mut edges: HashMap<_, i64> = HashMap::new();
        for tri in mesh.indices.chunks(3) {
            for k in 0..3 {
                let (a, b) = (key(tri[k]), key(tri[(k + 1) % 3]));
                if a != b {
                    *edges.entry((a, b)).or_default() += 1;
                }
            }
        }
        edges
            .iter()
            .filter(|&(&(a, b), &n)| edges.get(&(b, a)).copied() != Some(n))
            .count()
    }

    #[test]
    fn test_boolean_meshes_are_closed() {
        let a = block(0.0, 0.0, 4.0, 4.0, 0.0, 2.0);
        let b = block(2.0, 1.0, 4.0, 4.0, 1.0, 3.0);
        assert_eq!(open_edges(&a.union(&b).to_mesh()), 0);
        assert_eq!(open_edges(&a.difference(&b).to_mesh()), 0);

        let plate = block(0.0, 0.0, 10.0, 10.0, 0.0, 2.0);
        let drilled = plate.difference(&cylinder(0.0, 0.0, 1.0, -1.0, 3.0));
        let mesh = drilled.to_mesh();
        assert_eq!(open_edges(&mesh), 0);
        assert_eq!(drilled.num_triangles(), mesh.num_triangles());
    }

    #[test]
    fn test_zero_direction_ray() {
        let b = block(0.0, 0.0, 1.0, 1.0, 0.0, 1.0);
        assert!(b.ray_intervals(&Point3::origin(), &Vec3::zeros()).is_empty());
    }
}
