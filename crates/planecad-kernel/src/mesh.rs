//! Triangle meshes for export.
//!
//! Boolean fragments meet at T-junctions. Before triangulating, every
//! boundary vertex that lies inside another polygon's edge is spliced into
//! that edge, so each directed mesh edge has a reverse twin.

use planecad_kernel_booleans::Polygon;
use planecad_kernel_math::Point3;

/// Vertices closer than this to an edge are spliced into it.
const SPLICE_EPSILON: f64 = 1e-6;

/// Output triangle mesh for rendering and export.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Flat array of vertex positions: `[x0, y0, z0, x1, y1, z1, ...]` (f32).
    pub vertices: Vec<f32>,
    /// Flat array of triangle indices: `[i0, i1, i2, ...]` (u32).
    pub indices: Vec<u32>,
    /// Flat array of vertex normals: `[nx0, ny0, nz0, ...]` (f32). Same length as vertices.
    pub normals: Vec<f32>,
}

impl TriangleMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Triangulate convex boundary polygons, one vertex block per polygon.
    ///
    /// Untouched polygons are fanned from their first vertex. Polygons that
    /// received spliced vertices are fanned around their vertex centroid,
    /// which keeps every triangle non-degenerate.
    pub fn from_polygons(polygons: &[Polygon]) -> Self {
        let index = VertexIndex::new(polygons);
        let mut mesh = Self::new();
        for poly in polygons {
            let ring = index.splice(&poly.vertices);
            let n = poly.plane.normal;
            let normal = [n.x as f32, n.y as f32, n.z as f32];
            let base = mesh.num_vertices() as u32;
            for v in &ring {
                mesh.push_vertex(v, normal);
            }

            let count = ring.len() as u32;
            if ring.len() == poly.vertices.len() {
                for i in 1..count.saturating_sub(1) {
                    mesh.indices.extend_from_slice(&[base, base + i, base + i + 1]);
                }
            } else {
                let sum = ring.iter().fold(Point3::origin().coords, |acc, p| acc + p.coords);
                let center = Point3::from(sum / ring.len() as f64);
                mesh.push_vertex(&center, normal);
                let apex = base + count;
                for i in 0..count {
                    let next = (i + 1) % count;
                    mesh.indices.extend_from_slice(&[apex, base + i, base + next]);
                }
            }
        }
        mesh
    }

    fn push_vertex(&mut self, v: &Point3, normal: [f32; 3]) {
        self.vertices
            .extend_from_slice(&[v.x as f32, v.y as f32, v.z as f32]);
        self.normals.extend_from_slice(&normal);
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }
}

/// All boundary vertices, sorted by x for range lookups along an edge.
struct VertexIndex {
    points: Vec<Point3>,
}

impl VertexIndex {
    fn new(polygons: &[Polygon]) -> Self {
        let mut points: Vec<Point3> = polygons
            .iter()
            .flat_map(|p| p.vertices.iter().copied())
            .collect();
        points.sort_by(|a, b| a.x.total_cmp(&b.x));
        Self { points }
    }

    /// Copy of `ring` with every indexed vertex lying strictly inside one of
    /// its edges inserted in order along that edge.
    fn splice(&self, ring: &[Point3]) -> Vec<Point3> {
        let n = ring.len();
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            out.push(a);

            let d = b - a;
            let len = d.norm();
            if len <= SPLICE_EPSILON {
                continue;
            }
            let dir = d / len;
            let lo = self
                .points
                .partition_point(|p| p.x < a.x.min(b.x) - SPLICE_EPSILON);
            let hi = self
                .points
                .partition_point(|p| p.x <= a.x.max(b.x) + SPLICE_EPSILON);

            let mut inner: Vec<(f64, Point3)> = self.points[lo..hi]
                .iter()
                .filter_map(|p| {
                    let t = (p - a).dot(&dir);
                    if t <= SPLICE_EPSILON || t >= len - SPLICE_EPSILON {
                        return None;
                    }
                    let off = (p - a) - dir * t;
                    (off.norm() <= SPLICE_EPSILON).then_some((t, *p))
                })
                .collect();
            inner.sort_by(|x, y| x.0.total_cmp(&y.0));

            let mut last = 0.0;
            for (t, p) in inner {
                if t - last > SPLICE_EPSILON {
                    out.push(p);
                    last = t;
                }
            }
        }
        out
    }
}
