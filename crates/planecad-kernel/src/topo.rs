//! Face, edge and vertex topology recovered from boundary polygons.
//!
//! Boolean results are polygon soups: a single surface may be spread over
//! many fragments with T-junctions between them. Faces are rebuilt by
//! grouping coplanar polygons (or facets sharing a curved surface tag), and
//! edges by cancelling opposite polygon edges along each supporting line.

use std::collections::HashMap;

use planecad_kernel_booleans::Polygon;
use planecad_kernel_math::{Point3, Vec3};
use slotmap::{new_key_type, SlotMap};

/// Edges and vertices closer than this are merged.
pub const EDGE_EPSILON: f64 = 1e-6;

new_key_type! {
    /// Key of a [`Vertex`] in a [`Topology`].
    pub struct VertexId;
    /// Key of an [`Edge`] in a [`Topology`].
    pub struct EdgeId;
    /// Key of a [`Face`] in a [`Topology`].
    pub struct FaceId;
}

/// A corner of the solid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position.
    pub point: Point3,
}

/// A maximal straight segment of a face boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Start point, in the traversal direction of the first face that owns it.
    pub start: Point3,
    /// End point.
    pub end: Point3,
    /// Vertex at `start`.
    pub start_vertex: VertexId,
    /// Vertex at `end`.
    pub end_vertex: VertexId,
}

impl Edge {
    /// Length of the segment.
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// Midpoint.
    pub fn center(&self) -> Point3 {
        Point3::from((self.start.coords + self.end.coords) * 0.5)
    }

    /// Unit direction from start to end.
    pub fn direction(&self) -> Vec3 {
        (self.end - self.start).normalize()
    }
}

/// A face of the solid: coplanar boundary polygons, or all facets of one
/// curved surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// Outward normal; `None` for curved faces.
    pub normal: Option<Vec3>,
    /// Total area.
    pub area: f64,
    /// Area-weighted centroid.
    pub center: Point3,
    /// Boundary edges.
    pub edges: Vec<EdgeId>,
    /// Corners (edge end points).
    pub vertices: Vec<VertexId>,
}

impl Face {
    /// True for planar faces.
    pub fn is_planar(&self) -> bool {
        self.normal.is_some()
    }
}

/// Arena-based storage for the faces, edges and vertices of a solid.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    /// Vertices.
    pub vertices: SlotMap<VertexId, Vertex>,
    /// Edges, shared between the faces they bound.
    pub edges: SlotMap<EdgeId, Edge>,
    /// Faces.
    pub faces: SlotMap<FaceId, Face>,
}

enum FaceKey {
    Planar { normal: Vec3, w: f64 },
    Curved(u64),
}

impl FaceKey {
    fn of(poly: &Polygon) -> Self {
        if poly.tag.curved {
            FaceKey::Curved(poly.tag.id)
        } else {
            FaceKey::Planar {
                normal: poly.plane.normal,
                w: poly.plane.w,
            }
        }
    }

    fn matches(&self, other: &FaceKey) -> bool {
        match (self, other) {
            (FaceKey::Curved(a), FaceKey::Curved(b)) => a == b,
            (
                FaceKey::Planar { normal: na, w: wa },
                FaceKey::Planar { normal: nb, w: wb },
            ) => na.dot(nb) > 1.0 - 1e-9 && (wa - wb).abs() < EDGE_EPSILON,
            _ => false,
        }
    }
}

/// Directed spans collected on one supporting line.
struct LineSpans {
    dir: Vec3,
    anchor: Point3,
    spans: Vec<(f64, f64, i32)>,
}

/// Unit direction with its largest component positive, and the sign of
/// `d` relative to it.
fn canonical(d: Vec3) -> (Vec3, i32) {
    let (i, _) = d
        .iter()
        .enumerate()
        .fold((0, 0.0f64), |best, (i, v)| if v.abs() > best.1 { (i, v.abs()) } else { best });
    if d[i] < 0.0 {
        (-d, -1)
    } else {
        (d, 1)
    }
}

/// Net boundary of a set of polygons as directed segments.
fn boundary_segments(polygons: &[&Polygon]) -> Vec<(Point3, Point3)> {
    let mut lines: Vec<LineSpans> = Vec::new();
    for poly in polygons {
        let n = poly.vertices.len();
        for i in 0..n {
            let (a, b) = (poly.vertices[i], poly.vertices[(i + 1) % n]);
            let len = (b - a).norm();
            if len < EDGE_EPSILON {
                continue;
            }
            let (dir, sign) = canonical((b - a) / len);
            let anchor = Point3::from(a.coords - a.coords.dot(&dir) * dir);
            let idx = match lines
                .iter()
                .position(|l| l.dir.dot(&dir) > 1.0 - 1e-9 && (l.anchor - anchor).norm() < EDGE_EPSILON)
            {
                Some(idx) => idx,
                None => {
                    lines.push(LineSpans {
                        dir,
                        anchor,
                        spans: Vec::new(),
                    });
                    lines.len() - 1
                }
            };
            let line = &mut lines[idx];
            let (ta, tb) = ((a - line.anchor).dot(&line.dir), (b - line.anchor).dot(&line.dir));
            line.spans.push((ta.min(tb), ta.max(tb), sign));
        }
    }

    let mut out = Vec::new();
    for line in &lines {
        let mut events: Vec<(f64, i32)> = line
            .spans
            .iter()
            .flat_map(|&(t0, t1, s)| [(t0, s), (t1, -s)])
            .collect();
        events.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut runs: Vec<(f64, f64, i32)> = Vec::new();
        let mut net = 0;
        let mut i = 0;
        while i < events.len() {
            let t = events[i].0;
            while i < events.len() && events[i].0 - t <= 1e-9 {
                net += events[i].1;
                i += 1;
            }
            if net == 0 || i == events.len() {
                continue;
            }
            let next = events[i].0;
            let s = net.signum();
            match runs.last_mut() {
                Some(run) if run.2 == s && t - run.1 < EDGE_EPSILON => run.1 = next,
                _ => runs.push((t, next, s)),
            }
        }

        for (t0, t1, s) in runs {
            if t1 - t0 < EDGE_EPSILON {
                continue;
            }
            let p0 = line.anchor + t0 * line.dir;
            let p1 = line.anchor + t1 * line.dir;
            out.push(if s > 0 { (p0, p1) } else { (p1, p0) });
        }
    }
    out
}

fn quantize(p: &Point3) -> [i64; 3] {
    [
        (p.x / EDGE_EPSILON).round() as i64,
        (p.y / EDGE_EPSILON).round() as i64,
        (p.z / EDGE_EPSILON).round() as i64,
    ]
}

impl Topology {
    /// Create an empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recover faces, edges and vertices from closed boundary polygons.
    pub fn from_polygons(polygons: &[Polygon]) -> Self {
        let mut groups: Vec<(FaceKey, Vec<&Polygon>)> = Vec::new();
        for poly in polygons {
            let key = FaceKey::of(poly);
            match groups.iter_mut().find(|(k, _)| k.matches(&key)) {
                Some((_, members)) => members.push(poly),
                None => groups.push((key, vec![poly])),
            }
        }

        let mut topo = Topology::new();
        let mut vertex_cache: HashMap<[i64; 3], VertexId> = HashMap::new();
        let mut edge_cache: HashMap<(VertexId, VertexId), EdgeId> = HashMap::new();

        for (key, members) in &groups {
            let area: f64 = members.iter().map(|p| p.area()).sum();
            if area < EDGE_EPSILON * EDGE_EPSILON {
                continue;
            }
            let weighted = members
                .iter()
                .fold(Vec3::zeros(), |acc, p| acc + p.centroid().coords * p.area());
            let normal = match key {
                FaceKey::Planar { normal, .. } => Some(*normal),
                FaceKey::Curved(_) => None,
            };

            let mut edges = Vec::new();
            let mut vertices = Vec::new();
            for (start, end) in boundary_segments(members) {
                let mut vertex = |p: Point3| {
                    *vertex_cache
                        .entry(quantize(&p))
                        .or_insert_with(|| topo.vertices.insert(Vertex { point: p }))
                };
                let (sv, ev) = (vertex(start), vertex(end));
                if sv == ev {
                    continue;
                }
                let key = if sv < ev { (sv, ev) } else { (ev, sv) };
                let edge = *edge_cache.entry(key).or_insert_with(|| {
                    topo.edges.insert(Edge {
                        start,
                        end,
                        start_vertex: sv,
                        end_vertex: ev,
                    })
                });
                edges.push(edge);
                for v in [sv, ev] {
                    if !vertices.contains(&v) {
                        vertices.push(v);
                    }
                }
            }

            topo.faces.insert(Face {
                normal,
                area,
                center: Point3::from(weighted / area),
                edges,
                vertices,
            });
        }
        topo
    }

    /// Edges of one face.
    pub fn face_edges(&self, face: FaceId) -> Vec<EdgeId> {
        self.faces
            .get(face)
            .map(|f| f.edges.clone())
            .unwrap_or_default()
    }

    /// Corners of one face.
    pub fn face_vertices(&self, face: FaceId) -> Vec<VertexId> {
        self.faces
            .get(face)
            .map(|f| f.vertices.clone())
            .unwrap_or_default()
    }

    /// End points of one edge.
    pub fn edge_vertices(&self, edge: EdgeId) -> Vec<VertexId> {
        self.edges
            .get(edge)
            .map(|e| vec![e.start_vertex, e.end_vertex])
            .unwrap_or_default()
    }
}
