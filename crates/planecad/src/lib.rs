#![warn(missing_docs)]

//! planecad - workplane-style parametric modeling in Rust
//!
//! Parts are built by sketching closed profiles on oriented workplanes and
//! extruding or cutting them, with faces, edges and vertices picked by
//! selector strings such as `>Z`, `<X[1]` or `|Y`.
//!
//! # Example
//!
//! ```rust,no_run
//! use planecad::Workplane;
//!
//! let plate = Workplane::new("XY")
//!     .and_then(|wp| wp.box_centered(40.0, 20.0, 5.0))
//!     .and_then(|wp| wp.faces(">Z"))
//!     .and_then(|wp| wp.workplane())
//!     .and_then(|wp| wp.hole(3.0, None))
//!     .unwrap();
//! plate.part().write_stl("plate.stl").unwrap();
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use planecad_ir::{
    CsgOp, Document, Node, NodeId, PlaneDef, ProfileSegment, SceneEntry, Vec2 as IrVec2,
    Vec3 as IrVec3,
};
use planecad_kernel::planecad_kernel_math::{Plane, Point2, Point3, Vec3};
use planecad_kernel::planecad_kernel_sketch::{SketchError, SketchProfile, SketchSegment};
use planecad_kernel::{Edge, Face, Solid, TriangleMesh};
use thiserror::Error;

pub mod export;
mod selector;
mod workplane;

pub use planecad_ir;
pub use planecad_kernel;
pub use selector::{Axis, Candidate, Selector, SelectorError, SelectorKind};
pub use workplane::{Centroid, Selected, Workplane, WorkplaneError};

/// Errors returned by CAD operations.
#[derive(Error, Debug)]
pub enum CadError {
    /// An I/O error occurred during export.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The geometry is empty (no polygons or triangles).
    #[error("Empty geometry")]
    EmptyGeometry,
    /// A construction document could not be evaluated.
    #[error("invalid document: {0}")]
    Document(String),
    /// A recorded sketch could not be rebuilt.
    #[error("sketch error: {0}")]
    Sketch(#[from] SketchError),
}

/// Global atomic counter for unique IR node IDs.
static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a globally unique [`NodeId`].
fn alloc_node_id() -> NodeId {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Keep future ids clear of ids loaded from a document.
fn reserve_node_ids(max_id: NodeId) {
    NEXT_NODE_ID.fetch_max(max_id.saturating_add(1), Ordering::Relaxed);
}

/// A named part with geometry.
///
/// Parts are created by extruding sketch profiles ([`Part::extrusion`]) and
/// combined with [`Part::union`] and [`Part::difference`]. Most code builds
/// them indirectly through a [`Workplane`].
///
/// Each Part carries an IR subtree recording its construction history.
/// Extract it with [`Part::to_document`] and rebuild it with
/// [`Part::from_document`].
#[derive(Debug, Clone)]
pub struct Part {
    /// Human-readable name for this part.
    pub name: String,
    solid: Solid,
    ir_node_id: NodeId,
    ir_nodes: BTreeMap<NodeId, Node>,
}

impl Part {
    // =========================================================================
    // Internal constructors
    // =========================================================================

    fn with_ir(
        name: String,
        solid: Solid,
        ir_node_id: NodeId,
        ir_nodes: BTreeMap<NodeId, Node>,
    ) -> Self {
        Self {
            name,
            solid,
            ir_node_id,
            ir_nodes,
        }
    }

    /// Create a leaf IR node and return `(id, nodes)`.
    fn make_leaf(name: &str, op: CsgOp) -> (NodeId, BTreeMap<NodeId, Node>) {
        let id = alloc_node_id();
        let mut nodes = BTreeMap::new();
        nodes.insert(
            id,
            Node {
                id,
                name: Some(name.to_string()),
                op,
            },
        );
        (id, nodes)
    }

    /// Build a binary CSG node, merging both children's IR maps.
    fn make_binary(
        name: &str,
        left: &Part,
        right: &Part,
        op_fn: impl FnOnce(NodeId, NodeId) -> CsgOp,
    ) -> (NodeId, BTreeMap<NodeId, Node>) {
        let id = alloc_node_id();
        let mut nodes = left.ir_nodes.clone();
        nodes.extend(right.ir_nodes.iter().map(|(&k, v)| (k, v.clone())));
        nodes.insert(
            id,
            Node {
                id,
                name: Some(name.to_string()),
                op: op_fn(left.ir_node_id, right.ir_node_id),
            },
        );
        (id, nodes)
    }

    // =========================================================================
    // Public constructors
    // =========================================================================

    /// Create an empty part.
    pub fn empty(name: impl Into<String>) -> Self {
        let name = name.into();
        let (id, nodes) = Self::make_leaf(&name, CsgOp::Empty);
        Self::with_ir(name, Solid::empty(), id, nodes)
    }

    /// Extrude a closed profile between `start` and `end` along its plane
    /// normal. Arcs are split into `resolution` facets per full turn.
    pub fn extrusion(
        name: impl Into<String>,
        profile: &SketchProfile,
        start: f64,
        end: f64,
        resolution: u32,
    ) -> Result<Self, SketchError> {
        let name = name.into();
        let solid = Solid::extrude(profile, start, end, resolution)?;
        let (id, nodes) = Self::make_leaf(
            &name,
            CsgOp::Extrude {
                plane: plane_to_ir(&profile.plane),
                segments: profile.segments.iter().map(segment_to_ir).collect(),
                start,
                end,
                resolution,
            },
        );
        Ok(Self::with_ir(name, solid, id, nodes))
    }

    /// Rebuild a part by evaluating a construction document.
    ///
    /// A document with several roots yields the union of all of them.
    pub fn from_document(doc: &Document) -> Result<Self, CadError> {
        if let Some(id) = doc.dangling_reference() {
            return Err(CadError::Document(format!(
                "node {id} is referenced but not defined"
            )));
        }
        if let Some(&max_id) = doc.nodes.keys().next_back() {
            reserve_node_ids(max_id);
        }
        tracing::debug!(
            nodes = doc.nodes.len(),
            roots = doc.roots.len(),
            "evaluating document"
        );

        let mut eval = Evaluator {
            doc,
            cache: HashMap::new(),
            visiting: HashSet::new(),
        };
        let mut result: Option<Part> = None;
        for entry in &doc.roots {
            let solid = eval.solid(entry.root)?;
            let part = Self::with_ir(
                entry.name.clone(),
                solid,
                entry.root,
                reachable_nodes(doc, entry.root),
            );
            result = Some(match result {
                Some(acc) => acc.union(&part),
                None => part,
            });
        }
        result.ok_or(CadError::EmptyGeometry)
    }

    // =========================================================================
    // CSG operations
    // =========================================================================

    /// Boolean difference (self - other).
    pub fn difference(&self, other: &Part) -> Self {
        let node_name = format!("{}-diff", self.name);
        let (id, nodes) = Self::make_binary(&node_name, self, other, |l, r| {
            CsgOp::Difference { left: l, right: r }
        });
        Self::with_ir(
            self.name.clone(),
            self.solid.difference(&other.solid),
            id,
            nodes,
        )
    }

    /// Boolean union (self + other).
    pub fn union(&self, other: &Part) -> Self {
        let node_name = format!("{}-union", self.name);
        let (id, nodes) =
            Self::make_binary(&node_name, self, other, |l, r| CsgOp::Union { left: l, right: r });
        Self::with_ir(self.name.clone(), self.solid.union(&other.solid), id, nodes)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Check if geometry is empty.
    pub fn is_empty(&self) -> bool {
        self.solid.is_empty()
    }

    /// The underlying kernel solid.
    pub fn solid(&self) -> &Solid {
        &self.solid
    }

    /// Root node of this part's construction history.
    pub fn ir_node_id(&self) -> NodeId {
        self.ir_node_id
    }

    /// Get the mesh representation.
    pub fn to_mesh(&self) -> TriangleMesh {
        self.solid.to_mesh()
    }

    /// Export to binary STL bytes (delegates to [`export::stl::to_stl_bytes`]).
    pub fn to_stl(&self) -> Result<Vec<u8>, CadError> {
        export::stl::to_stl_bytes(self)
    }

    /// Write STL to file (delegates to [`export::stl::export_stl`]).
    pub fn write_stl(&self, path: impl AsRef<std::path::Path>) -> Result<(), CadError> {
        export::stl::export_stl(self, path)
    }

    /// Extract the IR document for this part.
    ///
    /// The document contains all nodes in this part's construction DAG
    /// with this part's root node as the single scene entry.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.nodes = self.ir_nodes.clone();
        doc.roots.push(SceneEntry {
            root: self.ir_node_id,
            name: self.name.clone(),
        });
        doc
    }
}

// =============================================================================
// Mass properties and probes
// =============================================================================

impl Part {
    /// Enclosed volume.
    pub fn volume(&self) -> f64 {
        self.solid.volume()
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        self.solid.surface_area()
    }

    /// Axis-aligned bounding box as `(min, max)`.
    pub fn bounding_box(&self) -> ([f64; 3], [f64; 3]) {
        self.solid.bounding_box()
    }

    /// Geometric centroid (volume-weighted center of mass assuming uniform density).
    pub fn center_of_mass(&self) -> [f64; 3] {
        self.solid.center_of_mass()
    }

    /// Number of triangles in the mesh.
    pub fn num_triangles(&self) -> usize {
        self.solid.num_triangles()
    }

    /// True if the point lies strictly inside the material.
    pub fn contains(&self, point: [f64; 3]) -> bool {
        self.solid
            .contains(&Point3::new(point[0], point[1], point[2]))
    }

    /// Intervals `[t0, t1]` along `origin + t * dir` that lie inside the
    /// material, with `t` measured in the length units of a normalized `dir`.
    pub fn ray_intervals(&self, origin: [f64; 3], dir: [f64; 3]) -> Vec<(f64, f64)> {
        self.solid.ray_intervals(
            &Point3::new(origin[0], origin[1], origin[2]),
            &Vec3::new(dir[0], dir[1], dir[2]),
        )
    }

    /// Snapshot of every face.
    pub fn faces(&self) -> Vec<Face> {
        self.solid.faces()
    }

    /// Snapshot of every edge.
    pub fn edges(&self) -> Vec<Edge> {
        self.solid.edges()
    }
}

// =============================================================================
// IR conversion
// =============================================================================

fn ir_vec3(v: &Vec3) -> IrVec3 {
    IrVec3::new(v.x, v.y, v.z)
}

fn ir_point2(p: &Point2) -> IrVec2 {
    IrVec2::new(p.x, p.y)
}

fn point2(v: &IrVec2) -> Point2 {
    Point2::new(v.x, v.y)
}

fn plane_to_ir(plane: &Plane) -> PlaneDef {
    PlaneDef {
        origin: ir_vec3(&plane.origin.coords),
        x_dir: ir_vec3(plane.x_dir.as_ref()),
        normal: ir_vec3(plane.z_dir.as_ref()),
    }
}

fn plane_from_ir(def: &PlaneDef) -> Option<Plane> {
    let v = |v: &IrVec3| Vec3::new(v.x, v.y, v.z);
    Plane::new(Point3::from(v(&def.origin)), v(&def.x_dir), v(&def.normal))
}

fn segment_to_ir(seg: &SketchSegment) -> ProfileSegment {
    match seg {
        SketchSegment::Line { start, end } => ProfileSegment::Line {
            start: ir_point2(start),
            end: ir_point2(end),
        },
        SketchSegment::Arc {
            start,
            end,
            center,
            ccw,
        } => ProfileSegment::Arc {
            start: ir_point2(start),
            end: ir_point2(end),
            center: ir_point2(center),
            ccw: *ccw,
        },
    }
}

fn segment_from_ir(seg: &ProfileSegment) -> SketchSegment {
    match seg {
        ProfileSegment::Line { start, end } => SketchSegment::Line {
            start: point2(start),
            end: point2(end),
        },
        ProfileSegment::Arc {
            start,
            end,
            center,
            ccw,
        } => SketchSegment::Arc {
            start: point2(start),
            end: point2(end),
            center: point2(center),
            ccw: *ccw,
        },
    }
}

/// Nodes reachable from `root`, keyed by id.
fn reachable_nodes(doc: &Document, root: NodeId) -> BTreeMap<NodeId, Node> {
    let mut out = BTreeMap::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if out.contains_key(&id) {
            continue;
        }
        if let Some(node) = doc.nodes.get(&id) {
            out.insert(id, node.clone());
            stack.extend(doc.children(id));
        }
    }
    out
}

/// Memoized evaluation of a document DAG.
struct Evaluator<'a> {
    doc: &'a Document,
    cache: HashMap<NodeId, Solid>,
    visiting: HashSet<NodeId>,
}

impl Evaluator<'_> {
    fn solid(&mut self, id: NodeId) -> Result<Solid, CadError> {
        if let Some(solid) = self.cache.get(&id) {
            return Ok(solid.clone());
        }
        if !self.visiting.insert(id) {
            return Err(CadError::Document(format!("cycle through node {id}")));
        }
        let node = self
            .doc
            .nodes
            .get(&id)
            .ok_or_else(|| CadError::Document(format!("missing node {id}")))?;

        let solid = match &node.op {
            CsgOp::Empty => Solid::empty(),
            CsgOp::Extrude {
                plane,
                segments,
                start,
                end,
                resolution,
            } => {
                let plane = plane_from_ir(plane).ok_or_else(|| {
                    CadError::Document(format!("node {id} has a degenerate plane"))
                })?;
                let profile =
                    SketchProfile::new(plane, segments.iter().map(segment_from_ir).collect())?;
                Solid::extrude(&profile, *start, *end, *resolution)?
            }
            CsgOp::Union { left, right } => {
                let (l, r) = (self.solid(*left)?, self.solid(*right)?);
                l.union(&r)
            }
            CsgOp::Difference { left, right } => {
                let (l, r) = (self.solid(*left)?, self.solid(*right)?);
                l.difference(&r)
            }
        };

        self.visiting.remove(&id);
        self.cache.insert(id, solid.clone());
        Ok(solid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn slab(name: &str, cx: f64, w: f64, h: f64, t: f64) -> Part {
        let profile =
            SketchProfile::rectangle(Plane::xy(), Point2::new(cx, 0.0), w, h).unwrap();
        Part::extrusion(name, &profile, 0.0, t, 32).unwrap()
    }

    fn peg(name: &str, r: f64) -> Part {
        let profile = SketchProfile::circle(Plane::xy(), Point2::origin(), r).unwrap();
        Part::extrusion(name, &profile, -1.0, 10.0, 32).unwrap()
    }

    #[test]
    fn test_extrusion_creation() {
        let block = slab("block", 0.0, 10.0, 20.0, 5.0);
        assert!(!block.is_empty());
        assert_relative_eq!(block.volume(), 1000.0, epsilon = 1e-9);
        assert_eq!(block.num_triangles(), 12);
    }

    #[test]
    fn test_difference() {
        let plate = slab("plate", 0.0, 10.0, 10.0, 2.0);
        let drilled = plate.difference(&peg("hole", 1.0));
        assert!(!drilled.is_empty());
        assert!(drilled.volume() < plate.volume());
        assert!(!drilled.contains([0.0, 0.0, 1.0]));
        assert!(drilled.contains([4.0, 0.0, 1.0]));
        assert_eq!(drilled.name, "plate");
    }

    #[test]
    fn test_bounding_box_and_center() {
        let a = slab("a", 0.0, 4.0, 2.0, 1.0);
        let b = slab("b", 6.0, 4.0, 2.0, 1.0);
        let both = a.union(&b);
        assert_eq!(both.bounding_box(), ([-2.0, -1.0, 0.0], [8.0, 1.0, 1.0]));
        let com = both.center_of_mass();
        assert_relative_eq!(com[0], 3.0, epsilon = 1e-9);
        assert_relative_eq!(com[2], 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_ray_probe() {
        let plate = slab("plate", 0.0, 10.0, 10.0, 2.0).difference(&peg("hole", 1.0));
        assert!(plate.ray_intervals([0.0, 0.0, 5.0], [0.0, 0.0, -1.0]).is_empty());
        let hits = plate.ray_intervals([3.0, 0.0, 5.0], [0.0, 0.0, -1.0]);
        assert_eq!(hits.len(), 1);
        assert_relative_eq!(hits[0].1 - hits[0].0, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ir_leaf() {
        let block = slab("box", 0.0, 10.0, 20.0, 30.0);
        let doc = block.to_document();
        assert_eq!(doc.nodes.len(), 1);
        assert_eq!(doc.roots.len(), 1);
        assert_eq!(doc.roots[0].name, "box");
        let root = &doc.nodes[&doc.roots[0].root];
        assert_eq!(root.name, Some("box".to_string()));
        match &root.op {
            CsgOp::Extrude {
                segments,
                start,
                end,
                ..
            } => {
                assert_eq!(segments.len(), 4);
                assert_eq!(*start, 0.0);
                assert_eq!(*end, 30.0);
            }
            other => panic!("expected Extrude, got {other:?}"),
        }
    }

    #[test]
    fn test_ir_csg_dag() {
        let result = slab("box", 0.0, 10.0, 10.0, 10.0).difference(&peg("hole", 3.0));
        let doc = result.to_document();
        // 3 nodes: plate, peg, difference
        assert_eq!(doc.nodes.len(), 3);
        let root = &doc.nodes[&doc.roots[0].root];
        assert_eq!(root.name.as_deref(), Some("box-diff"));
        match &root.op {
            CsgOp::Difference { left, right } => {
                assert!(matches!(doc.nodes[left].op, CsgOp::Extrude { .. }));
                assert!(matches!(doc.nodes[right].op, CsgOp::Extrude { .. }));
            }
            other => panic!("expected Difference, got {other:?}"),
        }
    }

    #[test]
    fn test_document_reevaluation() {
        let original = slab("plate", 0.0, 10.0, 10.0, 2.0)
            .union(&slab("tab", 7.0, 4.0, 4.0, 2.0))
            .difference(&peg("hole", 1.5));
        let json = original.to_document().to_json().expect("serialize");
        let doc = Document::from_json(&json).expect("deserialize");
        let rebuilt = Part::from_document(&doc).expect("evaluate");

        assert_eq!(rebuilt.name, "plate");
        assert_relative_eq!(rebuilt.volume(), original.volume(), epsilon = 1e-9);
        assert_eq!(rebuilt.bounding_box(), original.bounding_box());
        assert_eq!(rebuilt.to_document(), original.to_document());

        // New operations never reuse ids loaded from the document.
        let extended = rebuilt.union(&slab("extra", 0.0, 1.0, 1.0, 1.0));
        assert!(doc.nodes.keys().all(|&id| id < extended.ir_node_id()));
    }

    #[test]
    fn test_document_errors() {
        let mut doc = slab("plate", 0.0, 2.0, 2.0, 1.0).to_document();
        let root = doc.roots[0].root;
        doc.nodes.insert(
            root + 1_000_000,
            Node {
                id: root + 1_000_000,
                name: None,
                op: CsgOp::Union {
                    left: root,
                    right: root + 2_000_000,
                },
            },
        );
        assert!(matches!(
            Part::from_document(&doc),
            Err(CadError::Document(_))
        ));

        let mut cyclic = Document::new();
        cyclic.nodes.insert(
            1,
            Node {
                id: 1,
                name: None,
                op: CsgOp::Union { left: 2, right: 2 },
            },
        );
        cyclic.nodes.insert(
            2,
            Node {
                id: 2,
                name: None,
                op: CsgOp::Difference { left: 1, right: 1 },
            },
        );
        cyclic.roots.push(SceneEntry {
            root: 1,
            name: "loop".to_string(),
        });
        assert!(matches!(
            Part::from_document(&cyclic),
            Err(CadError::Document(_))
        ));

        assert!(matches!(
            Part::from_document(&Document::new()),
            Err(CadError::EmptyGeometry)
        ));
    }

    #[test]
    fn test_empty_part() {
        let empty = Part::empty("nothing");
        assert!(empty.is_empty());
        assert!(matches!(empty.to_stl(), Err(CadError::EmptyGeometry)));
        let block = slab("block", 0.0, 1.0, 1.0, 1.0);
        assert_relative_eq!(empty.union(&block).volume(), 1.0, epsilon = 1e-9);
    }
}
