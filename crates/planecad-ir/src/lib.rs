//! Intermediate representation for planecad parts.
//!
//! This crate defines the DAG-based IR that records how a part was built:
//! extrusions of closed sketch profiles combined by union and difference.
//!
//! The IR is purely declarative: no polygon data, just a graph of
//! operations. Evaluation is handled separately by the `planecad` crate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unique identifier for a node in the IR graph.
pub type NodeId = u64;

/// Current document format version.
pub const FORMAT_VERSION: &str = "0.1";

/// 3D vector with f64 components (conventionally millimeters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// Create a new Vec3.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// 2D vector in sketch coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
}

impl Vec2 {
    /// Create a new Vec2.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A sketch plane: origin, local X direction and normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneDef {
    /// Origin in world coordinates.
    pub origin: Vec3,
    /// Local X axis.
    pub x_dir: Vec3,
    /// Plane normal.
    pub normal: Vec3,
}

/// A segment of a closed sketch profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProfileSegment {
    /// Straight line.
    Line {
        /// Start point.
        start: Vec2,
        /// End point.
        end: Vec2,
    },
    /// Circular arc.
    Arc {
        /// Start point.
        start: Vec2,
        /// End point.
        end: Vec2,
        /// Arc center.
        center: Vec2,
        /// Counter-clockwise from start to end.
        ccw: bool,
    },
}

/// CSG operation, the core building block of the IR DAG.
///
/// Each variant is either a leaf or a combining operation that references
/// child nodes by [`NodeId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CsgOp {
    /// Empty geometry (identity for union).
    Empty,
    /// Closed profile swept between two offsets along the plane normal.
    Extrude {
        /// Sketch plane.
        plane: PlaneDef,
        /// Closed profile in plane coordinates.
        segments: Vec<ProfileSegment>,
        /// Lower offset along the normal.
        start: f64,
        /// Upper offset along the normal.
        end: f64,
        /// Arc facets per full turn.
        resolution: u32,
    },
    /// Boolean union of two geometries.
    Union {
        /// Left operand.
        left: NodeId,
        /// Right operand.
        right: NodeId,
    },
    /// Boolean difference (left minus right).
    Difference {
        /// Left operand (base).
        left: NodeId,
        /// Right operand (subtracted).
        right: NodeId,
    },
}

/// A node in the IR graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier.
    pub id: NodeId,
    /// Optional human-readable name.
    pub name: Option<String>,
    /// The operation this node represents.
    pub op: CsgOp,
}

/// An entry in the scene: a named root node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEntry {
    /// Root node of this part.
    pub root: NodeId,
    /// Part name.
    pub name: String,
}

/// A planecad document: the full IR DAG plus its named roots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Format version string (e.g. "0.1").
    pub version: String,
    /// All nodes in the graph, keyed by [`NodeId`].
    pub nodes: BTreeMap<NodeId, Node>,
    /// Parts in the document.
    pub roots: Vec<SceneEntry>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            nodes: BTreeMap::new(),
            roots: Vec::new(),
        }
    }
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of the direct children of a node.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.nodes.get(&id).map(|n| &n.op) {
            Some(CsgOp::Union { left, right }) | Some(CsgOp::Difference { left, right }) => {
                vec![*left, *right]
            }
            _ => Vec::new(),
        }
    }

    /// First child id that is referenced but missing from `nodes`.
    pub fn dangling_reference(&self) -> Option<NodeId> {
        self.nodes
            .keys()
            .flat_map(|&id| self.children(id))
            .chain(self.roots.iter().map(|r| r.root))
            .find(|id| !self.nodes.contains_key(id))
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_extrude() -> CsgOp {
        let p = |x, y| Vec2::new(x, y);
        let corners = [p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)];
        CsgOp::Extrude {
            plane: PlaneDef {
                origin: Vec3::new(0.0, 0.0, 0.0),
                x_dir: Vec3::new(1.0, 0.0, 0.0),
                normal: Vec3::new(0.0, 0.0, 1.0),
            },
            segments: (0..4)
                .map(|i| ProfileSegment::Line {
                    start: corners[i],
                    end: corners[(i + 1) % 4],
                })
                .collect(),
            start: 0.0,
            end: 2.0,
            resolution: 32,
        }
    }

    #[test]
    fn roundtrip_document() {
        let mut doc = Document::new();
        doc.nodes.insert(
            1,
            Node {
                id: 1,
                name: Some("block".to_string()),
                op: square_extrude(),
            },
        );
        doc.nodes.insert(
            2,
            Node {
                id: 2,
                name: None,
                op: CsgOp::Extrude {
                    plane: PlaneDef {
                        origin: Vec3::new(0.5, 0.5, 0.0),
                        x_dir: Vec3::new(1.0, 0.0, 0.0),
                        normal: Vec3::new(0.0, 0.0, 1.0),
                    },
                    segments: vec![
                        ProfileSegment::Arc {
                            start: Vec2::new(0.2, 0.0),
                            end: Vec2::new(-0.2, 0.0),
                            center: Vec2::new(0.0, 0.0),
                            ccw: true,
                        },
                        ProfileSegment::Arc {
                            start: Vec2::new(-0.2, 0.0),
                            end: Vec2::new(0.2, 0.0),
                            center: Vec2::new(0.0, 0.0),
                            ccw: true,
                        },
                    ],
                    start: -1.0,
                    end: 3.0,
                    resolution: 32,
                },
            },
        );
        doc.nodes.insert(
            3,
            Node {
                id: 3,
                name: Some("drilled".to_string()),
                op: CsgOp::Difference { left: 1, right: 2 },
            },
        );
        doc.roots.push(SceneEntry {
            root: 3,
            name: "drilled".to_string(),
        });

        let json = doc.to_json().expect("serialize");
        let restored = Document::from_json(&json).expect("deserialize");

        assert_eq!(doc, restored);
        assert_eq!(restored.nodes.len(), 3);
        assert_eq!(restored.children(3), vec![1, 2]);
        assert_eq!(restored.dangling_reference(), None);
    }

    #[test]
    fn dangling_reference_detected() {
        let mut doc = Document::new();
        doc.nodes.insert(
            5,
            Node {
                id: 5,
                name: None,
                op: CsgOp::Union { left: 1, right: 2 },
            },
        );
        assert_eq!(doc.dangling_reference(), Some(1));
    }

    #[test]
    fn empty_document() {
        let doc = Document::new();
        assert_eq!(doc.version, FORMAT_VERSION);
        assert!(doc.nodes.is_empty());
        assert!(doc.roots.is_empty());
    }

    #[test]
    fn serde_tagged_enum() {
        let op = square_extrude();
        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains(r#""type":"Extrude""#));
        assert!(json.contains(r#""type":"Line""#));

        let restored: CsgOp = serde_json::from_str(&json).unwrap();
        assert_eq!(op, restored);
    }
}
