//! Chainable sketch-and-extrude modeling context.
//!
//! A [`Workplane`] threads one state through a modeling script: the part
//! built so far, an oriented sketch [`Plane`], the current face, edge or
//! vertex selection, placement points, the sketch pen and any pending
//! closed profiles. Every operation consumes the workplane and returns the
//! next one, so scripts read as a chain of `?`-separated steps. Clones are
//! cheap and can be used to branch off a side query.

use planecad_kernel::planecad_kernel_math::{Plane, Point2, Point3, Tolerance, Vec2, Vec3};
use planecad_kernel::planecad_kernel_sketch::{
    SketchError, SketchProfile, SketchSegment, DEFAULT_RESOLUTION,
};
use planecad_kernel::{Edge, EdgeId, Face, FaceId, Topology, Vertex, VertexId};
use thiserror::Error;

use crate::selector::{Candidate, Selector, SelectorError};
use crate::Part;

/// Errors from workplane operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WorkplaneError {
    /// The plane name is not one of the standard planes.
    #[error("unknown plane name '{0}'")]
    UnknownPlane(String),
    /// The operation needs a selection but nothing is selected.
    #[error("selection is empty")]
    EmptySelection,
    /// The selection holds the wrong kind of object.
    #[error("expected a {expected} in the selection")]
    WrongSelection {
        /// The object kind the operation needs.
        expected: &'static str,
    },
    /// A workplane was requested on faces that do not share a plane.
    #[error("selected faces are not coplanar")]
    NonCoplanarFaces,
    /// A workplane was requested on a curved face.
    #[error("cannot place a workplane on a curved face")]
    CurvedFace,
    /// The selection does not define a valid frame.
    #[error("degenerate workplane frame")]
    DegeneratePlane,
    /// `close` was called with no segments drawn.
    #[error("no wire to close")]
    EmptyWire,
    /// A solid operation was requested while a wire is still open.
    #[error("wire is not closed")]
    UnclosedWire,
    /// A solid operation was requested with no closed profile pending.
    #[error("no closed profile to extrude or cut")]
    NothingToExtrude,
    /// A count or size argument is out of range.
    #[error("invalid {what}: {value}")]
    InvalidArgument {
        /// Which argument.
        what: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// Sketch construction failed.
    #[error(transparent)]
    Sketch(#[from] SketchError),
    /// Selector parsing or evaluation failed.
    #[error(transparent)]
    Selector(#[from] SelectorError),
}

/// Anything with a well-defined center point.
pub trait Centroid {
    /// Center in world coordinates.
    fn centroid(&self) -> Point3;
}

impl Centroid for Face {
    fn centroid(&self) -> Point3 {
        self.center
    }
}

impl Centroid for Edge {
    fn centroid(&self) -> Point3 {
        self.center()
    }
}

impl Centroid for Vertex {
    fn centroid(&self) -> Point3 {
        self.point
    }
}

impl Centroid for Point3 {
    fn centroid(&self) -> Point3 {
        *self
    }
}

/// One selected topological object of the current part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selected {
    /// A face.
    Face(FaceId),
    /// An edge.
    Edge(EdgeId),
    /// A vertex.
    Vertex(VertexId),
}

/// Modeling context: part + plane + selection + pending sketch.
#[derive(Debug, Clone)]
pub struct Workplane {
    part: Part,
    plane: Plane,
    selection: Vec<Selected>,
    points: Vec<Point2>,
    pen: Point2,
    wire: Vec<SketchSegment>,
    profiles: Vec<SketchProfile>,
    holes_drilled: usize,
    resolution: u32,
}

impl Workplane {
    // =========================================================================
    // Construction and accessors
    // =========================================================================

    /// Start on a named standard plane (`XY`, `YZ`, `ZX`, `XZ`, `YX`, `ZY`,
    /// `front`, `back`, `left`, `right`, `top`, `bottom`).
    pub fn new(plane_name: &str) -> Result<Self, WorkplaneError> {
        let plane = Plane::named(plane_name)
            .ok_or_else(|| WorkplaneError::UnknownPlane(plane_name.to_string()))?;
        Ok(Self::on(plane))
    }

    /// Start on an explicit plane with an empty part.
    pub fn on(plane: Plane) -> Self {
        Self {
            part: Part::empty("part"),
            plane,
            selection: Vec::new(),
            points: Vec::new(),
            pen: Point2::origin(),
            wire: Vec::new(),
            profiles: Vec::new(),
            holes_drilled: 0,
            resolution: DEFAULT_RESOLUTION,
        }
    }

    /// Arc facets per full turn for later sketches.
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    /// Rename the part being built.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.part.name = name.into();
        self
    }

    /// The part built so far.
    pub fn part(&self) -> &Part {
        &self.part
    }

    /// Finish the chain and keep the part.
    pub fn into_part(self) -> Part {
        self.part
    }

    /// The current sketch plane.
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// The current selection.
    pub fn selection(&self) -> &[Selected] {
        &self.selection
    }

    /// Pending placement points in plane coordinates.
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// Number of holes drilled over the whole chain.
    pub fn holes_drilled(&self) -> usize {
        self.holes_drilled
    }

    fn topology(&self) -> &Topology {
        self.part.solid().topology()
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Select faces: of the selected faces if any, else of the whole part.
    pub fn faces(mut self, selector: &str) -> Result<Self, WorkplaneError> {
        let selector: Selector = selector.parse()?;
        let topo = self.topology();
        let mut pool: Vec<FaceId> = self
            .selection
            .iter()
            .filter_map(|s| match s {
                Selected::Face(id) => Some(*id),
                _ => None,
            })
            .collect();
        if pool.is_empty() {
            pool = topo.faces.keys().collect();
        }
        let candidates: Vec<Candidate> = pool
            .iter()
            .filter_map(|&id| topo.faces.get(id))
            .map(|f| Candidate {
                position: f.center,
                direction: f.normal,
            })
            .collect();
        let picked = selector.select(&candidates)?;
        self.selection = picked.into_iter().map(|i| Selected::Face(pool[i])).collect();
        tracing::debug!(%selector, selected = self.selection.len(), "faces");
        Ok(self)
    }

    /// Select edges: of the selected faces, among the selected edges, or of
    /// the whole part.
    pub fn edges(mut self, selector: &str) -> Result<Self, WorkplaneError> {
        let selector: Selector = selector.parse()?;
        let topo = self.topology();
        let mut pool: Vec<EdgeId> = Vec::new();
        for s in &self.selection {
            let ids = match s {
                Selected::Face(id) => topo.face_edges(*id),
                Selected::Edge(id) => vec![*id],
                Selected::Vertex(_) => Vec::new(),
            };
            for id in ids {
                if !pool.contains(&id) {
                    pool.push(id);
                }
            }
        }
        if pool.is_empty() {
            pool = topo.edges.keys().collect();
        }
        let candidates: Vec<Candidate> = pool
            .iter()
            .filter_map(|&id| topo.edges.get(id))
            .map(|e| Candidate {
                position: e.center(),
                direction: Some(e.direction()),
            })
            .collect();
        let picked = selector.select(&candidates)?;
        self.selection = picked.into_iter().map(|i| Selected::Edge(pool[i])).collect();
        tracing::debug!(%selector, selected = self.selection.len(), "edges");
        Ok(self)
    }

    /// Select vertices: corners of the selected faces or edges, among the
    /// selected vertices, or of the whole part.
    pub fn vertices(mut self, selector: &str) -> Result<Self, WorkplaneError> {
        let selector: Selector = selector.parse()?;
        let topo = self.topology();
        let mut pool: Vec<VertexId> = Vec::new();
        for s in &self.selection {
            let ids = match s {
                Selected::Face(id) => topo.face_vertices(*id),
                Selected::Edge(id) => topo.edge_vertices(*id),
                Selected::Vertex(id) => vec![*id],
            };
            for id in ids {
                if !pool.contains(&id) {
                    pool.push(id);
                }
            }
        }
        if pool.is_empty() {
            pool = topo.vertices.keys().collect();
        }
        let candidates: Vec<Candidate> = pool
            .iter()
            .filter_map(|&id| topo.vertices.get(id))
            .map(|v| Candidate {
                position: v.point,
                direction: None,
            })
            .collect();
        let picked = selector.select(&candidates)?;
        self.selection = picked
            .into_iter()
            .map(|i| Selected::Vertex(pool[i]))
            .collect();
        tracing::debug!(%selector, selected = self.selection.len(), "vertices");
        Ok(self)
    }

    /// First selected face.
    pub fn face(&self) -> Result<Face, WorkplaneError> {
        self.first(|s| match s {
            Selected::Face(id) => self.topology().faces.get(*id).cloned(),
            _ => None,
        }, "face")
    }

    /// First selected edge.
    pub fn edge(&self) -> Result<Edge, WorkplaneError> {
        self.first(|s| match s {
            Selected::Edge(id) => self.topology().edges.get(*id).cloned(),
            _ => None,
        }, "edge")
    }

    /// First selected vertex.
    pub fn vertex(&self) -> Result<Vertex, WorkplaneError> {
        self.first(|s| match s {
            Selected::Vertex(id) => self.topology().vertices.get(*id).copied(),
            _ => None,
        }, "vertex")
    }

    fn first<T>(
        &self,
        pick: impl Fn(&Selected) -> Option<T>,
        expected: &'static str,
    ) -> Result<T, WorkplaneError> {
        if self.selection.is_empty() {
            return Err(WorkplaneError::EmptySelection);
        }
        self.selection
            .iter()
            .find_map(pick)
            .ok_or(WorkplaneError::WrongSelection { expected })
    }

    // =========================================================================
    // Plane placement
    // =========================================================================

    /// New workplane on the selection.
    ///
    /// Faces must be planar and coplanar: the plane goes through their
    /// area-weighted centroid with their normal, and its X axis is
    /// `Z × normal` (world X when the normal is vertical). Edges and
    /// vertices keep the current orientation and move the origin to their
    /// mean center; pending points do the same. With nothing selected the
    /// plane is unchanged.
    pub fn workplane(self) -> Result<Self, WorkplaneError> {
        self.workplane_offset(0.0)
    }

    /// [`Workplane::workplane`] moved `offset` along the new normal.
    pub fn workplane_offset(mut self, offset: f64) -> Result<Self, WorkplaneError> {
        let plane = self.selection_plane()?;
        self.plane = plane.offset(offset);
        self.selection.clear();
        self.reset_sketch();
        tracing::debug!(origin = ?self.plane.origin, normal = ?self.plane.normal(), "workplane");
        Ok(self)
    }

    fn selection_plane(&self) -> Result<Plane, WorkplaneError> {
        let tol = Tolerance::SELECTION;
        let topo = self.topology();

        let faces: Vec<&Face> = self
            .selection
            .iter()
            .filter_map(|s| match s {
                Selected::Face(id) => topo.faces.get(*id),
                _ => None,
            })
            .collect();
        if let Some(first) = faces.first() {
            let normal = first.normal.ok_or(WorkplaneError::CurvedFace)?;
            let mut weighted = Vec3::zeros();
            let mut area = 0.0;
            for f in &faces {
                let n = f.normal.ok_or(WorkplaneError::CurvedFace)?;
                let apart = (f.center - first.center).dot(&normal).abs();
                if !tol.same_direction(&n, &normal) || apart > tol.linear {
                    return Err(WorkplaneError::NonCoplanarFaces);
                }
                weighted += f.center.coords * f.area;
                area += f.area;
            }
            let x_dir = Vec3::z().cross(&normal);
            let x_dir = if x_dir.norm() < tol.linear {
                Vec3::x()
            } else {
                x_dir
            };
            return Plane::new(Point3::from(weighted / area), x_dir, normal)
                .ok_or(WorkplaneError::DegeneratePlane);
        }

        let anchors: Vec<Point3> = self
            .selection
            .iter()
            .filter_map(|s| match s {
                Selected::Edge(id) => topo.edges.get(*id).map(Edge::center),
                Selected::Vertex(id) => topo.vertices.get(*id).map(|v| v.point),
                Selected::Face(_) => None,
            })
            .collect();
        let anchors = if anchors.is_empty() {
            self.points
                .iter()
                .map(|p| self.plane.to_world_2d(p))
                .collect()
        } else {
            anchors
        };
        if anchors.is_empty() {
            return Ok(self.plane.clone());
        }
        let mean = anchors
            .iter()
            .fold(Vec3::zeros(), |acc, p| acc + p.coords)
            / anchors.len() as f64;
        Ok(self.plane.with_origin(Point3::from(mean)))
    }

    /// Move the origin by `(x, y)` in plane coordinates.
    pub fn center(mut self, x: f64, y: f64) -> Result<Self, WorkplaneError> {
        self.plane = self.plane.shifted(x, y);
        self.selection.clear();
        self.reset_sketch();
        Ok(self)
    }

    /// Rotate the plane by Euler angles in degrees about the world X, Y and
    /// Z axes, after moving its origin by `offset` in plane coordinates.
    pub fn transformed(mut self, rotate: [f64; 3], offset: [f64; 3]) -> Result<Self, WorkplaneError> {
        let origin = self
            .plane
            .to_world(&Point3::new(offset[0], offset[1], offset[2]));
        self.plane = self
            .plane
            .rotated(rotate[0], rotate[1], rotate[2])
            .with_origin(origin);
        self.selection.clear();
        self.reset_sketch();
        Ok(self)
    }

    // =========================================================================
    // Sketching
    // =========================================================================

    /// Move the pen to `(x, y)` and make it the single placement point.
    pub fn move_to(mut self, x: f64, y: f64) -> Result<Self, WorkplaneError> {
        if !self.wire.is_empty() {
            return Err(WorkplaneError::UnclosedWire);
        }
        self.pen = Point2::new(x, y);
        self.points = vec![self.pen];
        Ok(self)
    }

    /// Straight segment to an absolute point.
    pub fn line_to(self, x: f64, y: f64) -> Result<Self, WorkplaneError> {
        let start = self.pen;
        self.push_segment(SketchSegment::Line {
            start,
            end: Point2::new(x, y),
        })
    }

    /// Straight segment by a relative offset.
    pub fn line(self, dx: f64, dy: f64) -> Result<Self, WorkplaneError> {
        let end = self.pen + Vec2::new(dx, dy);
        self.line_to(end.x, end.y)
    }

    /// Horizontal segment of signed length `d`.
    pub fn h_line(self, d: f64) -> Result<Self, WorkplaneError> {
        self.line(d, 0.0)
    }

    /// Vertical segment of signed length `d`.
    pub fn v_line(self, d: f64) -> Result<Self, WorkplaneError> {
        self.line(0.0, d)
    }

    /// Horizontal segment to absolute `x`.
    pub fn h_line_to(self, x: f64) -> Result<Self, WorkplaneError> {
        let y = self.pen.y;
        self.line_to(x, y)
    }

    /// Vertical segment to absolute `y`.
    pub fn v_line_to(self, y: f64) -> Result<Self, WorkplaneError> {
        let x = self.pen.x;
        self.line_to(x, y)
    }

    /// Circular arc from the pen through `mid` to `end`.
    pub fn three_point_arc(
        self,
        mid: (f64, f64),
        end: (f64, f64),
    ) -> Result<Self, WorkplaneError> {
        let seg = SketchSegment::arc_through(
            self.pen,
            Point2::new(mid.0, mid.1),
            Point2::new(end.0, end.1),
        )?;
        self.push_segment(seg)
    }

    fn push_segment(mut self, seg: SketchSegment) -> Result<Self, WorkplaneError> {
        if seg.is_degenerate() {
            return Err(SketchError::DegenerateSegment(self.wire.len()).into());
        }
        self.pen = seg.end();
        self.points.clear();
        self.wire.push(seg);
        Ok(self)
    }

    /// Close the wire back to its start and queue it as a profile.
    pub fn close(mut self) -> Result<Self, WorkplaneError> {
        let start = self
            .wire
            .first()
            .map(SketchSegment::start)
            .ok_or(WorkplaneError::EmptyWire)?;
        if (self.pen - start).norm() > Tolerance::DEFAULT.linear {
            self.wire.push(SketchSegment::Line {
                start: self.pen,
                end: start,
            });
        }
        let profile = SketchProfile::new(self.plane.clone(), std::mem::take(&mut self.wire))?;
        self.profiles.push(profile);
        self.pen = Point2::origin();
        Ok(self)
    }

    /// Centered `width × height` rectangle at every placement point.
    pub fn rect(mut self, width: f64, height: f64) -> Result<Self, WorkplaneError> {
        for c in self.placement() {
            let profile = SketchProfile::rectangle(self.plane.clone(), c, width, height)?;
            self.profiles.push(profile);
        }
        Ok(self)
    }

    /// Replace the placement points with the corners of a centered
    /// `width × height` rectangle around each current point.
    pub fn construction_rect(mut self, width: f64, height: f64) -> Result<Self, WorkplaneError> {
        for (what, value) in [("width", width), ("height", height)] {
            if value <= 0.0 {
                return Err(WorkplaneError::InvalidArgument { what, value });
            }
        }
        let (hw, hh) = (width / 2.0, height / 2.0);
        self.points = self
            .placement()
            .into_iter()
            .flat_map(|c| {
                [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)]
                    .map(|(dx, dy)| c + Vec2::new(dx, dy))
            })
            .collect();
        Ok(self)
    }

    /// Regular polygon of `sides` on a circle of `diameter` at every
    /// placement point, first corner on the local +X axis.
    pub fn polygon(mut self, sides: usize, diameter: f64) -> Result<Self, WorkplaneError> {
        for c in self.placement() {
            let profile = SketchProfile::regular_polygon(self.plane.clone(), c, sides, diameter)?;
            self.profiles.push(profile);
        }
        Ok(self)
    }

    /// Replace the placement points.
    pub fn push_points(mut self, points: &[(f64, f64)]) -> Result<Self, WorkplaneError> {
        self.points = points.iter().map(|&(x, y)| Point2::new(x, y)).collect();
        Ok(self)
    }

    /// Replace the placement points with a grid centered on the origin.
    pub fn rarray(
        mut self,
        x_spacing: f64,
        y_spacing: f64,
        x_count: usize,
        y_count: usize,
    ) -> Result<Self, WorkplaneError> {
        for (what, count) in [("x count", x_count), ("y count", y_count)] {
            if count == 0 {
                return Err(WorkplaneError::InvalidArgument {
                    what,
                    value: count as f64,
                });
            }
        }
        let x0 = -x_spacing * (x_count - 1) as f64 / 2.0;
        let y0 = -y_spacing * (y_count - 1) as f64 / 2.0;
        self.points = (0..x_count)
            .flat_map(|i| {
                (0..y_count).map(move |j| {
                    Point2::new(x0 + i as f64 * x_spacing, y0 + j as f64 * y_spacing)
                })
            })
            .collect();
        Ok(self)
    }

    fn placement(&self) -> Vec<Point2> {
        if self.points.is_empty() {
            vec![Point2::origin()]
        } else {
            self.points.clone()
        }
    }

    fn reset_sketch(&mut self) {
        self.points.clear();
        self.pen = Point2::origin();
        self.wire.clear();
        self.profiles.clear();
    }

    // =========================================================================
    // Solid operations
    // =========================================================================

    /// `length × width × height` box centered on every placement point.
    pub fn box_centered(
        mut self,
        length: f64,
        width: f64,
        height: f64,
    ) -> Result<Self, WorkplaneError> {
        let half = height / 2.0;
        let mut pieces = Vec::new();
        for c in self.placement() {
            let profile = SketchProfile::rectangle(self.plane.clone(), c, length, width)?;
            pieces.push(Part::extrusion("box", &profile, -half, half, self.resolution)?);
        }
        let tool = combine(pieces).ok_or(WorkplaneError::NothingToExtrude)?;
        self.part = self.part.union(&tool);
        Ok(self.finish("box"))
    }

    /// Extrude pending profiles by signed `distance` and add them.
    pub fn extrude(mut self, distance: f64) -> Result<Self, WorkplaneError> {
        let tool = self.take_tool("extrude", 0.0, distance)?;
        self.part = self.part.union(&tool);
        Ok(self.finish("extrude"))
    }

    /// Extrude pending profiles `distance` to both sides and add them.
    pub fn extrude_both(mut self, distance: f64) -> Result<Self, WorkplaneError> {
        let d = distance.abs();
        let tool = self.take_tool("extrude", -d, d)?;
        self.part = self.part.union(&tool);
        Ok(self.finish("extrude_both"))
    }

    /// Cut pending profiles by signed `depth` (negative goes into the
    /// material behind the plane).
    pub fn cut_blind(mut self, depth: f64) -> Result<Self, WorkplaneError> {
        let tool = self.take_tool("cut", 0.0, depth)?;
        self.part = self.part.difference(&tool);
        Ok(self.finish("cut_blind"))
    }

    /// Cut pending profiles through all material behind the plane.
    pub fn cut_thru_all(mut self) -> Result<Self, WorkplaneError> {
        let depth = self.thru_depth();
        let tool = self.take_tool("cut", -depth, 0.0)?;
        self.part = self.part.difference(&tool);
        Ok(self.finish("cut_thru_all"))
    }

    /// Drill a hole at every placement point, `depth` deep or through all.
    pub fn hole(self, diameter: f64, depth: Option<f64>) -> Result<Self, WorkplaneError> {
        self.drill(diameter, depth, None)
    }

    /// Counterbored hole at every placement point: a `diameter` bore plus a
    /// `cbore_diameter` seat `cbore_depth` deep.
    pub fn cbore_hole(
        self,
        diameter: f64,
        cbore_diameter: f64,
        cbore_depth: f64,
        depth: Option<f64>,
    ) -> Result<Self, WorkplaneError> {
        self.drill(diameter, depth, Some((cbore_diameter, cbore_depth)))
    }

    fn drill(
        mut self,
        diameter: f64,
        depth: Option<f64>,
        cbore: Option<(f64, f64)>,
    ) -> Result<Self, WorkplaneError> {
        if !self.wire.is_empty() {
            return Err(WorkplaneError::UnclosedWire);
        }
        let depth = depth.unwrap_or_else(|| self.thru_depth());
        for (what, value) in [("hole depth", depth)]
            .into_iter()
            .chain(cbore.map(|(_, d)| ("counterbore depth", d)))
        {
            if value <= 0.0 {
                return Err(WorkplaneError::InvalidArgument { what, value });
            }
        }

        let centers = self.placement();
        let mut pieces = Vec::new();
        for &c in &centers {
            let bore = SketchProfile::circle(self.plane.clone(), c, diameter / 2.0)?;
            let mut piece = Part::extrusion("hole", &bore, -depth, 0.0, self.resolution)?;
            if let Some((cbore_diameter, cbore_depth)) = cbore {
                let seat = SketchProfile::circle(self.plane.clone(), c, cbore_diameter / 2.0)?;
                let seat = Part::extrusion("cbore", &seat, -cbore_depth, 0.0, self.resolution)?;
                piece = piece.union(&seat);
            }
            pieces.push(piece);
        }
        let tool = combine(pieces).ok_or(WorkplaneError::NothingToExtrude)?;
        self.part = self.part.difference(&tool);
        self.holes_drilled += centers.len();
        tracing::debug!(count = centers.len(), diameter, depth, "drilled holes");
        Ok(self.finish("hole"))
    }

    /// Union of all pending profiles extruded between `start` and `end`.
    fn take_tool(&mut self, name: &str, start: f64, end: f64) -> Result<Part, WorkplaneError> {
        if !self.wire.is_empty() {
            return Err(WorkplaneError::UnclosedWire);
        }
        let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
        let mut pieces = Vec::new();
        for profile in std::mem::take(&mut self.profiles) {
            pieces.push(Part::extrusion(name, &profile, lo, hi, self.resolution)?);
        }
        combine(pieces).ok_or(WorkplaneError::NothingToExtrude)
    }

    /// A length that reaches past all material from the plane origin.
    fn thru_depth(&self) -> f64 {
        let bounds = self.part.solid().bounds();
        if bounds.is_empty() {
            return 1.0;
        }
        (bounds.center() - self.plane.origin).norm() + bounds.diagonal() + 1.0
    }

    fn finish(mut self, op: &str) -> Self {
        self.selection.clear();
        self.reset_sketch();
        tracing::debug!(
            op,
            polygons = self.part.solid().polygons().len(),
            volume = self.part.volume(),
            "solid updated"
        );
        self
    }
}

/// Union of all pieces, `None` when there are none.
fn combine(pieces: Vec<Part>) -> Option<Part> {
    pieces.into_iter().reduce(|acc, piece| acc.union(&piece))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::TAU;

    /// Area of the 32-gon a circle of radius `r` is polygonized into.
    fn ngon_area(r: f64) -> f64 {
        0.5 * 32.0 * r * r * (TAU / 32.0).sin()
    }

    fn block() -> Workplane {
        Workplane::new("XY")
            .unwrap()
            .box_centered(20.0, 20.0, 10.0)
            .unwrap()
    }

    #[test]
    fn test_box_and_top_face() {
        let wp = block();
        assert_relative_eq!(wp.part().volume(), 4000.0, epsilon = 1e-9);
        assert_eq!(
            wp.part().bounding_box(),
            ([-10.0, -10.0, -5.0], [10.0, 10.0, 5.0])
        );
        let top = wp.faces(">Z").unwrap();
        assert_eq!(top.selection().len(), 1);
        let face = top.face().unwrap();
        assert_relative_eq!(face.center, Point3::new(0.0, 0.0, 5.0), epsilon = 1e-9);
        assert_relative_eq!(face.area, 400.0, epsilon = 1e-9);
    }

    #[test]
    fn test_edge_and_vertex_chains() {
        let wp = Workplane::new("XY")
            .unwrap()
            .box_centered(10.0, 20.0, 30.0)
            .unwrap();
        let edge = wp.clone().faces(">Z").unwrap().edges(">Y").unwrap().edge().unwrap();
        assert_relative_eq!(edge.length(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(edge.center(), Point3::new(0.0, 10.0, 15.0), epsilon = 1e-9);

        let corner = wp
            .clone()
            .faces("<Z")
            .unwrap()
            .vertices(">XY")
            .unwrap()
            .vertex()
            .unwrap();
        assert_relative_eq!(corner.point, Point3::new(5.0, 10.0, -15.0), epsilon = 1e-9);

        let pair = wp.faces("<Z").unwrap().vertices(">Y").unwrap();
        assert_eq!(pair.selection().len(), 2);
        let left = pair.vertices("<X").unwrap().vertex().unwrap();
        assert_relative_eq!(left.point, Point3::new(-5.0, 10.0, -15.0), epsilon = 1e-9);
    }

    #[test]
    fn test_nth_face_selection() {
        let wp = block().faces(">Z[1]").unwrap();
        assert_relative_eq!(wp.face().unwrap().center.z, -5.0, epsilon = 1e-9);
        assert_eq!(block().faces("|Z").unwrap().selection().len(), 2);
        assert_eq!(block().faces("#Z").unwrap().selection().len(), 4);
    }

    #[test]
    fn test_workplane_on_faces() {
        let wp = block().faces(">Z").unwrap().workplane().unwrap();
        assert_relative_eq!(wp.plane().origin, Point3::new(0.0, 0.0, 5.0), epsilon = 1e-9);
        assert_relative_eq!(wp.plane().normal(), Vec3::z(), epsilon = 1e-12);
        assert_relative_eq!(wp.plane().x_dir.into_inner(), Vec3::x(), epsilon = 1e-12);
        assert!(wp.selection().is_empty());

        // Side faces take X from Z × normal.
        let side = block().faces(">Y").unwrap().workplane().unwrap();
        assert_relative_eq!(side.plane().x_dir.into_inner(), -Vec3::x(), epsilon = 1e-12);
        assert_relative_eq!(side.plane().y_dir.into_inner(), Vec3::z(), epsilon = 1e-12);

        let raised = block().faces(">Z").unwrap().workplane_offset(3.0).unwrap();
        assert_relative_eq!(raised.plane().origin.z, 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_workplane_on_vertex_keeps_orientation() {
        let wp = block()
            .faces("<Z")
            .unwrap()
            .vertices(">XY")
            .unwrap()
            .workplane()
            .unwrap();
        assert_relative_eq!(wp.plane().origin, Point3::new(10.0, 10.0, -5.0), epsilon = 1e-9);
        assert_relative_eq!(wp.plane().normal(), Vec3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_move_to_then_workplane() {
        let wp = block()
            .faces(">Z")
            .unwrap()
            .workplane()
            .unwrap()
            .move_to(3.0, -2.0)
            .unwrap()
            .workplane()
            .unwrap();
        assert_relative_eq!(wp.plane().origin, Point3::new(3.0, -2.0, 5.0), epsilon = 1e-9);
    }

    #[test]
    fn test_through_hole() {
        let wp = block()
            .faces(">Z")
            .unwrap()
            .workplane()
            .unwrap()
            .hole(2.5, None)
            .unwrap();
        assert_eq!(wp.holes_drilled(), 1);
        assert_relative_eq!(
            wp.part().volume(),
            4000.0 - ngon_area(1.25) * 10.0,
            epsilon = 1e-6
        );
        assert!(!wp.part().contains([0.0, 0.0, -4.9]));
        assert!(wp.part().ray_intervals([0.0, 0.0, 20.0], [0.0, 0.0, -1.0]).is_empty());
    }

    #[test]
    fn test_blind_holes_on_grid() {
        let wp = block()
            .faces(">Z")
            .unwrap()
            .workplane()
            .unwrap()
            .rarray(6.0, 6.0, 2, 2)
            .unwrap();
        assert_eq!(wp.points().len(), 4);
        assert_relative_eq!(wp.points()[0], Point2::new(-3.0, -3.0), epsilon = 1e-12);
        let wp = wp.hole(2.0, Some(4.0)).unwrap();
        assert_eq!(wp.holes_drilled(), 4);
        assert_relative_eq!(
            wp.part().volume(),
            4000.0 - 4.0 * ngon_area(1.0) * 4.0,
            epsilon = 1e-6
        );
        assert!(!wp.part().contains([3.0, 3.0, 2.0]));
        assert!(wp.part().contains([3.0, 3.0, 0.0]));
    }

    #[test]
    fn test_cbore_hole() {
        let wp = block()
            .faces(">Z")
            .unwrap()
            .workplane()
            .unwrap()
            .cbore_hole(2.5, 5.0, 3.0, None)
            .unwrap();
        let removed = ngon_area(2.5) * 3.0 + ngon_area(1.25) * 7.0;
        assert_relative_eq!(wp.part().volume(), 4000.0 - removed, epsilon = 1e-6);
        assert!(!wp.part().contains([2.0, 0.0, 3.0]));
        assert!(wp.part().contains([2.0, 0.0, 1.0]));
    }

    #[test]
    fn test_construction_rect_corners() {
        let wp = block()
            .faces(">Z")
            .unwrap()
            .workplane()
            .unwrap()
            .construction_rect(10.0, 10.0)
            .unwrap();
        assert_eq!(wp.points().len(), 4);
        let wp = wp.hole(1.0, None).unwrap();
        assert_eq!(wp.holes_drilled(), 4);
        assert!(!wp.part().contains([5.0, 5.0, 0.0]));
        assert!(!wp.part().contains([-5.0, 5.0, 0.0]));
    }

    #[test]
    fn test_rect_pocket() {
        let wp = block()
            .faces(">Z")
            .unwrap()
            .workplane()
            .unwrap()
            .rect(4.0, 6.0)
            .unwrap()
            .cut_blind(-2.0)
            .unwrap();
        assert_relative_eq!(wp.part().volume(), 4000.0 - 48.0, epsilon = 1e-6);
        let hits = wp.part().ray_intervals([0.0, 0.0, 10.0], [0.0, 0.0, -1.0]);
        assert_eq!(hits.len(), 1);
        assert_relative_eq!(hits[0].1 - hits[0].0, 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_wire_extrude() {
        let wp = Workplane::new("XY")
            .unwrap()
            .h_line(10.0)
            .unwrap()
            .v_line(10.0)
            .unwrap()
            .close()
            .unwrap()
            .extrude(2.0)
            .unwrap();
        assert_relative_eq!(wp.part().volume(), 100.0, epsilon = 1e-9);

        let both = Workplane::new("XY")
            .unwrap()
            .rect(2.0, 2.0)
            .unwrap()
            .extrude_both(3.0)
            .unwrap();
        assert_eq!(both.part().bounding_box(), ([-1.0, -1.0, -3.0], [1.0, 1.0, 3.0]));
    }

    #[test]
    fn test_keyhole_cut_thru_all() {
        let wp = Workplane::new("XY")
            .unwrap()
            .box_centered(40.0, 40.0, 10.0)
            .unwrap()
            .faces(">Y")
            .unwrap()
            .workplane()
            .unwrap()
            .move_to(3.0, 0.0)
            .unwrap()
            .three_point_arc((0.0, -3.0), (-3.0, 0.0))
            .unwrap()
            .v_line_to(5.0)
            .unwrap()
            .h_line_to(3.0)
            .unwrap()
            .close()
            .unwrap()
            .cut_thru_all()
            .unwrap();
        let part = wp.part();
        assert!(part.ray_intervals([0.0, 30.0, 2.0], [0.0, -1.0, 0.0]).is_empty());
        let hits = part.ray_intervals([10.0, 30.0, 2.0], [0.0, -1.0, 0.0]);
        assert_eq!(hits.len(), 1);
        assert_relative_eq!(hits[0].1 - hits[0].0, 40.0, epsilon = 1e-9);
        assert!(part.contains([0.0, 0.0, -4.0]));
    }

    #[test]
    fn test_transformed() {
        let wp = Workplane::new("XY")
            .unwrap()
            .transformed([0.0, 90.0, 0.0], [1.0, 2.0, 3.0])
            .unwrap();
        assert_relative_eq!(wp.plane().origin, Point3::new(1.0, 2.0, 3.0), epsilon = 1e-12);
        assert_relative_eq!(wp.plane().normal(), Vec3::x(), epsilon = 1e-12);
        assert_relative_eq!(wp.plane().x_dir.into_inner(), -Vec3::z(), epsilon = 1e-12);

        let moved = Workplane::new("XY").unwrap().center(2.0, -1.0).unwrap();
        assert_relative_eq!(moved.plane().origin, Point3::new(2.0, -1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_polygon_profile() {
        let wp = Workplane::new("XY")
            .unwrap()
            .polygon(6, 2.0)
            .unwrap()
            .extrude(1.0)
            .unwrap();
        let hex_area = 1.5 * 3f64.sqrt();
        assert_relative_eq!(wp.part().volume(), hex_area, epsilon = 1e-9);
        assert_relative_eq!(wp.part().bounding_box().1[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            Workplane::new("diagonal").unwrap_err(),
            WorkplaneError::UnknownPlane("diagonal".to_string())
        );
        let wp = block();
        assert_eq!(
            wp.clone().extrude(1.0).unwrap_err(),
            WorkplaneError::NothingToExtrude
        );
        assert_eq!(
            wp.clone().h_line(1.0).unwrap().extrude(1.0).unwrap_err(),
            WorkplaneError::UnclosedWire
        );
        assert_eq!(wp.clone().close().unwrap_err(), WorkplaneError::EmptyWire);
        assert_eq!(wp.face().unwrap_err(), WorkplaneError::EmptySelection);
        assert_eq!(
            wp.clone().faces(">Z").unwrap().edge().unwrap_err(),
            WorkplaneError::WrongSelection { expected: "edge" }
        );
        assert!(matches!(
            wp.clone().faces("?Z"),
            Err(WorkplaneError::Selector(SelectorError::UnknownOperator('?')))
        ));
        assert_eq!(
            wp.clone().faces("|Z").unwrap().workplane().unwrap_err(),
            WorkplaneError::NonCoplanarFaces
        );
        assert!(matches!(
            wp.clone().h_line(0.0),
            Err(WorkplaneError::Sketch(SketchError::DegenerateSegment(0)))
        ));
        assert!(matches!(
            wp.clone().rarray(1.0, 1.0, 0, 2),
            Err(WorkplaneError::InvalidArgument { .. })
        ));
        assert!(matches!(
            wp.hole(1.0, Some(0.0)),
            Err(WorkplaneError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_curved_face_rejected() {
        let d_shape = Workplane::new("XY")
            .unwrap()
            .move_to(-5.0, 0.0)
            .unwrap()
            .three_point_arc((0.0, 5.0), (5.0, 0.0))
            .unwrap()
            .close()
            .unwrap()
            .extrude(2.0)
            .unwrap();
        let arc_face = d_shape.faces(">Y").unwrap();
        assert!(!arc_face.face().unwrap().is_planar());
        assert_eq!(arc_face.workplane().unwrap_err(), WorkplaneError::CurvedFace);
    }

    #[test]
    fn test_centroid_trait() {
        let wp = block();
        let face = wp.clone().faces(">Z").unwrap().face().unwrap();
        let edge = wp.faces(">Z").unwrap().edges("<X").unwrap().edge().unwrap();
        assert_relative_eq!(face.centroid(), Point3::new(0.0, 0.0, 5.0), epsilon = 1e-9);
        assert_relative_eq!(edge.centroid(), Point3::new(-10.0, 0.0, 5.0), epsilon = 1e-9);
        let p = Point3::new(1.0, 2.0, 3.0);
        assert_eq!(p.centroid(), p);
    }
}
