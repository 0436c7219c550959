//! 2D sketch profile types.

use std::f64::consts::PI;

use planecad_kernel_math::{Plane, Point2, Point3, Tolerance, Vec2};

use crate::SketchError;

/// A segment of a 2D sketch profile.
#[derive(Debug, Clone, PartialEq)]
pub enum SketchSegment {
    /// A line segment from start to end.
    Line {
        /// Start point in 2D sketch coordinates.
        start: Point2,
        /// End point in 2D sketch coordinates.
        end: Point2,
    },
    /// A circular arc from start to end around a center.
    Arc {
        /// Start point in 2D sketch coordinates.
        start: Point2,
        /// End point in 2D sketch coordinates.
        end: Point2,
        /// Center of the arc in 2D sketch coordinates.
        center: Point2,
        /// If true, arc goes counter-clockwise from start to end.
        ccw: bool,
    },
}

impl SketchSegment {
    /// Arc from `start` to `end` passing through `mid`.
    ///
    /// The center is the circumcenter of the three points; the sweep
    /// direction follows the turn from `start` through `mid` to `end`.
    pub fn arc_through(start: Point2, mid: Point2, end: Point2) -> Result<Self, SketchError> {
        let tol = Tolerance::DEFAULT;
        let a = mid - start;
        let b = end - mid;
        let turn = cross2(&a, &b);
        if turn.abs() < tol.linear * (a.norm() + b.norm()).max(1.0) {
            return Err(SketchError::CollinearArc);
        }

        // Circumcenter relative to `start`.
        let c = end - start;
        let d = 2.0 * cross2(&a, &c);
        let (a2, c2) = (a.norm_squared(), c.norm_squared());
        let ux = (c.y * a2 - a.y * c2) / d;
        let uy = (a.x * c2 - c.x * a2) / d;
        let center = start + Vec2::new(ux, uy);

        Ok(SketchSegment::Arc {
            start,
            end,
            center,
            ccw: turn > 0.0,
        })
    }

    /// Get the start point of this segment.
    pub fn start(&self) -> Point2 {
        match self {
            SketchSegment::Line { start, .. } => *start,
            SketchSegment::Arc { start, .. } => *start,
        }
    }

    /// Get the end point of this segment.
    pub fn end(&self) -> Point2 {
        match self {
            SketchSegment::Line { end, .. } => *end,
            SketchSegment::Arc { end, .. } => *end,
        }
    }

    /// Check if this segment is degenerate (zero length).
    pub fn is_degenerate(&self) -> bool {
        let tol = Tolerance::DEFAULT;
        match self {
            SketchSegment::Line { start, end } => (end - start).norm() < tol.linear,
            SketchSegment::Arc {
                start, end, center, ..
            } => {
                // Degenerate if start == end or radius is zero
                let r1 = (start - center).norm();
                let r2 = (end - center).norm();
                r1 < tol.linear || r2 < tol.linear || (end - start).norm() < tol.linear
            }
        }
    }

    /// Get the length of this segment.
    pub fn length(&self) -> f64 {
        match self {
            SketchSegment::Line { start, end } => (end - start).norm(),
            SketchSegment::Arc {
                start,
                end,
                center,
                ccw,
            } => {
                let radius = (start - center).norm();
                radius * arc_sweep(*start, *end, *center, *ccw).abs()
            }
        }
    }

    /// Points along the segment, excluding the end point.
    ///
    /// Lines yield their start; arcs are split into facets so that a full
    /// turn would use `resolution` of them.
    pub fn polyline(&self, resolution: u32) -> Vec<Point2> {
        match self {
            SketchSegment::Line { start, .. } => vec![*start],
            SketchSegment::Arc {
                start,
                end,
                center,
                ccw,
            } => {
                let sweep = arc_sweep(*start, *end, *center, *ccw);
                let n = ((sweep.abs() / (2.0 * PI)) * resolution as f64 - 1e-9).ceil().max(1.0) as usize;
                let radius = (start - center).norm();
                let d = start - center;
                let a0 = d.y.atan2(d.x);
                (0..n)
                    .map(|k| {
                        let a = a0 + sweep * k as f64 / n as f64;
                        center + Vec2::new(radius * a.cos(), radius * a.sin())
                    })
                    .collect()
            }
        }
    }

    /// True when both segments are arcs of the same circle.
    pub fn same_circle(&self, other: &SketchSegment) -> bool {
        let tol = Tolerance::DEFAULT;
        match (self, other) {
            (
                SketchSegment::Arc {
                    start: s1,
                    center: c1,
                    ..
                },
                SketchSegment::Arc {
                    start: s2,
                    center: c2,
                    ..
                },
            ) => {
                (c1 - c2).norm() < tol.linear
                    && ((s1 - c1).norm() - (s2 - c2).norm()).abs() < tol.linear
            }
            _ => false,
        }
    }
}

fn cross2(a: &Vec2, b: &Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Signed sweep angle of an arc, positive when counter-clockwise.
fn arc_sweep(start: Point2, end: Point2, center: Point2, ccw: bool) -> f64 {
    let d_start = start - center;
    let d_end = end - center;
    let start_angle = d_start.y.atan2(d_start.x);
    let end_angle = d_end.y.atan2(d_end.x);
    let mut angle = end_angle - start_angle;
    if ccw {
        if angle <= 0.0 {
            angle += 2.0 * PI;
        }
    } else if angle >= 0.0 {
        angle -= 2.0 * PI;
    }
    angle
}

/// A closed 2D profile on a sketch plane.
#[derive(Debug, Clone)]
pub struct SketchProfile {
    /// Frame the profile is drawn in.
    pub plane: Plane,
    /// The segments forming the closed profile.
    pub segments: Vec<SketchSegment>,
}

impl SketchProfile {
    /// Create a new sketch profile.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The profile has no segments
    /// - Any segment is degenerate
    /// - The profile is not closed (start of first segment != end of last segment)
    pub fn new(plane: Plane, segments: Vec<SketchSegment>) -> Result<Self, SketchError> {
        let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
            return Err(SketchError::EmptyProfile);
        };

        for (i, seg) in segments.iter().enumerate() {
            if seg.is_degenerate() {
                return Err(SketchError::DegenerateSegment(i));
            }
        }

        let tol = Tolerance::DEFAULT;
        let gap = (last.end() - first.start()).norm();
        if gap > tol.linear {
            return Err(SketchError::NotClosed(gap));
        }
        for pair in segments.windows(2) {
            let continuity_gap = (pair[1].start() - pair[0].end()).norm();
            if continuity_gap > tol.linear {
                return Err(SketchError::NotClosed(continuity_gap));
            }
        }

        Ok(Self { plane, segments })
    }

    /// Closed polygon through `points`.
    pub fn polyline(plane: Plane, points: &[Point2]) -> Result<Self, SketchError> {
        let n = points.len();
        let segments = (0..n)
            .map(|i| SketchSegment::Line {
                start: points[i],
                end: points[(i + 1) % n],
            })
            .collect();
        Self::new(plane, segments)
    }

    /// Axis-aligned rectangle centered on `center`.
    pub fn rectangle(
        plane: Plane,
        center: Point2,
        width: f64,
        height: f64,
    ) -> Result<Self, SketchError> {
        for d in [width, height] {
            if d <= 0.0 {
                return Err(SketchError::InvalidDimension(d));
            }
        }
        let (hw, hh) = (width / 2.0, height / 2.0);
        Self::polyline(
            plane,
            &[
                center + Vec2::new(-hw, -hh),
                center + Vec2::new(hw, -hh),
                center + Vec2::new(hw, hh),
                center + Vec2::new(-hw, hh),
            ],
        )
    }

    /// Regular polygon with `sides` vertices on a circle of `diameter`.
    ///
    /// The first vertex lies on the local +X axis from the center.
    pub fn regular_polygon(
        plane: Plane,
        center: Point2,
        sides: usize,
        diameter: f64,
    ) -> Result<Self, SketchError> {
        if sides < 3 {
            return Err(SketchError::TooFewSides(sides));
        }
        if diameter <= 0.0 {
            return Err(SketchError::InvalidDimension(diameter));
        }
        let r = diameter / 2.0;
        let points: Vec<Point2> = (0..sides)
            .map(|i| {
                let a = 2.0 * PI * i as f64 / sides as f64;
                center + Vec2::new(r * a.cos(), r * a.sin())
            })
            .collect();
        Self::polyline(plane, &points)
    }

    /// Full circle, stored as two counter-clockwise half arcs.
    pub fn circle(plane: Plane, center: Point2, radius: f64) -> Result<Self, SketchError> {
        if radius <= 0.0 {
            return Err(SketchError::InvalidDimension(radius));
        }
        let right = center + Vec2::new(radius, 0.0);
        let left = center + Vec2::new(-radius, 0.0);
        Self::new(
            plane,
            vec![
                SketchSegment::Arc {
                    start: right,
                    end: left,
                    center,
                    ccw: true,
                },
                SketchSegment::Arc {
                    start: left,
                    end: right,
                    center,
                    ccw: true,
                },
            ],
        )
    }

    /// Map a 2D point in sketch coordinates to 3D.
    pub fn to_3d(&self, p: Point2) -> Point3 {
        self.plane.to_world_2d(&p)
    }

    /// Polygonized outline: each vertex paired with the index of the
    /// segment whose facet starts there.
    pub fn outline(&self, resolution: u32) -> Vec<(Point2, usize)> {
        let mut out = Vec::new();
        for (i, seg) in self.segments.iter().enumerate() {
            out.extend(seg.polyline(resolution).into_iter().map(|p| (p, i)));
        }
        out
    }

    /// Check if all segments are lines (no arcs).
    pub fn is_line_only(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, SketchSegment::Line { .. }))
    }

    /// Get the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the profile is empty.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
