//! Extrude operation: sweep a closed profile along its plane normal.

use planecad_kernel_booleans::{Aabb3, Polygon, SurfaceTag};
use planecad_kernel_math::{Plane, Point2, Point3, Tolerance, Vec2, Vec3};

use crate::triangulate::{ear_clip, is_convex, signed_area};
use crate::{SketchError, SketchProfile, SketchSegment};

/// A right prism: a polygonized profile swept between two offsets along
/// the normal of its sketch plane.
///
/// The outline is stored counter-clockwise in plane coordinates, so the
/// boundary produced by [`Prism::boundary`] faces outward.
#[derive(Debug, Clone)]
pub struct Prism {
    plane: Plane,
    outline: Vec<Point2>,
    wall_tags: Vec<SurfaceTag>,
    cap_tags: [SurfaceTag; 2],
    start: f64,
    end: f64,
}

/// Extrude a closed profile between `start` and `end` along its normal.
///
/// Arcs are split into facets so that a full turn uses `resolution` of
/// them. The offsets may be given in either order; negative values extrude
/// against the normal.
///
/// # Errors
///
/// Returns an error if the distance is zero or the outline has no area.
///
/// # Example
///
/// ```
/// use planecad_kernel_sketch::{extrude, SketchProfile};
/// use planecad_kernel_math::{Plane, Point2};
///
/// let profile = SketchProfile::circle(Plane::xy(), Point2::origin(), 5.0).unwrap();
/// let prism = extrude(&profile, -10.0, 0.0, 64).unwrap();
/// assert_eq!(prism.outline().len(), 64);
/// ```
pub fn extrude(
    profile: &SketchProfile,
    start: f64,
    end: f64,
    resolution: u32,
) -> Result<Prism, SketchError> {
    if (end - start).abs() < Tolerance::DEFAULT.linear {
        return Err(SketchError::ZeroExtrusion);
    }
    let (start, end) = if start <= end {
        (start, end)
    } else {
        (end, start)
    };

    // One tag per segment; consecutive arcs of one circle share a surface.
    let mut segment_tags: Vec<SurfaceTag> = Vec::with_capacity(profile.segments.len());
    for (i, seg) in profile.segments.iter().enumerate() {
        let tag = match seg {
            SketchSegment::Line { .. } => SurfaceTag::planar(),
            SketchSegment::Arc { .. } => match i.checked_sub(1) {
                Some(prev) if profile.segments[prev].same_circle(seg) => segment_tags[prev],
                _ => SurfaceTag::curved(),
            },
        };
        segment_tags.push(tag);
    }

    let mut edges: Vec<(Point2, SurfaceTag)> = profile
        .outline(resolution.max(3))
        .into_iter()
        .map(|(p, seg)| (p, segment_tags[seg]))
        .collect();

    let points: Vec<Point2> = edges.iter().map(|(p, _)| *p).collect();
    let area = signed_area(&points);
    if area.abs() < Tolerance::DEFAULT.linear {
        return Err(SketchError::ZeroArea);
    }
    if area < 0.0 {
        // Reverse the loop; edge j of the result is edge (n - 2 - j) of the input.
        let n = edges.len();
        edges = (0..n)
            .map(|j| (points[n - 1 - j], edges[(2 * n - 2 - j) % n].1))
            .collect();
    }

    Ok(Prism {
        plane: profile.plane.clone(),
        outline: edges.iter().map(|(p, _)| *p).collect(),
        wall_tags: edges.into_iter().map(|(_, t)| t).collect(),
        cap_tags: [SurfaceTag::planar(), SurfaceTag::planar()],
        start,
        end,
    })
}

impl Prism {
    /// Sketch plane of the profile.
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Counter-clockwise outline in plane coordinates.
    pub fn outline(&self) -> &[Point2] {
        &self.outline
    }

    /// Lower offset along the plane normal.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Upper offset along the plane normal.
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Exact volume of the prism.
    pub fn volume(&self) -> f64 {
        signed_area(&self.outline) * (self.end - self.start)
    }

    fn world(&self, p: &Point2, z: f64) -> Point3 {
        self.plane.to_world(&Point3::new(p.x, p.y, z))
    }

    /// Outward-facing boundary polygons: two caps and one wall quad per
    /// outline edge. Non-convex caps are split into triangles.
    pub fn boundary(&self) -> Vec<Polygon> {
        let n = self.outline.len();
        let mut polygons = Vec::with_capacity(n + 2);

        let caps: Vec<Vec<usize>> = if is_convex(&self.outline) {
            vec![(0..n).collect()]
        } else {
            ear_clip(&self.outline).iter().map(|t| t.to_vec()).collect()
        };
        for cap in &caps {
            let top = cap.iter().map(|&i| self.world(&self.outline[i], self.end)).collect();
            let bottom = cap
                .iter()
                .rev()
                .map(|&i| self.world(&self.outline[i], self.start))
                .collect();
            polygons.extend(Polygon::new(bottom, self.cap_tags[0]));
            polygons.extend(Polygon::new(top, self.cap_tags[1]));
        }

        for i in 0..n {
            let (a, b) = (&self.outline[i], &self.outline[(i + 1) % n]);
            let quad = vec![
                self.world(a, self.start),
                self.world(b, self.start),
                self.world(b, self.end),
                self.world(a, self.end),
            ];
            polygons.extend(Polygon::new(quad, self.wall_tags[i]));
        }
        polygons
    }

    /// Bounding box of the prism in world coordinates.
    pub fn bounds(&self) -> Aabb3 {
        let corners: Vec<Point3> = self
            .outline
            .iter()
            .flat_map(|p| [self.world(p, self.start), self.world(p, self.end)])
            .collect();
        Aabb3::from_points(&corners)
    }

    /// True if `p` lies strictly inside the prism.
    pub fn contains(&self, p: &Point3) -> bool {
        let l = self.plane.to_local(p);
        l.z > self.start && l.z < self.end && point_in_outline(&self.outline, &Point2::new(l.x, l.y))
    }

    /// Parameter intervals `[t0, t1]` with `t >= 0` where the ray
    /// `origin + t * dir` is inside the prism, in increasing order.
    pub fn ray_intervals(&self, origin: &Point3, dir: &Vec3) -> Vec<(f64, f64)> {
        let o = self.plane.to_local(origin);
        let d = Vec3::new(
            dir.dot(self.plane.x_dir.as_ref()),
            dir.dot(self.plane.y_dir.as_ref()),
            dir.dot(self.plane.z_dir.as_ref()),
        );

        let slab = if d.z.abs() < 1e-15 {
            if o.z <= self.start || o.z >= self.end {
                return Vec::new();
            }
            (f64::NEG_INFINITY, f64::INFINITY)
        } else {
            let (t0, t1) = ((self.start - o.z) / d.z, (self.end - o.z) / d.z);
            (t0.min(t1), t0.max(t1))
        };

        let o2 = Point2::new(o.x, o.y);
        let d2 = Vec2::new(d.x, d.y);
        let spans: Vec<(f64, f64)> = if d2.norm_squared() < 1e-30 {
            if point_in_outline(&self.outline, &o2) {
                vec![(f64::NEG_INFINITY, f64::INFINITY)]
            } else {
                Vec::new()
            }
        } else {
            let n = self.outline.len();
            let mut hits = Vec::new();
            for i in 0..n {
                let (a, b) = (self.outline[i], self.outline[(i + 1) % n]);
                let sa = d2.x * (a.y - o2.y) - d2.y * (a.x - o2.x);
                let sb = d2.x * (b.y - o2.y) - d2.y * (b.x - o2.x);
                if (sa > 0.0) != (sb > 0.0) {
                    let q = a + (b - a) * (sa / (sa - sb));
                    hits.push((q - o2).dot(&d2) / d2.norm_squared());
                }
            }
            hits.sort_by(f64::total_cmp);
            hits.chunks_exact(2).map(|c| (c[0], c[1])).collect()
        };

        spans
            .into_iter()
            .filter_map(|(t0, t1)| {
                let lo = t0.max(slab.0).max(0.0);
                let hi = t1.min(slab.1);
                (hi > lo).then_some((lo, hi))
            })
            .collect()
    }
}

/// Crossing-number point-in-polygon test.
fn point_in_outline(outline: &[Point2], p: &Point2) -> bool {
    let n = outline.len();
    let mut inside = false;
    for i in 0..n {
        let (a, b) = (outline[i], outline[(i + 1) % n]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}
