//! Orthonormal plane frames.

use crate::{Dir3, Point2, Point3, Tolerance, Transform, Vec3};

/// An oriented 2D coordinate frame in 3D space.
///
/// The frame is explicit: an origin plus three orthonormal axes, with
/// `z_dir = x_dir × y_dir` as the plane normal. Local coordinates map to
/// world coordinates as `origin + x * x_dir + y * y_dir + z * z_dir`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    /// Origin of the frame in world coordinates.
    pub origin: Point3,
    /// Local X axis.
    pub x_dir: Dir3,
    /// Local Y axis.
    pub y_dir: Dir3,
    /// Plane normal (local Z axis).
    pub z_dir: Dir3,
}

impl Plane {
    /// Build a frame from an origin, an approximate X direction and a normal.
    ///
    /// The X direction is orthogonalized against the normal. Returns `None`
    /// when the normal is zero or the X direction is parallel to it.
    pub fn new(origin: Point3, x_dir: Vec3, normal: Vec3) -> Option<Self> {
        let tol = Tolerance::DEFAULT;
        if normal.norm() < tol.linear {
            return None;
        }
        let z = normal.normalize();
        let x = x_dir - x_dir.dot(&z) * z;
        if x.norm() < tol.linear {
            return None;
        }
        let x = x.normalize();
        let y = z.cross(&x);
        Some(Self {
            origin,
            x_dir: Dir3::new_unchecked(x),
            y_dir: Dir3::new_unchecked(y),
            z_dir: Dir3::new_unchecked(z),
        })
    }

    /// The world XY plane at the origin.
    pub fn xy() -> Self {
        Self::from_axes(Vec3::x(), Vec3::z())
    }

    /// Look up one of the standard named planes.
    ///
    /// Accepts `XY`, `YZ`, `ZX`, `XZ`, `YX`, `ZY` and the view names
    /// `front`, `back`, `left`, `right`, `top`, `bottom`.
    pub fn named(name: &str) -> Option<Self> {
        let (x, n) = match name {
            "XY" | "front" => (Vec3::x(), Vec3::z()),
            "YZ" => (Vec3::y(), Vec3::x()),
            "ZX" => (Vec3::z(), Vec3::y()),
            "XZ" => (Vec3::x(), -Vec3::y()),
            "YX" => (Vec3::y(), -Vec3::z()),
            "ZY" => (Vec3::z(), -Vec3::x()),
            "back" => (-Vec3::x(), -Vec3::z()),
            "left" => (Vec3::z(), -Vec3::x()),
            "right" => (-Vec3::z(), Vec3::x()),
            "top" => (Vec3::x(), Vec3::y()),
            "bottom" => (Vec3::x(), -Vec3::y()),
            _ => return None,
        };
        Some(Self::from_axes(x, n))
    }

    fn from_axes(x: Vec3, n: Vec3) -> Self {
        Self {
            origin: Point3::origin(),
            x_dir: Dir3::new_unchecked(x),
            y_dir: Dir3::new_unchecked(n.cross(&x)),
            z_dir: Dir3::new_unchecked(n),
        }
    }

    /// Plane normal as a plain vector.
    pub fn normal(&self) -> Vec3 {
        self.z_dir.into_inner()
    }

    /// Map a local 2D point (on the plane) to world coordinates.
    pub fn to_world_2d(&self, p: &Point2) -> Point3 {
        self.origin + p.x * self.x_dir.as_ref() + p.y * self.y_dir.as_ref()
    }

    /// Map a local 3D point to world coordinates.
    pub fn to_world(&self, p: &Point3) -> Point3 {
        self.origin
            + p.x * self.x_dir.as_ref()
            + p.y * self.y_dir.as_ref()
            + p.z * self.z_dir.as_ref()
    }

    /// Map a world point into local coordinates.
    pub fn to_local(&self, p: &Point3) -> Point3 {
        let d = p - self.origin;
        Point3::new(
            d.dot(self.x_dir.as_ref()),
            d.dot(self.y_dir.as_ref()),
            d.dot(self.z_dir.as_ref()),
        )
    }

    /// Project a world point onto the plane, returning local 2D coordinates.
    pub fn project(&self, p: &Point3) -> Point2 {
        let l = self.to_local(p);
        Point2::new(l.x, l.y)
    }

    /// Same orientation, origin moved by a local in-plane offset.
    pub fn shifted(&self, dx: f64, dy: f64) -> Self {
        Self {
            origin: self.to_world_2d(&Point2::new(dx, dy)),
            ..self.clone()
        }
    }

    /// Same orientation, origin moved along the normal.
    pub fn offset(&self, distance: f64) -> Self {
        Self {
            origin: self.origin + distance * self.z_dir.as_ref(),
            ..self.clone()
        }
    }

    /// Same orientation, origin moved to `origin`.
    pub fn with_origin(&self, origin: Point3) -> Self {
        Self {
            origin,
            ..self.clone()
        }
    }

    /// Rotate the axes by Euler angles in degrees about the world X, Y and Z
    /// axes (in that order). The origin is unchanged.
    pub fn rotated(&self, x_deg: f64, y_deg: f64, z_deg: f64) -> Self {
        let r = Transform::rotation_xyz_deg(x_deg, y_deg, z_deg);
        let x = r.apply_vec(self.x_dir.as_ref()).normalize();
        let z = r.apply_vec(self.z_dir.as_ref()).normalize();
        Self {
            origin: self.origin,
            x_dir: Dir3::new_unchecked(x),
            y_dir: Dir3::new_unchecked(z.cross(&x)),
            z_dir: Dir3::new_unchecked(z),
        }
    }
}

impl Default for Plane {
    fn default() -> Self {
        Self::xy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_orthogonalizes_x() {
        let p = Plane::new(Point3::origin(), Vec3::new(1.0, 0.0, 1.0), Vec3::z()).unwrap();
        assert_relative_eq!(p.x_dir.into_inner(), Vec3::x(), epsilon = 1e-12);
        assert_relative_eq!(p.y_dir.into_inner(), Vec3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_new_rejects_degenerate() {
        assert!(Plane::new(Point3::origin(), Vec3::z(), Vec3::z()).is_none());
        assert!(Plane::new(Point3::origin(), Vec3::x(), Vec3::zeros()).is_none());
    }

    #[test]
    fn test_named_planes_right_handed() {
        for name in [
            "XY", "YZ", "ZX", "XZ", "YX", "ZY", "front", "back", "left", "right", "top", "bottom",
        ] {
            let p = Plane::named(name).unwrap();
            let n = p.x_dir.cross(p.y_dir.as_ref());
            assert_relative_eq!(n, p.normal(), epsilon = 1e-12);
        }
        assert!(Plane::named("sideways").is_none());
    }

    #[test]
    fn test_local_world_round_trip() {
        let p = Plane::new(Point3::new(1.0, 2.0, 3.0), Vec3::y(), Vec3::x()).unwrap();
        let w = Point3::new(4.0, -1.0, 7.5);
        let back = p.to_world(&p.to_local(&w));
        assert_relative_eq!(back, w, epsilon = 1e-12);
    }

    #[test]
    fn test_rotated_about_world_y() {
        let p = Plane::xy().rotated(0.0, 90.0, 0.0);
        assert_relative_eq!(p.x_dir.into_inner(), -Vec3::z(), epsilon = 1e-12);
        assert_relative_eq!(p.normal(), Vec3::x(), epsilon = 1e-12);
        assert_relative_eq!(p.y_dir.into_inner(), Vec3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_uses_world_axes() {
        // A plane facing +X with x_dir +Y, tilted 90 about world X.
        let p = Plane::new(Point3::origin(), Vec3::y(), Vec3::x()).unwrap();
        let r = p.rotated(90.0, 0.0, 0.0);
        assert_relative_eq!(r.x_dir.into_inner(), Vec3::z(), epsilon = 1e-12);
        assert_relative_eq!(r.normal(), Vec3::x(), epsilon = 1e-12);
    }

    #[test]
    fn test_shift_and_offset() {
        let p = Plane::named("top").unwrap().shifted(2.0, 3.0).offset(-1.0);
        // top: x = +X, y = -Z, normal = +Y
        assert_relative_eq!(p.origin, Point3::new(2.0, -1.0, -3.0), epsilon = 1e-12);
    }
}
