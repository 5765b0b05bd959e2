//! Plane representation for signed-distance tests.

use nalgebra::{Point3, Vector3};

/// A plane in 3D space defined by a point and a unit normal.
///
/// The plane equation is: `normal · (p - point) = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// A point on the plane.
    pub point: Point3<f64>,
    /// The plane normal (unit vector).
    pub normal: Vector3<f64>,
}

impl Plane {
    /// Create a new plane from a point and normal.
    ///
    /// The normal is normalized. Returns `None` for a zero normal.
    #[must_use]
    pub fn new(point: Point3<f64>, normal: Vector3<f64>) -> Option<Self> {
        let normal = normal.try_normalize(f64::EPSILON)?;
        Some(Self { point, normal })
    }

    /// Compute the signed distance from a point to the plane.
    ///
    /// Positive distance means the point is on the side the normal points to.
    /// Negative distance means the point is behind the plane.
    #[inline]
    #[must_use]
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&(point - self.point))
    }

    /// Compute the absolute distance from a point to the plane.
    #[inline]
    #[must_use]
    pub fn distance(&self, point: &Point3<f64>) -> f64 {
        self.signed_distance(point).abs()
    }

    /// Project a point onto the plane.
    #[must_use]
    pub fn project(&self, point: &Point3<f64>) -> Point3<f64> {
        point - self.signed_distance(point) * self.normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn signed_distance_sides() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 1.0), Vector3::new(0.0, 0.0, 2.0));
        assert!(plane.is_some());
        let Some(plane) = plane else { return };

        assert_relative_eq!(plane.normal, Vector3::z());
        assert_relative_eq!(plane.signed_distance(&Point3::new(3.0, 4.0, 3.0)), 2.0);
        assert_relative_eq!(plane.signed_distance(&Point3::new(0.0, 0.0, 0.5)), -0.5);
        assert_relative_eq!(plane.distance(&Point3::new(0.0, 0.0, 0.5)), 0.5);
    }

    #[test]
    fn projection_lands_on_plane() {
        let plane = Plane::new(Point3::origin(), Vector3::new(1.0, 1.0, 0.0));
        let Some(plane) = plane else { return };
        let projected = plane.project(&Point3::new(2.0, 0.0, 5.0));
        assert_relative_eq!(plane.distance(&projected), 0.0, epsilon = 1e-12);
        assert_relative_eq!(projected.z, 5.0);
    }

    #[test]
    fn zero_normal_rejected() {
        assert!(Plane::new(Point3::origin(), Vector3::zeros()).is_none());
    }
}
