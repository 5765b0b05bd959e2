//! Rigid 4x4 transform applied to scan meshes and trajectories.

use mesh_types::ScanMesh;
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

use crate::error::{TransformError, TransformResult};

/// A rigid transformation represented as a homogeneous 4x4 matrix.
///
/// Points are column vectors: `p' = M * p`.
///
/// # Example
///
/// ```
/// use mesh_transform::RigidTransform;
/// use nalgebra::{Point3, Vector3};
///
/// let lift = RigidTransform::translation(Vector3::new(0.0, 0.0, 1.0));
/// let turn = RigidTransform::rotation_z(std::f64::consts::FRAC_PI_2);
/// let combined = lift.then(&turn);
///
/// let p = combined.transform_point(&Point3::new(1.0, 0.0, 0.0));
/// assert!((p - Point3::new(0.0, 1.0, 1.0)).norm() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    matrix: Matrix4<f64>,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    /// Create a transformation from a 4x4 matrix.
    #[must_use]
    pub const fn from_matrix(matrix: Matrix4<f64>) -> Self {
        Self { matrix }
    }

    /// Create a transformation from a 4x4 matrix, rejecting NaN or infinite entries.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::NonFinite` if any entry is not finite.
    pub fn try_from_matrix(matrix: Matrix4<f64>) -> TransformResult<Self> {
        if matrix.iter().all(|v| v.is_finite()) {
            Ok(Self { matrix })
        } else {
            Err(TransformError::NonFinite)
        }
    }

    /// The identity transformation.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// A pure translation.
    #[must_use]
    pub fn translation(offset: Vector3<f64>) -> Self {
        Self {
            matrix: Matrix4::new_translation(&offset),
        }
    }

    /// A pure rotation from a 3x3 matrix.
    #[must_use]
    pub fn from_rotation(rotation: &Matrix3<f64>) -> Self {
        Self {
            matrix: rotation.to_homogeneous(),
        }
    }

    /// A rotation whose rows are the given axes.
    ///
    /// With orthonormal rows this maps `rows[i]` onto the i-th world axis,
    /// expressing points in the frame spanned by the axes.
    #[must_use]
    pub fn from_rotation_rows(rows: &[Vector3<f64>; 3]) -> Self {
        let rotation = Matrix3::from_rows(&[
            rows[0].transpose(),
            rows[1].transpose(),
            rows[2].transpose(),
        ]);
        Self::from_rotation(&rotation)
    }

    /// A rotation around the X axis by `angle` radians.
    #[must_use]
    pub fn rotation_x(angle: f64) -> Self {
        Self {
            matrix: Matrix4::from_axis_angle(&Vector3::x_axis(), angle),
        }
    }

    /// A rotation around the Z axis by `angle` radians.
    #[must_use]
    pub fn rotation_z(angle: f64) -> Self {
        Self {
            matrix: Matrix4::from_axis_angle(&Vector3::z_axis(), angle),
        }
    }

    /// Get the underlying 4x4 matrix.
    #[must_use]
    pub const fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    /// The upper-left 3x3 block.
    #[must_use]
    pub fn rotation(&self) -> Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// The translation column.
    #[must_use]
    pub fn translation_part(&self) -> Vector3<f64> {
        self.matrix.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Compose this transformation with another (self then other).
    ///
    /// The result applies `self` first, then `other`.
    #[must_use]
    pub fn then(&self, other: &Self) -> Self {
        Self {
            matrix: other.matrix * self.matrix,
        }
    }

    /// Compute the inverse transformation.
    ///
    /// # Returns
    ///
    /// `Some(inverse)` if the matrix is invertible, `None` otherwise.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|m| Self { matrix: m })
    }

    /// True when every entry is within `epsilon` of the identity.
    #[must_use]
    pub fn is_identity(&self, epsilon: f64) -> bool {
        (self.matrix - Matrix4::identity()).amax() <= epsilon
    }

    /// Transform a point (applies translation).
    #[must_use]
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.matrix.transform_point(point)
    }

    /// Transform a direction vector (ignores translation).
    #[must_use]
    pub fn transform_vector(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.matrix.transform_vector(vector)
    }

    /// Transform a normal vector (uses inverse transpose), normalized.
    ///
    /// Returns the input unchanged if the linear part is singular or the
    /// result is zero.
    #[must_use]
    pub fn transform_normal(&self, normal: &Vector3<f64>) -> Vector3<f64> {
        self.rotation()
            .try_inverse()
            .and_then(|inv| (inv.transpose() * normal).try_normalize(f64::EPSILON))
            .unwrap_or(*normal)
    }

    /// Apply this transformation in place to every vertex of a mesh.
    ///
    /// Positions and normals are updated; colors and faces are untouched.
    pub fn apply_to_mesh(&self, mesh: &mut ScanMesh) {
        for p in &mut mesh.positions {
            *p = self.matrix.transform_point(p);
        }

        if mesh.normals.is_empty() {
            return;
        }
        let Some(normal_matrix) = self.rotation().try_inverse().map(|m| m.transpose()) else {
            return;
        };
        for n in &mut mesh.normals {
            if let Some(transformed) = (normal_matrix * *n).try_normalize(f64::EPSILON) {
                *n = transformed;
            }
        }
    }
}

impl From<Matrix4<f64>> for RigidTransform {
    fn from(matrix: Matrix4<f64>) -> Self {
        Self::from_matrix(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn translation_does_not_affect_vectors() {
        let t = RigidTransform::translation(Vector3::new(10.0, 20.0, 30.0));
        assert_relative_eq!(
            t.transform_point(&Point3::new(1.0, 2.0, 3.0)),
            Point3::new(11.0, 22.0, 33.0)
        );
        assert_relative_eq!(t.transform_vector(&Vector3::x()), Vector3::x());
    }

    #[test]
    fn rotation_rows_map_axes_to_world() {
        let x = Vector3::new(1.0, 1.0, 0.0).normalize();
        let z = Vector3::z();
        let y = z.cross(&x);
        let t = RigidTransform::from_rotation_rows(&[x, y, z]);

        assert_relative_eq!(t.transform_vector(&x), Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(t.transform_vector(&y), Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(t.rotation().determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn composition_order() {
        let translate = RigidTransform::translation(Vector3::new(1.0, 0.0, 0.0));
        let rotate = RigidTransform::rotation_z(FRAC_PI_2);

        let p = translate.then(&rotate).transform_point(&Point3::origin());
        assert_relative_eq!(p, Point3::new(0.0, 1.0, 0.0), epsilon = 1e-12);

        let p = rotate.then(&translate).transform_point(&Point3::origin());
        assert_relative_eq!(p, Point3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn inverse_roundtrip() {
        let t = RigidTransform::rotation_x(0.3)
            .then(&RigidTransform::translation(Vector3::new(1.0, -2.0, 0.5)));
        let Some(inv) = t.inverse() else {
            panic!("rigid transform must be invertible");
        };
        assert!(t.then(&inv).is_identity(1e-12));
        let expected = -(t.rotation().transpose() * t.translation_part());
        assert_relative_eq!(inv.translation_part(), expected, epsilon = 1e-12);
    }

    #[test]
    fn non_finite_rejected() {
        let mut m = Matrix4::identity();
        m[(0, 0)] = f64::NEG_INFINITY;
        assert!(matches!(
            RigidTransform::try_from_matrix(m),
            Err(TransformError::NonFinite)
        ));
    }

    #[test]
    fn apply_to_mesh_rotates_normals() {
        let mut mesh = ScanMesh::from_parts(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        mesh.compute_vertex_normals();

        let t = RigidTransform::rotation_x(FRAC_PI_2)
            .then(&RigidTransform::translation(Vector3::new(0.0, 0.0, 2.0)));
        t.apply_to_mesh(&mut mesh);

        assert_relative_eq!(mesh.positions[2], Point3::new(0.0, 0.0, 3.0), epsilon = 1e-12);
        assert_relative_eq!(mesh.normals[0], -Vector3::y(), epsilon = 1e-12);
    }
}
