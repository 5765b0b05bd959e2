//! Principal Component Analysis for point sets.
//!
//! Computes the principal axes of a point cloud. Plane refits use the axis
//! of least variance as the plane normal.

use nalgebra::{Matrix3, Point3, SymmetricEigen, Vector3};

use crate::error::{TransformError, TransformResult};

/// Result of PCA computation on a point cloud.
///
/// Contains the principal axes sorted by variance (largest first).
#[derive(Debug, Clone)]
pub struct PcaResult {
    /// The centroid of the point cloud.
    pub centroid: Point3<f64>,
    /// Principal axes (unit eigenvectors), sorted by eigenvalue descending.
    /// `axes[0]` is the direction of maximum variance.
    pub axes: [Vector3<f64>; 3],
    /// Eigenvalues (variances) along each axis, sorted descending.
    pub eigenvalues: [f64; 3],
}

impl PcaResult {
    /// Direction of maximum variance.
    #[must_use]
    pub const fn primary_axis(&self) -> Vector3<f64> {
        self.axes[0]
    }

    /// Direction of minimum variance; the normal of a best-fit plane.
    #[must_use]
    pub const fn normal_axis(&self) -> Vector3<f64> {
        self.axes[2]
    }

    /// Check if the point cloud is approximately flat (one eigenvalue near zero).
    ///
    /// # Arguments
    ///
    /// * `threshold` - Ratio of smallest to largest eigenvalue below which is flat
    #[must_use]
    pub fn is_flat(&self, threshold: f64) -> bool {
        if self.eigenvalues[0] < f64::EPSILON {
            return true;
        }
        self.eigenvalues[2] / self.eigenvalues[0] < threshold
    }
}

/// Compute PCA on a slice of points.
///
/// # Returns
///
/// `Some(PcaResult)` if successful, `None` if there are fewer than 3 points.
///
/// # Example
///
/// ```
/// use mesh_transform::pca_from_points;
/// use nalgebra::Point3;
///
/// let points = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(10.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(10.0, 1.0, 0.0),
/// ];
///
/// let pca = pca_from_points(&points).unwrap();
/// assert!(pca.primary_axis().x.abs() > 0.9);
/// assert!(pca.normal_axis().z.abs() > 0.9);
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
// Precision loss: point counts beyond 2^52 are unsupported
pub fn pca_from_points(points: &[Point3<f64>]) -> Option<PcaResult> {
    if points.len() < 3 {
        return None;
    }

    let count = points.len() as f64;
    let centroid = Point3::from(
        points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            / count,
    );

    let mut covariance = Matrix3::zeros();
    for p in points {
        let centered = p - centroid;
        covariance += centered * centered.transpose();
    }
    covariance /= count;

    let eigen = SymmetricEigen::new(covariance);
    let eigenvalues = eigen.eigenvalues;
    let eigenvectors = eigen.eigenvectors;

    // Sort by eigenvalue (descending)
    let mut indices = [0usize, 1, 2];
    indices.sort_by(|&a, &b| {
        eigenvalues[b]
            .partial_cmp(&eigenvalues[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let axes = indices.map(|i| eigenvectors.column(i).into_owned());
    let sorted_eigenvalues = indices.map(|i| eigenvalues[i]);

    Some(PcaResult {
        centroid,
        axes,
        eigenvalues: sorted_eigenvalues,
    })
}

/// Compute PCA with error handling.
///
/// # Errors
///
/// Returns `TransformError::InsufficientPoints` if there are fewer than 3 points.
pub fn pca_checked(points: &[Point3<f64>]) -> TransformResult<PcaResult> {
    pca_from_points(points).ok_or(TransformError::InsufficientPoints {
        required: 3,
        actual: points.len(),
    })
}
