//! Incrementally grown plane clusters.

use mesh_transform::{Plane, pca_from_points};
use mesh_types::{Point3, Vector3};
use nalgebra::Matrix3;

use crate::error::{PlaneError, PlaneResult};
use crate::{ClusterParams, PlaneModel};

/// A group of plane models sharing one representative plane.
///
/// The representative is the running average of the members: its normal is
/// the normalized sum of member normals and its point is the mean member
/// position. Both are updated in O(1) per insertion. An exact least-squares
/// fit is only computed on demand by [`Cluster::tighten_and_rotation`].
///
/// Members are borrowed from the point set the cluster was extracted from.
#[derive(Debug, Clone)]
pub struct Cluster<'a> {
    representative: PlaneModel,
    members: Vec<&'a PlaneModel>,
    normal_sum: Vector3<f64>,
    position_sum: Vector3<f64>,
}

impl<'a> Cluster<'a> {
    /// Starts a cluster from a single plane model.
    #[must_use]
    pub fn new(seed: &'a PlaneModel) -> Self {
        Self {
            representative: *seed,
            members: vec![seed],
            normal_sum: seed.normal,
            position_sum: seed.point.coords,
        }
    }

    /// The running-average plane. Its `source_index` is the seed's.
    #[must_use]
    pub const fn representative(&self) -> &PlaneModel {
        &self.representative
    }

    /// Representative as a [`Plane`].
    #[must_use]
    pub const fn plane(&self) -> Plane {
        self.representative.plane()
    }

    /// Members in insertion order.
    #[must_use]
    pub fn members(&self) -> &[&'a PlaneModel] {
        &self.members
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false; a cluster starts with its seed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// True if `model` agrees with the representative plane.
    ///
    /// Normals must satisfy `dot > normal_threshold` and the model's point
    /// must lie strictly within `distance_threshold` of the plane.
    #[must_use]
    pub fn accepts(&self, model: &PlaneModel, params: &ClusterParams) -> bool {
        model.normal.dot(&self.representative.normal) > params.normal_threshold
            && self.plane().distance(&model.point) < params.distance_threshold
    }

    /// Adds a member and updates the representative.
    #[allow(clippy::cast_precision_loss)]
    pub fn insert(&mut self, model: &'a PlaneModel) {
        self.members.push(model);
        self.normal_sum += model.normal;
        self.position_sum += model.point.coords;

        // Opposing normals can cancel; keep the last direction in that case
        if let Some(normal) = self.normal_sum.try_normalize(f64::EPSILON) {
            self.representative.normal = normal;
        }
        self.representative.point = Point3::from(self.position_sum / self.members.len() as f64);
    }

    /// Refit the plane from the members near it and return a rotation taking
    /// the refined normal onto +Z.
    ///
    /// Members within `tolerance` of the representative plane are fitted by
    /// PCA. The rotation's rows are the principal in-plane axis, the
    /// in-plane axis completing a right-handed frame, and the fitted normal
    /// oriented to agree with the representative normal.
    ///
    /// # Errors
    ///
    /// Returns `PlaneError::InsufficientPoints` if fewer than 3 members lie
    /// within `tolerance`.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_planes::{Cluster, PlaneModel};
    /// use mesh_types::{Point3, Vector3};
    ///
    /// let tilt = Vector3::new(0.0, 0.1, 1.0).normalize();
    /// let models: Vec<_> = (0..25)
    ///     .filter_map(|i| {
    ///         let (x, y) = (f64::from(i % 5), f64::from(i / 5));
    ///         let p = Point3::new(x, y, -0.1 * y);
    ///         PlaneModel::new(p, tilt, i as usize)
    ///     })
    ///     .collect();
    ///
    /// let mut cluster = Cluster::new(&models[0]);
    /// for m in &models[1..] {
    ///     cluster.insert(m);
    /// }
    ///
    /// let rotation = cluster.tighten_and_rotation(0.05).unwrap();
    /// assert!(((rotation * tilt).z - 1.0).abs() < 1e-9);
    /// ```
    pub fn tighten_and_rotation(&self, tolerance: f64) -> PlaneResult<Matrix3<f64>> {
        let plane = self.plane();
        let near: Vec<Point3<f64>> = self
            .members
            .iter()
            .filter(|m| plane.distance(&m.point) < tolerance)
            .map(|m| m.point)
            .collect();

        let pca = pca_from_points(&near).ok_or(PlaneError::InsufficientPoints {
            required: 3,
            actual: near.len(),
        })?;

        let mut normal = pca.normal_axis();
        if normal.dot(&self.representative.normal) < 0.0 {
            normal = -normal;
        }
        let in_plane = pca.primary_axis();
        let completing = normal.cross(&in_plane);

        Ok(Matrix3::from_rows(&[
            in_plane.transpose(),
            completing.transpose(),
            normal.transpose(),
        ]))
    }
}
