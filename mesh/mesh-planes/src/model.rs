//! Per-vertex plane hypotheses.

use mesh_transform::Plane;
use mesh_types::{Point3, ScanMesh, Vector3};

use crate::error::{PlaneError, PlaneResult};

/// A scan vertex together with the local plane its normal implies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneModel {
    /// Unit normal.
    pub normal: Vector3<f64>,
    /// Vertex position.
    pub point: Point3<f64>,
    /// Index of the vertex in the mesh it came from.
    pub source_index: usize,
}

impl PlaneModel {
    /// Creates a plane model, normalizing `normal`.
    ///
    /// Returns `None` when the normal is zero or not finite.
    #[must_use]
    pub fn new(point: Point3<f64>, normal: Vector3<f64>, source_index: usize) -> Option<Self> {
        if !normal.iter().all(|v| v.is_finite()) {
            return None;
        }
        let normal = normal.try_normalize(f64::EPSILON)?;
        Some(Self {
            normal,
            point,
            source_index,
        })
    }

    /// Builds one plane model per vertex of `mesh`.
    ///
    /// Vertices whose normal is zero (for example, vertices referenced by no
    /// face) carry no plane hypothesis and are skipped.
    ///
    /// # Errors
    ///
    /// Returns `PlaneError::MissingNormals` if the mesh does not carry one
    /// normal per vertex.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_planes::PlaneModel;
    /// use mesh_types::{Point3, ScanMesh};
    ///
    /// let mut mesh = ScanMesh::from_parts(
    ///     vec![
    ///         Point3::new(0.0, 0.0, 0.0),
    ///         Point3::new(1.0, 0.0, 0.0),
    ///         Point3::new(0.0, 1.0, 0.0),
    ///     ],
    ///     vec![[0, 1, 2]],
    /// );
    /// assert!(PlaneModel::from_mesh(&mesh).is_err());
    ///
    /// mesh.compute_vertex_normals();
    /// let models = PlaneModel::from_mesh(&mesh).unwrap();
    /// assert_eq!(models.len(), 3);
    /// assert_eq!(models[2].source_index, 2);
    /// ```
    pub fn from_mesh(mesh: &ScanMesh) -> PlaneResult<Vec<Self>> {
        if !mesh.has_normals() {
            return Err(PlaneError::MissingNormals {
                vertices: mesh.vertex_count(),
                normals: mesh.normals.len(),
            });
        }

        Ok(mesh
            .positions
            .iter()
            .zip(&mesh.normals)
            .enumerate()
            .filter_map(|(i, (p, n))| Self::new(*p, *n, i))
            .collect())
    }

    /// The plane through `point` with this model's normal.
    #[must_use]
    pub const fn plane(&self) -> Plane {
        Plane {
            point: self.point,
            normal: self.normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normal_is_normalized() {
        let model = PlaneModel::new(Point3::origin(), Vector3::new(0.0, 0.0, 3.0), 4);
        assert!(model.is_some());
        if let Some(model) = model {
            assert_relative_eq!(model.normal, Vector3::z());
            assert_eq!(model.source_index, 4);
        }
    }

    #[test]
    fn degenerate_normals_rejected() {
        assert!(PlaneModel::new(Point3::origin(), Vector3::zeros(), 0).is_none());
        assert!(PlaneModel::new(Point3::origin(), Vector3::new(f64::NAN, 0.0, 1.0), 0).is_none());
    }

    #[test]
    fn from_mesh_skips_unreferenced_vertices() {
        let mut mesh = ScanMesh::from_parts(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(5.0, 5.0, 5.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 3]],
        );
        mesh.compute_vertex_normals();

        let models = PlaneModel::from_mesh(&mesh).unwrap_or_default();
        let indices: Vec<_> = models.iter().map(|m| m.source_index).collect();
        assert_eq!(indices, vec![0, 1, 3]);
    }
}
