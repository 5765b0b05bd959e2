//! Scan mesh with parallel per-vertex attribute arrays.

use nalgebra::{Point3, Vector3};

use crate::{Aabb, VertexColor};

/// A triangle mesh (or bare point cloud) produced by a scan reconstruction.
///
/// Attribute arrays are either empty or exactly as long as `positions`.
/// A mesh without faces is a valid point cloud.
///
/// # Example
///
/// ```
/// use mesh_types::{ScanMesh, Point3};
///
/// let mesh = ScanMesh::from_parts(
///     vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(2.0, 0.0, 0.0),
///         Point3::new(0.0, 1.0, 3.0),
///     ],
///     vec![[0, 1, 2]],
/// );
///
/// let bounds = mesh.bounds();
/// assert_eq!(bounds.max, Point3::new(2.0, 1.0, 3.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanMesh {
    /// Vertex positions.
    pub positions: Vec<Point3<f64>>,

    /// Unit vertex normals; empty when the mesh carries none.
    pub normals: Vec<Vector3<f64>>,

    /// Vertex colors; empty when the mesh carries none.
    pub colors: Vec<VertexColor>,

    /// Triangle faces as indices into `positions`.
    pub faces: Vec<[u32; 3]>,
}

impl ScanMesh {
    /// Create an empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            colors: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh from positions and faces, without normals or colors.
    #[inline]
    #[must_use]
    pub const fn from_parts(positions: Vec<Point3<f64>>, faces: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            normals: Vec::new(),
            colors: Vec::new(),
            faces,
        }
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    #[inline]
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// True when the mesh has no vertices.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// True when every vertex has a normal.
    #[inline]
    #[must_use]
    pub fn has_normals(&self) -> bool {
        !self.positions.is_empty() && self.normals.len() == self.positions.len()
    }

    /// True when every vertex has a color.
    #[inline]
    #[must_use]
    pub fn has_colors(&self) -> bool {
        !self.positions.is_empty() && self.colors.len() == self.positions.len()
    }

    /// Axis-aligned bounding box of all vertex positions.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.positions.iter())
    }

    /// Drop stored normals.
    pub fn clear_normals(&mut self) {
        self.normals.clear();
    }

    /// Translate every vertex by `offset`.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for p in &mut self.positions {
            *p += offset;
        }
    }

    /// Recompute per-vertex normals from the faces.
    ///
    /// Each vertex normal is the area-weighted sum of the normals of its
    /// incident faces (counter-clockwise winding), normalized. Vertices that
    /// belong to no face, or whose incident faces cancel out, get a zero
    /// normal.
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vector3::zeros(); self.positions.len()];

        for &[i0, i1, i2] in &self.faces {
            let (i0, i1, i2) = (i0 as usize, i1 as usize, i2 as usize);
            let p0 = self.positions[i0];
            // Unnormalized cross product is twice the face area times the unit normal
            let weighted = (self.positions[i1] - p0).cross(&(self.positions[i2] - p0));
            normals[i0] += weighted;
            normals[i1] += weighted;
            normals[i2] += weighted;
        }

        for n in &mut normals {
            *n = n.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros);
        }

        self.normals = normals;
    }

    /// Keep only the vertices flagged in `keep`, compacting all attribute
    /// arrays and dropping faces that reference a removed vertex.
    ///
    /// Returns the number of vertices removed. A `keep` slice shorter than
    /// `positions` treats the missing tail as removed.
    pub fn retain_vertices(&mut self, keep: &[bool]) -> usize {
        let before = self.positions.len();
        let mut remap: Vec<Option<u32>> = Vec::with_capacity(before);
        let mut next = 0u32;
        for i in 0..before {
            if keep.get(i).copied().unwrap_or(false) {
                remap.push(Some(next));
                next += 1;
            } else {
                remap.push(None);
            }
        }

        if next as usize == before {
            return 0;
        }

        let kept = |i: usize| remap[i].is_some();
        compact(&mut self.positions, kept);
        if self.normals.len() == before {
            compact(&mut self.normals, kept);
        }
        if self.colors.len() == before {
            compact(&mut self.colors, kept);
        }

        self.faces.retain_mut(|face| {
            let mapped = [
                remap[face[0] as usize],
                remap[face[1] as usize],
                remap[face[2] as usize],
            ];
            match mapped {
                [Some(a), Some(b), Some(c)] => {
                    *face = [a, b, c];
                    true
                }
                _ => false,
            }
        });

        before - next as usize
    }
}

fn compact<T>(values: &mut Vec<T>, kept: impl Fn(usize) -> bool) {
    let mut index = 0;
    values.retain(|_| {
        let keep = kept(index);
        index += 1;
        keep
    });
}
