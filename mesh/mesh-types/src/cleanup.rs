//! Scan pre-cleaning: vertex welding and small-piece removal.
//!
//! Raw reconstructions contain duplicated seam vertices and floating debris.
//! Both distort plane statistics, so the working copy of a scan is cleaned
//! before any estimation runs.

use hashbrown::HashMap;
use nalgebra::Point3;
use tracing::debug;

use crate::ScanMesh;

/// Merge vertices closer than `epsilon` into the first one encountered.
///
/// Faces are remapped onto the surviving vertex, faces that collapse are
/// dropped, and merged vertices are removed from every attribute array.
/// Returns the number of vertices merged away.
///
/// # Example
///
/// ```
/// use mesh_types::{ScanMesh, Point3, merge_close_vertices};
///
/// let mut mesh = ScanMesh::from_parts(
///     vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///         Point3::new(1.0001, 0.0, 0.0),
///         Point3::new(1.0, 1.0, 0.0),
///     ],
///     vec![[0, 1, 2], [3, 4, 2]],
/// );
///
/// assert_eq!(merge_close_vertices(&mut mesh, 0.001), 1);
/// assert_eq!(mesh.vertex_count(), 4);
/// assert_eq!(mesh.faces[1], [1, 3, 2]);
/// ```
#[allow(clippy::cast_possible_truncation)]
// Truncation: vertex indices are u32 by construction of the face array
pub fn merge_close_vertices(mesh: &mut ScanMesh, epsilon: f64) -> usize {
    let count = mesh.positions.len();
    if count == 0 || epsilon <= 0.0 {
        return 0;
    }

    let cell_size = epsilon * 2.0;
    let mut grid: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
    for (idx, p) in mesh.positions.iter().enumerate() {
        grid.entry(cell_of(p, cell_size)).or_default().push(idx as u32);
    }

    let mut remap: Vec<u32> = (0..count as u32).collect();
    let mut merged = 0;

    for idx in 0..count {
        if remap[idx] as usize != idx {
            continue;
        }
        let p = mesh.positions[idx];
        let (cx, cy, cz) = cell_of(&p, cell_size);

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(candidates) = grid.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &other in candidates {
                        let other = other as usize;
                        if other <= idx || remap[other] as usize != other {
                            continue;
                        }
                        if (mesh.positions[other] - p).norm() < epsilon {
                            remap[other] = idx as u32;
                            merged += 1;
                        }
                    }
                }
            }
        }
    }

    if merged == 0 {
        return 0;
    }

    for face in &mut mesh.faces {
        for i in face.iter_mut() {
            *i = remap[*i as usize];
        }
    }
    mesh.faces.retain(|&[a, b, c]| a != b && b != c && a != c);

    let keep: Vec<bool> = remap
        .iter()
        .enumerate()
        .map(|(i, &target)| target as usize == i)
        .collect();
    mesh.retain_vertices(&keep);

    debug!(merged, epsilon, "merged close vertices");
    merged
}

/// Remove connected pieces with fewer than `min_vertices` vertices.
///
/// Connectivity follows shared face vertices; a vertex referenced by no face
/// is a piece of its own. Returns the number of vertices removed.
///
/// # Example
///
/// ```
/// use mesh_types::{ScanMesh, Point3, remove_isolated_pieces};
///
/// let mut mesh = ScanMesh::from_parts(
///     vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///         Point3::new(1.0, 1.0, 0.0),
///         Point3::new(9.0, 9.0, 9.0),
///     ],
///     vec![[0, 1, 2], [1, 3, 2]],
/// );
///
/// assert_eq!(remove_isolated_pieces(&mut mesh, 3), 1);
/// assert_eq!(mesh.vertex_count(), 4);
/// ```
pub fn remove_isolated_pieces(mesh: &mut ScanMesh, min_vertices: usize) -> usize {
    let count = mesh.positions.len();
    if count == 0 || min_vertices <= 1 {
        return 0;
    }

    let mut parent: Vec<usize> = (0..count).collect();
    for &[a, b, c] in &mesh.faces {
        union(&mut parent, a as usize, b as usize);
        union(&mut parent, b as usize, c as usize);
    }

    let roots: Vec<usize> = (0..count).map(|i| find(&mut parent, i)).collect();
    let mut sizes: HashMap<usize, usize> = HashMap::new();
    for &root in &roots {
        *sizes.entry(root).or_default() += 1;
    }

    let keep: Vec<bool> = roots
        .iter()
        .map(|root| sizes.get(root).copied().unwrap_or(0) >= min_vertices)
        .collect();
    let removed = mesh.retain_vertices(&keep);

    debug!(
        removed,
        pieces = sizes.len(),
        min_vertices,
        "removed isolated pieces"
    );
    removed
}

#[allow(clippy::cast_possible_truncation)]
fn cell_of(p: &Point3<f64>, cell_size: f64) -> (i64, i64, i64) {
    (
        (p.x / cell_size).floor() as i64,
        (p.y / cell_size).floor() as i64,
        (p.z / cell_size).floor() as i64,
    )
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        // Lower index wins so results do not depend on face order
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[hi] = lo;
    }
}
