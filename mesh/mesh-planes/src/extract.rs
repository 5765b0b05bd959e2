//! Greedy first-fit plane extraction and cluster filtering.

use mesh_types::{ScanMesh, VertexColor};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Cluster, PlaneModel};

/// Thresholds for accepting a plane model into a cluster.
///
/// # Example
///
/// ```
/// use mesh_planes::ClusterParams;
///
/// let params = ClusterParams::default().with_distance_threshold(0.02);
/// assert!((params.normal_threshold - 0.90).abs() < 1e-12);
/// assert!((params.distance_threshold - 0.02).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    /// Minimum dot product between a model's normal and the cluster normal
    /// (exclusive). In `(0, 1]`.
    pub normal_threshold: f64,

    /// Maximum distance of a model's point from the cluster plane
    /// (exclusive). Must be positive.
    pub distance_threshold: f64,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            normal_threshold: 0.90,
            distance_threshold: 0.05,
        }
    }
}

impl ClusterParams {
    /// Tighter thresholds for clean, densely sampled scans.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            normal_threshold: 0.97,
            distance_threshold: 0.02,
        }
    }

    /// Set the normal threshold.
    #[must_use]
    pub const fn with_normal_threshold(mut self, threshold: f64) -> Self {
        self.normal_threshold = threshold;
        self
    }

    /// Set the distance threshold.
    #[must_use]
    pub const fn with_distance_threshold(mut self, threshold: f64) -> Self {
        self.distance_threshold = threshold;
        self
    }
}

/// Clusters extracted from one point set, largest first.
///
/// The set borrows the point slice it was extracted from; the bounding
/// filter scans that full slice.
#[derive(Debug, Clone)]
pub struct ClusterSet<'a> {
    points: &'a [PlaneModel],
    clusters: Vec<Cluster<'a>>,
}

impl<'a> ClusterSet<'a> {
    /// Group `points` into planar clusters.
    ///
    /// Each point, in input order, joins the first existing cluster (in
    /// creation order) that accepts it, or starts a new one. The clusters are
    /// then stable-sorted by descending member count. The result depends on
    /// the input order but is fully deterministic for a given order.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_planes::{ClusterParams, ClusterSet, PlaneModel};
    /// use mesh_types::{Point3, Vector3};
    ///
    /// let mut points = Vec::new();
    /// for i in 0..10 {
    ///     let x = f64::from(i);
    ///     points.extend(PlaneModel::new(Point3::new(x, 0.0, 0.0), Vector3::z(), points.len()));
    ///     points.extend(PlaneModel::new(Point3::new(0.0, x, 5.0), -Vector3::z(), points.len()));
    /// }
    /// points.extend(PlaneModel::new(Point3::new(0.0, 0.0, 1.0), Vector3::x(), points.len()));
    ///
    /// let set = ClusterSet::extract(&points, &ClusterParams::default());
    /// let sizes: Vec<_> = set.iter().map(|c| c.len()).collect();
    /// assert_eq!(sizes, vec![10, 10, 1]);
    /// ```
    #[must_use]
    pub fn extract(points: &'a [PlaneModel], params: &ClusterParams) -> Self {
        let mut clusters: Vec<Cluster<'a>> = Vec::new();

        for point in points {
            // First fit in creation order
            let mut placed = false;
            for cluster in &mut clusters {
                if cluster.accepts(point, params) {
                    cluster.insert(point);
                    placed = true;
                    break;
                }
            }
            if !placed {
                clusters.push(Cluster::new(point));
            }
        }

        // Stable: equal-sized clusters keep creation order
        clusters.sort_by(|a, b| b.len().cmp(&a.len()));

        debug!(
            points = points.len(),
            clusters = clusters.len(),
            largest = clusters.first().map_or(0, Cluster::len),
            "extracted plane clusters"
        );

        Self { points, clusters }
    }

    /// Drop clusters with fewer than `min_size` members. Returns how many
    /// were dropped.
    pub fn remove_small(&mut self, min_size: usize) -> usize {
        let before = self.clusters.len();
        self.clusters.retain(|c| c.len() >= min_size);
        let removed = before - self.clusters.len();
        debug!(min_size, removed, remaining = self.clusters.len(), "removed small clusters");
        removed
    }

    /// Drop clusters that are not bounding surfaces. Returns how many were
    /// dropped.
    ///
    /// See [`ClusterSet::is_bounding`].
    pub fn remove_non_bounding(&mut self, distance: f64, max_behind: usize) -> usize {
        let before = self.clusters.len();
        let points = self.points;
        self.clusters
            .retain(|c| Self::count_behind(points, c, distance, max_behind) <= max_behind);
        let removed = before - self.clusters.len();
        debug!(
            distance,
            max_behind,
            removed,
            remaining = self.clusters.len(),
            "removed non-bounding clusters"
        );
        removed
    }

    /// True if at most `max_behind` of all input points lie behind the
    /// cluster's plane by more than `distance`.
    ///
    /// Floors and walls seen from inside a room have (almost) nothing
    /// behind them; a table top has the floor beneath it.
    #[must_use]
    pub fn is_bounding(&self, cluster: &Cluster<'_>, distance: f64, max_behind: usize) -> bool {
        Self::count_behind(self.points, cluster, distance, max_behind) <= max_behind
    }

    // Stops counting once the limit is exceeded
    fn count_behind(
        points: &[PlaneModel],
        cluster: &Cluster<'_>,
        distance: f64,
        max_behind: usize,
    ) -> usize {
        let plane = cluster.plane();
        points
            .iter()
            .filter(|p| plane.signed_distance(&p.point) < -distance)
            .take(max_behind.saturating_add(1))
            .count()
    }

    /// The clusters, largest first.
    #[must_use]
    pub fn clusters(&self) -> &[Cluster<'a>] {
        &self.clusters
    }

    /// The point set the clusters were extracted from.
    #[must_use]
    pub const fn points(&self) -> &'a [PlaneModel] {
        self.points
    }

    /// Iterate over the clusters, largest first.
    pub fn iter(&self) -> std::slice::Iter<'_, Cluster<'a>> {
        self.clusters.iter()
    }

    /// Number of clusters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// True if no clusters remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

impl<'s, 'a> IntoIterator for &'s ClusterSet<'a> {
    type Item = &'s Cluster<'a>;
    type IntoIter = std::slice::Iter<'s, Cluster<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.clusters.iter()
    }
}

/// Copy of `mesh` with the `top_n` largest clusters painted in distinct
/// colors and every other vertex gray.
///
/// Members are mapped back to vertices through their `source_index`;
/// indices outside the mesh are ignored.
#[must_use]
pub fn paint_clusters(mesh: &ScanMesh, clusters: &ClusterSet<'_>, top_n: usize) -> ScanMesh {
    let mut painted = mesh.clone();
    painted.colors = vec![VertexColor::GRAY; mesh.vertex_count()];

    for (label, cluster) in clusters.iter().take(top_n).enumerate() {
        let color = VertexColor::from_label(label);
        for member in cluster.members() {
            if let Some(c) = painted.colors.get_mut(member.source_index) {
                *c = color;
            }
        }
    }
    painted
}
