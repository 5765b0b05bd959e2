//! Alignment pipeline parameters.

use mesh_planes::ClusterParams;
use serde::{Deserialize, Serialize};

use crate::UpVectorConfig;

/// Parameters for [`crate::align_scan`].
///
/// Distances are in scan units (meters for the supported capture
/// pipeline).
///
/// # Example
///
/// ```
/// use scan_align::AlignParams;
///
/// let params: AlignParams = serde_json::from_str(r#"{ "min_cluster_size": 200 }"#).unwrap();
/// assert_eq!(params.min_cluster_size, 200);
/// assert_eq!(params.min_piece_vertices, 5000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignParams {
    /// Up-vector estimation.
    pub up: UpVectorConfig,

    /// Vertices closer than this are merged before estimation.
    pub merge_epsilon: f64,

    /// Connected pieces with fewer vertices are dropped before estimation.
    pub min_piece_vertices: usize,

    /// Plane clustering thresholds for the horizontal plane search.
    pub clusters: ClusterParams,

    /// Clusters with fewer members are ignored.
    pub min_cluster_size: usize,

    /// A point counts as behind a plane when it is further than this on the
    /// plane's back side.
    pub bounding_distance: f64,

    /// Clusters with more points behind them are not bounding surfaces.
    pub max_points_behind: usize,

    /// A cluster is horizontal when its normal's dot product with +Z exceeds
    /// this.
    pub horizontal_dot: f64,

    /// Members within this distance of the horizontal plane are refitted.
    pub tighten_tolerance: f64,

    /// Keep a copy of the working mesh with this many of the largest
    /// clusters painted, for inspection. Zero disables it.
    pub paint_top_clusters: usize,
}

impl Default for AlignParams {
    fn default() -> Self {
        Self {
            up: UpVectorConfig::default(),
            merge_epsilon: 0.0005,
            min_piece_vertices: 5000,
            clusters: ClusterParams::default(),
            min_cluster_size: 500,
            bounding_distance: 0.1,
            max_points_behind: 100,
            horizontal_dot: 0.8,
            tighten_tolerance: 0.05,
            paint_top_clusters: 0,
        }
    }
}

impl AlignParams {
    /// Thresholds scaled down for small or sparse scans, such as single
    /// objects or synthetic data.
    #[must_use]
    pub fn small_scan() -> Self {
        Self {
            min_piece_vertices: 100,
            min_cluster_size: 50,
            max_points_behind: 10,
            ..Self::default()
        }
    }

    /// Set the up-vector configuration.
    #[must_use]
    pub const fn with_up(mut self, up: UpVectorConfig) -> Self {
        self.up = up;
        self
    }

    /// Set the minimum connected piece size.
    #[must_use]
    pub const fn with_min_piece_vertices(mut self, count: usize) -> Self {
        self.min_piece_vertices = count;
        self
    }

    /// Set the minimum cluster size.
    #[must_use]
    pub const fn with_min_cluster_size(mut self, count: usize) -> Self {
        self.min_cluster_size = count;
        self
    }

    /// Set the bounding filter.
    #[must_use]
    pub const fn with_bounding_filter(mut self, distance: f64, max_behind: usize) -> Self {
        self.bounding_distance = distance;
        self.max_points_behind = max_behind;
        self
    }

    /// Keep a painted copy of the working mesh with the `count` largest
    /// clusters.
    #[must_use]
    pub const fn with_paint_top_clusters(mut self, count: usize) -> Self {
        self.paint_top_clusters = count;
        self
    }
}
