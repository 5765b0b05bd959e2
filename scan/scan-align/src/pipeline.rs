//! The scan alignment pipeline.
//!
//! Alignment runs as a fixed sequence of stages:
//!
//! ```text
//! NotStarted → PriorTransformCheck → UpCorrection → HorizontalPlaneSearch
//!            → FloorSnap → VerticalPlaneAlign → Commit → Done
//! ```
//!
//! Every stage before `Commit` works on an in-memory copy of the main mesh
//! and appends its rigid transform to a [`TransformChain`]. `Commit` applies
//! the composed transform once to every mesh file and to the trajectory,
//! then marks the scan as aligned. A failure before `Commit` leaves every
//! file untouched.

use std::fmt;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use mesh_io::{PlyDocument, list_ply_files, load_ply};
use mesh_planes::{ClusterSet, PlaneModel, paint_clusters};
use mesh_transform::{ObbConstraint, RigidTransform, TransformChain, oriented_bounding_box};
use mesh_types::{ScanMesh, Vector3, merge_close_vertices, remove_isolated_pieces};
use sensor_types::{Trajectory, load_trajectory, write_trajectory};
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

use crate::error::{AlignError, AlignResult};
use crate::{
    AlignParams, AlignmentState, ScanLayout, UpEstimate, UpVectorEstimator, read_aln, up_alignment,
};

/// A first pose within this of the identity carries no previous alignment.
const PRIOR_IDENTITY_EPSILON: f64 = 1e-9;

/// Pipeline states, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlignStage {
    /// State file not yet checked.
    NotStarted,
    /// Reverting a transform baked in by an earlier run.
    PriorTransformCheck,
    /// Rotating the estimated up vector onto +Z.
    UpCorrection,
    /// Leveling the mesh on its dominant horizontal plane.
    HorizontalPlaneSearch,
    /// Floor to `z = 0`, footprint centered on the origin.
    FloorSnap,
    /// Rotating walls onto the X/Y axes and moving into the positive quadrant.
    VerticalPlaneAlign,
    /// Rewriting all artifacts.
    Commit,
    /// Finished.
    Done,
}

impl AlignStage {
    /// Stable name, also used to label transform chain entries.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::PriorTransformCheck => "prior-transform-check",
            Self::UpCorrection => "up-correction",
            Self::HorizontalPlaneSearch => "horizontal-plane-search",
            Self::FloorSnap => "floor-snap",
            Self::VerticalPlaneAlign => "vertical-plane-align",
            Self::Commit => "commit",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for AlignStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Chain label of the final translation into the positive quadrant.
pub const QUADRANT_SNAP: &str = "quadrant-snap";

/// Why a scan was not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No state file: the scan has not been reconstructed.
    NoReconstruction,
    /// The reconstruction is marked invalid.
    InvalidReconstruction,
    /// The scan is already aligned and re-alignment was not forced.
    AlreadyAligned,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoReconstruction => "no reconstruction available",
            Self::InvalidReconstruction => "reconstruction was invalid",
            Self::AlreadyAligned => "reconstruction is already aligned",
        })
    }
}

/// The estimation stages' result for one mesh.
#[derive(Debug, Clone)]
pub struct Alignment {
    /// Named stages from up correction to the quadrant snap.
    pub stages: TransformChain,
    /// The up vector used for the up correction.
    pub up: UpEstimate,
    /// Representative normal of the horizontal cluster used for leveling,
    /// in the up-corrected frame. `None` if no horizontal plane was found.
    pub floor_normal: Option<Vector3<f64>>,
    /// Working mesh with the largest clusters painted, if requested, in
    /// the same final frame as the aligned mesh.
    pub painted: Option<ScanMesh>,
}

impl Alignment {
    /// All stages composed in order.
    #[must_use]
    pub fn transform(&self) -> RigidTransform {
        self.stages.compose()
    }
}

/// Result of a completed alignment.
#[derive(Debug, Clone)]
pub struct AlignReport {
    /// Transform applied to every mesh file.
    pub transform: RigidTransform,
    /// Inverse of a previous alignment that was reverted first.
    pub prior: Option<RigidTransform>,
    /// Estimation details; `None` when the transform came from a file.
    pub alignment: Option<Alignment>,
    /// Mesh files that were rewritten.
    pub files: Vec<PathBuf>,
}

/// Outcome of aligning one scan.
#[derive(Debug, Clone)]
pub enum AlignOutcome {
    /// All artifacts were rewritten.
    Aligned(Box<AlignReport>),
    /// A precondition failed; nothing was touched.
    Skipped(SkipReason),
}

impl AlignOutcome {
    /// True if the scan was aligned.
    #[must_use]
    pub const fn is_aligned(&self) -> bool {
        matches!(self, Self::Aligned(_))
    }
}

/// Outcome of one scan within [`align_directory`].
#[derive(Debug)]
pub struct ScanResult {
    /// Scan directory.
    pub dir: PathBuf,
    /// What happened.
    pub result: AlignResult<AlignOutcome>,
}

/// Compute the canonical-frame transform of a mesh.
///
/// Runs the estimation stages on `mesh` in place: up correction, horizontal
/// plane leveling, floor snap, vertical plane alignment and the quadrant
/// snap. On return `mesh` is in the canonical frame and has no normals.
///
/// `trajectory` supplies the up vector and must already be expressed in the
/// mesh's frame.
///
/// # Errors
///
/// Returns an error if no up vector can be estimated or the mesh has no
/// vertices. A missing horizontal plane is not an error.
pub fn compute_alignment(
    mesh: &mut ScanMesh,
    trajectory: &Trajectory,
    params: &AlignParams,
) -> AlignResult<Alignment> {
    if mesh.is_empty() {
        return Err(AlignError::EmptyMesh {
            path: PathBuf::new(),
        });
    }
    let mut stages = TransformChain::new();

    debug!(stage = %AlignStage::UpCorrection, "entering stage");
    let up = UpVectorEstimator::new(params.up).estimate(trajectory)?;
    let r1 = up_alignment(&up.up).ok_or(AlignError::DegenerateUp("estimate is not a direction"))?;
    apply_stage(
        &mut stages,
        mesh,
        AlignStage::UpCorrection.name(),
        RigidTransform::from_rotation(&r1),
    );

    debug!(stage = %AlignStage::HorizontalPlaneSearch, "entering stage");
    mesh.compute_vertex_normals();
    let (floor_normal, r2, painted) = {
        let models = PlaneModel::from_mesh(mesh)?;
        let mut clusters = ClusterSet::extract(&models, &params.clusters);
        clusters.remove_small(params.min_cluster_size);
        clusters.remove_non_bounding(params.bounding_distance, params.max_points_behind);

        let painted = (params.paint_top_clusters > 0)
            .then(|| paint_clusters(mesh, &clusters, params.paint_top_clusters));

        let horizontal = clusters
            .iter()
            .find(|c| c.representative().normal.dot(&Vector3::z()) > params.horizontal_dot);
        match horizontal {
            Some(cluster) => match cluster.tighten_and_rotation(params.tighten_tolerance) {
                Ok(r2) => (Some(cluster.representative().normal), Some(r2), painted),
                Err(err) => {
                    warn!(error = %err, "horizontal plane refit failed");
                    (None, None, painted)
                }
            },
            None => {
                warn!(clusters = clusters.len(), "could not find a horizontal plane");
                (None, None, painted)
            }
        }
    };
    if let Some(r2) = r2 {
        apply_stage(
            &mut stages,
            mesh,
            AlignStage::HorizontalPlaneSearch.name(),
            RigidTransform::from_rotation(&r2),
        );
    }

    debug!(stage = %AlignStage::FloorSnap, "entering stage");
    let bounds = mesh.bounds();
    let center = bounds.center();
    apply_stage(
        &mut stages,
        mesh,
        AlignStage::FloorSnap.name(),
        RigidTransform::translation(Vector3::new(-center.x, -center.y, -bounds.min.z)),
    );

    debug!(stage = %AlignStage::VerticalPlaneAlign, "entering stage");
    let obb = oriented_bounding_box(&mesh.positions, ObbConstraint::AxisZ)?;
    apply_stage(
        &mut stages,
        mesh,
        AlignStage::VerticalPlaneAlign.name(),
        RigidTransform::from_rotation_rows(&obb.axes),
    );
    let bounds = mesh.bounds();
    apply_stage(
        &mut stages,
        mesh,
        QUADRANT_SNAP,
        RigidTransform::translation(Vector3::new(-bounds.min.x, -bounds.min.y, 0.0)),
    );

    // Normals are scratch state for the plane search
    mesh.clear_normals();

    // Painted after the up correction; bring it into the final frame
    let mut painted = painted;
    if let Some(painted) = painted.as_mut() {
        let undo_up = RigidTransform::from_rotation(&r1.transpose());
        undo_up.then(&stages.compose()).apply_to_mesh(painted);
    }

    Ok(Alignment {
        stages,
        up,
        floor_normal,
        painted,
    })
}

fn apply_stage(
    stages: &mut TransformChain,
    mesh: &mut ScanMesh,
    name: &'static str,
    transform: RigidTransform,
) {
    transform.apply_to_mesh(mesh);
    debug!(stage = name, "applied transform");
    stages.push(name, transform);
}

/// Align the scan in `dir` to the canonical frame.
///
/// Skips the scan (without error) if it has no state file, its
/// reconstruction is invalid, or it is already aligned and `force` is
/// false.
///
/// # Errors
///
/// Returns an error if the trajectory has no frames, a previous alignment
/// cannot be reverted, no up vector can be estimated, or a file cannot be
/// read or written. Files are only written once every estimate succeeded.
///
/// # Example
///
/// ```no_run
/// use scan_align::{AlignOutcome, AlignParams, align_scan};
///
/// match align_scan("scans/scene0001", &AlignParams::default(), false).unwrap() {
///     AlignOutcome::Aligned(report) => println!("{:?}", report.transform),
///     AlignOutcome::Skipped(reason) => println!("skipped: {reason}"),
/// }
/// ```
pub fn align_scan<P: AsRef<Path>>(
    dir: P,
    params: &AlignParams,
    force: bool,
) -> AlignResult<AlignOutcome> {
    let layout = ScanLayout::new(dir);
    info!(dir = %layout.dir().display(), "aligning scan");
    let result = align_scan_inner(&layout, params, force);
    if let Err(err) = &result {
        error!(dir = %layout.dir().display(), error = %err, "alignment failed");
    }
    result
}

fn align_scan_inner(
    layout: &ScanLayout,
    params: &AlignParams,
    force: bool,
) -> AlignResult<AlignOutcome> {
    let dir = layout.dir();
    let mut state = match check_state(layout)? {
        Ok(state) => state,
        Err(reason) => return Ok(AlignOutcome::Skipped(reason)),
    };
    if state.aligned && !force {
        return Ok(skip(layout, SkipReason::AlreadyAligned));
    }

    let mut trajectory = load_trajectory(layout.trajectory_path())?;
    trajectory.remove_invalid_imu_samples();
    if trajectory.frames.is_empty() {
        return Err(AlignError::NoFrames {
            dir: dir.to_path_buf(),
        });
    }

    debug!(stage = %AlignStage::PriorTransformCheck, "entering stage");
    let prior = prior_inverse(&trajectory, params, dir)?;
    let marker = params.up.invalid_marker;
    if let Some(inverse) = &prior {
        trajectory.apply_transform(inverse.matrix(), marker);
    }

    let mesh_path = layout.mesh_path();
    let mut mesh = load_ply(&mesh_path)?;
    if let Some(inverse) = &prior {
        inverse.apply_to_mesh(&mut mesh);
    }
    merge_close_vertices(&mut mesh, params.merge_epsilon);
    remove_isolated_pieces(&mut mesh, params.min_piece_vertices);
    if mesh.is_empty() {
        return Err(AlignError::EmptyMesh { path: mesh_path });
    }

    let alignment = compute_alignment(&mut mesh, &trajectory, params)?;
    drop(mesh);

    let estimated = alignment.transform();
    let transform = prior.map_or(estimated, |inverse| inverse.then(&estimated));

    debug!(stage = %AlignStage::Commit, "entering stage");
    // The trajectory already has the prior inverse applied
    trajectory.apply_transform(estimated.matrix(), marker);
    let files = commit(layout, &transform, &trajectory, &mut state)?;

    info!(
        dir = %dir.display(),
        files = files.len(),
        reverted_prior = prior.is_some(),
        horizontal_plane = alignment.floor_normal.is_some(),
        "scan aligned"
    );
    debug!(stage = %AlignStage::Done, "entering stage");
    Ok(AlignOutcome::Aligned(Box::new(AlignReport {
        transform,
        prior,
        alignment: Some(alignment),
        files,
    })))
}

/// Apply the transform stored in the scan's `alignment.aln` file.
///
/// No estimation runs; the transform is applied exactly once to every mesh
/// file and to the trajectory. The `aligned` flag does not gate this entry
/// point, but missing or invalid reconstructions are still skipped.
///
/// # Errors
///
/// Returns an error if the transform file is missing or malformed, the
/// trajectory has no frames, or a file cannot be read or written.
pub fn align_scan_from_aln<P: AsRef<Path>>(
    dir: P,
    params: &AlignParams,
) -> AlignResult<AlignOutcome> {
    let layout = ScanLayout::new(dir);
    info!(dir = %layout.dir().display(), "aligning scan from transform file");
    let result = align_scan_from_aln_inner(&layout, params);
    if let Err(err) = &result {
        error!(dir = %layout.dir().display(), error = %err, "alignment failed");
    }
    result
}

fn align_scan_from_aln_inner(layout: &ScanLayout, params: &AlignParams) -> AlignResult<AlignOutcome> {
    let mut state = match check_state(layout)? {
        Ok(state) => state,
        Err(reason) => return Ok(AlignOutcome::Skipped(reason)),
    };

    let transform = read_aln(layout.aln_path())?;
    let mut trajectory = load_trajectory(layout.trajectory_path())?;
    if trajectory.frames.is_empty() {
        return Err(AlignError::NoFrames {
            dir: layout.dir().to_path_buf(),
        });
    }

    trajectory.apply_transform(transform.matrix(), params.up.invalid_marker);
    let files = commit(layout, &transform, &trajectory, &mut state)?;

    info!(dir = %layout.dir().display(), files = files.len(), "scan aligned from transform file");
    Ok(AlignOutcome::Aligned(Box::new(AlignReport {
        transform,
        prior: None,
        alignment: None,
        files,
    })))
}

/// Align every scan directory directly inside `root`, in sorted order.
///
/// A failing scan is logged and recorded; the remaining scans still run.
///
/// # Errors
///
/// Returns an error only if `root` cannot be listed.
pub fn align_directory<P: AsRef<Path>>(
    root: P,
    params: &AlignParams,
    force: bool,
) -> AlignResult<Vec<ScanResult>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root.as_ref())? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();

    let results: Vec<ScanResult> = dirs
        .into_iter()
        .map(|dir| {
            let result = align_scan(&dir, params, force);
            ScanResult { dir, result }
        })
        .collect();

    let aligned = results
        .iter()
        .filter(|r| r.result.as_ref().is_ok_and(AlignOutcome::is_aligned))
        .count();
    let failed = results.iter().filter(|r| r.result.is_err()).count();
    info!(
        root = %root.as_ref().display(),
        scans = results.len(),
        aligned,
        failed,
        "directory done"
    );
    Ok(results)
}

/// Read the state file; `Ok(Err(_))` means the scan should be skipped.
fn check_state(layout: &ScanLayout) -> AlignResult<Result<AlignmentState, SkipReason>> {
    let path = layout.state_path();
    if !path.is_file() {
        return Ok(Err(skip_reason(layout, SkipReason::NoReconstruction)));
    }
    let state = AlignmentState::load(&path)?;
    if !state.valid {
        return Ok(Err(skip_reason(layout, SkipReason::InvalidReconstruction)));
    }
    Ok(Ok(state))
}

fn skip(layout: &ScanLayout, reason: SkipReason) -> AlignOutcome {
    AlignOutcome::Skipped(skip_reason(layout, reason))
}

fn skip_reason(layout: &ScanLayout, reason: SkipReason) -> SkipReason {
    info!(dir = %layout.dir().display(), %reason, "skipping scan");
    reason
}

/// Inverse of the first pose if it carries a previous alignment.
fn prior_inverse(
    trajectory: &Trajectory,
    params: &AlignParams,
    dir: &Path,
) -> AlignResult<Option<RigidTransform>> {
    let Some(first) = trajectory.first_pose() else {
        return Err(AlignError::NoFrames {
            dir: dir.to_path_buf(),
        });
    };
    if first.is_identity(PRIOR_IDENTITY_EPSILON) {
        return Ok(None);
    }
    if first.is_marked(params.up.invalid_marker) {
        return Err(AlignError::InvalidPriorPose {
            dir: dir.to_path_buf(),
        });
    }

    info!(dir = %dir.display(), "found a previous alignment, reverting to original");
    RigidTransform::from_matrix(first.camera_to_world)
        .inverse()
        .map(Some)
        .ok_or_else(|| AlignError::SingularPriorPose {
            dir: dir.to_path_buf(),
        })
}

/// Rewrite every mesh file in the scan directory with `transform`, replace
/// the trajectory and mark the state aligned.
///
/// Every mesh is loaded and transformed, and every output is written to a
/// temporary file in the scan directory, before the first original is
/// replaced. A file that fails to load or write leaves the scan untouched.
/// Meshes are rewritten through [`PlyDocument`], so properties the
/// pipeline does not model (alpha, labels, double precision, polygons)
/// survive.
fn commit(
    layout: &ScanLayout,
    transform: &RigidTransform,
    trajectory: &Trajectory,
    state: &mut AlignmentState,
) -> AlignResult<Vec<PathBuf>> {
    let dir = layout.dir();
    let files = list_ply_files(dir)?;

    let mut documents = Vec::with_capacity(files.len());
    for path in &files {
        let mut doc = PlyDocument::load(path)?;
        doc.transform_vertices(
            |p| transform.transform_point(p),
            |n| transform.transform_normal(n),
        )?;
        documents.push(doc);
    }

    let mut staged = Vec::with_capacity(files.len() + 1);
    for (path, doc) in files.iter().zip(&documents) {
        let mut temp = NamedTempFile::new_in(dir)?;
        let mut writer = BufWriter::new(temp.as_file_mut());
        doc.write(&mut writer)?;
        writer.flush()?;
        drop(writer);
        staged.push((temp, path.clone()));
    }
    let mut temp = NamedTempFile::new_in(dir)?;
    let mut writer = BufWriter::new(temp.as_file_mut());
    write_trajectory(trajectory, &mut writer)?;
    writer.flush()?;
    drop(writer);
    staged.push((temp, layout.trajectory_path()));

    for (temp, path) in staged {
        temp.persist(&path).map_err(|e| e.error)?;
        debug!(path = %path.display(), "replaced");
    }
    state.aligned = true;
    state.save(layout.state_path())?;
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::Point3;
    use nalgebra::Matrix4;
    use sensor_types::{CameraFrame, Timestamp};

    /// Floor and two walls of a 2 × 1 box, sampled on a grid, each face a
    /// separate triangulated patch with inward normals.
    fn corner_mesh() -> ScanMesh {
        let mut mesh = ScanMesh::new();
        let mut patch = |origin: Point3<f64>, u: Vector3<f64>, v: Vector3<f64>, nu: u32, nv: u32| {
            #[allow(clippy::cast_possible_truncation)]
            let base = mesh.positions.len() as u32;
            for j in 0..=nv {
                for i in 0..=nu {
                    let p = origin + u * (f64::from(i) * 0.1) + v * (f64::from(j) * 0.1);
                    mesh.positions.push(p);
                }
            }
            for j in 0..nv {
                for i in 0..nu {
                    let a = base + j * (nu + 1) + i;
                    let b = a + 1;
                    let c = a + nu + 1;
                    let d = c + 1;
                    mesh.faces.push([a, b, d]);
                    mesh.faces.push([a, d, c]);
                }
            }
        };
        // Floor z = 0, normal +Z
        patch(Point3::origin(), Vector3::x(), Vector3::y(), 20, 10);
        // Wall y = 0, normal +Y
        patch(Point3::origin(), Vector3::z(), Vector3::x(), 10, 20);
        // Wall x = 0, normal +X
        patch(Point3::origin(), Vector3::y(), Vector3::z(), 10, 10);
        mesh
    }

    fn level_trajectory() -> Trajectory {
        let level = Matrix4::new(
            1.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, -1.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        );
        Trajectory::new(vec![CameraFrame::new(Timestamp::from_nanos(1), level)], Vec::new())
    }

    #[test]
    fn stage_names_and_order() {
        assert!(AlignStage::UpCorrection < AlignStage::Commit);
        assert_eq!(AlignStage::FloorSnap.to_string(), "floor-snap");
        assert_eq!(SkipReason::AlreadyAligned.to_string(), "reconstruction is already aligned");
    }

    #[test]
    fn level_scan_is_snapped() {
        let mut mesh = corner_mesh();
        mesh.translate(Vector3::new(5.0, -3.0, 1.5));
        let params = AlignParams::small_scan();

        let alignment = compute_alignment(&mut mesh, &level_trajectory(), &params);
        let Ok(alignment) = alignment else {
            panic!("alignment failed");
        };

        assert!(alignment.floor_normal.is_some());
        assert!(!mesh.has_normals());
        let bounds = mesh.bounds();
        assert_relative_eq!(bounds.min.coords, Vector3::zeros(), epsilon = 1e-9);
        assert_relative_eq!(bounds.max.z, 1.0, epsilon = 1e-9);
        // Longer footprint side along X
        assert_relative_eq!(bounds.max.x, 2.0, epsilon = 1e-9);
        assert_relative_eq!(bounds.max.y, 1.0, epsilon = 1e-9);

        let names: Vec<_> = alignment.stages.names().collect();
        assert_eq!(
            names,
            vec![
                "up-correction",
                "horizontal-plane-search",
                "floor-snap",
                "vertical-plane-align",
                QUADRANT_SNAP,
            ]
        );
    }

    #[test]
    fn composed_transform_matches_in_place_result() {
        let original = corner_mesh();
        let mut mesh = original.clone();
        let Ok(alignment) = compute_alignment(&mut mesh, &level_trajectory(), &AlignParams::small_scan())
        else {
            panic!("alignment failed");
        };

        let mut replayed = original;
        alignment.transform().apply_to_mesh(&mut replayed);
        for (a, b) in replayed.positions.iter().zip(&mesh.positions) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn missing_horizontal_plane_is_not_fatal() {
        let mut mesh = corner_mesh();
        // Cluster size threshold above every cluster
        let params = AlignParams::small_scan().with_min_cluster_size(100_000);
        let alignment = compute_alignment(&mut mesh, &level_trajectory(), &params);
        assert!(alignment.is_ok_and(|a| a.floor_normal.is_none() && a.stages.len() == 4));
    }

    #[test]
    fn painted_copy_on_request() {
        let mut mesh = corner_mesh();
        let params = AlignParams::small_scan().with_paint_top_clusters(3);
        let Ok(alignment) = compute_alignment(&mut mesh, &level_trajectory(), &params) else {
            panic!("alignment failed");
        };
        let Some(painted) = alignment.painted else {
            panic!("no painted mesh");
        };
        assert_eq!(painted.colors.len(), mesh.vertex_count());
        // Same vertices, same final frame
        for (a, b) in painted.positions.iter().zip(&mesh.positions) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9);
        }
    }

    #[test]
    fn painted_copy_follows_up_correction() {
        // Tilted capture, so the up correction is not the identity
        let mut mesh = corner_mesh();
        let tilt = RigidTransform::rotation_x(0.3);
        tilt.apply_to_mesh(&mut mesh);
        let mut trajectory = level_trajectory();
        trajectory.apply_transform(tilt.matrix(), f64::NEG_INFINITY);

        let params = AlignParams::small_scan().with_paint_top_clusters(2);
        let Ok(alignment) = compute_alignment(&mut mesh, &trajectory, &params) else {
            panic!("alignment failed");
        };
        let Some(painted) = alignment.painted else {
            panic!("no painted mesh");
        };
        let bounds = painted.bounds();
        assert_relative_eq!(bounds.min.coords, mesh.bounds().min.coords, epsilon = 1e-9);
        assert_relative_eq!(bounds.max.coords, mesh.bounds().max.coords, epsilon = 1e-9);
    }

    #[test]
    fn empty_mesh_rejected() {
        let mut mesh = ScanMesh::new();
        assert!(matches!(
            compute_alignment(&mut mesh, &level_trajectory(), &AlignParams::default()),
            Err(AlignError::EmptyMesh { .. })
        ));
    }

    #[test]
    fn prior_inverse_detection() {
        let dir = Path::new("scene");
        let params = AlignParams::default();

        let level = level_trajectory();
        let mut at_origin = level.clone();
        at_origin.frames[0].camera_to_world = Matrix4::identity();
        assert!(prior_inverse(&at_origin, &params, dir).is_ok_and(|p| p.is_none()));

        let prior = prior_inverse(&level, &params, dir);
        assert!(prior.is_ok_and(|p| p.is_some_and(|inverse| {
            let restored = inverse.matrix() * level.frames[0].camera_to_world;
            (restored - Matrix4::identity()).amax() < 1e-12
        })));

        let invalid = Trajectory::new(vec![CameraFrame::invalid(Timestamp::zero())], Vec::new());
        assert!(matches!(
            prior_inverse(&invalid, &params, dir),
            Err(AlignError::InvalidPriorPose { .. })
        ));
    }
}
