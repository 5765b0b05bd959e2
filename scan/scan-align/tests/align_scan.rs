//! End-to-end tests of scan alignment on synthetic scan directories.
//!
//! The fixture is an open room (floor and four walls, no ceiling) of
//! 4 × 3 × 2.5 units, captured by eight cameras at the room center, each
//! tilted 10° from level. Its files are written in the frame of the first
//! camera, so the room is tilted and off-center on disk.

use std::fs;
use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use mesh_io::{PlyDocument, load_ply, save_ply};
use mesh_transform::RigidTransform;
use mesh_types::{Point3, ScanMesh, Vector3};
use nalgebra::{Matrix4, Rotation3};
use scan_align::{
    AlignError, AlignOutcome, AlignParams, AlignmentState, ScanLayout, SkipReason,
    align_directory, align_scan, align_scan_from_aln, write_aln,
};
use sensor_types::{CameraFrame, Timestamp, Trajectory, load_trajectory, save_trajectory};

// =============================================================================
// Fixture
// =============================================================================

const ROOM: [f64; 3] = [4.0, 3.0, 2.5];
const CAMERA_CENTER: [f64; 3] = [2.0, 1.5, 1.2];

/// One triangulated grid patch with 0.1 spacing; the normal is `u × v`.
fn add_patch(mesh: &mut ScanMesh, origin: Point3<f64>, u: Vector3<f64>, v: Vector3<f64>, nu: u32, nv: u32) {
    #[allow(clippy::cast_possible_truncation)]
    let base = mesh.positions.len() as u32;
    for j in 0..=nv {
        for i in 0..=nu {
            mesh.positions
                .push(origin + u * (f64::from(i) * 0.1) + v * (f64::from(j) * 0.1));
        }
    }
    for j in 0..nv {
        for i in 0..nu {
            let a = base + j * (nu + 1) + i;
            let c = a + nu + 1;
            mesh.faces.push([a, a + 1, c + 1]);
            mesh.faces.push([a, c + 1, c]);
        }
    }
}

/// The room in its canonical frame, faces oriented inwards.
fn canonical_room() -> ScanMesh {
    let mut mesh = ScanMesh::new();
    let (x, y, z) = (Vector3::x(), Vector3::y(), Vector3::z());
    // Floor
    add_patch(&mut mesh, Point3::origin(), x, y, 40, 30);
    // y = 0 and y = 3
    add_patch(&mut mesh, Point3::origin(), z, x, 25, 40);
    add_patch(&mut mesh, Point3::new(0.0, 3.0, 0.0), x, z, 40, 25);
    // x = 0 and x = 4
    add_patch(&mut mesh, Point3::origin(), y, z, 30, 25);
    add_patch(&mut mesh, Point3::new(4.0, 0.0, 0.0), z, y, 25, 30);
    mesh
}

/// Camera-to-world poses in the canonical frame.
fn canonical_poses() -> Vec<Matrix4<f64>> {
    // Looking along +Y with image rows pointing down
    let level = Matrix4::new(
        1.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, -1.0, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    );
    let tilt = Rotation3::from_axis_angle(&Vector3::x_axis(), 10f64.to_radians()).to_homogeneous();
    let center = Matrix4::new_translation(&Vector3::from(CAMERA_CENTER));

    (0..8)
        .map(|i| {
            let yaw = f64::from(i) * std::f64::consts::FRAC_PI_4;
            let turn = Rotation3::from_axis_angle(&Vector3::z_axis(), yaw).to_homogeneous();
            center * turn * level * tilt
        })
        .collect()
}

/// Write a valid, unaligned scan named `name` into `root`.
///
/// Everything is stored in the frame of the first camera, then `prior` is
/// baked into both the mesh and the poses.
fn write_scan(root: &Path, name: &str, prior: &Matrix4<f64>) -> PathBuf {
    let dir = root.join(name);
    assert!(fs::create_dir_all(&dir).is_ok());
    let layout = ScanLayout::new(&dir);

    let poses = canonical_poses();
    let Some(to_first_camera) = poses[0].try_inverse() else {
        panic!("camera pose is singular");
    };
    let to_disk = RigidTransform::from_matrix(prior * to_first_camera);

    let mut mesh = canonical_room();
    to_disk.apply_to_mesh(&mut mesh);
    assert!(save_ply(&mesh, layout.mesh_path(), true).is_ok());

    let mut frames: Vec<CameraFrame> = poses
        .iter()
        .zip(1u64..)
        .map(|(pose, i)| {
            CameraFrame::new(Timestamp::from_nanos(i * 33_000_000), to_disk.matrix() * pose)
        })
        .collect();
    // A tracking failure in the middle of the capture
    frames.insert(4, CameraFrame::invalid(Timestamp::from_nanos(140_000_000)));
    let trajectory = Trajectory::new(frames, Vec::new());
    assert!(save_trajectory(&trajectory, layout.trajectory_path()).is_ok());

    let state = AlignmentState {
        valid: true,
        num_transforms: 9,
        num_valid_opt_transforms: 8,
        ..AlignmentState::default()
    };
    assert!(state.save(layout.state_path()).is_ok());
    dir
}

fn params() -> AlignParams {
    AlignParams::small_scan().with_min_cluster_size(100)
}

fn load_state(dir: &Path) -> AlignmentState {
    let loaded = AlignmentState::load(ScanLayout::new(dir).state_path());
    let Ok(state) = loaded else {
        panic!("state file unreadable");
    };
    state
}

/// Checks the main mesh and trajectory of an aligned room scan.
fn assert_room_is_canonical(dir: &Path) {
    let layout = ScanLayout::new(dir);
    let Ok(mesh) = load_ply(layout.mesh_path()) else {
        panic!("mesh unreadable");
    };
    let bounds = mesh.bounds();
    assert_relative_eq!(bounds.min.coords, Vector3::zeros(), epsilon = 1e-4);
    assert_relative_eq!(bounds.size(), Vector3::from(ROOM), epsilon = 1e-3);
    assert!(!mesh.has_normals());

    // The whole floor sits at z = 0
    let on_floor = mesh.positions.iter().filter(|p| p.z.abs() < 1e-3).count();
    assert!(on_floor >= 41 * 31, "only {on_floor} vertices on the floor");

    let Ok(trajectory) = load_trajectory(layout.trajectory_path()) else {
        panic!("trajectory unreadable");
    };
    assert_eq!(trajectory.frames.len(), 9);
    assert!(trajectory.frames[4].is_invalid());
    // The cameras sit at the room center, which is where the aligned frame
    // puts them whichever way round the long walls end up
    let first = RigidTransform::from_matrix(trajectory.frames[0].camera_to_world);
    assert_relative_eq!(
        first.translation_part(),
        Vector3::from(CAMERA_CENTER),
        epsilon = 1e-3
    );
}

// =============================================================================
// Full pipeline
// =============================================================================

#[test]
fn tilted_room_is_aligned() {
    let Ok(root) = tempfile::tempdir() else { return };
    let dir = write_scan(root.path(), "scene0001", &Matrix4::identity());

    let outcome = align_scan(&dir, &params(), false);
    let Ok(AlignOutcome::Aligned(report)) = outcome else {
        panic!("scan not aligned: {outcome:?}");
    };

    assert!(report.prior.is_none());
    assert_eq!(report.files.len(), 1);
    let Some(alignment) = &report.alignment else {
        panic!("no estimation details");
    };
    let Some(floor_normal) = alignment.floor_normal else {
        panic!("no horizontal plane found");
    };
    assert!(floor_normal.dot(&Vector3::z()) > 5f64.to_radians().cos());
    assert_eq!(alignment.stages.len(), 5);

    assert_room_is_canonical(&dir);
    let state = load_state(&dir);
    assert!(state.aligned);
    assert_eq!(state.num_transforms, 9);
}

#[test]
fn second_run_is_a_no_op() {
    let Ok(root) = tempfile::tempdir() else { return };
    let dir = write_scan(root.path(), "scene0002", &Matrix4::identity());
    let layout = ScanLayout::new(&dir);

    assert!(align_scan(&dir, &params(), false).is_ok_and(|o| o.is_aligned()));
    let mesh_bytes = fs::read(layout.mesh_path()).ok();
    let trajectory_bytes = fs::read(layout.trajectory_path()).ok();
    let state_bytes = fs::read(layout.state_path()).ok();

    let outcome = align_scan(&dir, &params(), false);
    assert!(matches!(
        outcome,
        Ok(AlignOutcome::Skipped(SkipReason::AlreadyAligned))
    ));
    assert_eq!(fs::read(layout.mesh_path()).ok(), mesh_bytes);
    assert_eq!(fs::read(layout.trajectory_path()).ok(), trajectory_bytes);
    assert_eq!(fs::read(layout.state_path()).ok(), state_bytes);
}

#[test]
fn forced_realignment_reverts_and_repeats() {
    let Ok(root) = tempfile::tempdir() else { return };
    let dir = write_scan(root.path(), "scene0003", &Matrix4::identity());

    assert!(align_scan(&dir, &params(), false).is_ok_and(|o| o.is_aligned()));
    let outcome = align_scan(&dir, &params(), true);
    let Ok(AlignOutcome::Aligned(report)) = outcome else {
        panic!("forced run did not align: {outcome:?}");
    };
    // The first pose now carries the first run's transform
    assert!(report.prior.is_some());
    assert_room_is_canonical(&dir);
}

#[test]
fn baked_prior_transform_is_reverted() {
    let Ok(root) = tempfile::tempdir() else { return };
    let prior = RigidTransform::rotation_z(0.6)
        .then(&RigidTransform::rotation_x(0.3))
        .then(&RigidTransform::translation(Vector3::new(10.0, -4.0, 2.0)));
    let dir = write_scan(root.path(), "scene0004", prior.matrix());

    let outcome = align_scan(&dir, &params(), false);
    let Ok(AlignOutcome::Aligned(report)) = outcome else {
        panic!("scan not aligned: {outcome:?}");
    };
    let Some(inverse) = report.prior else {
        panic!("prior transform not detected");
    };
    assert!(inverse.then(&prior).is_identity(1e-9));
    assert_room_is_canonical(&dir);
}

#[test]
fn every_mesh_file_is_transformed() {
    let Ok(root) = tempfile::tempdir() else { return };
    let dir = write_scan(root.path(), "scene0005", &Matrix4::identity());

    // A second artifact holding three floor corners, in the same frame as
    // the main mesh
    let poses = canonical_poses();
    let Some(to_first_camera) = poses[0].try_inverse() else {
        panic!("camera pose is singular");
    };
    let mut corners = ScanMesh::from_parts(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
        ],
        vec![[0, 1, 2]],
    );
    RigidTransform::from_matrix(to_first_camera).apply_to_mesh(&mut corners);
    let extra = dir.join("scene0005_vh.ply");
    assert!(save_ply(&corners, &extra, false).is_ok());

    let outcome = align_scan(&dir, &params(), false);
    let Ok(AlignOutcome::Aligned(report)) = outcome else {
        panic!("scan not aligned: {outcome:?}");
    };
    assert_eq!(report.files.len(), 2);

    let Ok(corners) = load_ply(&extra) else {
        panic!("extra mesh unreadable");
    };
    for p in &corners.positions {
        assert!(p.z.abs() < 1e-3);
        assert!(p.x.abs() < 1e-3 || (p.x - 4.0).abs() < 1e-3, "x = {}", p.x);
        assert!(p.y.abs() < 1e-3 || (p.y - 3.0).abs() < 1e-3, "y = {}", p.y);
    }
}

// =============================================================================
// Preconditions and failures
// =============================================================================

#[test]
fn scans_without_valid_reconstruction_are_skipped() {
    let Ok(root) = tempfile::tempdir() else { return };

    let missing = root.path().join("empty");
    assert!(fs::create_dir_all(&missing).is_ok());
    assert!(matches!(
        align_scan(&missing, &params(), false),
        Ok(AlignOutcome::Skipped(SkipReason::NoReconstruction))
    ));

    let dir = write_scan(root.path(), "scene0006", &Matrix4::identity());
    let invalid = AlignmentState::default();
    assert!(invalid.save(ScanLayout::new(&dir).state_path()).is_ok());
    assert!(matches!(
        align_scan(&dir, &params(), true),
        Ok(AlignOutcome::Skipped(SkipReason::InvalidReconstruction))
    ));
}

#[test]
fn empty_trajectory_fails_without_writing() {
    let Ok(root) = tempfile::tempdir() else { return };
    let dir = write_scan(root.path(), "scene0007", &Matrix4::identity());
    let layout = ScanLayout::new(&dir);
    assert!(save_trajectory(&Trajectory::default(), layout.trajectory_path()).is_ok());
    let mesh_bytes = fs::read(layout.mesh_path()).ok();

    assert!(matches!(
        align_scan(&dir, &params(), false),
        Err(AlignError::NoFrames { .. })
    ));
    assert_eq!(fs::read(layout.mesh_path()).ok(), mesh_bytes);
    assert!(!load_state(&dir).aligned);
}

#[test]
fn invalid_first_pose_cannot_be_reverted() {
    let Ok(root) = tempfile::tempdir() else { return };
    let dir = write_scan(root.path(), "scene0008", &Matrix4::identity());
    let layout = ScanLayout::new(&dir);

    let Ok(mut trajectory) = load_trajectory(layout.trajectory_path()) else {
        panic!("trajectory unreadable");
    };
    trajectory.frames[0] = CameraFrame::invalid(trajectory.frames[0].timestamp);
    assert!(save_trajectory(&trajectory, layout.trajectory_path()).is_ok());

    assert!(matches!(
        align_scan(&dir, &params(), false),
        Err(AlignError::InvalidPriorPose { .. })
    ));
    assert!(!load_state(&dir).aligned);
}

// =============================================================================
// Transform file entry point
// =============================================================================

#[test]
fn aln_transform_is_applied_once() {
    let Ok(root) = tempfile::tempdir() else { return };
    let dir = write_scan(root.path(), "scene0009", &Matrix4::identity());
    let layout = ScanLayout::new(&dir);

    let Ok(before) = load_ply(layout.mesh_path()) else {
        panic!("mesh unreadable");
    };
    let shift = RigidTransform::translation(Vector3::new(1.0, 2.0, 3.0));
    assert!(write_aln(layout.aln_path(), &shift, "scene0009.ply").is_ok());

    let outcome = align_scan_from_aln(&dir, &params());
    assert!(outcome.is_ok_and(|o| o.is_aligned()));

    let Ok(after) = load_ply(layout.mesh_path()) else {
        panic!("mesh unreadable");
    };
    for (a, b) in before.positions.iter().zip(&after.positions) {
        assert_relative_eq!(b - a, Vector3::new(1.0, 2.0, 3.0), epsilon = 1e-5);
    }

    let Ok(trajectory) = load_trajectory(layout.trajectory_path()) else {
        panic!("trajectory unreadable");
    };
    let first = RigidTransform::from_matrix(trajectory.frames[0].camera_to_world);
    assert_relative_eq!(first.translation_part(), Vector3::new(1.0, 2.0, 3.0), epsilon = 1e-12);
    assert!(trajectory.frames[4].is_invalid());
    assert!(load_state(&dir).aligned);
}

#[test]
fn aln_entry_point_requires_the_file() {
    let Ok(root) = tempfile::tempdir() else { return };
    let dir = write_scan(root.path(), "scene0010", &Matrix4::identity());
    assert!(matches!(
        align_scan_from_aln(&dir, &params()),
        Err(AlignError::Io(_))
    ));
    assert!(!load_state(&dir).aligned);
}

// =============================================================================
// Commit
// =============================================================================

/// Per-vertex labels with an alpha channel and double-precision positions.
const LABELED_ASCII: &str = "ply\n\
    format ascii 1.0\n\
    comment segmentation export\n\
    element vertex 3\n\
    property double x\n\
    property double y\n\
    property double z\n\
    property uchar red\n\
    property uchar green\n\
    property uchar blue\n\
    property uchar alpha\n\
    property ushort label\n\
    element face 1\n\
    property list uchar int vertex_indices\n\
    end_header\n\
    0.123456789012 1.5 2 10 20 30 255 7\n\
    3.25 0.5 4 40 50 60 128 65535\n\
    1 2 3 70 80 90 0 1\n\
    3 0 1 2\n";

fn count_entries(dir: &Path) -> usize {
    fs::read_dir(dir).map_or(0, Iterator::count)
}

#[test]
fn identity_commit_keeps_artifacts_byte_for_byte() {
    let Ok(root) = tempfile::tempdir() else { return };
    let dir = write_scan(root.path(), "scene0012", &Matrix4::identity());
    let layout = ScanLayout::new(&dir);
    let labels = dir.join("scene0012.labels.ply");
    assert!(fs::write(&labels, LABELED_ASCII).is_ok());

    let identity = RigidTransform::identity();
    assert!(write_aln(layout.aln_path(), &identity, "scene0012.ply").is_ok());
    let outcome = align_scan_from_aln(&dir, &params());
    let Ok(AlignOutcome::Aligned(report)) = outcome else {
        panic!("scan not aligned: {outcome:?}");
    };

    assert_eq!(report.files.len(), 2);
    assert_eq!(fs::read_to_string(&labels).ok().as_deref(), Some(LABELED_ASCII));
    let Ok(mesh) = load_ply(layout.mesh_path()) else {
        panic!("mesh unreadable");
    };
    assert!(!mesh.faces.is_empty());
}

#[test]
fn commit_keeps_unmodeled_vertex_properties() {
    let Ok(root) = tempfile::tempdir() else { return };
    let dir = write_scan(root.path(), "scene0013", &Matrix4::identity());
    let layout = ScanLayout::new(&dir);
    let labels = dir.join("scene0013.labels.ply");
    assert!(fs::write(&labels, LABELED_ASCII).is_ok());

    let shift = RigidTransform::translation(Vector3::new(1.0, 0.0, 0.0));
    assert!(write_aln(layout.aln_path(), &shift, "scene0013.ply").is_ok());
    assert!(align_scan_from_aln(&dir, &params()).is_ok_and(|o| o.is_aligned()));

    let Ok(doc) = PlyDocument::load(&labels) else {
        panic!("label mesh unreadable");
    };
    assert!(!doc.is_binary());
    assert!(doc.has_vertex_property("alpha"));
    let x = doc.vertex_scalar(0, "x").unwrap_or_default();
    assert!((x - 1.123_456_789_012).abs() < 1e-12, "x = {x}");
    assert_eq!(doc.vertex_scalar(0, "alpha"), Some(255.0));
    assert_eq!(doc.vertex_scalar(1, "label"), Some(65535.0));
    assert_eq!(doc.vertex_scalar(2, "y"), Some(2.0));
}

#[test]
fn unreadable_artifact_leaves_the_scan_untouched() {
    let Ok(root) = tempfile::tempdir() else { return };
    let dir = write_scan(root.path(), "scene0014", &Matrix4::identity());
    let layout = ScanLayout::new(&dir);
    // Sorts after the main mesh
    assert!(fs::write(dir.join("scene0014_zz.ply"), "not a mesh").is_ok());

    let shift = RigidTransform::translation(Vector3::new(5.0, 0.0, 0.0));
    assert!(write_aln(layout.aln_path(), &shift, "scene0014.ply").is_ok());
    let mesh_bytes = fs::read(layout.mesh_path()).ok();
    let trajectory_bytes = fs::read(layout.trajectory_path()).ok();
    let entries = count_entries(&dir);

    assert!(matches!(
        align_scan_from_aln(&dir, &params()),
        Err(AlignError::Mesh(_))
    ));
    assert!(matches!(
        align_scan(&dir, &params(), false),
        Err(AlignError::Mesh(_))
    ));

    assert_eq!(fs::read(layout.mesh_path()).ok(), mesh_bytes);
    assert_eq!(fs::read(layout.trajectory_path()).ok(), trajectory_bytes);
    assert!(!load_state(&dir).aligned);
    // No staged files left behind
    assert_eq!(count_entries(&dir), entries);
}

// =============================================================================
// Batch driver
// =============================================================================

#[test]
fn directory_batch_continues_after_failures() {
    let Ok(root) = tempfile::tempdir() else { return };
    write_scan(root.path(), "b_scene", &Matrix4::identity());
    let broken = write_scan(root.path(), "a_scene", &Matrix4::identity());
    assert!(fs::remove_file(ScanLayout::new(&broken).trajectory_path()).is_ok());
    assert!(fs::create_dir_all(root.path().join("c_unprocessed")).is_ok());
    // Loose files next to the scans are not scans
    assert!(fs::write(root.path().join("notes.txt"), "scans").is_ok());

    let results = align_directory(root.path(), &params(), false);
    let Ok(results) = results else {
        panic!("root not listed");
    };

    let names: Vec<_> = results
        .iter()
        .filter_map(|r| r.dir.file_name().and_then(|n| n.to_str()))
        .collect();
    assert_eq!(names, vec!["a_scene", "b_scene", "c_unprocessed"]);
    assert!(results[0].result.is_err());
    assert!(matches!(&results[1].result, Ok(AlignOutcome::Aligned(_))));
    assert!(matches!(
        &results[2].result,
        Ok(AlignOutcome::Skipped(SkipReason::NoReconstruction))
    ));
}
