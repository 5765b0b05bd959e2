//! File layout of a scan directory.

use std::path::{Path, PathBuf};

/// Paths of the artifacts in one scan directory.
///
/// A scan named after its directory `scene0001/` holds
/// `scene0001.ply` (the reconstruction), `scene0001.traj` (poses and IMU),
/// `processed.txt` (state) and optionally `alignment.aln`. Further `.ply`
/// files produced by later stages may sit next to them.
///
/// # Example
///
/// ```
/// use scan_align::ScanLayout;
///
/// let layout = ScanLayout::new("scans/scene0001");
/// assert_eq!(layout.name(), "scene0001");
/// assert!(layout.mesh_path().ends_with("scene0001/scene0001.ply"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanLayout {
    dir: PathBuf,
    name: String,
}

impl ScanLayout {
    /// State file name.
    pub const STATE_FILE: &'static str = "processed.txt";

    /// External transform file name.
    pub const ALN_FILE: &'static str = "alignment.aln";

    /// Layout of the scan in `dir`, named after the last path component.
    #[must_use]
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { dir, name }
    }

    /// The scan directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The scan name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Processing state file.
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.dir.join(Self::STATE_FILE)
    }

    /// Main reconstruction mesh.
    #[must_use]
    pub fn mesh_path(&self) -> PathBuf {
        self.dir.join(format!("{}.ply", self.name))
    }

    /// Trajectory file.
    #[must_use]
    pub fn trajectory_path(&self) -> PathBuf {
        self.dir.join(format!("{}.traj", self.name))
    }

    /// External transform file.
    #[must_use]
    pub fn aln_path(&self) -> PathBuf {
        self.dir.join(Self::ALN_FILE)
    }
}
