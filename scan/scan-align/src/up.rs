//! World up-vector estimation from camera poses and IMU data.
//!
//! Three independent signals can provide the up direction. They are never
//! blended; one is selected by priority and availability:
//!
//! 1. IMU gravity, when enough samples carry it
//! 2. IMU acceleration, only on explicit request
//! 3. Camera views, which are always available when a valid frame exists

use nalgebra::{Matrix3, Vector3};
use sensor_types::{ImuSample, INVALID_POSE_MARKER, Trajectory};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AlignError, AlignResult};

/// Conventions and thresholds for up-vector estimation.
///
/// # Example
///
/// ```
/// use scan_align::UpVectorConfig;
///
/// let config = UpVectorConfig::default().with_min_imu_samples(3);
/// assert_eq!(config.camera_up.y, -1.0);
/// assert_eq!(config.min_imu_samples, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpVectorConfig {
    /// The up direction in camera space. Image rows grow downwards, so the
    /// default is `-Y`.
    pub camera_up: Vector3<f64>,

    /// Value of pose entry `(0, 0)` that marks a tracking failure.
    #[serde(skip, default = "default_invalid_marker")]
    pub invalid_marker: f64,

    /// Gravity is used only when strictly more samples than this carry it.
    pub min_imu_samples: usize,
}

const fn default_invalid_marker() -> f64 {
    INVALID_POSE_MARKER
}

impl Default for UpVectorConfig {
    fn default() -> Self {
        Self {
            camera_up: Vector3::new(0.0, -1.0, 0.0),
            invalid_marker: INVALID_POSE_MARKER,
            min_imu_samples: 10,
        }
    }
}

impl UpVectorConfig {
    /// Set the camera-space up direction.
    #[must_use]
    pub const fn with_camera_up(mut self, camera_up: Vector3<f64>) -> Self {
        self.camera_up = camera_up;
        self
    }

    /// Set the invalid-pose marker.
    #[must_use]
    pub const fn with_invalid_marker(mut self, marker: f64) -> Self {
        self.invalid_marker = marker;
        self
    }

    /// Set the gravity sample threshold.
    #[must_use]
    pub const fn with_min_imu_samples(mut self, count: usize) -> Self {
        self.min_imu_samples = count;
        self
    }
}

/// Which signal an up vector was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpSource {
    /// IMU gravity channel.
    Gravity,
    /// Negated IMU acceleration channel.
    Acceleration,
    /// Camera-space up convention rotated by each pose.
    Views,
}

/// An estimated world up direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UpEstimate {
    /// Unit up vector in world space.
    pub up: Vector3<f64>,
    /// Signal the estimate came from.
    pub source: UpSource,
    /// Number of frames that contributed.
    pub frames_used: usize,
}

/// Estimates the world up direction of a scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpVectorEstimator {
    config: UpVectorConfig,
}

impl UpVectorEstimator {
    /// Creates an estimator.
    #[must_use]
    pub const fn new(config: UpVectorConfig) -> Self {
        Self { config }
    }

    /// The estimator's configuration.
    #[must_use]
    pub const fn config(&self) -> &UpVectorConfig {
        &self.config
    }

    /// True if enough IMU samples carry gravity for the gravity path.
    #[must_use]
    pub fn has_gravity(&self, trajectory: &Trajectory) -> bool {
        trajectory.gravity_sample_count() > self.config.min_imu_samples
    }

    /// True if enough IMU samples carry acceleration for the acceleration path.
    #[must_use]
    pub fn has_acceleration(&self, trajectory: &Trajectory) -> bool {
        trajectory.acceleration_sample_count() > self.config.min_imu_samples
    }

    /// Gravity if available, camera views otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected path yields no usable direction.
    ///
    /// # Example
    ///
    /// ```
    /// use nalgebra::Matrix4;
    /// use scan_align::{UpSource, UpVectorEstimator};
    /// use sensor_types::{CameraFrame, Timestamp, Trajectory};
    ///
    /// // Camera looking along +Y with image rows pointing down -Z
    /// let pose = Matrix4::new(
    ///     1.0, 0.0, 0.0, 0.0,
    ///     0.0, 0.0, 1.0, 0.0,
    ///     0.0, -1.0, 0.0, 0.0,
    ///     0.0, 0.0, 0.0, 1.0,
    /// );
    /// let frames = vec![CameraFrame::new(Timestamp::from_nanos(1), pose)];
    /// let trajectory = Trajectory::new(frames, Vec::new());
    ///
    /// let estimate = UpVectorEstimator::default().estimate(&trajectory).unwrap();
    /// assert_eq!(estimate.source, UpSource::Views);
    /// assert!((estimate.up.z - 1.0).abs() < 1e-12);
    /// ```
    pub fn estimate(&self, trajectory: &Trajectory) -> AlignResult<UpEstimate> {
        let estimate = if self.has_gravity(trajectory) {
            self.from_gravity(trajectory)?
        } else {
            debug!(
                gravity_samples = trajectory.gravity_sample_count(),
                threshold = self.config.min_imu_samples,
                "not enough gravity samples, using camera views"
            );
            self.from_views(trajectory)?
        };
        info!(
            source = ?estimate.source,
            frames = estimate.frames_used,
            up = ?estimate.up.as_slice(),
            "estimated up vector"
        );
        Ok(estimate)
    }

    /// Average of the camera-space up convention rotated into world space
    /// by every valid pose.
    ///
    /// # Errors
    ///
    /// Returns `AlignError::DegenerateUp` if no frame is valid or the
    /// contributions cancel.
    pub fn from_views(&self, trajectory: &Trajectory) -> AlignResult<UpEstimate> {
        let mut sum = Vector3::zeros();
        let mut used = 0;
        for frame in trajectory.valid_frames(self.config.invalid_marker) {
            if let Some(world_up) = (frame.rotation() * self.config.camera_up).try_normalize(0.0) {
                sum += world_up;
                used += 1;
            }
        }
        finish(sum, used, UpSource::Views)
    }

    /// Average of the per-frame IMU gravity reading rotated into world
    /// space.
    ///
    /// The gravity channel's X and Y components are swapped relative to the
    /// camera axes; they are swapped back before rotating.
    ///
    /// # Errors
    ///
    /// Returns `AlignError::NoImuSamples` if the trajectory has no IMU data,
    /// or `AlignError::DegenerateUp` if no frame contributes.
    pub fn from_gravity(&self, trajectory: &Trajectory) -> AlignResult<UpEstimate> {
        self.from_imu(trajectory, UpSource::Gravity, |sample| {
            sample
                .gravity
                .try_normalize(0.0)
                .map(|g| Vector3::new(g.y, g.x, g.z))
        })
    }

    /// Average of the per-frame negated IMU acceleration rotated into world
    /// space.
    ///
    /// # Errors
    ///
    /// Returns `AlignError::NoImuSamples` if the trajectory has no IMU data,
    /// or `AlignError::DegenerateUp` if no frame contributes.
    pub fn from_acceleration(&self, trajectory: &Trajectory) -> AlignResult<UpEstimate> {
        self.from_imu(trajectory, UpSource::Acceleration, |sample| {
            sample.acceleration.try_normalize(0.0).map(|a| -a)
        })
    }

    fn from_imu(
        &self,
        trajectory: &Trajectory,
        source: UpSource,
        camera_up: impl Fn(&ImuSample) -> Option<Vector3<f64>>,
    ) -> AlignResult<UpEstimate> {
        if trajectory.imu.is_empty() {
            return Err(AlignError::NoImuSamples);
        }

        let mut sum = Vector3::zeros();
        let mut used = 0;
        for (index, frame) in trajectory.frames.iter().enumerate() {
            if frame.is_marked(self.config.invalid_marker) {
                continue;
            }
            let sample = trajectory.closest_imu(frame.timestamp)?;
            let Some(up) = camera_up(sample) else {
                warn!(frame = index, channel = ?source, "invalid IMU data entry, skipping frame");
                continue;
            };
            if let Some(world_up) = (frame.rotation() * up).try_normalize(0.0) {
                sum += world_up;
                used += 1;
            }
        }
        finish(sum, used, source)
    }
}

fn finish(sum: Vector3<f64>, used: usize, source: UpSource) -> AlignResult<UpEstimate> {
    if used == 0 {
        return Err(AlignError::DegenerateUp("no usable frames"));
    }
    let up = sum
        .try_normalize(f64::EPSILON)
        .ok_or(AlignError::DegenerateUp("frame contributions cancel out"))?;
    Ok(UpEstimate {
        up,
        source,
        frames_used: used,
    })
}

/// Rotation whose rows form a right-handed frame with `up` as the third
/// axis, so it maps `up` onto +Z.
///
/// The first axis is `up × (up.y, -up.z, up.x)`. When that perturbation is
/// parallel to `up`, the world axis least aligned with `up` is used instead.
///
/// Returns `None` if `up` is zero or not finite.
///
/// # Example
///
/// ```
/// use nalgebra::Vector3;
/// use scan_align::up_alignment;
///
/// let up = Vector3::new(0.1, -0.2, 0.9).normalize();
/// let rotation = up_alignment(&up).unwrap();
/// assert!((rotation * up - Vector3::z()).norm() < 1e-12);
/// ```
#[must_use]
pub fn up_alignment(up: &Vector3<f64>) -> Option<Matrix3<f64>> {
    if !up.iter().all(|v| v.is_finite()) {
        return None;
    }
    let z = up.try_normalize(f64::EPSILON)?;

    let perturbed = Vector3::new(z.y, -z.z, z.x);
    let x = z.cross(&perturbed).try_normalize(1e-9).or_else(|| {
        let axis = z.iamin();
        z.cross(&Vector3::ith(axis, 1.0)).try_normalize(f64::EPSILON)
    })?;
    let y = z.cross(&x).normalize();

    Some(Matrix3::from_rows(&[x.transpose(), y.transpose(), z.transpose()]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix4, Rotation3};
    use sensor_types::{CameraFrame, Timestamp};

    /// Camera looking along world +Y, image rows pointing down world -Z,
    /// then rolled about the world X axis by `tilt`.
    fn tilted_pose(tilt: f64) -> Matrix4<f64> {
        let level = Matrix3::new(1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, -1.0, 0.0);
        let roll = Rotation3::from_axis_angle(&Vector3::x_axis(), tilt).into_inner();
        (roll * level).to_homogeneous()
    }

    fn frames(count: u64, pose: Matrix4<f64>) -> Vec<CameraFrame> {
        (1..=count)
            .map(|i| CameraFrame::new(Timestamp::from_nanos(i * 100), pose))
            .collect()
    }

    fn imu(count: u64, gravity: Vector3<f64>) -> Vec<ImuSample> {
        (1..=count)
            .map(|i| ImuSample {
                gravity,
                ..ImuSample::zero(Timestamp::from_nanos(i * 100))
            })
            .collect()
    }

    #[test]
    fn views_average_valid_frames() {
        let mut all = frames(3, tilted_pose(0.0));
        all.push(CameraFrame::invalid(Timestamp::from_nanos(400)));
        let trajectory = Trajectory::new(all, Vec::new());

        let estimate = UpVectorEstimator::default().from_views(&trajectory);
        assert!(estimate.is_ok());
        let Ok(estimate) = estimate else { return };
        assert_eq!(estimate.frames_used, 3);
        assert_relative_eq!(estimate.up, Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn views_follow_camera_tilt() {
        let tilt = 10f64.to_radians();
        let trajectory = Trajectory::new(frames(2, tilted_pose(tilt)), Vec::new());
        let estimate = UpVectorEstimator::default().from_views(&trajectory);
        let Ok(estimate) = estimate else {
            panic!("estimate failed");
        };
        assert_relative_eq!(estimate.up.dot(&Vector3::z()), tilt.cos(), epsilon = 1e-12);
    }

    #[test]
    fn views_without_valid_frames() {
        let trajectory = Trajectory::new(vec![CameraFrame::invalid(Timestamp::zero())], Vec::new());
        assert!(matches!(
            UpVectorEstimator::default().from_views(&trajectory),
            Err(AlignError::DegenerateUp(_))
        ));
    }

    #[test]
    fn gravity_channel_swaps_x_and_y() {
        // Identity poses: the swapped reading is the world up directly
        let trajectory = Trajectory::new(
            frames(12, Matrix4::identity()),
            imu(12, Vector3::new(2.0, 0.0, 0.0)),
        );
        let estimate = UpVectorEstimator::default().from_gravity(&trajectory);
        let Ok(estimate) = estimate else {
            panic!("estimate failed");
        };
        assert_eq!(estimate.source, UpSource::Gravity);
        assert_relative_eq!(estimate.up, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn acceleration_is_negated_not_swapped() {
        let samples: Vec<_> = (1..=3)
            .map(|i| ImuSample {
                acceleration: Vector3::new(0.0, 0.0, 9.81),
                ..ImuSample::zero(Timestamp::from_nanos(i * 100))
            })
            .collect();
        let trajectory = Trajectory::new(frames(3, Matrix4::identity()), samples);
        let estimate = UpVectorEstimator::default().from_acceleration(&trajectory);
        let Ok(estimate) = estimate else {
            panic!("estimate failed");
        };
        assert_relative_eq!(estimate.up, -Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn gravity_preferred_over_views() {
        // Views say +Z, gravity (after the swap) says +X
        let trajectory = Trajectory::new(
            frames(12, tilted_pose(0.0)),
            imu(12, Vector3::new(0.0, 1.0, 0.0)),
        );
        let estimator = UpVectorEstimator::default();
        assert!(estimator.has_gravity(&trajectory));

        let Ok(estimate) = estimator.estimate(&trajectory) else {
            panic!("estimate failed");
        };
        assert_eq!(estimate.source, UpSource::Gravity);
        assert_relative_eq!(estimate.up, Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn falls_back_to_views_below_threshold() {
        // Exactly the threshold is not enough
        let trajectory = Trajectory::new(
            frames(10, tilted_pose(0.0)),
            imu(10, Vector3::new(0.0, 1.0, 0.0)),
        );
        let estimator = UpVectorEstimator::default();
        assert!(!estimator.has_gravity(&trajectory));

        let Ok(estimate) = estimator.estimate(&trajectory) else {
            panic!("estimate failed");
        };
        assert_eq!(estimate.source, UpSource::Views);
        assert_relative_eq!(estimate.up, Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn imu_paths_require_samples() {
        let trajectory = Trajectory::new(frames(3, Matrix4::identity()), Vec::new());
        let estimator = UpVectorEstimator::default();
        assert!(matches!(
            estimator.from_gravity(&trajectory),
            Err(AlignError::NoImuSamples)
        ));
        assert!(matches!(
            estimator.from_acceleration(&trajectory),
            Err(AlignError::NoImuSamples)
        ));
    }

    #[test]
    fn zero_imu_entries_are_skipped() {
        let mut samples = imu(3, Vector3::new(1.0, 0.0, 0.0));
        samples[1].gravity = Vector3::zeros();
        let trajectory = Trajectory::new(frames(3, Matrix4::identity()), samples);

        let Ok(estimate) = UpVectorEstimator::default().from_gravity(&trajectory) else {
            panic!("estimate failed");
        };
        assert_eq!(estimate.frames_used, 2);
    }

    #[test]
    fn up_alignment_is_proper_rotation() {
        for up in [
            Vector3::z(),
            -Vector3::z(),
            Vector3::x(),
            Vector3::new(0.3, -0.4, 0.8),
            Vector3::new(1.0, -1.0, -1.0),
            Vector3::new(-1.0, 1.0, 1.0),
        ] {
            let up = up.normalize();
            let Some(rotation) = up_alignment(&up) else {
                panic!("no rotation for {up:?}");
            };
            assert_relative_eq!(rotation * up, Vector3::z(), epsilon = 1e-12);
            assert_relative_eq!(rotation.determinant(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(rotation * rotation.transpose(), Matrix3::identity(), epsilon = 1e-12);
        }
    }

    #[test]
    fn up_alignment_rejects_degenerate_input() {
        assert!(up_alignment(&Vector3::zeros()).is_none());
        assert!(up_alignment(&Vector3::new(f64::NAN, 0.0, 1.0)).is_none());
    }

    #[test]
    fn config_from_json_keeps_marker() {
        let config: Result<UpVectorConfig, _> = serde_json::from_str(r#"{ "min_imu_samples": 4 }"#);
        let Ok(config) = config else {
            panic!("config did not parse");
        };
        assert_eq!(config.min_imu_samples, 4);
        assert!(config.invalid_marker.is_infinite());
        assert_relative_eq!(config.camera_up, Vector3::new(0.0, -1.0, 0.0));
    }
}
