//! Camera trajectory and IMU stream of one scan.

use nalgebra::Matrix4;
use tracing::debug;

use crate::error::{SensorError, SensorResult};
use crate::{CameraFrame, ImuSample, Timestamp};

/// Per-frame camera poses plus the IMU samples recorded alongside them.
///
/// Frames are in capture order. IMU samples are expected sorted by
/// timestamp once invalid samples are removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    /// Camera poses, one per captured frame.
    pub frames: Vec<CameraFrame>,
    /// IMU samples.
    pub imu: Vec<ImuSample>,
}

impl Trajectory {
    /// Creates a trajectory from frames and IMU samples.
    #[must_use]
    pub const fn new(frames: Vec<CameraFrame>, imu: Vec<ImuSample>) -> Self {
        Self { frames, imu }
    }

    /// First frame's pose, if any.
    #[must_use]
    pub fn first_pose(&self) -> Option<&CameraFrame> {
        self.frames.first()
    }

    /// Frames whose pose is not marked with `marker`.
    pub fn valid_frames(&self, marker: f64) -> impl Iterator<Item = &CameraFrame> {
        self.frames.iter().filter(move |f| !f.is_marked(marker))
    }

    /// Number of IMU samples with a non-zero gravity channel.
    #[must_use]
    pub fn gravity_sample_count(&self) -> usize {
        self.imu.iter().filter(|s| s.has_gravity()).count()
    }

    /// Number of IMU samples with a non-zero acceleration channel.
    #[must_use]
    pub fn acceleration_sample_count(&self) -> usize {
        self.imu.iter().filter(|s| s.has_acceleration()).count()
    }

    /// Drop IMU samples with a zero timestamp and sort the rest by
    /// timestamp. Returns how many were removed.
    ///
    /// The sort is stable, so samples sharing a timestamp keep their order.
    /// [`Trajectory::closest_imu`] relies on it.
    pub fn remove_invalid_imu_samples(&mut self) -> usize {
        let before = self.imu.len();
        self.imu.retain(|s| !s.timestamp.is_zero());
        if !self.imu.is_sorted_by_key(|s| s.timestamp) {
            debug!(samples = self.imu.len(), "sorting out-of-order IMU samples");
            self.imu.sort_by_key(|s| s.timestamp);
        }
        let removed = before - self.imu.len();
        if removed > 0 {
            debug!(removed, remaining = self.imu.len(), "removed invalid IMU samples");
        }
        removed
    }

    /// The IMU sample temporally closest to `timestamp`.
    ///
    /// Samples must be sorted by timestamp, as left by
    /// [`Trajectory::remove_invalid_imu_samples`].
    ///
    /// Timestamps before the first or after the last sample clamp to that
    /// sample. When two samples are equally close, the later one wins.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::NoImuSamples` if the trajectory has no IMU data.
    ///
    /// # Example
    ///
    /// ```
    /// use sensor_types::{ImuSample, Timestamp, Trajectory};
    ///
    /// let imu = [10, 20, 40]
    ///     .map(|t| ImuSample::zero(Timestamp::from_nanos(t)))
    ///     .to_vec();
    /// let trajectory = Trajectory::new(Vec::new(), imu);
    ///
    /// let closest = trajectory.closest_imu(Timestamp::from_nanos(31)).unwrap();
    /// assert_eq!(closest.timestamp.as_nanos(), 40);
    /// ```
    pub fn closest_imu(&self, timestamp: Timestamp) -> SensorResult<&ImuSample> {
        let (Some(first), Some(last)) = (self.imu.first(), self.imu.last()) else {
            return Err(SensorError::NoImuSamples);
        };
        if timestamp <= first.timestamp {
            return Ok(first);
        }
        if timestamp >= last.timestamp {
            return Ok(last);
        }

        // First sample not earlier than the key; 0 < after < len here
        let after = self.imu.partition_point(|s| s.timestamp < timestamp);
        let before = after - 1;
        let to_before = timestamp.abs_diff_nanos(self.imu[before].timestamp);
        let to_after = timestamp.abs_diff_nanos(self.imu[after].timestamp);
        Ok(if to_before < to_after {
            &self.imu[before]
        } else {
            &self.imu[after]
        })
    }

    /// Left-multiply every valid pose by `transform`.
    ///
    /// Poses marked with `marker` are left untouched so they never turn
    /// into NaN.
    pub fn apply_transform(&mut self, transform: &Matrix4<f64>, marker: f64) {
        let mut skipped = 0usize;
        for frame in &mut self.frames {
            if frame.is_marked(marker) {
                skipped += 1;
                continue;
            }
            frame.camera_to_world = transform * frame.camera_to_world;
        }
        debug!(
            frames = self.frames.len(),
            skipped, "applied transform to trajectory"
        );
    }
}
