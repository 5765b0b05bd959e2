//! Camera poses recorded per captured frame.

use nalgebra::{Matrix3, Matrix4};

use crate::Timestamp;

/// Value stored in the first matrix entry of a pose whose tracking failed.
pub const INVALID_POSE_MARKER: f64 = f64::NEG_INFINITY;

/// One captured frame's camera-to-world pose.
///
/// Tracking failures are recorded in place rather than dropped, so frame
/// indices stay aligned with the color/depth stream. Such poses carry
/// [`INVALID_POSE_MARKER`] in entry `(0, 0)`.
///
/// # Example
///
/// ```
/// use sensor_types::{CameraFrame, Timestamp};
///
/// let lost = CameraFrame::invalid(Timestamp::from_nanos(10));
/// assert!(lost.is_invalid());
/// assert!(!CameraFrame::identity(Timestamp::zero()).is_invalid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    /// Capture time of the color image.
    pub timestamp: Timestamp,
    /// Homogeneous camera-to-world transform.
    pub camera_to_world: Matrix4<f64>,
}

impl CameraFrame {
    /// Creates a frame from a pose matrix.
    #[must_use]
    pub const fn new(timestamp: Timestamp, camera_to_world: Matrix4<f64>) -> Self {
        Self {
            timestamp,
            camera_to_world,
        }
    }

    /// Creates a frame with an identity pose.
    #[must_use]
    pub fn identity(timestamp: Timestamp) -> Self {
        Self::new(timestamp, Matrix4::identity())
    }

    /// Creates a frame whose pose is marked as a tracking failure.
    #[must_use]
    pub fn invalid(timestamp: Timestamp) -> Self {
        let mut camera_to_world = Matrix4::from_element(INVALID_POSE_MARKER);
        camera_to_world[(3, 3)] = 1.0;
        Self::new(timestamp, camera_to_world)
    }

    /// True when entry `(0, 0)` equals `marker`.
    #[must_use]
    #[allow(clippy::float_cmp)]
    // Exact compare: the marker is a sentinel, never a computed value
    pub fn is_marked(&self, marker: f64) -> bool {
        self.camera_to_world[(0, 0)] == marker
    }

    /// True when the pose carries [`INVALID_POSE_MARKER`].
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        self.is_marked(INVALID_POSE_MARKER)
    }

    /// Camera-to-world rotation block.
    #[must_use]
    pub fn rotation(&self) -> Matrix3<f64> {
        self.camera_to_world.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// True when every pose entry is within `epsilon` of the identity.
    #[must_use]
    pub fn is_identity(&self, epsilon: f64) -> bool {
        (self.camera_to_world - Matrix4::identity()).amax() <= epsilon
    }
}
