//! Capture data types for scan alignment.
//!
//! A scan's capture record holds one camera pose per frame plus the IMU
//! samples recorded alongside. This crate provides:
//!
//! - [`Timestamp`] - Nanosecond capture time
//! - [`CameraFrame`] - Camera-to-world pose, possibly marked invalid
//! - [`ImuSample`] - Rotation rate, acceleration, magnetic field, attitude, gravity
//! - [`Trajectory`] - Frames plus IMU stream, closest-sample lookup and
//!   transform application
//! - [`load_trajectory`] / [`save_trajectory`] - Binary trajectory files
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Invalid Poses
//!
//! Frames where tracking failed keep their slot and carry
//! [`INVALID_POSE_MARKER`] in pose entry `(0, 0)`. Consumers skip them.
//!
//! # Example
//!
//! ```
//! use nalgebra::{Matrix4, Vector3};
//! use sensor_types::{CameraFrame, INVALID_POSE_MARKER, Timestamp, Trajectory};
//!
//! let mut trajectory = Trajectory::new(
//!     vec![
//!         CameraFrame::identity(Timestamp::from_nanos(1)),
//!         CameraFrame::invalid(Timestamp::from_nanos(2)),
//!     ],
//!     Vec::new(),
//! );
//!
//! let lift = Matrix4::new_translation(&Vector3::new(0.0, 0.0, 1.0));
//! trajectory.apply_transform(&lift, INVALID_POSE_MARKER);
//! assert_eq!(trajectory.frames[0].camera_to_world, lift);
//! assert!(trajectory.frames[1].is_invalid());
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod frame;
mod imu;
mod io;
mod time;
mod trajectory;

pub use error::{SensorError, SensorResult};
pub use frame::{CameraFrame, INVALID_POSE_MARKER};
pub use imu::ImuSample;
pub use io::{
    TRAJECTORY_VERSION, load_trajectory, read_trajectory, save_trajectory, write_trajectory,
};
pub use time::Timestamp;
pub use trajectory::Trajectory;
