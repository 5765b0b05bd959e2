//! Inertial Measurement Unit (IMU) samples recorded during capture.

use nalgebra::Vector3;

use crate::Timestamp;

/// A reading from the capture device's motion sensors.
///
/// Vectors are in the device frame as reported by the platform motion API.
/// Channels the device did not provide are zero.
///
/// # Units
///
/// - Rotation rate: radians per second
/// - Acceleration and gravity: multiples of g
/// - Magnetic field: microtesla
/// - Attitude: roll, pitch, yaw in radians
///
/// # Example
///
/// ```
/// use nalgebra::Vector3;
/// use sensor_types::{ImuSample, Timestamp};
///
/// let sample = ImuSample {
///     gravity: Vector3::new(0.0, -1.0, 0.0),
///     ..ImuSample::zero(Timestamp::from_nanos(5))
/// };
///
/// assert!(sample.has_gravity());
/// assert!(!sample.has_acceleration());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuSample {
    /// Timestamp of the reading; zero when the sample was never filled in.
    pub timestamp: Timestamp,
    /// Angular velocity.
    pub rotation_rate: Vector3<f64>,
    /// User acceleration.
    pub acceleration: Vector3<f64>,
    /// Magnetic field.
    pub magnetic_field: Vector3<f64>,
    /// Device attitude.
    pub attitude: Vector3<f64>,
    /// Gravity direction estimated by the device.
    pub gravity: Vector3<f64>,
}

impl ImuSample {
    /// Creates an all-zero sample.
    #[must_use]
    pub fn zero(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            rotation_rate: Vector3::zeros(),
            acceleration: Vector3::zeros(),
            magnetic_field: Vector3::zeros(),
            attitude: Vector3::zeros(),
            gravity: Vector3::zeros(),
        }
    }

    /// True when the gravity channel is non-zero.
    #[must_use]
    pub fn has_gravity(&self) -> bool {
        self.gravity != Vector3::zeros()
    }

    /// True when the acceleration channel is non-zero.
    #[must_use]
    pub fn has_acceleration(&self) -> bool {
        self.acceleration != Vector3::zeros()
    }
}

impl Default for ImuSample {
    fn default() -> Self {
        Self::zero(Timestamp::zero())
    }
}
