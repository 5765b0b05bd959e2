//! Time types for capture data.

/// Nanosecond-precision capture timestamp.
///
/// A zero timestamp marks an IMU sample the capture device never filled in.
///
/// # Example
///
/// ```
/// use sensor_types::Timestamp;
///
/// let ts = Timestamp::from_secs_f64(1.5);
/// assert!((ts.as_secs_f64() - 1.5).abs() < 1e-9);
///
/// let ts_nanos = Timestamp::from_nanos(1_500_000_000);
/// assert_eq!(ts, ts_nanos);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    nanos: u64,
}

impl Timestamp {
    /// Creates a timestamp from nanoseconds.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    /// Creates a timestamp from seconds (floating point), clamped at zero.
    #[must_use]
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn from_secs_f64(secs: f64) -> Self {
        let nanos = (secs * 1e9).round().max(0.0) as u64;
        Self { nanos }
    }

    /// Returns the timestamp as nanoseconds.
    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.nanos
    }

    /// Returns the timestamp as seconds (floating point).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_secs_f64(self) -> f64 {
        self.nanos as f64 / 1e9
    }

    /// Returns the zero timestamp.
    #[must_use]
    pub const fn zero() -> Self {
        Self { nanos: 0 }
    }

    /// Checks if this is the zero timestamp.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.nanos == 0
    }

    /// Absolute difference in nanoseconds.
    #[must_use]
    pub const fn abs_diff_nanos(self, other: Self) -> u64 {
        self.nanos.abs_diff(other.nanos)
    }
}
