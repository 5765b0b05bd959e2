//! Binary trajectory file codec.
//!
//! # Layout
//!
//! All values little-endian:
//!
//! ```text
//! magic      4 bytes  "TRAJ"
//! version    u32
//! frames     u64 count, then per frame:
//!              timestamp u64, camera_to_world 16 x f64 (row-major)
//! imu        u64 count, then per sample:
//!              rotation_rate, acceleration, magnetic_field, attitude,
//!              gravity (3 x f64 each), timestamp u64
//! ```
//!
//! Invalid poses keep their marker values (including infinities), which is
//! why the store is binary rather than JSON.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use nalgebra::{Matrix4, Vector3};
use tracing::debug;

use crate::error::{SensorError, SensorResult};
use crate::{CameraFrame, ImuSample, Timestamp, Trajectory};

const MAGIC: &[u8; 4] = b"TRAJ";

/// Format version written by [`save_trajectory`].
pub const TRAJECTORY_VERSION: u32 = 1;

/// Upper bound on a single element count, to reject corrupt headers before
/// allocating.
const MAX_COUNT: u64 = 1 << 32;

/// Load a trajectory file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, has the wrong magic or
/// version, or is truncated.
pub fn load_trajectory<P: AsRef<Path>>(path: P) -> SensorResult<Trajectory> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SensorError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            SensorError::Io(e)
        }
    })?;
    let trajectory = read_trajectory(&mut BufReader::new(file))?;
    debug!(
        path = %path.display(),
        frames = trajectory.frames.len(),
        imu = trajectory.imu.len(),
        "loaded trajectory"
    );
    Ok(trajectory)
}

/// Save a trajectory file, replacing any existing file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_trajectory<P: AsRef<Path>>(trajectory: &Trajectory, path: P) -> SensorResult<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_trajectory(trajectory, &mut writer)?;
    writer.flush()?;
    debug!(
        path = %path.display(),
        frames = trajectory.frames.len(),
        imu = trajectory.imu.len(),
        "saved trajectory"
    );
    Ok(())
}

/// Decode a trajectory from a reader.
///
/// # Errors
///
/// Returns an error on bad magic, unknown version, or truncated input.
pub fn read_trajectory<R: Read>(reader: &mut R) -> SensorResult<Trajectory> {
    let mut magic = [0u8; 4];
    read_exact(reader, &mut magic, "magic")?;
    if &magic != MAGIC {
        return Err(SensorError::invalid_format("bad magic"));
    }
    let version = read_u32(reader)?;
    if version != TRAJECTORY_VERSION {
        return Err(SensorError::UnsupportedVersion {
            found: version,
            expected: TRAJECTORY_VERSION,
        });
    }

    let frame_count = read_count(reader, "frame")?;
    let mut frames = Vec::with_capacity(frame_count.min(1 << 16));
    for _ in 0..frame_count {
        let timestamp = Timestamp::from_nanos(read_u64(reader)?);
        let mut values = [0.0; 16];
        for v in &mut values {
            *v = read_f64(reader)?;
        }
        frames.push(CameraFrame::new(timestamp, Matrix4::from_row_slice(&values)));
    }

    let imu_count = read_count(reader, "IMU sample")?;
    let mut imu = Vec::with_capacity(imu_count.min(1 << 16));
    for _ in 0..imu_count {
        let rotation_rate = read_vec3(reader)?;
        let acceleration = read_vec3(reader)?;
        let magnetic_field = read_vec3(reader)?;
        let attitude = read_vec3(reader)?;
        let gravity = read_vec3(reader)?;
        let timestamp = Timestamp::from_nanos(read_u64(reader)?);
        imu.push(ImuSample {
            timestamp,
            rotation_rate,
            acceleration,
            magnetic_field,
            attitude,
            gravity,
        });
    }

    Ok(Trajectory::new(frames, imu))
}

/// Encode a trajectory to a writer.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_trajectory<W: Write>(trajectory: &Trajectory, writer: &mut W) -> SensorResult<()> {
    writer.write_all(MAGIC)?;
    writer.write_all(&TRAJECTORY_VERSION.to_le_bytes())?;

    writer.write_all(&(trajectory.frames.len() as u64).to_le_bytes())?;
    for frame in &trajectory.frames {
        writer.write_all(&frame.timestamp.as_nanos().to_le_bytes())?;
        // nalgebra stores column-major; the file is row-major
        for row in frame.camera_to_world.row_iter() {
            for v in row.iter() {
                writer.write_all(&v.to_le_bytes())?;
            }
        }
    }

    writer.write_all(&(trajectory.imu.len() as u64).to_le_bytes())?;
    for sample in &trajectory.imu {
        for v in [
            &sample.rotation_rate,
            &sample.acceleration,
            &sample.magnetic_field,
            &sample.attitude,
            &sample.gravity,
        ] {
            for c in v.iter() {
                writer.write_all(&c.to_le_bytes())?;
            }
        }
        writer.write_all(&sample.timestamp.as_nanos().to_le_bytes())?;
    }

    Ok(())
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> SensorResult<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            SensorError::invalid_format(format!("truncated while reading {what}"))
        } else {
            SensorError::Io(e)
        }
    })
}

fn read_u32<R: Read>(reader: &mut R) -> SensorResult<u32> {
    let mut buf = [0u8; 4];
    read_exact(reader, &mut buf, "u32")?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(reader: &mut R) -> SensorResult<u64> {
    let mut buf = [0u8; 8];
    read_exact(reader, &mut buf, "u64")?;
    Ok(u64::from_le_bytes(buf))
}

fn read_f64<R: Read>(reader: &mut R) -> SensorResult<f64> {
    let mut buf = [0u8; 8];
    read_exact(reader, &mut buf, "f64")?;
    Ok(f64::from_le_bytes(buf))
}

fn read_vec3<R: Read>(reader: &mut R) -> SensorResult<Vector3<f64>> {
    Ok(Vector3::new(read_f64(reader)?, read_f64(reader)?, read_f64(reader)?))
}

#[allow(clippy::cast_possible_truncation)]
fn read_count<R: Read>(reader: &mut R, what: &str) -> SensorResult<usize> {
    let count = read_u64(reader)?;
    if count > MAX_COUNT {
        return Err(SensorError::invalid_format(format!(
            "{what} count {count} exceeds limit"
        )));
    }
    Ok(count as usize)
}
