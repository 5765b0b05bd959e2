//! Canonical-frame alignment of 3D scan reconstructions.
//!
//! Given a reconstructed mesh and the camera trajectory it was captured
//! with, this crate computes one rigid transform that puts the scan into a
//! canonical frame and applies it to every artifact of the scan:
//!
//! - Z points up (from IMU gravity when available, camera views otherwise)
//! - the floor is level and lies at `z = 0`
//! - the dominant walls are parallel to the X and Y axes
//! - the footprint lies in the positive X/Y quadrant
//!
//! The main entry points are [`align_scan`] for one scan directory,
//! [`align_scan_from_aln`] to apply a transform from an `.aln` file, and
//! [`align_directory`] for a directory of scans. [`compute_alignment`] runs
//! the estimation on an in-memory mesh without touching any file.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Scan Directory Layout
//!
//! See [`ScanLayout`]. A scan is only processed if its state file exists
//! and marks the reconstruction as valid. Once aligned, the state file
//! records it and later runs skip the scan unless forced.
//!
//! # Example
//!
//! ```no_run
//! use scan_align::{AlignParams, align_directory};
//!
//! let params = AlignParams::default();
//! for scan in align_directory("scans", &params, false).unwrap() {
//!     if let Err(err) = scan.result {
//!         eprintln!("{}: {err}", scan.dir.display());
//!     }
//! }
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod aln;
mod error;
mod layout;
mod params;
mod pipeline;
mod state;
mod up;

pub use aln::{format_aln, parse_aln, read_aln, write_aln};
pub use error::{AlignError, AlignResult};
pub use layout::ScanLayout;
pub use params::AlignParams;
pub use pipeline::{
    AlignOutcome, AlignReport, AlignStage, Alignment, QUADRANT_SNAP, ScanResult, SkipReason,
    align_directory, align_scan, align_scan_from_aln, compute_alignment,
};
pub use state::AlignmentState;
pub use up::{UpEstimate, UpSource, UpVectorConfig, UpVectorEstimator, up_alignment};
