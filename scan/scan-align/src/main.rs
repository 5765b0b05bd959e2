//! Scan alignment command line tool.
//!
//! # Usage
//!
//! - `scan-align <SCAN_DIR>` - Align one scan
//! - `scan-align --all <ROOT>` - Align every scan directory inside `ROOT`
//! - `scan-align --aln <SCAN_DIR>` - Apply the scan's `alignment.aln`
//!
//! Logging is controlled with `RUST_LOG` (default `info`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use scan_align::{AlignOutcome, AlignParams, align_directory, align_scan, align_scan_from_aln};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Align 3D scan reconstructions to a canonical frame
///
/// Z up, floor at zero, walls along X and Y.
#[derive(Parser)]
#[command(name = "scan-align")]
#[command(version, long_about = None)]
struct Cli {
    /// Scan directory, or a directory of scans with --all
    #[arg(name = "PATH")]
    path: PathBuf,

    /// Re-align scans that are already marked aligned
    #[arg(long)]
    force: bool,

    /// Treat PATH as a directory of scan directories
    #[arg(long, conflicts_with = "aln")]
    all: bool,

    /// Apply the scan's alignment.aln instead of estimating
    #[arg(long)]
    aln: bool,

    /// JSON file with alignment parameters; omitted fields keep defaults
    #[arg(long, value_name = "FILE")]
    params: Option<PathBuf>,

    /// Write the working mesh with its largest plane clusters painted
    #[arg(long, value_name = "FILE", conflicts_with_all = ["all", "aln"])]
    paint_clusters: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut params = match &cli.params {
        Some(path) => load_params(path)?,
        None => AlignParams::default(),
    };
    if cli.paint_clusters.is_some() && params.paint_top_clusters == 0 {
        params.paint_top_clusters = 8;
    }

    if cli.all {
        return run_all(&cli.path, &params, cli.force);
    }

    let outcome = if cli.aln {
        align_scan_from_aln(&cli.path, &params)
    } else {
        align_scan(&cli.path, &params, cli.force)
    }
    .with_context(|| format!("aligning {}", cli.path.display()))?;

    if let (AlignOutcome::Aligned(report), Some(out)) = (&outcome, &cli.paint_clusters) {
        let painted = report.alignment.as_ref().and_then(|a| a.painted.as_ref());
        match painted {
            Some(mesh) => {
                mesh_io::save_ply(mesh, out, true)
                    .with_context(|| format!("writing {}", out.display()))?;
                info!(path = %out.display(), "wrote painted clusters");
            }
            None => warn!("no painted mesh was produced"),
        }
    }
    Ok(())
}

fn run_all(root: &Path, params: &AlignParams, force: bool) -> Result<()> {
    let results = align_directory(root, params, force)
        .with_context(|| format!("listing {}", root.display()))?;

    let failed: Vec<_> = results.iter().filter(|r| r.result.is_err()).collect();
    for scan in &failed {
        if let Err(err) = &scan.result {
            warn!(dir = %scan.dir.display(), error = %err, "scan failed");
        }
    }
    if !failed.is_empty() {
        bail!("{} of {} scans failed", failed.len(), results.len());
    }
    Ok(())
}

fn load_params(path: &Path) -> Result<AlignParams> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}
