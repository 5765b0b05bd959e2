//! Persisted per-scan processing state.
//!
//! The state file is a plain `name = value` text file written by the
//! reconstruction stage. Alignment reads it to decide whether a scan may be
//! processed and writes it back once all artifacts have been rewritten.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::{AlignError, AlignResult};

/// Processing state of one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlignmentState {
    /// The reconstruction succeeded.
    pub valid: bool,
    /// Free heap blocks at the end of reconstruction.
    pub heap_free_count: u32,
    /// Number of valid optimized frame transforms.
    pub num_valid_opt_transforms: u32,
    /// Number of frame transforms.
    pub num_transforms: u32,
    /// All artifacts have been rewritten into the canonical frame.
    pub aligned: bool,
}

/// File field names, in write order.
const FIELDS: [&str; 5] = [
    "valid",
    "heapFreeCount",
    "numValidOptTransforms",
    "numTransforms",
    "aligned",
];

impl AlignmentState {
    /// Read a state file.
    ///
    /// Missing fields default to `false`/`0` with a warning, except
    /// `aligned`, which silently defaults to `false`. Blank lines, lines
    /// starting with `#` or `//`, and unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a line has no `=`, or a
    /// value does not parse.
    pub fn load<P: AsRef<Path>>(path: P) -> AlignResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::parse(&text).map_err(|message| AlignError::StateFormat {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Write the state file, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> AlignResult<()> {
        let path = path.as_ref();
        fs::write(path, self.to_text())?;
        debug!(path = %path.display(), aligned = self.aligned, "saved alignment state");
        Ok(())
    }

    /// Parse state file text.
    ///
    /// # Example
    ///
    /// ```
    /// use scan_align::AlignmentState;
    ///
    /// let state = AlignmentState::parse("valid = true\nnumTransforms = 120\n").unwrap();
    /// assert!(state.valid);
    /// assert!(!state.aligned);
    /// assert_eq!(state.num_transforms, 120);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a description of the first malformed line.
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut state = Self::default();
        let mut seen = [false; FIELDS.len()];

        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(format!("line {}: expected `name = value`", number + 1));
            };
            let (key, value) = (key.trim(), value.trim());
            let Some(field) = FIELDS.iter().position(|f| *f == key) else {
                debug!(key, "ignoring unknown state field");
                continue;
            };
            seen[field] = true;

            let parsed = match field {
                0 => parse_bool(value).map(|v| state.valid = v),
                1 => parse_number(value).map(|v| state.heap_free_count = v),
                2 => parse_number(value).map(|v| state.num_valid_opt_transforms = v),
                3 => parse_number(value).map(|v| state.num_transforms = v),
                _ => parse_bool(value).map(|v| state.aligned = v),
            };
            parsed.map_err(|e| format!("line {}: {key}: {e}", number + 1))?;
        }

        for (name, _) in FIELDS.iter().zip(seen).filter(|(_, seen)| !seen) {
            if *name != "aligned" {
                warn!(field = name, "state field uninitialized");
            }
        }
        Ok(state)
    }

    /// Render as state file text: one `name = value` line per field.
    #[must_use]
    pub fn to_text(&self) -> String {
        let values = [
            self.valid.to_string(),
            self.heap_free_count.to_string(),
            self.num_valid_opt_transforms.to_string(),
            self.num_transforms.to_string(),
            self.aligned.to_string(),
        ];
        let mut text = String::new();
        for (name, value) in FIELDS.iter().zip(values) {
            let _ = writeln!(text, "{name} = {value}");
        }
        text
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(format!("expected a boolean, found `{other}`")),
    }
}

fn parse_number<T: FromStr>(value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("expected an unsigned integer, found `{value}`"))
}
