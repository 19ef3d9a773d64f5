//! Snapshot codec: the JSON array on disk.
//!
//! The snapshot is the only durable representation of the store: a JSON
//! array in which each element is a member's fields plus the `memberType`
//! discriminator naming its rank.
//!
//! ## Decode tolerance
//!
//! Decoding is per-element fallible: a malformed element is skipped,
//! counted, and logged, and never aborts the batch. A missing file reads as
//! an empty collection. Errors are collected into a [`SnapshotReport`] for
//! diagnostics.
//!
//! ## Write path
//!
//! Writes create missing parent directories and replace the target through
//! a temp file + rename, which is atomic enough for the single-writer
//! assumption; concurrent export/import against one path needs external
//! coordination.

use crate::error::{Error, Result};
use crate::member::Member;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Outcome of a snapshot decode.
#[derive(Debug, Clone, Default)]
pub struct SnapshotReport {
    /// Records decoded successfully.
    pub loaded: usize,
    /// Elements skipped as unreadable.
    pub skipped: usize,
    /// One message per skipped element.
    pub errors: Vec<String>,
}

impl SnapshotReport {
    /// Whether every element decoded.
    pub fn is_clean(&self) -> bool {
        self.skipped == 0
    }

    /// One-line human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "snapshot load: {} loaded, {} skipped",
            self.loaded, self.skipped
        )
    }
}

/// Write `members` as a JSON array at `path`.
///
/// Creates parent directories as needed and replaces any existing file.
pub fn write_snapshot(path: &Path, members: &[Member]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(members)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;

    info!("wrote {} members to {}", members.len(), path.display());
    Ok(())
}

/// Read a snapshot array from `path`.
///
/// A missing file yields an empty set. An unreadable or non-array file is a
/// persistence failure; an unreadable *element* is skipped and reported.
pub fn read_snapshot(path: &Path) -> Result<(Vec<Member>, SnapshotReport)> {
    if !path.exists() {
        debug!("no snapshot at {}", path.display());
        return Ok((Vec::new(), SnapshotReport::default()));
    }

    let raw = fs::read_to_string(path)?;
    let root: serde_json::Value = serde_json::from_str(&raw)?;
    let elements = match root {
        serde_json::Value::Array(elements) => elements,
        other => {
            return Err(Error::Serialization(format!(
                "snapshot root must be an array, got {}",
                type_name(&other)
            )))
        }
    };

    let (members, report) = decode_elements(elements);
    if !report.is_clean() {
        warn!("{} ({})", report.summary(), path.display());
    } else {
        info!("{}", report.summary());
    }
    Ok((members, report))
}

/// Decode each element independently, collecting failures.
fn decode_elements(elements: Vec<serde_json::Value>) -> (Vec<Member>, SnapshotReport) {
    let mut members = Vec::with_capacity(elements.len());
    let mut report = SnapshotReport::default();

    for (index, element) in elements.into_iter().enumerate() {
        match serde_json::from_value::<Member>(element) {
            Ok(member) => {
                report.loaded += 1;
                members.push(member);
            }
            Err(e) => {
                warn!("skipping unreadable snapshot entry {index}: {e}");
                report.skipped += 1;
                report.errors.push(format!("entry {index}: {e}"));
            }
        }
    }

    (members, report)
}

fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
