//! Atomic JSON state files.
//!
//! Every state document in the data directory goes through these two
//! functions. Writes land in a sibling temp file and rename over the
//! target, so concurrent readers always see either the old or the new
//! complete document. Corrupt or missing files read as `None` and the
//! owning component falls back to a fresh default.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::warn;

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(path = %path.display(), %err, "state file is corrupt, treating as fresh");
            None
        }
    }
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating state directory {}", parent.display()))?;
    }

    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');

    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    fs::write(&tmp, content)
        .with_context(|| format!("writing temp state file {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("renaming state file into place at {}", path.display()))?;
    Ok(())
}

/// Atomically replace a file with raw text (used for the session log and
/// host config, which are not pretty-printed JSON documents).
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    fs::write(&tmp, content)
        .with_context(|| format!("writing temp file {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("renaming into place at {}", path.display()))?;
    Ok(())
}
