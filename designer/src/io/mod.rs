//! I/O helpers for designer commands.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

pub mod config;
pub mod definition;
pub mod init;
pub mod registry;

/// Write `contents` to a uniquely named temp file beside `path`, then rename
/// it into place. Concurrent writers of the same path never share a temp file.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("path missing parent {}", path.display()))?;
    let dir = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
        parent
    };
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    tmp.write_all(contents.as_bytes())
        .with_context(|| format!("write temp file {}", tmp.path().display()))?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}
