//! Filesystem layout (spec.md §4.4, "design-level, not prescriptive"):
//! one directory per artifact UUID holding an immutable blob per version,
//! a mutable current-pointer blob, and an index blob with metadata.

use std::path::{Path, PathBuf};
use uuid::Uuid;

pub fn artifact_dir(base: &Path, id: Uuid) -> PathBuf {
    base.join(id.to_string())
}

pub fn version_path(base: &Path, id: Uuid, version: u64) -> PathBuf {
    artifact_dir(base, id).join(format!("v{version}.json"))
}

pub fn current_pointer_path(base: &Path, id: Uuid) -> PathBuf {
    artifact_dir(base, id).join("current")
}

pub fn index_path(base: &Path, id: Uuid) -> PathBuf {
    artifact_dir(base, id).join("index.json")
}

/// Writes `contents` to `path` via a temp-file-then-rename so a crash
/// mid-write never leaves a half-written blob or dangling pointer
/// (spec.md §4.4 "A failed write must not leave the current pointer
/// dangling").
pub fn atomic_write(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let tmp = dir.join(format!(
        ".tmp-{}-{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("blob"),
        std::process::id()
    ));
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
