use crate::errors::StructuralError;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[cfg(unix)]
use std::os::unix::fs::symlink as symlink_dir;
#[cfg(windows)]
use std::os::windows::fs::symlink_dir;

/// Alias each partition root under `dest` so a single directory listing
/// yields all partitions.
///
/// Aliases are symlinks, checked before creation: re-running over the same
/// sources is a no-op. A partition whose source root is absent is fatal.
pub fn consolidate(dest: &Path, partitions: &[(String, PathBuf)]) -> anyhow::Result<()> {
    fs::create_dir_all(dest).with_context(|| format!("failed to create {}", dest.display()))?;

    for (alias, source) in partitions {
        if !source.is_dir() {
            return Err(StructuralError(format!(
                "partition root missing for alias {alias:?}: {}",
                source.display()
            ))
            .into());
        }

        let link = dest.join(alias);
        if link.symlink_metadata().is_ok() {
            debug!(alias = %alias, "consolidation alias already present");
            continue;
        }
        symlink_dir(source, &link).with_context(|| {
            format!("failed to alias {} -> {}", link.display(), source.display())
        })?;
    }
    Ok(())
}
