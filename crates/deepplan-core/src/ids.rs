use crate::errors::StructuralError;
use std::path::{Path, PathBuf};

/// Parse the numeric suffix of a `prefix_NNN` directory name.
///
/// Directory names are not guaranteed to be zero-padded, so the numeric value
/// is the canonical identity: `case_007` and `case_7` both map to 7, and the
/// derived id string is always the plain decimal form.
pub fn numeric_dir_id(name: &str) -> Result<u64, StructuralError> {
    let suffix = name
        .split('_')
        .nth(1)
        .ok_or_else(|| StructuralError(format!("directory name has no numeric suffix: {name:?}")))?;
    suffix
        .parse::<u64>()
        .map_err(|_| StructuralError(format!("directory name has non-numeric suffix: {name:?}")))
}

/// List the `prefix`-named subdirectories of `dir`, sorted by numeric id.
///
/// A `prefix`-named entry whose suffix does not parse is fatal; entries not
/// matching the prefix at all (stray files, metadata dirs) are ignored.
pub fn numbered_subdirs(dir: &Path, prefix: &str) -> anyhow::Result<Vec<(u64, PathBuf)>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| StructuralError(format!("failed to list {}: {e}", dir.display())))?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| StructuralError(format!("failed to list {}: {e}", dir.display())))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(prefix) {
            continue;
        }
        let id = numeric_dir_id(name)?;
        dirs.push((id, path));
    }

    // Numeric sort, not lexical: case_10 comes after case_9.
    dirs.sort_by_key(|(id, _)| *id);
    Ok(dirs)
}
