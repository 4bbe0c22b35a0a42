use crate::errors::StructuralError;
use anyhow::Context;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

/// Unpack a gzipped tar archive and return its single expected root directory.
pub fn extract_tar_gz(
    archive: &Path,
    out_dir: &Path,
    root_prefix: &str,
) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let file = File::open(archive)
        .with_context(|| format!("failed to open archive {}", archive.display()))?;
    let mut tar = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    tar.unpack(out_dir)
        .with_context(|| format!("failed to unpack {}", archive.display()))?;
    info!(archive = %archive.display(), out = %out_dir.display(), "extracted tar archive");
    Ok(single_extraction_root(out_dir, root_prefix)?)
}

/// Unpack a zip archive and return its single expected root directory.
pub fn extract_zip(archive: &Path, out_dir: &Path, root_prefix: &str) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let file = File::open(archive)
        .with_context(|| format!("failed to open archive {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("failed to read zip {}", archive.display()))?;
    zip.extract(out_dir)
        .with_context(|| format!("failed to unpack {}", archive.display()))?;
    info!(archive = %archive.display(), out = %out_dir.display(), "extracted zip archive");
    Ok(single_extraction_root(out_dir, root_prefix)?)
}

/// Every archive must yield exactly one root directory with the expected name
/// prefix. Zero roots means a damaged archive, more than one means the layout
/// changed upstream; both abort the run.
pub fn single_extraction_root(dir: &Path, prefix: &str) -> Result<PathBuf, StructuralError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| StructuralError(format!("failed to list {}: {e}", dir.display())))?;

    let mut roots = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| StructuralError(format!("failed to list {}: {e}", dir.display())))?;
        let path = entry.path();
        if path.is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(prefix))
        {
            roots.push(path);
        }
    }

    if roots.len() != 1 {
        return Err(StructuralError(format!(
            "unexpected extraction roots under {}: {roots:?}",
            dir.display()
        )));
    }
    Ok(roots.remove(0))
}
