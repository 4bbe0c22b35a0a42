use crate::config::DatasetSpec;
use anyhow::Context;
use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Download the raw benchmark archives into `cache_dir`.
///
/// Archives already materialized in the cache with a matching size are left
/// alone, so a warm cache makes this a no-op. Retries and auth are the hub
/// client's concern.
pub fn fetch_raw_archives(spec: &DatasetSpec, cache_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    fs::create_dir_all(cache_dir)
        .with_context(|| format!("failed to create cache dir {}", cache_dir.display()))?;

    let api = ApiBuilder::from_env()
        .with_progress(true)
        .with_retries(5)
        .build()
        .context("failed to build hf-hub client")?;
    let repo_api = api.repo(Repo::new(spec.hf_dataset_id.clone(), RepoType::Dataset));

    let mut fetched = Vec::new();
    for name in spec.raw_files() {
        let target = cache_dir.join(&name);
        if target.is_file() {
            debug!(archive = %name, "raw archive already cached");
            fetched.push(target);
            continue;
        }

        info!(archive = %name, dataset = %spec.hf_dataset_id, "downloading raw archive");
        let cached = repo_api
            .get(&name)
            .with_context(|| format!("failed to download '{name}' from {}", spec.hf_dataset_id))?;
        materialize(&cached, &target)?;
        fetched.push(target);
    }
    Ok(fetched)
}

/// Copy a hub cache file into place, replacing a partial file if sizes differ.
fn materialize(source: &Path, target: &Path) -> anyhow::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    if target.exists() {
        let src_len = fs::metadata(source)
            .with_context(|| format!("failed to stat {}", source.display()))?
            .len();
        let dst_len = fs::metadata(target)
            .with_context(|| format!("failed to stat {}", target.display()))?
            .len();
        if src_len == dst_len {
            return Ok(());
        }
        fs::remove_file(target)
            .with_context(|| format!("failed to replace {}", target.display()))?;
    }

    fs::copy(source, target).with_context(|| {
        format!(
            "failed to copy {} -> {}",
            source.display(),
            target.display()
        )
    })?;
    Ok(())
}
