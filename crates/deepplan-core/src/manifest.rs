use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Descriptive record of one build run: dataset identity, source provenance,
/// the optional-table flag, the query fallback count and per-table row
/// counts. Purely descriptive; nothing here is validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub dataset: String,
    pub source_dataset: String,
    pub source_qwen_agent_root: String,
    pub include_distance_matrix: bool,
    /// Shopping cases resolved from the validation file's embedded query
    /// because their id was absent from the level's query map.
    pub query_fallback_cases: u64,
    pub generated_at: String,
    pub tables: BTreeMap<String, u64>,
}

impl Manifest {
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to encode manifest")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}
