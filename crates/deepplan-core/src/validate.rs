use crate::config::DatasetSpec;
use crate::errors::StructuralError;
use crate::manifest::MANIFEST_FILE;
use crate::storage;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const REPORT_FILE: &str = "validation_report.json";

/// At most this many violating keys are kept as evidence per failed check.
const MISSING_SAMPLE_CAP: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableStat {
    pub rows: u64,
}

/// One id-set containment check between a dependent table and its query
/// universe. A failed check is report data, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsetCheck {
    pub ok: bool,
    /// Distinct keys in the dependent table.
    pub subset_size: usize,
    /// Distinct keys in the query universe.
    pub universe_size: usize,
    /// Up to [`MISSING_SAMPLE_CAP`] dependent keys absent from the universe,
    /// sorted for stable output.
    pub missing_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub tables: BTreeMap<String, TableStat>,
    pub checks: BTreeMap<String, SubsetCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<serde_json::Value>,
}

impl ValidationReport {
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json =
            serde_json::to_string_pretty(self).context("failed to encode validation report")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn all_checks_ok(&self) -> bool {
        self.checks.values().all(|c| c.ok)
    }
}

/// Validate previously written tables: the full required set must be present
/// (fatal otherwise), then row counts are recorded and the referential
/// checks computed. The manifest, when present, is embedded verbatim.
pub fn validate_tables(spec: &DatasetSpec, parquet_dir: &Path) -> anyhow::Result<ValidationReport> {
    if !parquet_dir.is_dir() {
        return Err(StructuralError(format!(
            "parquet directory missing: {}",
            parquet_dir.display()
        ))
        .into());
    }

    let missing: Vec<&String> = spec
        .required_tables
        .iter()
        .filter(|t| !table_path(parquet_dir, t).is_file())
        .collect();
    if !missing.is_empty() {
        return Err(StructuralError(format!("missing required tables: {missing:?}")).into());
    }

    let mut tables = BTreeMap::new();
    for name in &spec.required_tables {
        let rows = storage::row_count(&table_path(parquet_dir, name))?;
        tables.insert(name.clone(), TableStat { rows });
    }

    let shopping_case_ids: HashSet<String> =
        storage::read_string_column(&table_path(parquet_dir, "shopping_cases"), "case_id")?
            .into_iter()
            .collect();
    let shopping_query_ids: HashSet<String> =
        storage::read_string_column(&table_path(parquet_dir, "shopping_queries"), "case_id")?
            .into_iter()
            .collect();

    let travel_query_ids = composite_keys(parquet_dir, "travel_queries")?;
    let travel_constraint_ids = composite_keys(parquet_dir, "travel_constraints")?;

    let mut checks = BTreeMap::new();
    checks.insert(
        "shopping_query_case_overlap".to_string(),
        subset_check(&shopping_case_ids, &shopping_query_ids),
    );
    checks.insert(
        "travel_query_constraint_overlap".to_string(),
        subset_check(&travel_constraint_ids, &travel_query_ids),
    );

    for (name, check) in &checks {
        if check.ok {
            info!(check = %name, subset = check.subset_size, universe = check.universe_size, "check passed");
        } else {
            warn!(check = %name, missing = check.missing_ids.len(), "check failed");
        }
    }

    let manifest_path = parquet_dir.join(MANIFEST_FILE);
    let manifest = if manifest_path.is_file() {
        let raw = std::fs::read_to_string(&manifest_path)
            .with_context(|| format!("failed to read {}", manifest_path.display()))?;
        Some(
            serde_json::from_str(&raw)
                .with_context(|| format!("malformed JSON in {}", manifest_path.display()))?,
        )
    } else {
        None
    };

    Ok(ValidationReport {
        tables,
        checks,
        manifest,
    })
}

/// Validate and persist the report into the parquet directory.
pub fn run_validation(
    spec: &DatasetSpec,
    parquet_dir: &Path,
) -> anyhow::Result<(ValidationReport, PathBuf)> {
    let report = validate_tables(spec, parquet_dir)?;
    let out = parquet_dir.join(REPORT_FILE);
    report.save(&out)?;
    Ok((report, out))
}

fn table_path(dir: &Path, table: &str) -> PathBuf {
    dir.join(format!("{table}.parquet"))
}

/// Travel ids are scoped per language; the same sample id exists
/// independently in each language, so the key is the composite pair.
fn composite_keys(parquet_dir: &Path, table: &str) -> anyhow::Result<HashSet<String>> {
    let path = table_path(parquet_dir, table);
    let languages = storage::read_string_column(&path, "language")?;
    let sample_ids = storage::read_string_column(&path, "sample_id")?;
    Ok(languages
        .into_iter()
        .zip(sample_ids)
        .map(|(lang, sid)| format!("{lang}:{sid}"))
        .collect())
}

fn subset_check(dependent: &HashSet<String>, universe: &HashSet<String>) -> SubsetCheck {
    let mut missing: Vec<String> = dependent.difference(universe).cloned().collect();
    missing.sort();
    let ok = missing.is_empty();
    missing.truncate(MISSING_SAMPLE_CAP);
    SubsetCheck {
        ok,
        subset_size: dependent.len(),
        universe_size: universe.len(),
        missing_ids: missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn subset_holds() {
        let check = subset_check(&set(&["1", "2"]), &set(&["1", "2", "3"]));
        assert!(check.ok);
        assert_eq!(check.subset_size, 2);
        assert_eq!(check.universe_size, 3);
        assert!(check.missing_ids.is_empty());
    }

    #[test]
    fn subset_violation_reports_evidence() {
        let check = subset_check(&set(&["1", "2", "4"]), &set(&["1", "2", "3"]));
        assert!(!check.ok);
        assert_eq!(check.missing_ids, vec!["4"]);
    }

    #[test]
    fn evidence_is_capped_and_sorted() {
        let dependent: HashSet<String> = (0..50).map(|i| format!("{i:03}")).collect();
        let check = subset_check(&dependent, &HashSet::new());
        assert!(!check.ok);
        assert_eq!(check.missing_ids.len(), MISSING_SAMPLE_CAP);
        assert_eq!(check.missing_ids[0], "000");
        assert_eq!(check.subset_size, 50);
    }
}
