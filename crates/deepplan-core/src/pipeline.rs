use crate::acquire::fetch_raw_archives;
use crate::config::{BuildOptions, DatasetSpec};
use crate::consolidate::consolidate;
use crate::errors::StructuralError;
use crate::extract::{extract_tar_gz, extract_zip};
use crate::manifest::{Manifest, MANIFEST_FILE};
use crate::storage;
use crate::tables::shopping::build_shopping_tables;
use crate::tables::travel::build_travel_tables;
use anyhow::Context;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Result of a full build: the output directory, per-table row counts and
/// the persisted manifest.
#[derive(Debug)]
pub struct BuildOutcome {
    pub out_dir: PathBuf,
    pub tables: BTreeMap<String, u64>,
    pub manifest: Manifest,
}

/// Run the whole batch pipeline: acquire raw archives, extract and
/// consolidate them, build both domains' tables, write parquet and persist
/// the manifest. Strictly sequential; any fatal error aborts the run with no
/// partial-output recovery.
pub fn run_build(spec: &DatasetSpec, opts: &BuildOptions) -> anyhow::Result<BuildOutcome> {
    for dir in [&opts.raw_cache_dir, &opts.work_dir, &opts.out_dir] {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let shopping_root = opts.source_root.join("shoppingplanning");
    let travel_root = opts.source_root.join("travelplanning");
    if !shopping_root.is_dir() || !travel_root.is_dir() {
        return Err(StructuralError(format!(
            "invalid source root (expected shoppingplanning/ and travelplanning/): {}",
            opts.source_root.display()
        ))
        .into());
    }

    let consolidated_shopping = opts.work_dir.join("shopping_consolidated");
    let consolidated_travel = opts.work_dir.join("travel_consolidated");

    if opts.offline {
        for dir in [&consolidated_shopping, &consolidated_travel] {
            if !dir.is_dir() {
                return Err(StructuralError(format!(
                    "offline build requires existing consolidated root: {}",
                    dir.display()
                ))
                .into());
            }
        }
        info!("offline build, reusing consolidated roots");
    } else {
        fetch_raw_archives(spec, &opts.raw_cache_dir)?;
        prepare_sources(spec, opts, &consolidated_shopping, &consolidated_travel)?;
    }

    let shopping = build_shopping_tables(spec, &shopping_root, &consolidated_shopping)?;
    let travel = build_travel_tables(
        spec,
        &travel_root,
        &consolidated_travel,
        opts.include_distance_matrix,
    )?;
    let mut tables = shopping.tables;
    tables.merge(travel);

    let mut counts = BTreeMap::new();
    for (name, rows) in tables.iter() {
        let out_path = opts.out_dir.join(format!("{name}.parquet"));
        let written = storage::write_table(rows, &out_path)?;
        info!(table = %name, rows = written, "wrote table");
        counts.insert(name.clone(), written as u64);
    }

    let manifest = Manifest {
        dataset: "DeepPlanning-parquet".to_string(),
        source_dataset: spec.hf_dataset_id.clone(),
        source_qwen_agent_root: opts.source_root.display().to_string(),
        include_distance_matrix: opts.include_distance_matrix,
        query_fallback_cases: shopping.query_fallback_cases,
        generated_at: chrono::Utc::now().to_rfc3339(),
        tables: counts.clone(),
    };
    manifest.save(&opts.out_dir.join(MANIFEST_FILE))?;

    Ok(BuildOutcome {
        out_dir: opts.out_dir.clone(),
        tables: counts,
        manifest,
    })
}

/// Extract every archive into its own working subdirectory, then alias all
/// partition roots under one consolidated directory per domain.
fn prepare_sources(
    spec: &DatasetSpec,
    opts: &BuildOptions,
    consolidated_shopping: &Path,
    consolidated_travel: &Path,
) -> anyhow::Result<()> {
    let mut shopping_parts = Vec::new();
    for &level in &spec.shopping_levels {
        let archive = opts.raw_cache_dir.join(spec.shopping_archive(level));
        let out = opts.work_dir.join("shopping").join(format!("level{level}"));
        let root = extract_tar_gz(&archive, &out, "database_level")?;
        shopping_parts.push((format!("database_level{level}"), root));
    }
    consolidate(consolidated_shopping, &shopping_parts)?;

    let mut travel_parts = Vec::new();
    for language in &spec.travel_languages {
        let archive = opts.raw_cache_dir.join(spec.travel_archive(language));
        let out = opts.work_dir.join(format!("travel_{language}"));
        let root = extract_zip(&archive, &out, "database_")?;
        travel_parts.push((format!("database_{language}"), root));
    }
    consolidate(consolidated_travel, &travel_parts)?;
    Ok(())
}
