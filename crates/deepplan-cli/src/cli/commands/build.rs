use crate::cli::args::BuildArgs;
use deepplan_core::config::{BuildOptions, DatasetSpec};
use deepplan_core::pipeline::run_build;
use serde_json::json;

pub fn run(args: BuildArgs) -> anyhow::Result<i32> {
    let spec = DatasetSpec::default();
    let opts = BuildOptions {
        source_root: args.source_root,
        raw_cache_dir: args.raw_cache_dir,
        work_dir: args.work_dir,
        out_dir: args.out_dir,
        include_distance_matrix: args.include_distance_matrix,
        offline: args.offline,
    };

    let outcome = run_build(&spec, &opts)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "status": "ok",
            "out_dir": outcome.out_dir,
            "tables": outcome.tables,
        }))?
    );
    Ok(0)
}
