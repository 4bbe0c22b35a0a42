use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "deepplan",
    version,
    about = "Normalize DeepPlanning benchmark archives into parquet tables"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Download, extract and build all parquet tables
    Build(BuildArgs),
    /// Check referential consistency of previously built tables
    Validate(ValidateArgs),
    /// Upload a built output folder to an HF dataset repo
    Publish(PublishArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Path to the Qwen-Agent benchmark/deepplanning directory
    #[arg(long)]
    pub source_root: PathBuf,

    /// Directory for downloaded raw archives
    #[arg(long, default_value = "artifacts/raw_hf")]
    pub raw_cache_dir: PathBuf,

    /// Temporary extraction working directory
    #[arg(long, default_value = "artifacts/work")]
    pub work_dir: PathBuf,

    /// Output parquet directory
    #[arg(long, default_value = "artifacts/deepplanning_parquet")]
    pub out_dir: PathBuf,

    /// Include the travel distance matrix table (largest table)
    #[arg(long)]
    pub include_distance_matrix: bool,

    /// Skip download and extraction, reusing consolidated roots in the work dir
    #[arg(long)]
    pub offline: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long, default_value = "artifacts/deepplanning_parquet")]
    pub parquet_dir: PathBuf,
}

#[derive(clap::Args, Debug, Clone)]
pub struct PublishArgs {
    /// HF username or organization
    #[arg(long)]
    pub username: String,

    /// HF dataset repo name
    #[arg(long, default_value = "deepplanning-parquet")]
    pub dataset_name: String,

    /// Folder to upload
    #[arg(long, default_value = "hf_publish")]
    pub source_dir: PathBuf,

    /// Create a private dataset repo
    #[arg(long)]
    pub private: bool,

    #[arg(long, default_value = "Upload DeepPlanning parquet standardized dataset")]
    pub commit_message: String,
}
