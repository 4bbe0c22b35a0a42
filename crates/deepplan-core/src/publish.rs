//! Thin publish wrapper over the HF hub HTTP API: create the dataset repo if
//! needed, then upload the output folder as a single commit.

use anyhow::Context;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

const DEFAULT_ENDPOINT: &str = "https://huggingface.co";

#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub username: String,
    pub dataset_name: String,
    pub source_dir: PathBuf,
    pub private: bool,
    pub commit_message: String,
}

impl PublishOptions {
    pub fn repo_id(&self) -> String {
        format!("{}/{}", self.username, self.dataset_name)
    }
}

/// Publish the source directory to a dataset repo and return its URL.
/// Requires `HF_TOKEN` in the environment.
pub fn publish_dataset(opts: &PublishOptions) -> anyhow::Result<String> {
    if !opts.source_dir.is_dir() {
        anyhow::bail!("source directory missing: {}", opts.source_dir.display());
    }
    let token = std::env::var("HF_TOKEN").context("HF_TOKEN must be set to publish")?;
    let endpoint =
        std::env::var("HF_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
    let client = reqwest::blocking::Client::new();
    let repo_id = opts.repo_id();

    create_repo(&client, &endpoint, &token, opts)?;

    let files = collect_files(&opts.source_dir)?;
    if files.is_empty() {
        anyhow::bail!("nothing to upload in {}", opts.source_dir.display());
    }
    info!(repo = %repo_id, files = files.len(), "uploading folder");

    // The commit endpoint takes newline-delimited JSON: one header line with
    // the commit message, then one line per file with base64 content.
    let mut body = String::new();
    body.push_str(&json!({"key": "header", "value": {"summary": opts.commit_message}}).to_string());
    body.push('\n');
    for path in &files {
        let content = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let rel = path
            .strip_prefix(&opts.source_dir)
            .context("upload path outside source dir")?
            .to_string_lossy()
            .replace('\\', "/");
        body.push_str(
            &json!({
                "key": "file",
                "value": {
                    "path": rel,
                    "content": BASE64.encode(&content),
                    "encoding": "base64",
                }
            })
            .to_string(),
        );
        body.push('\n');
    }

    let resp = client
        .post(format!("{endpoint}/api/datasets/{repo_id}/commit/main"))
        .bearer_auth(&token)
        .header("Content-Type", "application/x-ndjson")
        .body(body)
        .send()
        .context("commit request failed")?;
    let status = resp.status();
    if !status.is_success() {
        let detail = resp.text().unwrap_or_default();
        anyhow::bail!("commit to {repo_id} failed ({status}): {detail}");
    }

    Ok(format!("https://huggingface.co/datasets/{repo_id}"))
}

/// Create the dataset repo; an already existing repo is fine.
fn create_repo(
    client: &reqwest::blocking::Client,
    endpoint: &str,
    token: &str,
    opts: &PublishOptions,
) -> anyhow::Result<()> {
    let resp = client
        .post(format!("{endpoint}/api/repos/create"))
        .bearer_auth(token)
        .json(&json!({
            "type": "dataset",
            "name": opts.dataset_name,
            "organization": opts.username,
            "private": opts.private,
        }))
        .send()
        .context("create-repo request failed")?;
    let status = resp.status();
    if status.is_success() || status == reqwest::StatusCode::CONFLICT {
        return Ok(());
    }
    let detail = resp.text().unwrap_or_default();
    anyhow::bail!("failed to create repo {} ({status}): {detail}", opts.repo_id());
}

fn collect_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}
