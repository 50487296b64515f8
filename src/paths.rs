//! Centralized path resolution for capstan.
//!
//! A capstan workspace is a checked-out application repository: the
//! `workspace.yaml` project config sits at its root, and each installed
//! repository owns a `<repo>/` subdirectory holding its rendered terraform
//! root, helm chart, and generated `deploy.hcl`.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

/// Project config file expected at the workspace root.
pub const PROJECT_CONFIG_FILE: &str = "workspace.yaml";

/// Deployment context manifest at the workspace root.
pub const CONTEXT_FILE: &str = "context.yaml";

/// Find the workspace root by walking up from the current directory until
/// a `workspace.yaml` (or a `.git` directory) appears.
pub fn workspace_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    find_root(&cwd)
}

/// Walk up from `start` looking for the workspace root.
pub fn find_root(start: &Path) -> Result<PathBuf> {
    let mut dir = start;
    loop {
        if dir.join(PROJECT_CONFIG_FILE).is_file() || dir.join(".git").is_dir() {
            return Ok(dir.to_path_buf());
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => bail!(
                "not inside a capstan workspace (no {} found above {})",
                PROJECT_CONFIG_FILE,
                start.display()
            ),
        }
    }
}

/// Terraform root for one installed repository.
pub fn terraform_dir(root: &Path, repo: &str) -> PathBuf {
    root.join(repo).join("terraform")
}

/// The generated backend file removed on reset.
pub fn deploy_file(root: &Path, repo: &str) -> PathBuf {
    root.join(repo).join("deploy.hcl")
}

/// Helm chart directory for one installed repository.
pub fn helm_dir(root: &Path, repo: &str) -> PathBuf {
    root.join(repo).join("helm").join(repo)
}
