//! Shared fixtures: real git repositories in temporary directories

#![allow(dead_code)]

use anyhow::{bail, Result};
use std::path::Path;
use tokio::process::Command;

async fn git(path: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .output()
        .await?;

    if !output.status.success() {
        bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(())
}

/// Create a repository at `path` with one commit on `branch`
pub async fn init_repo(path: &Path, branch: &str) -> Result<()> {
    std::fs::create_dir_all(path)?;
    git(path, &["init", "-q"]).await?;
    git(path, &["config", "user.name", "Test User"]).await?;
    git(path, &["config", "user.email", "test@example.com"]).await?;
    git(path, &["symbolic-ref", "HEAD", &format!("refs/heads/{branch}")]).await?;
    git(path, &["commit", "-q", "--allow-empty", "-m", "Initial commit"]).await?;
    Ok(())
}

/// Create `branch` at HEAD without switching to it
pub async fn create_branch(path: &Path, branch: &str) -> Result<()> {
    git(path, &["branch", branch]).await
}
