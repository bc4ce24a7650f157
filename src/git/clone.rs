use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{error, info};

use crate::environment::{EnvironmentConfig, GitVcs};
use crate::error::SwcError;

const UNDEFINED: &str = "<undefined>";

/// Outcome of cloning a list of repositories
#[derive(Debug, Clone, Default)]
pub struct CloneReport {
    pub cloned: Vec<String>,
    pub failed: Vec<String>,
}

fn or_undefined(value: &str) -> &str {
    if value.trim().is_empty() {
        UNDEFINED
    } else {
        value
    }
}

/// HTTPS clone URL for `repository` on the configured hosting service
pub fn clone_url(config: &EnvironmentConfig, repository: &str) -> String {
    let username = or_undefined(&config.username);
    match config.git_vcs {
        GitVcs::Bitbucket => format!(
            "https://{username}@bitbucket.org/{}/{repository}.git",
            or_undefined(&config.bitbucket_project)
        ),
        GitVcs::Github => format!("https://github.com/{username}/{repository}.git"),
    }
}

/// Repositories `clone_all` would clone: the exported snapshot when there is
/// one, otherwise the configured lists enabled in `cloneOptions`.
pub fn repositories_to_clone(config: &EnvironmentConfig) -> Vec<String> {
    let exported = config.exported();
    if !exported.is_empty() {
        if exported.iter().any(|entry| entry.name.is_empty()) {
            // A single-repository snapshot has no names to clone by
            return Vec::new();
        }
        return exported.iter().map(|entry| entry.name.clone()).collect();
    }

    let mut repos = Vec::new();
    if config.clone_options.back_end.clone {
        repos.extend(config.repositories.back_end.iter().cloned());
    }
    if config.clone_options.front_end.clone {
        repos.extend(config.repositories.front_end.iter().cloned());
    }
    repos
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn relay_lines<R: AsyncRead + Unpin>(stream: R, pb: ProgressBar) {
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        pb.println(line);
    }
}

/// `git clone --verbose <url>` inside `destination`, streaming git's output
pub async fn clone_repository(url: &str, destination: &Path) -> Result<()> {
    if !destination.is_dir() {
        return Err(SwcError::PathNotFound {
            path: destination.to_path_buf(),
        }
        .into());
    }

    info!("Cloning repository {} to {}", url, destination.display());
    let pb = spinner(format!("Cloning {url}"));

    let mut child = Command::new("git")
        .args(["clone", "--verbose", url])
        .current_dir(destination)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("Failed to execute git clone")?;

    let stdout = child.stdout.take().map(|s| tokio::spawn(relay_lines(s, pb.clone())));
    let stderr = child.stderr.take().map(|s| tokio::spawn(relay_lines(s, pb.clone())));

    let status = child.wait().await.context("Failed to wait for git clone")?;
    for relay in [stdout, stderr].into_iter().flatten() {
        let _ = relay.await;
    }
    pb.finish_and_clear();

    if !status.success() {
        return Err(SwcError::subprocess(
            format!("git clone --verbose {url}"),
            format!("Git clone failed with exit code {}", status.code().unwrap_or(-1)),
        )
        .into());
    }

    Ok(())
}

/// Clone every repository of the environment into its root, one at a time
pub async fn clone_all(config: &EnvironmentConfig) -> Result<CloneReport> {
    let repos = repositories_to_clone(config);
    if repos.is_empty() {
        return Err(SwcError::NoRepositoriesFound { path: config.root() }.into());
    }

    let destination = config.root();
    crate::utils::fs::ensure_directory_exists(&destination).await?;

    let mut report = CloneReport::default();
    for repo in repos {
        let url = clone_url(config, &repo);
        match clone_repository(&url, &destination).await {
            Ok(()) => report.cloned.push(repo),
            Err(e) => {
                error!("Error cloning repository {}: {:#}", repo, e);
                report.failed.push(repo);
            }
        }
    }

    Ok(report)
}
