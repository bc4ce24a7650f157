//! Git plumbing: every call runs `git` as a subprocess with an explicit
//! working directory, never by changing the process-wide one.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::process::Command as AsyncCommand;
use tracing::debug;

use crate::error::SwcError;

pub mod branches;
pub mod clone;
pub mod discovery;

pub use branches::switch_branches;
pub use clone::{clone_all, clone_repository, clone_url, repositories_to_clone, CloneReport};
pub use discovery::{list_repositories, read_current_branch, RepositoryBranch, RepositoryListing};

/// Execute a git command in the specified repository, returning trimmed stdout
pub async fn execute_git_command<P: AsRef<Path>>(repo_path: P, args: &[&str]) -> Result<String> {
    let repo_path = repo_path.as_ref();
    let rendered = format!("git {}", args.join(" "));

    debug!("Executing git command in {}: {}", repo_path.display(), rendered);

    let output = AsyncCommand::new("git")
        .args(args)
        .current_dir(repo_path)
        .output()
        .await
        .with_context(|| format!("Failed to execute git command: {rendered}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SwcError::subprocess(
            rendered,
            format!(
                "exit code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            ),
        )
        .into());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.trim().to_string())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;
    use std::process::Command;

    fn git(path: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(path)
            .output()
            .expect("git runs");
        assert!(
            status.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&status.stderr)
        );
    }

    /// Initialise a repository at `path` with one commit on `branch`
    pub fn init_repo(path: &Path, branch: &str) {
        std::fs::create_dir_all(path).unwrap();
        git(path, &["init", "-q"]);
        git(path, &["config", "user.name", "Test User"]);
        git(path, &["config", "user.email", "test@example.com"]);
        let head = format!("refs/heads/{branch}");
        git(path, &["symbolic-ref", "HEAD", &head]);
        git(path, &["commit", "-q", "--allow-empty", "-m", "Initial commit"]);
    }

    /// Create `branch` at HEAD without switching to it
    pub fn create_branch(path: &Path, branch: &str) {
        git(path, &["branch", branch]);
    }
}
