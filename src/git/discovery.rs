use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, error};
use walkdir::WalkDir;

use crate::environment::ExportedRepository;

/// A repository and the branch currently checked out in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryBranch {
    pub name: String,
    pub branch: String,
}

/// Result of scanning an environment root
#[derive(Debug, Clone, Default)]
pub struct RepositoryListing {
    pub root: PathBuf,
    pub entries: Vec<RepositoryBranch>,
    /// The root is itself a repository; no children were scanned
    pub is_single_repo: bool,
}

impl From<RepositoryBranch> for ExportedRepository {
    fn from(repo: RepositoryBranch) -> Self {
        ExportedRepository {
            name: repo.name,
            branch: repo.branch,
        }
    }
}

/// A directory qualifies as a repository iff it contains a `.git` entry
pub fn is_git_repository<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    path.is_dir() && path.join(".git").exists()
}

/// Get the repository name from a path
pub fn get_repository_name<P: AsRef<Path>>(path: P) -> Option<String> {
    path.as_ref()
        .file_name()
        .and_then(|name| name.to_str())
        .map(|s| s.to_string())
}

/// Immediate children of `root`, sorted by name. Files are included; callers
/// decide what qualifies.
pub fn child_entries(root: &Path) -> Vec<(String, PathBuf)> {
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            Some((name, entry.into_path()))
        })
        .collect()
}

/// `git rev-parse --abbrev-ref HEAD` in `repo_path`
pub async fn read_current_branch<P: AsRef<Path>>(repo_path: P) -> Result<String> {
    super::execute_git_command(repo_path, &["rev-parse", "--abbrev-ref", "HEAD"]).await
}

/// List the repositories under `root_dir` with their current branch.
///
/// If `root_dir` is itself a repository it is the only entry. Otherwise every
/// immediate child directory holding `.git` is read; a repository whose
/// branch cannot be read is logged and left out.
pub async fn list_repositories(root_dir: &str) -> Result<RepositoryListing> {
    let root = crate::utils::fs::resolve_existing_dir(root_dir)?;
    debug!("Listing repositories in {}", root.display());

    let (candidates, is_single_repo) = if is_git_repository(&root) {
        let name = get_repository_name(&root).unwrap_or_default();
        (vec![(name, root.clone())], true)
    } else {
        let children = child_entries(&root)
            .into_iter()
            .filter(|(_, path)| is_git_repository(path))
            .collect();
        (children, false)
    };

    let mut entries = Vec::with_capacity(candidates.len());
    for (name, path) in candidates {
        match read_current_branch(&path).await {
            Ok(branch) => entries.push(RepositoryBranch { name, branch }),
            Err(e) => error!("Error processing repository {}: {:#}", name, e),
        }
    }

    Ok(RepositoryListing {
        root,
        entries,
        is_single_repo,
    })
}
