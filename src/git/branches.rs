use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

use super::discovery::{child_entries, get_repository_name, is_git_repository};
use crate::error::SwcError;

/// Repositories a branch switch applies to, as `(name, path)` pairs.
///
/// A root that is itself a repository is the only target. Otherwise
/// `retry_only` (when non-empty) names the subset to work on instead of
/// re-enumerating the root. Entries that are not repositories are logged and
/// dropped.
pub fn switch_targets(root: &Path, retry_only: Option<&[String]>) -> Vec<(String, PathBuf)> {
    if is_git_repository(root) {
        debug!("{} is a repository itself", root.display());
        let name = get_repository_name(root).unwrap_or_default();
        return vec![(name, root.to_path_buf())];
    }

    let candidates = match retry_only {
        Some(names) if !names.is_empty() => names
            .iter()
            .map(|name| (name.clone(), root.join(name)))
            .collect(),
        _ => child_entries(root),
    };

    candidates
        .into_iter()
        .filter(|(name, path)| {
            let qualifies = is_git_repository(path);
            if !qualifies {
                debug!("** {}/ is not a repository **", name);
            }
            qualifies
        })
        .collect()
}

/// Check out `target_branch` in every repository under `root_dir`.
///
/// Returns the names whose checkout failed; one failure never stops the
/// rest. Fails as a whole only when the root is missing or holds no
/// repository.
pub async fn switch_branches(
    root_dir: &str,
    target_branch: &str,
    retry_only: Option<&[String]>,
) -> Result<Vec<String>> {
    let root = crate::utils::fs::resolve_existing_dir(root_dir)?;
    let targets = switch_targets(&root, retry_only);

    if targets.is_empty() {
        return Err(SwcError::NoRepositoriesFound { path: root }.into());
    }

    let mut failed = Vec::new();
    for (name, path) in targets {
        match super::execute_git_command(&path, &["checkout", target_branch]).await {
            Ok(_) => debug!("{} switched to {}", name, target_branch),
            Err(e) => {
                error!("Error switching branch for repository {}: {:#}", name, e);
                failed.push(name);
            }
        }
    }

    if !failed.is_empty() {
        warn!(
            "{} repositories did not switch to {}",
            failed.len(),
            target_branch
        );
    }

    Ok(failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::discovery::read_current_branch;
    use crate::git::test_support::{create_branch, init_repo};
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        init_repo(&root.join("a"), "main");
        init_repo(&root.join("b"), "dev");
        create_branch(&root.join("a"), "release");
        fs::write(root.join("README.md"), "noise").unwrap();

        let failed = switch_branches(root.to_str().unwrap(), "release", None)
            .await
            .unwrap();

        assert_eq!(failed, vec!["b"]);
        assert_eq!(read_current_branch(root.join("a")).await.unwrap(), "release");
        assert_eq!(read_current_branch(root.join("b")).await.unwrap(), "dev");
    }

    #[tokio::test]
    async fn test_retry_only_touches_subset() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        init_repo(&root.join("a"), "main");
        init_repo(&root.join("b"), "main");
        create_branch(&root.join("a"), "develop");
        create_branch(&root.join("b"), "develop");

        let retry = vec!["b".to_string()];
        let failed = switch_branches(root.to_str().unwrap(), "develop", Some(&retry))
            .await
            .unwrap();

        assert!(failed.is_empty());
        assert_eq!(read_current_branch(root.join("a")).await.unwrap(), "main");
        assert_eq!(read_current_branch(root.join("b")).await.unwrap(), "develop");
    }

    #[tokio::test]
    async fn test_switch_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        init_repo(&root.join("a"), "main");

        for _ in 0..2 {
            let failed = switch_branches(root.to_str().unwrap(), "main", None)
                .await
                .unwrap();
            assert!(failed.is_empty());
        }
    }

    #[tokio::test]
    async fn test_empty_root_is_no_repositories_found() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("not-a-repo")).unwrap();

        let err = switch_branches(temp_dir.path().to_str().unwrap(), "main", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SwcError>(),
            Some(SwcError::NoRepositoriesFound { .. })
        ));
    }

    #[test]
    fn test_single_repository_root_ignores_retry_list() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("project");
        init_repo(&root, "main");

        let retry = vec!["other".to_string()];
        let targets = switch_targets(&root, Some(&retry));
        assert_eq!(targets, vec![("project".to_string(), root.clone())]);
    }
}
