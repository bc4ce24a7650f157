use anyhow::Result;
use tracing::{error, info};

use super::config::{EnvironmentConfig, ExportedRepository};
use crate::error::SwcError;
use crate::git::discovery::is_git_repository;
use crate::git::{list_repositories, switch_branches};

/// What an export changed in the config and what it noticed on disk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub single_repo: bool,
    pub exported: usize,
    /// Configured backend repositories not found on disk, now removed
    pub removed_back_end: Vec<String>,
    /// Configured frontend repositories not found on disk, now removed
    pub removed_front_end: Vec<String>,
    /// Repositories on disk that neither list mentions
    pub untracked: Vec<String>,
}

/// Bring the repository lists in line with the `exported` snapshot.
///
/// Names missing from the snapshot are dropped from `backEnd`/`frontEnd`;
/// snapshot entries that neither list mentions are reported, not added.
pub fn reconcile(config: &mut EnvironmentConfig) -> ExportReport {
    let exported: Vec<String> = config
        .exported()
        .iter()
        .map(|entry| entry.name.clone())
        .collect();
    let on_disk = |name: &String| exported.iter().any(|e| e == name);

    let mut report = ExportReport {
        exported: exported.len(),
        ..ExportReport::default()
    };

    let (kept, removed): (Vec<_>, Vec<_>) = config
        .repositories
        .back_end
        .drain(..)
        .partition(|name| on_disk(name));
    config.repositories.back_end = kept;
    report.removed_back_end = removed;

    let (kept, removed): (Vec<_>, Vec<_>) = config
        .repositories
        .front_end
        .drain(..)
        .partition(|name| on_disk(name));
    config.repositories.front_end = kept;
    report.removed_front_end = removed;

    let lists = &config.repositories;
    report.untracked = exported
        .iter()
        .filter(|name| !lists.back_end.contains(name) && !lists.front_end.contains(name))
        .cloned()
        .collect();

    for name in &report.removed_back_end {
        info!("{} is not found. Removed from backend repositories", name);
    }
    for name in &report.removed_front_end {
        info!("{} is not found. Removed from frontend repositories", name);
    }

    report
}

/// Snapshot the branch of every repository under the environment root into
/// `exported`, then reconcile the repository lists against it.
///
/// Only the in-memory config changes; the caller persists it.
pub async fn export_with_branches(config: &mut EnvironmentConfig) -> Result<ExportReport> {
    let listing = list_repositories(config.root_dir()?).await?;

    if listing.is_single_repo {
        let entry = listing
            .entries
            .into_iter()
            .next()
            .ok_or(SwcError::NoRepositoriesFound {
                path: listing.root,
            })?;

        // The root is the project itself; a per-repository name means nothing
        config.exported = Some(vec![ExportedRepository {
            name: String::new(),
            branch: entry.branch,
        }]);

        return Ok(ExportReport {
            single_repo: true,
            exported: 1,
            ..ExportReport::default()
        });
    }

    config.exported = Some(listing.entries.into_iter().map(Into::into).collect());
    Ok(reconcile(config))
}

/// Check every exported repository back out to its recorded branch.
///
/// Returns the repositories that did not switch. An entry with an empty name
/// refers to the environment root itself.
pub async fn checkout_exported(config: &EnvironmentConfig) -> Result<Vec<String>> {
    let root = config.root_dir()?;
    let exported = match &config.exported {
        Some(exported) if !exported.is_empty() => exported,
        _ => {
            return Err(SwcError::NoRepositoriesFound {
                path: config.root(),
            }
            .into())
        }
    };

    let mut failed = Vec::new();
    for ExportedRepository { name, branch } in exported {
        let target = if name.is_empty() {
            config.root()
        } else {
            config.root().join(name)
        };
        let label = if name.is_empty() { root } else { name.as_str() };
        info!("Repo : {} -- Trying to checkout to {}", label, branch);

        // A plain directory would otherwise have its children switched instead
        if target.is_dir() && !is_git_repository(&target) {
            let e = SwcError::NotARepository { path: target };
            error!("Error processing repository {}: {}", label, e);
            failed.push(label.to_string());
            continue;
        }

        match switch_branches(&target.to_string_lossy(), branch, None).await {
            Ok(mut failures) => failed.append(&mut failures),
            Err(e) => {
                error!("Error processing repository {}: {:#}", label, e);
                failed.push(label.to_string());
            }
        }
    }

    Ok(failed)
}
