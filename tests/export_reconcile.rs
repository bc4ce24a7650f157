//! Exporting branches into a config and reconciling its repository lists

mod common;

use anyhow::Result;
use setupwiz::environment::{checkout_exported, export_with_branches, ExportedRepository};
use setupwiz::git::read_current_branch;
use setupwiz::{ConfigStore, EnvironmentConfig};
use tempfile::TempDir;

#[tokio::test]
async fn test_export_prunes_missing_and_reports_untracked() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let work = temp_dir.path().join("work");
    common::init_repo(&work.join("a"), "main").await?;
    common::init_repo(&work.join("b"), "dev").await?;

    let mut config = EnvironmentConfig::base_template();
    config.path = work.to_string_lossy().to_string();
    config.repositories.back_end = vec!["a".to_string(), "c".to_string()];

    let report = export_with_branches(&mut config).await?;

    assert_eq!(
        config.exported(),
        &[
            ExportedRepository {
                name: "a".to_string(),
                branch: "main".to_string()
            },
            ExportedRepository {
                name: "b".to_string(),
                branch: "dev".to_string()
            },
        ]
    );
    assert_eq!(config.repositories.back_end, vec!["a".to_string()]);
    assert_eq!(report.removed_back_end, vec!["c".to_string()]);
    assert_eq!(report.untracked, vec!["b".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_exported_snapshot_survives_the_store_and_restores_branches() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let work = temp_dir.path().join("work");
    let api = work.join("api");
    common::init_repo(&api, "main").await?;
    common::create_branch(&api, "feature").await?;

    let store = ConfigStore::new(temp_dir.path().join("resources"));
    store.ensure_base_config().await?;

    let mut config = store.load_base().await?;
    config.path = work.to_string_lossy().to_string();
    config.repositories.back_end = vec!["api".to_string()];
    export_with_branches(&mut config).await?;
    store.save("acme-main-git-config.json", &config).await?;

    // Move away from the recorded branch, then restore it from disk
    let output = tokio::process::Command::new("git")
        .args(["checkout", "-q", "feature"])
        .current_dir(&api)
        .output()
        .await?;
    assert!(output.status.success());

    let reloaded = store.load("acme-main-git-config.json").await?;
    let failed = checkout_exported(&reloaded).await?;

    assert!(failed.is_empty());
    assert_eq!(read_current_branch(&api).await?, "main");
    Ok(())
}

#[tokio::test]
async fn test_single_repository_root_exports_one_unnamed_entry() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let project = temp_dir.path().join("project");
    common::init_repo(&project, "main").await?;
    common::create_branch(&project, "hotfix").await?;

    let mut config = EnvironmentConfig::base_template();
    config.path = project.to_string_lossy().to_string();
    config.repositories.back_end = vec!["x".to_string()];

    let report = export_with_branches(&mut config).await?;

    assert!(report.single_repo);
    assert_eq!(
        config.exported(),
        &[ExportedRepository {
            name: String::new(),
            branch: "main".to_string()
        }]
    );
    // Reconciliation does not run for a single repository
    assert_eq!(config.repositories.back_end, vec!["x".to_string()]);
    assert!(report.removed_back_end.is_empty());

    let output = tokio::process::Command::new("git")
        .args(["checkout", "-q", "hotfix"])
        .current_dir(&project)
        .output()
        .await?;
    assert!(output.status.success());

    let failed = checkout_exported(&config).await?;
    assert!(failed.is_empty());
    assert_eq!(read_current_branch(&project).await?, "main");
    Ok(())
}
