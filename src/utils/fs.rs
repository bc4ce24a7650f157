use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::error::SwcError;

/// Ensure directory exists, creating it if necessary
pub async fn ensure_directory_exists<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if !path.exists() {
        fs::create_dir_all(path)
            .await
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        anyhow::bail!("Path exists but is not a directory: {}", path.display());
    }

    Ok(())
}

/// Expand tilde in path
pub fn expand_tilde<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();

    if let Some(path_str) = path.to_str() {
        if let Some(rest) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }

    path.to_path_buf()
}

/// Turn an operator-supplied directory (`.`, `./x`, `x`, `~/x`) into an
/// absolute path. Leading `./` and `.\` segments are dropped, the rest is
/// joined onto `cwd`.
pub fn absolutize(raw: &str, cwd: &Path) -> PathBuf {
    let trimmed = raw.trim();
    let expanded = expand_tilde(trimmed);

    if expanded.is_absolute() {
        return expanded;
    }

    let mut resolved = cwd.to_path_buf();
    for component in expanded.components() {
        match component {
            Component::CurDir => {}
            other => resolved.push(other.as_os_str()),
        }
    }
    resolved
}

/// Resolve a directory against the process working directory and require it
/// to exist.
pub fn resolve_existing_dir(raw: &str) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let path = absolutize(raw, &cwd);

    if !path.is_dir() {
        return Err(SwcError::PathNotFound { path }.into());
    }

    Ok(path)
}
