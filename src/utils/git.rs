use anyhow::Result;
use std::process::Command;

use crate::error::SwcError;

/// Check if git is available on the system
pub fn is_git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Get git version string, failing with `GitNotInstalled` when git is absent
pub fn get_git_version() -> Result<String> {
    let output = Command::new("git")
        .arg("--version")
        .output()
        .map_err(|_| SwcError::GitNotInstalled)?;

    if !output.status.success() {
        return Err(SwcError::GitNotInstalled.into());
    }

    let version = String::from_utf8_lossy(&output.stdout);
    Ok(version.trim().to_string())
}

/// Version of an auxiliary build tool (`node -v`, `npm -v`, `mvn -v`), or
/// `None` when it is not installed.
pub fn get_tool_version(binary: &str, version_flag: &str) -> Option<String> {
    let output = Command::new(binary).arg(version_flag).output().ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let first_line = stdout.lines().next()?.trim();
    if first_line.is_empty() {
        None
    } else {
        Some(first_line.to_string())
    }
}
