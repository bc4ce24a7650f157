//! Find and kill processes listening on a TCP port

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{debug, error};

use crate::utils::platform::Platform;

/// Result of killing the processes bound to a port
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KillReport {
    pub killed: Vec<String>,
    pub failed: Vec<String>,
}

fn push_unique(pids: &mut Vec<String>, pid: &str) {
    if !pid.is_empty() && pid.chars().all(|c| c.is_ascii_digit()) && !pids.iter().any(|p| p == pid)
    {
        pids.push(pid.to_string());
    }
}

/// PIDs from `lsof -i :<port> -t`, which prints one per line
pub fn parse_lsof_pids(stdout: &str) -> Vec<String> {
    let mut pids = Vec::new();
    for line in stdout.lines() {
        push_unique(&mut pids, line.trim());
    }
    pids
}

/// PIDs from `netstat -ano`: lines mentioning `:<port>`, PID in the last column
pub fn parse_netstat_pids(stdout: &str, port: u16) -> Vec<String> {
    let needle = format!(":{port}");
    let mut pids = Vec::new();
    for line in stdout.lines() {
        let mut columns = line.split_whitespace();
        // Only the local address column counts, so `:80` does not match `:8080`
        let local = columns.nth(1).unwrap_or_default();
        if !local.ends_with(&needle) {
            continue;
        }
        if let Some(pid) = line.split_whitespace().last() {
            push_unique(&mut pids, pid);
        }
    }
    pids
}

fn require_port(port: u16) -> Result<()> {
    if port == 0 {
        anyhow::bail!("Port number is required");
    }
    Ok(())
}

/// PIDs of processes bound to `port`
pub async fn find_pids(port: u16) -> Result<Vec<String>> {
    require_port(port)?;

    if Platform::current().is_windows() {
        let output = Command::new("netstat")
            .arg("-ano")
            .output()
            .await
            .context("Failed to run netstat")?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        return Ok(parse_netstat_pids(&stdout, port));
    }

    let output = Command::new("lsof")
        .args(["-i", &format!(":{port}"), "-t"])
        .output()
        .await
        .context("Failed to run lsof")?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    debug!("lsof output for port {}: {:?}", port, stdout);
    lsof_pids(output.status.success(), &stdout, &stderr)
}

/// Interpret an `lsof -t` run. A non-zero exit with nothing on stdout or
/// stderr means no match; PIDs on stdout are kept whatever the exit code.
pub fn lsof_pids(success: bool, stdout: &str, stderr: &str) -> Result<Vec<String>> {
    if !success && stdout.trim().is_empty() && !stderr.trim().is_empty() {
        anyhow::bail!("lsof failed: {}", stderr.trim());
    }
    Ok(parse_lsof_pids(stdout))
}

async fn kill_pid(pid: &str) -> Result<()> {
    let output = if Platform::current().is_windows() {
        Command::new("taskkill")
            .args(["/F", "/PID", pid])
            .output()
            .await?
    } else {
        Command::new("kill").args(["-9", pid]).output().await?
    };

    if !output.status.success() {
        anyhow::bail!("{}", String::from_utf8_lossy(&output.stderr).trim());
    }
    Ok(())
}

/// Kill every process bound to `port`
pub async fn kill_port(port: u16) -> Result<KillReport> {
    let pids = find_pids(port).await?;
    let mut report = KillReport::default();

    for pid in pids {
        match kill_pid(&pid).await {
            Ok(()) => report.killed.push(pid),
            Err(e) => {
                error!("Failed to kill {}: {:#}", pid, e);
                report.failed.push(pid);
            }
        }
    }

    Ok(report)
}
