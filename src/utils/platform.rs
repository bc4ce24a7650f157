use anyhow::{Context, Result};
use std::path::Path;
use tokio::process::Command;

/// Supported operating system platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOS,
    Linux,
    Windows,
    Unknown,
}

impl Platform {
    /// Detect the current platform
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOS
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Unknown
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::MacOS => "macOS",
            Platform::Linux => "Linux",
            Platform::Windows => "Windows",
            Platform::Unknown => "Unknown",
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Windows)
    }
}

/// Build a command that runs `command_line` through the platform shell.
pub fn shell_command(command_line: &str) -> Command {
    if Platform::current().is_windows() {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command_line]);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command_line]);
        cmd
    }
}

/// Start the child in its own process group so the whole tree can be
/// signalled at once. No-op outside unix.
pub fn isolate_process_group(cmd: &mut Command) {
    #[cfg(unix)]
    cmd.process_group(0);
    #[cfg(not(unix))]
    let _ = cmd;
}

/// Forcefully kill `pid` and its descendants
pub async fn terminate_process_tree(pid: u32) -> Result<()> {
    let status = if Platform::current().is_windows() {
        Command::new("taskkill")
            .args(["/F", "/T", "/PID", &pid.to_string()])
            .output()
            .await?
            .status
    } else {
        // Negative pid addresses the process group started by isolate_process_group
        Command::new("kill")
            .args(["-9", "--", &format!("-{pid}")])
            .output()
            .await?
            .status
    };

    if !status.success() {
        anyhow::bail!("could not terminate process tree {pid}");
    }
    Ok(())
}

/// Open a directory in the platform file manager
pub fn open_directory(path: &Path) -> Result<()> {
    let platform = Platform::current();
    let candidates: &[&str] = match platform {
        Platform::MacOS => &["open"],
        Platform::Windows => &["explorer"],
        Platform::Linux => &["xdg-open", "nautilus", "dolphin"],
        Platform::Unknown => anyhow::bail!("Unsupported operating system."),
    };

    let mut last_error = None;
    for opener in candidates {
        match std::process::Command::new(opener).arg(path).spawn() {
            Ok(_) => return Ok(()),
            Err(e) => last_error = Some(e),
        }
    }

    Err(last_error.map(anyhow::Error::from).unwrap_or_else(|| {
        anyhow::anyhow!("No file manager available on {}", platform.display_name())
    }))
    .with_context(|| format!("Unable to open {}", path.display()))
}
