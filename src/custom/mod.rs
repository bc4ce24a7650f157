//! User-defined shell commands addressed by alias

use anyhow::{Context, Result};
use std::process::Stdio;
use tracing::{info, warn};

use crate::environment::{CustomCommand, EnvironmentConfig};
use crate::error::SwcError;
use crate::utils::platform::shell_command;

/// Custom commands of `config`, empty when none are defined
pub fn list_commands(config: &EnvironmentConfig) -> Result<&[CustomCommand]> {
    if let Some(bad) = config
        .custom
        .commands
        .iter()
        .find(|c| c.command.trim().is_empty() || c.alias.trim().is_empty())
    {
        return Err(SwcError::invalid_config(
            crate::environment::constants::BASE_CONFIG_FILE,
            format!("custom command '{}' needs both an alias and a command", bad.alias),
        )
        .into());
    }
    Ok(&config.custom.commands)
}

/// Append a command. Aliases are not deduplicated: the first entry with a
/// given alias is the one `find_command` returns.
pub fn add_command(
    config: &mut EnvironmentConfig,
    command: &str,
    alias: &str,
    description: &str,
) -> Result<()> {
    let (command, alias, description) = (command.trim(), alias.trim(), description.trim());
    if command.is_empty() || alias.is_empty() || description.is_empty() {
        return Err(SwcError::invalid_config(
            crate::environment::constants::BASE_CONFIG_FILE,
            "Please provide valid arguments!",
        )
        .into());
    }

    if find_command(config, alias).is_some() {
        warn!(
            "Alias '{}' already exists; the earlier command keeps running for it",
            alias
        );
    }

    config.custom.commands.push(CustomCommand {
        command: command.to_string(),
        description: description.to_string(),
        alias: alias.to_string(),
    });
    Ok(())
}

/// First command whose trimmed alias equals the trimmed `alias`
pub fn find_command<'a>(config: &'a EnvironmentConfig, alias: &str) -> Option<&'a CustomCommand> {
    let alias = alias.trim();
    config
        .custom
        .commands
        .iter()
        .find(|c| c.alias.trim() == alias)
}

/// Run the command registered under `alias`, streaming its output
pub async fn execute_command(alias: &str, config: &EnvironmentConfig) -> Result<()> {
    let entry = find_command(config, alias).ok_or_else(|| SwcError::CommandNotFound {
        alias: alias.trim().to_string(),
    })?;

    info!("Executing command : {}", entry.command);
    let status = shell_command(&entry.command)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .with_context(|| format!("Failed to start `{}`", entry.command))?;

    if !status.success() {
        return Err(SwcError::subprocess(
            entry.command.clone(),
            format!("exit code {}", status.code().unwrap_or(-1)),
        )
        .into());
    }

    Ok(())
}
