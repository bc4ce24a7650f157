use anyhow::{Context, Result};
use std::path::PathBuf;

use super::config::EnvironmentConfig;
use super::constants::{config_file_name, DEFAULT_BRANCH};
use crate::error::SwcError;

/// Answers collected by the setup wizard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupAnswers {
    pub customer: String,
    pub current_branch: String,
    pub default_branch: String,
    pub location: String,
}

impl SetupAnswers {
    pub fn with_defaults(customer: impl Into<String>) -> Self {
        Self {
            customer: customer.into(),
            current_branch: DEFAULT_BRANCH.to_string(),
            default_branch: DEFAULT_BRANCH.to_string(),
            location: dirs::home_dir()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
        }
    }
}

/// Derive a customer environment from the base template.
///
/// Returns the new config and the file name it belongs under in the store.
pub fn create_environment(
    base: &EnvironmentConfig,
    answers: &SetupAnswers,
) -> Result<(EnvironmentConfig, String)> {
    let customer = answers.customer.trim();
    if customer.is_empty() || customer == "undefined" {
        return Err(SwcError::invalid_config(
            PathBuf::from(super::constants::BASE_CONFIG_FILE),
            "Customer name is required",
        )
        .into());
    }

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let location = crate::utils::fs::absolutize(&answers.location, &cwd);

    let mut config = base.clone();
    config.customer = customer.to_string();
    config.current_branch = answers.current_branch.trim().to_string();
    config.default_branch = answers.default_branch.trim().to_string();
    config.path = location.to_string_lossy().to_string();
    // A new environment starts without a snapshot of someone else's disk
    config.exported = None;

    let file_name = config_file_name(customer, &config.current_branch);
    Ok((config, file_name))
}
