use anyhow::Result;
use console::style;
use inquire::{Confirm, InquireError, Select, Text};
use std::path::Path;

use crate::custom;
use crate::environment::setup::{create_environment, SetupAnswers};
use crate::environment::{BaseField, ConfigStore};
use crate::git::{clone_all, clone_repository, clone_url};
use crate::ui::display::{
    format_path, print_error, print_info, print_name_table, print_success, print_warning,
};
use crate::utils::fs::{absolutize, ensure_directory_exists};
use crate::display_println;

/// Handle prompt results to distinguish between ESC key navigation and fatal errors
/// Returns:
/// - Ok(Some(value)) for successful prompts
/// - Ok(None) for ESC key cancellation
/// - Err(error) for other fatal errors
pub(crate) fn handle_prompt_result<T>(result: Result<T, InquireError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => Ok(None),
        Err(error) => Err(anyhow::Error::from(error)),
    }
}

fn home_dir_string() -> String {
    dirs::home_dir()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Ask for customer, branches and location, then write a new environment
/// config into the store and offer to clone its repositories.
pub async fn create_environment_wizard(store: &ConfigStore, customer: Option<&str>) -> Result<()> {
    let defaults = SetupAnswers::with_defaults(customer.unwrap_or("undefined"));

    let Some(customer) = handle_prompt_result(
        Text::new("Enter the customer name")
            .with_default(&defaults.customer)
            .prompt(),
    )?
    else {
        return Ok(());
    };
    let Some(current_branch) = handle_prompt_result(
        Text::new("Enter the branch to pull from")
            .with_default(&defaults.current_branch)
            .prompt(),
    )?
    else {
        return Ok(());
    };
    let Some(default_branch) = handle_prompt_result(
        Text::new("Enter the default branch to pull from, in case of a fallback")
            .with_default(&defaults.default_branch)
            .prompt(),
    )?
    else {
        return Ok(());
    };
    let Some(location) = handle_prompt_result(
        Text::new("Enter the path to where to clone the repositories")
            .with_default(&defaults.location)
            .prompt(),
    )?
    else {
        return Ok(());
    };

    let answers = SetupAnswers {
        customer,
        current_branch,
        default_branch,
        location,
    };

    let base = store.load_base().await?;
    let (config, file_name) = match create_environment(&base, &answers) {
        Ok(created) => created,
        Err(e) => {
            print_error(&e.to_string());
            return Ok(());
        }
    };

    ensure_directory_exists(config.root()).await?;
    let saved = store.save(&file_name, &config).await?;
    print_success(&format!(
        "Environment saved to {}",
        format_path(&saved.display().to_string())
    ));

    ask_for_clone(store, &file_name).await
}

/// Offer to clone every repository of the environment in `file_name`
pub async fn ask_for_clone(store: &ConfigStore, file_name: &str) -> Result<()> {
    let message = format!(
        "Do you want to git clone the repositories? Please take a look at the config file before proceeding:\n {}\n",
        store.path_of(file_name).display()
    );
    let Some(answer) =
        handle_prompt_result(Select::new(&message, vec!["Yes", "Later"]).prompt())?
    else {
        return Ok(());
    };
    if answer != "Yes" {
        return Ok(());
    }

    let config = store.load(file_name).await?;
    display_println!(
        "{} Username {}, GitVCS: {}",
        style("This is your config:").bold(),
        style(&config.username).cyan(),
        style(config.git_vcs.as_str()).cyan()
    );

    match clone_all(&config).await {
        Ok(report) => {
            if !report.cloned.is_empty() {
                print_success(&format!(
                    "Repositories cloned successfully to {}",
                    config.path
                ));
            }
            if !report.failed.is_empty() {
                print_info("The following repositories could not be cloned");
                print_name_table(&report.failed);
            }
        }
        Err(e) => print_error(&e.to_string()),
    }

    Ok(())
}

/// Pick one of the store configs whose name contains `customer`
pub async fn choose_config_file(store: &ConfigStore, customer: &str) -> Result<Option<String>> {
    let names = store.find_configs(customer).await?;
    if names.is_empty() {
        print_error("No config file found");
        return Ok(None);
    }

    handle_prompt_result(
        Select::new(
            "Please choose which customer based on the following found configs.",
            names,
        )
        .prompt(),
    )
}

/// Open the environment directory of a customer in the file manager
pub async fn open_project_directory(store: &ConfigStore, customer: &str) -> Result<()> {
    let Some(file_name) = choose_config_file(store, customer).await? else {
        return Ok(());
    };
    let config = store.load(&file_name).await?;
    let root = crate::utils::fs::resolve_existing_dir(config.root_dir()?)?;
    crate::utils::platform::open_directory(&root)
}

/// Clone a single repository chosen at the prompt, using the base config for
/// the hosting account. The destination becomes the base config's `path`.
pub async fn interactive_clone(store: &ConfigStore) -> Result<()> {
    let Some(repository) =
        handle_prompt_result(Text::new("Enter the repository name").prompt())?
    else {
        return Ok(());
    };
    let repository = repository.trim().to_string();
    if repository.is_empty() {
        print_error("Repository name is required");
        return Ok(());
    }

    let Some(destination) = handle_prompt_result(
        Text::new("Enter the destination directory")
            .with_default(&home_dir_string())
            .prompt(),
    )?
    else {
        return Ok(());
    };

    let cwd = std::env::current_dir()?;
    let destination = absolutize(destination.trim(), &cwd);
    ensure_directory_exists(&destination).await?;

    let base = store.load_base().await?;
    let url = clone_url(&base, &repository);
    store
        .update_field(BaseField::Path, &destination.to_string_lossy())
        .await?;

    clone_and_report(&url, &destination).await;
    Ok(())
}

async fn clone_and_report(url: &str, destination: &Path) {
    match clone_repository(url, destination).await {
        Ok(()) => print_success(&format!(
            "Repository cloned successfully to {}",
            destination.display()
        )),
        Err(e) => print_error(&format!("Error cloning repository: {e:#}")),
    }
}

/// Prompt for a new custom command and append it to the base config
pub async fn add_custom_command(store: &ConfigStore) -> Result<()> {
    let Some(command) = handle_prompt_result(Text::new("Enter the command").prompt())? else {
        return Ok(());
    };
    let Some(alias) = handle_prompt_result(Text::new("Enter the alias").prompt())? else {
        return Ok(());
    };
    let Some(description) =
        handle_prompt_result(Text::new("Enter the description").prompt())?
    else {
        return Ok(());
    };

    let mut base = store.load_base().await?;
    if let Err(e) = custom::add_command(&mut base, &command, &alias, &description) {
        print_error(&e.to_string());
        return Ok(());
    }
    store
        .save(crate::environment::constants::BASE_CONFIG_FILE, &base)
        .await?;
    print_success(&format!("Command '{}' added", alias.trim()));
    Ok(())
}

/// Ask before wiping the config store
pub fn confirm_reset(store: &ConfigStore) -> Result<bool> {
    print_warning(&format!(
        "This moves every config in {} to a backup directory",
        store.dir().display()
    ));
    Ok(handle_prompt_result(
        Confirm::new("Reset the CLI to its defaults?")
            .with_default(false)
            .prompt(),
    )?
    .unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_is_navigation_not_error() {
        let result: Result<Option<String>> =
            handle_prompt_result(Err(InquireError::OperationCanceled));
        assert!(matches!(result, Ok(None)));

        let result = handle_prompt_result(Ok(3));
        assert_eq!(result.unwrap(), Some(3));

        let result: Result<Option<String>> =
            handle_prompt_result(Err(InquireError::NotTTY));
        assert!(result.is_err());
    }
}
