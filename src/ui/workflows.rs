//! Customer menu behind `swc setup -c <customer>`

use anyhow::Result;
use inquire::{Select, Text};

use crate::apps::{install_deps, run_apps, AppKind, AppSelection, BatchOptions, BatchReport};
use crate::environment::{
    checkout_exported, export_with_branches, ConfigStore, EnvironmentConfig, ExportReport,
};
use crate::git::switch_branches;
use crate::ui::display::{
    format_branch, print_batch_report, print_error, print_info, print_name_table,
    print_success,
};
use crate::ui::prompts::{ask_for_clone, choose_config_file, create_environment_wizard, handle_prompt_result};
use crate::utils::signal::ctrl_c;

const NO_BRANCH_SPECIFIED: &str = "(no branch specified)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CustomerAction {
    CreateEnvironment,
    Clone,
    Checkout,
    RunFrontend,
    RunBackend,
    RunAll,
    BuildBackend,
    InstallFrontend,
    Export,
    CheckoutExported,
}

fn menu_entries(config: &EnvironmentConfig) -> Vec<(String, CustomerAction)> {
    let branch = if config.current_branch.trim().is_empty() {
        NO_BRANCH_SPECIFIED
    } else {
        config.current_branch.as_str()
    };

    let mut entries = vec![
        ("Create a new environment".to_string(), CustomerAction::CreateEnvironment),
        (format!("Clone repos to {}", config.path), CustomerAction::Clone),
        (format!("Checkout repositories to {branch}"), CustomerAction::Checkout),
        ("Run frontend apps".to_string(), CustomerAction::RunFrontend),
        ("Run backend apps".to_string(), CustomerAction::RunBackend),
        ("Run both backend and frontend".to_string(), CustomerAction::RunAll),
        ("Build backend apis".to_string(), CustomerAction::BuildBackend),
        ("Install frontend dependencies".to_string(), CustomerAction::InstallFrontend),
        (
            "Export repos with branches to the config file".to_string(),
            CustomerAction::Export,
        ),
    ];

    if !config.exported().is_empty() {
        entries.push((
            "Checkout branches according to the exported config".to_string(),
            CustomerAction::CheckoutExported,
        ));
    }

    entries
}

/// Pick a config for `customer`, then one action to perform on it
pub async fn choose_customer(store: &ConfigStore, customer: &str) -> Result<()> {
    let Some(file_name) = choose_config_file(store, customer).await? else {
        return Ok(());
    };
    let mut config = store.load(&file_name).await?;

    let entries = menu_entries(&config);
    let labels: Vec<String> = entries.iter().map(|(label, _)| label.clone()).collect();
    let Some(choice) =
        handle_prompt_result(Select::new("What do you want to do?", labels).prompt())?
    else {
        return Ok(());
    };
    let Some(action) = entries
        .into_iter()
        .find(|(label, _)| *label == choice)
        .map(|(_, action)| action)
    else {
        return Ok(());
    };

    match action {
        CustomerAction::CreateEnvironment => create_environment_wizard(store, Some(customer)).await,
        CustomerAction::Clone => ask_for_clone(store, &file_name).await,
        CustomerAction::Checkout => checkout_current_branch(&config).await,
        CustomerAction::RunFrontend => run(&config, AppSelection::Frontend).await,
        CustomerAction::RunBackend => run(&config, AppSelection::Backend).await,
        CustomerAction::RunAll => run(&config, AppSelection::All).await,
        CustomerAction::BuildBackend => install(&config, AppKind::Backend).await,
        CustomerAction::InstallFrontend => install(&config, AppKind::Frontend).await,
        CustomerAction::Export => export(store, &file_name, &mut config).await,
        CustomerAction::CheckoutExported => checkout_snapshot(&config).await,
    }
}

/// Switch every repository to `currentBranch`, then walk the operator
/// through retrying the ones that did not switch.
pub async fn checkout_current_branch(config: &EnvironmentConfig) -> Result<()> {
    let branch = config.current_branch.trim();
    if branch.is_empty() {
        print_error("No branch specified in the config file");
        return Ok(());
    }

    let failed = match switch_branches(&config.path, branch, None).await {
        Ok(failed) => failed,
        Err(e) => {
            print_error(&e.to_string());
            return Ok(());
        }
    };

    if failed.is_empty() {
        print_success(&format!("Every repository is on {}", format_branch(branch)));
        return Ok(());
    }

    print_info(&format!(
        "The following repos have not switched to {}",
        format_branch(branch)
    ));
    print_name_table(&failed);
    recover_failed_checkouts(config, &failed).await
}

async fn recover_failed_checkouts(config: &EnvironmentConfig, failed: &[String]) -> Result<()> {
    let default_branch = config.default_branch.trim();
    let question = format!("Do you want to checkout to the default branch {default_branch}?");

    let Some(answer) = handle_prompt_result(Select::new(&question, vec!["Yes", "No"]).prompt())?
    else {
        return Ok(());
    };

    let target = if answer == "Yes" {
        default_branch.to_string()
    } else {
        let Some(typed) =
            handle_prompt_result(Text::new("Enter the branch name to checkout to").prompt())?
        else {
            return Ok(());
        };
        typed.trim().to_string()
    };

    if target.is_empty() {
        print_error("No branch specified");
        return Ok(());
    }

    match switch_branches(&config.path, &target, Some(failed)).await {
        Ok(remaining) if remaining.is_empty() => {
            print_success(&format!("Remaining repositories switched to {}", format_branch(&target)));
        }
        Ok(remaining) => {
            print_info(&format!(
                "The following repos have not switched to {}. You would rather fix it manually",
                format_branch(&target)
            ));
            print_name_table(&remaining);
        }
        Err(e) => print_error(&e.to_string()),
    }

    Ok(())
}

async fn checkout_snapshot(config: &EnvironmentConfig) -> Result<()> {
    match checkout_exported(config).await {
        Ok(failed) if failed.is_empty() => print_success("Branches restored from the exported config"),
        Ok(failed) => {
            print_info("The following repos did not switch to their exported branch");
            print_name_table(&failed);
        }
        Err(e) => print_error(&e.to_string()),
    }
    Ok(())
}

/// Record the branch of every repository in the config and prune the
/// repository lists, then save the config back to `file_name`
pub async fn export(
    store: &ConfigStore,
    file_name: &str,
    config: &mut EnvironmentConfig,
) -> Result<()> {
    let report = match export_with_branches(config).await {
        Ok(report) => report,
        Err(e) => {
            print_error(&e.to_string());
            return Ok(());
        }
    };

    let saved = store.save(file_name, config).await?;
    report_export(&report);
    print_success(&format!("Exported {} entries to {}", report.exported, saved.display()));
    Ok(())
}

/// One line per repository an export dropped from the configured lists
pub fn removal_notices(report: &ExportReport) -> Vec<String> {
    let back_end = report
        .removed_back_end
        .iter()
        .map(|name| format!("{name} is not found. Removed from backend repositories"));
    let front_end = report
        .removed_front_end
        .iter()
        .map(|name| format!("{name} is not found. Removed from frontend repositories"));
    back_end.chain(front_end).collect()
}

/// Tell the operator what an export changed in their config
pub fn report_export(report: &ExportReport) {
    for notice in removal_notices(report) {
        print_info(&notice);
    }
    if !report.untracked.is_empty() {
        print_info(
            "The following repos were not found in the config file, add them manually to the 'repositories'",
        );
        print_name_table(&report.untracked);
    }
}

async fn run(config: &EnvironmentConfig, selection: AppSelection) -> Result<()> {
    let result = run_apps(config, selection, BatchOptions::run(), ctrl_c()).await;
    finish_batch(result, "start");
    Ok(())
}

async fn install(config: &EnvironmentConfig, kind: AppKind) -> Result<()> {
    let result = install_deps(config, kind, BatchOptions::install(), ctrl_c()).await;
    finish_batch(result, "install");
    Ok(())
}

fn finish_batch(result: Result<BatchReport>, verb: &str) {
    match result {
        Ok(report) => print_batch_report(&report, verb),
        Err(e) => print_error(&e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::ExportedRepository;

    #[test]
    fn test_removal_notices_name_every_pruned_repository() {
        let report = ExportReport {
            exported: 2,
            removed_back_end: vec!["ledger".to_string()],
            removed_front_end: vec!["admin".to_string(), "legacy-ui".to_string()],
            ..ExportReport::default()
        };

        assert_eq!(
            removal_notices(&report),
            vec![
                "ledger is not found. Removed from backend repositories",
                "admin is not found. Removed from frontend repositories",
                "legacy-ui is not found. Removed from frontend repositories",
            ]
        );
        assert!(removal_notices(&ExportReport::default()).is_empty());
    }

    #[test]
    fn test_menu_hides_snapshot_checkout_without_export() {
        let mut config = EnvironmentConfig::base_template();
        config.path = "/work".to_string();

        let entries = menu_entries(&config);
        assert!(entries
            .iter()
            .all(|(_, action)| *action != CustomerAction::CheckoutExported));
        assert!(entries[2].0.contains(NO_BRANCH_SPECIFIED));

        config.current_branch = "develop".to_string();
        config.exported = Some(vec![ExportedRepository {
            name: "api".to_string(),
            branch: "develop".to_string(),
        }]);
        let entries = menu_entries(&config);
        assert_eq!(entries.last().unwrap().1, CustomerAction::CheckoutExported);
        assert_eq!(entries[2].0, "Checkout repositories to develop");
    }
}
