use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use std::path::PathBuf;
use std::time::Duration;

use setupwiz::apps::{install_deps, run_apps, AppKind, AppSelection, BatchOptions};
use setupwiz::environment::{
    checkout_exported, export_with_branches, BaseField, ConfigStore, ImportOutcome,
};
use setupwiz::git::{clone_all, list_repositories, switch_branches};
use setupwiz::ui::{display, prompts, workflows};
use setupwiz::utils::{git as git_utils, signal::ctrl_c};
use setupwiz::{custom, display_eprintln, display_println, output, process};

const LICENSE_URL: &str = "https://github.com/abderox/SetupWiz-CLI/blob/master/LICENSE";

#[derive(Parser)]
#[command(name = "swc")]
#[command(
    about = "Set up customer environments, sync branches across repositories and run app fleets",
    long_about = "SetupWiz clones the repositories of a customer project, keeps their\n\
                  branches in sync and starts or builds every app in one go.\n\n\
                  EXAMPLES:\n  \
                  swc setup                  Create a new environment\n  \
                  swc setup -c ACME          Work on an existing customer\n  \
                  swc gc -l ~/work/acme      List repositories and their branch\n  \
                  swc ct -e <alias>          Run a custom command\n  \
                  swc p -k 8080              Kill whatever listens on port 8080"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress user-facing output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Directory holding the config files
    #[arg(long, global = true, env = "SWC_RESOURCES_DIR")]
    resources: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone a single repository
    Clone,

    /// Set up the environment for a customer project
    Setup {
        /// Work on an existing customer, like ACME
        #[arg(short = 'c', long = "choose", value_name = "CUSTOMER")]
        choose: Option<String>,

        /// Open the project directory of an existing customer
        #[arg(short, long, value_name = "CUSTOMER")]
        open: Option<String>,

        /// Import a configuration file into the CLI resources
        #[arg(short, long = "import", value_name = "PATH")]
        import: Option<PathBuf>,
    },

    /// Update the base config file
    Gc {
        /// Set the git username
        #[arg(short, long)]
        username: Option<String>,

        /// Set the Bitbucket project, like "company-project"
        #[arg(short, long)]
        project: Option<String>,

        /// Switch between bitbucket and github
        #[arg(short = 'v', long = "vcs")]
        vcs: bool,

        /// List repositories under a path with their active branch
        #[arg(short, long, value_name = "PATH")]
        list: Option<String>,
    },

    /// Custom commands
    Ct {
        /// List all custom commands
        #[arg(short, long)]
        list: bool,

        /// Add a new custom command
        #[arg(short, long)]
        add: bool,

        /// Execute the command with this alias
        #[arg(short, long, value_name = "ALIAS")]
        exec: Option<String>,
    },

    /// Find or kill processes by port
    P {
        /// Kill processes listening on this port
        #[arg(short = 'k', long = "port", value_name = "PORT")]
        kill: Option<u16>,

        /// Find processes listening on this port
        #[arg(short, long, value_name = "PORT")]
        search: Option<u16>,
    },

    /// Show the project license
    License,

    /// Reset the CLI to its defaults, moving every added config to a backup
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Non-interactive actions on a stored environment config
    Env {
        #[command(subcommand)]
        command: EnvCommands,
    },
}

#[derive(Subcommand)]
enum EnvCommands {
    /// Check out a branch in every repository (defaults to currentBranch)
    Checkout {
        /// Config file name in the resources directory
        file: String,

        #[arg(short, long)]
        branch: Option<String>,
    },

    /// Restore the branches recorded by the last export
    CheckoutExported { file: String },

    /// Record the branch of every repository in the config
    Export { file: String },

    /// Start the configured apps
    Run {
        file: String,

        #[arg(short, long, value_enum, default_value_t = KindArg::All)]
        kind: KindArg,
    },

    /// Install dependencies of backend or frontend apps, one at a time
    Install {
        file: String,

        #[arg(short, long, value_enum)]
        kind: InstallKindArg,

        /// Kill and fail an install running longer than this
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Clone every repository of the environment
    Clone { file: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Backend,
    Frontend,
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum InstallKindArg {
    Backend,
    Frontend,
}

impl From<KindArg> for AppSelection {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Backend => AppSelection::Backend,
            KindArg::Frontend => AppSelection::Frontend,
            KindArg::All => AppSelection::All,
        }
    }
}

impl From<InstallKindArg> for AppKind {
    fn from(kind: InstallKindArg) -> Self {
        match kind {
            InstallKindArg::Backend => AppKind::Backend,
            InstallKindArg::Frontend => AppKind::Frontend,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let output_mode = if cli.quiet {
        output::OutputMode::Quiet
    } else {
        output::OutputMode::Cli
    };
    output::init_with_verbosity(output_mode, cli.verbose);

    match git_utils::get_git_version() {
        Ok(version) => tracing::debug!("{}", version),
        Err(e) => {
            display_eprintln!("{} {}", style("❌").red(), e);
            std::process::exit(1);
        }
    }

    if cli.verbose {
        for (tool, flag) in [("node", "-v"), ("npm", "-v"), ("mvn", "-v")] {
            match git_utils::get_tool_version(tool, flag) {
                Some(version) => tracing::debug!("{} version: {}", tool, version),
                None => tracing::debug!("{} is not installed", tool),
            }
        }
    }

    let store = ConfigStore::resolve(cli.resources);
    store.ensure_base_config().await?;

    match cli.command {
        Commands::Clone => prompts::interactive_clone(&store).await?,

        Commands::Setup {
            choose,
            open,
            import,
        } => {
            if let Some(customer) = choose {
                workflows::choose_customer(&store, &customer).await?;
            } else if let Some(customer) = open {
                prompts::open_project_directory(&store, &customer).await?;
            } else if let Some(src) = import {
                match store.import(&src).await? {
                    ImportOutcome::Imported(path) => display::print_success(&format!(
                        "Imported to {}",
                        display::format_path(&path.display().to_string())
                    )),
                    ImportOutcome::AlreadyPresent(path) => display::print_warning(&format!(
                        "{} already exists, left untouched",
                        path.display()
                    )),
                }
            } else {
                prompts::create_environment_wizard(&store, None).await?;
            }
        }

        Commands::Gc {
            username,
            project,
            vcs,
            list,
        } => {
            if username.is_none() && project.is_none() && !vcs && list.is_none() {
                display::print_error(
                    "Please provide a valid argument! or use --help to see options",
                );
                return Ok(());
            }
            if let Some(username) = username {
                store.update_field(BaseField::Username, &username).await?;
                display::print_success(&format!("username set to {username}"));
            }
            if let Some(project) = project {
                store
                    .update_field(BaseField::BitbucketProject, &project)
                    .await?;
                display::print_success(&format!("bitbucketProject set to {project}"));
            }
            if vcs {
                let now = store.toggle_vcs().await?;
                display::print_success(&format!("Switched to {}", now.as_str()));
            }
            if let Some(path) = list {
                display::print_info("Listing repositories along with the active branch:");
                let listing = list_repositories(&path).await?;
                display::print_repository_table(&listing.entries);
            }
        }

        Commands::Ct { list, add, exec } => {
            if !list && !add && exec.is_none() {
                display::print_error(
                    "Please provide a valid argument! or use --help to see options",
                );
                return Ok(());
            }
            if list {
                let base = store.load_base().await?;
                let commands = custom::list_commands(&base)?;
                if commands.is_empty() {
                    display::print_info("No custom commands yet, add one with `swc ct -a`");
                } else {
                    display::print_custom_commands(commands);
                }
            }
            if add {
                prompts::add_custom_command(&store).await?;
            }
            if let Some(alias) = exec {
                let base = store.load_base().await?;
                custom::execute_command(&alias, &base).await?;
            }
        }

        Commands::P { kill, search } => {
            if kill.is_none() && search.is_none() {
                display::print_error(
                    "Please provide a valid argument! or use --help to see options",
                );
                return Ok(());
            }
            if let Some(port) = kill {
                let report = process::kill_port(port).await?;
                if report.killed.is_empty() && report.failed.is_empty() {
                    display::print_info(&format!("No process found on port {port}"));
                }
                for pid in &report.killed {
                    display::print_success(&format!("Process with PID {pid} has been killed"));
                }
                for pid in &report.failed {
                    display::print_error(&format!("Failed to kill process {pid}"));
                }
            }
            if let Some(port) = search {
                let pids = process::find_pids(port).await?;
                if pids.is_empty() {
                    display::print_info(&format!("No process found on port {port}"));
                } else {
                    display::print_info(&format!("Processes listening on port {port}:"));
                    display::print_name_table(&pids);
                }
            }
        }

        Commands::License => {
            display_println!("{}", LICENSE_URL);
        }

        Commands::Reset { force } => {
            if force || prompts::confirm_reset(&store)? {
                match store.reset().await? {
                    Some(backup) => display::print_success(&format!(
                        "CLI reset. Previous configs moved to {}",
                        backup.display()
                    )),
                    None => display::print_success("CLI reset"),
                }
            }
        }

        Commands::Env { command } => run_env_command(&store, command).await?,
    }

    Ok(())
}

async fn run_env_command(store: &ConfigStore, command: EnvCommands) -> Result<()> {
    match command {
        EnvCommands::Checkout { file, branch } => {
            let config = store.load(&file).await?;
            let branch = branch.unwrap_or_else(|| config.current_branch.clone());
            if branch.trim().is_empty() {
                display::print_error("No branch specified in the config file");
                return Ok(());
            }
            let failed = switch_branches(&config.path, branch.trim(), None).await?;
            report_failures(&failed, &format!("have not switched to {}", branch.trim()));
        }

        EnvCommands::CheckoutExported { file } => {
            let config = store.load(&file).await?;
            let failed = checkout_exported(&config).await?;
            report_failures(&failed, "did not switch to their exported branch");
        }

        EnvCommands::Export { file } => {
            let mut config = store.load(&file).await?;
            let report = export_with_branches(&mut config).await?;
            store.save(&file, &config).await?;
            workflows::report_export(&report);
            display::print_success(&format!("Exported {} entries", report.exported));
        }

        EnvCommands::Run { file, kind } => {
            let config = store.load(&file).await?;
            let report = run_apps(&config, kind.into(), BatchOptions::run(), ctrl_c()).await?;
            display::print_batch_report(&report, "start");
        }

        EnvCommands::Install {
            file,
            kind,
            timeout_secs,
        } => {
            let config = store.load(&file).await?;
            let mut options = BatchOptions::install();
            if let Some(secs) = timeout_secs {
                options = options.with_timeout(Duration::from_secs(secs));
            }
            let report = install_deps(&config, kind.into(), options, ctrl_c()).await?;
            display::print_batch_report(&report, "install");
        }

        EnvCommands::Clone { file } => {
            let config = store.load(&file).await?;
            let report = clone_all(&config).await?;
            if !report.cloned.is_empty() {
                display::print_success(&format!("Cloned: {}", report.cloned.join(", ")));
            }
            report_failures(&report.failed, "could not be cloned");
        }
    }

    Ok(())
}

fn report_failures(failed: &[String], what: &str) {
    if failed.is_empty() {
        display::print_success("Done");
    } else {
        display::print_info(&format!("The following repositories {what}"));
        display::print_name_table(failed);
    }
}
