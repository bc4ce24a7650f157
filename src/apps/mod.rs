//! Bulk app runner: start or build every configured app of an environment
//! with per-app failure isolation.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::future::Future;
use std::path::{Path, PathBuf};

use crate::environment::{AppCommands, AppGroup, EnvironmentConfig};
use crate::error::SwcError;

mod registry;
mod runner;

pub use registry::{AppOutcome, ProcessRegistry};
pub use runner::{run_batch, AppFailure, BatchMode, BatchOptions, BatchReport};

static APP_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{\{\s*app\s*\}\}").expect("valid placeholder pattern"));

/// Which half of the environment an app belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppKind {
    Backend,
    Frontend,
}

/// Apps selected for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppSelection {
    Backend,
    Frontend,
    All,
}

/// Start the apps, or install their dependencies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Run,
    Install,
}

impl AppKind {
    pub fn label(&self) -> &'static str {
        match self {
            AppKind::Backend => "backend",
            AppKind::Frontend => "frontend",
        }
    }

    /// Built-in command used when the config names none
    pub fn default_command(&self, purpose: Purpose) -> &'static str {
        match (self, purpose) {
            (AppKind::Backend, Purpose::Run) => "mvn spring-boot:run",
            (AppKind::Backend, Purpose::Install) => "mvn clean install -DskipTests",
            (AppKind::Frontend, Purpose::Run) => "npm start",
            (AppKind::Frontend, Purpose::Install) => "npm install",
        }
    }
}

impl AppSelection {
    pub fn kinds(&self) -> &'static [AppKind] {
        match self {
            AppSelection::Backend => &[AppKind::Backend],
            AppSelection::Frontend => &[AppKind::Frontend],
            AppSelection::All => &[AppKind::Backend, AppKind::Frontend],
        }
    }
}

impl From<AppKind> for AppSelection {
    fn from(kind: AppKind) -> Self {
        match kind {
            AppKind::Backend => AppSelection::Backend,
            AppKind::Frontend => AppSelection::Frontend,
        }
    }
}

/// One subprocess to launch: a shell command run inside an app directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppJob {
    pub name: String,
    pub kind: AppKind,
    pub dir: PathBuf,
    pub command: String,
}

/// Replace `${{app}}` in a command template with the app name, taken literally
pub fn render_command(template: &str, app: &str) -> String {
    APP_PLACEHOLDER
        .replace_all(template, regex::NoExpand(app))
        .into_owned()
}

fn group<'a>(commands: &'a AppCommands, kind: AppKind) -> &'a AppGroup {
    match kind {
        AppKind::Backend => &commands.back_end,
        AppKind::Frontend => &commands.front_end,
    }
}

/// Expand the configured app lists into jobs rooted at `root`, backend apps
/// first. Fails with `NoAppsConfigured` when nothing is selected.
pub fn resolve_jobs(
    config: &EnvironmentConfig,
    root: &Path,
    selection: AppSelection,
    purpose: Purpose,
) -> Result<Vec<AppJob>> {
    let commands = match purpose {
        Purpose::Run => &config.run,
        Purpose::Install => &config.install,
    };

    let mut jobs = Vec::new();
    for &kind in selection.kinds() {
        let group = group(commands, kind);
        let template = group
            .command
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| kind.default_command(purpose));

        jobs.extend(group.apps.iter().map(|app| AppJob {
            name: app.clone(),
            kind,
            dir: root.join(app),
            command: render_command(template, app),
        }));
    }

    if jobs.is_empty() {
        return Err(SwcError::NoAppsConfigured.into());
    }

    Ok(jobs)
}

/// Start the selected apps. Concurrent by default: every app is spawned up
/// front and supervised until it exits or `cancel` resolves.
pub async fn run_apps<F>(
    config: &EnvironmentConfig,
    selection: AppSelection,
    options: BatchOptions,
    cancel: F,
) -> Result<BatchReport>
where
    F: Future<Output = ()>,
{
    let root = crate::utils::fs::resolve_existing_dir(config.root_dir()?)?;
    let jobs = resolve_jobs(config, &root, selection, Purpose::Run)?;
    Ok(run_batch(jobs, options, cancel).await)
}

/// Install dependencies of one kind of app. Sequential by default: each
/// install finishes before the next starts.
pub async fn install_deps<F>(
    config: &EnvironmentConfig,
    kind: AppKind,
    options: BatchOptions,
    cancel: F,
) -> Result<BatchReport>
where
    F: Future<Output = ()>,
{
    let root = crate::utils::fs::resolve_existing_dir(config.root_dir()?)?;
    let jobs = resolve_jobs(config, &root, kind.into(), Purpose::Install)?;
    Ok(run_batch(jobs, options, cancel).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EnvironmentConfig {
        let mut config = EnvironmentConfig::base_template();
        config.run.back_end.apps = vec!["billing".to_string(), "ledger".to_string()];
        config.run.front_end.apps = vec!["portal".to_string()];
        config.run.front_end.command = Some("npm run dev -- --name ${{app}}".to_string());
        config
    }

    #[test]
    fn test_resolve_jobs_all() {
        let jobs = resolve_jobs(&config(), Path::new("/work"), AppSelection::All, Purpose::Run)
            .unwrap();

        let names: Vec<_> = jobs.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["billing", "ledger", "portal"]);
        assert_eq!(jobs[0].command, "mvn spring-boot:run");
        assert_eq!(jobs[0].dir, PathBuf::from("/work/billing"));
        assert_eq!(jobs[2].command, "npm run dev -- --name portal");
        assert_eq!(jobs[2].kind, AppKind::Frontend);
    }

    #[test]
    fn test_resolve_jobs_uses_install_section() {
        let mut config = config();
        config.install.front_end.apps = vec!["portal".to_string()];

        let jobs = resolve_jobs(
            &config,
            Path::new("/work"),
            AppSelection::Frontend,
            Purpose::Install,
        )
        .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].command, "npm install");
    }

    #[test]
    fn test_no_apps_configured() {
        let config = EnvironmentConfig::base_template();
        let err = resolve_jobs(&config, Path::new("/work"), AppSelection::All, Purpose::Run)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SwcError>(),
            Some(SwcError::NoAppsConfigured)
        ));
    }

    #[test]
    fn test_render_command() {
        assert_eq!(render_command("cd ${{ app }} && ls", "svc"), "cd svc && ls");
        assert_eq!(render_command("npm start", "svc"), "npm start");
    }

    #[test]
    fn test_render_command_keeps_dollar_in_app_name() {
        assert_eq!(render_command("cd ${{app}}", "pay$1svc"), "cd pay$1svc");
        assert_eq!(render_command("run ${{app}}", "$name"), "run $name");
    }
}
