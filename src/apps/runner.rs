use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Child;
use tracing::{error, info};

use super::registry::{AppOutcome, ProcessRegistry};
use super::AppJob;
use crate::utils::platform::{isolate_process_group, shell_command};

/// Whether a batch waits for each app before starting the next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    Sequential,
    Concurrent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub mode: BatchMode,
    /// Kill and fail any app still running after this long
    pub timeout: Option<Duration>,
}

impl BatchOptions {
    /// Dev servers: start everything, keep it running side by side
    pub fn run() -> Self {
        Self {
            mode: BatchMode::Concurrent,
            timeout: None,
        }
    }

    /// Dependency installs: one at a time, in list order
    pub fn install() -> Self {
        Self {
            mode: BatchMode::Sequential,
            timeout: None,
        }
    }

    pub fn with_mode(mut self, mode: BatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppFailure {
    pub name: String,
    pub reason: String,
}

/// Per-app results of a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<AppFailure>,
    /// Stopped by cancellation, or never started because of it
    pub cancelled: Vec<String>,
}

impl BatchReport {
    pub fn failed_names(&self) -> Vec<String> {
        self.failed.iter().map(|f| f.name.clone()).collect()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, name: String, outcome: AppOutcome) {
        match outcome {
            AppOutcome::Succeeded => {
                info!("App {} is done", name);
                self.succeeded.push(name);
            }
            AppOutcome::Failed(reason) => {
                error!("App {} failed: {}", name, reason);
                self.failed.push(AppFailure { name, reason });
            }
            AppOutcome::Cancelled => self.cancelled.push(name),
        }
    }
}

fn spawn_job(job: &AppJob) -> std::io::Result<Child> {
    let mut cmd = shell_command(&job.command);
    cmd.current_dir(&job.dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    isolate_process_group(&mut cmd);
    cmd.spawn()
}

/// Supervise everything in `registry` until it finishes or `cancel` fires.
/// Returns the outcomes and whether cancellation happened.
async fn drive<F>(
    registry: ProcessRegistry,
    cancel: &mut Pin<&mut F>,
) -> (Vec<(String, AppOutcome)>, bool)
where
    F: Future<Output = ()>,
{
    let shutdown = registry.shutdown_handle();
    let waiting = registry.wait_all();
    tokio::pin!(waiting);

    tokio::select! {
        outcomes = &mut waiting => (outcomes, false),
        _ = cancel.as_mut() => {
            info!("Interrupted, stopping running apps");
            let _ = shutdown.send(());
            (waiting.await, true)
        }
    }
}

/// Launch every job, isolating failures.
///
/// A spawn error or non-zero exit marks only that app as failed. In
/// `Sequential` mode each job completes before the next is spawned; in
/// `Concurrent` mode all are spawned first and then supervised together.
/// When `cancel` resolves, every live child is killed and awaited and jobs
/// not yet started are reported as cancelled.
pub async fn run_batch<F>(jobs: Vec<AppJob>, options: BatchOptions, cancel: F) -> BatchReport
where
    F: Future<Output = ()>,
{
    tokio::pin!(cancel);
    let mut report = BatchReport::default();

    match options.mode {
        BatchMode::Concurrent => {
            let mut registry = ProcessRegistry::new();
            for job in &jobs {
                info!("Starting {} app {}: {}", job.kind.label(), job.name, job.command);
                match spawn_job(job) {
                    Ok(child) => registry.register(job.name.clone(), child, options.timeout),
                    Err(e) => report.record(
                        job.name.clone(),
                        AppOutcome::Failed(format!("failed to start: {e}")),
                    ),
                }
            }

            let (outcomes, _) = drive(registry, &mut cancel).await;
            for (name, outcome) in outcomes {
                report.record(name, outcome);
            }
        }
        BatchMode::Sequential => {
            let mut cancelled = false;
            for job in &jobs {
                if cancelled {
                    report.cancelled.push(job.name.clone());
                    continue;
                }

                info!("Running {} for {} app {}", job.command, job.kind.label(), job.name);
                let child = match spawn_job(job) {
                    Ok(child) => child,
                    Err(e) => {
                        report.record(
                            job.name.clone(),
                            AppOutcome::Failed(format!("failed to start: {e}")),
                        );
                        continue;
                    }
                };

                let mut registry = ProcessRegistry::new();
                registry.register(job.name.clone(), child, options.timeout);
                let (outcomes, was_cancelled) = drive(registry, &mut cancel).await;
                cancelled = was_cancelled;
                for (name, outcome) in outcomes {
                    report.record(name, outcome);
                }
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::AppKind;
    use std::path::Path;
    use tempfile::TempDir;

    fn job(root: &Path, name: &str, command: &str) -> AppJob {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        AppJob {
            name: name.to_string(),
            kind: AppKind::Backend,
            dir,
            command: command.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sequential_order_and_isolation() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let jobs = vec![
            job(root, "svc1", "sleep 0.3; echo svc1 >> ../order.log; exit 1"),
            job(root, "svc2", "echo svc2 >> ../order.log"),
        ];

        let report = run_batch(jobs, BatchOptions::install(), std::future::pending()).await;

        assert_eq!(report.failed_names(), vec!["svc1"]);
        assert_eq!(report.succeeded, vec!["svc2"]);
        let order = std::fs::read_to_string(root.join("order.log")).unwrap();
        assert_eq!(order, "svc1\nsvc2\n");
    }

    #[tokio::test]
    async fn test_concurrent_apps_overlap() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        // The first app only finishes once the second one has started
        let jobs = vec![
            job(
                root,
                "api",
                "i=0; while [ ! -f ../web.started ] && [ $i -lt 50 ]; do sleep 0.1; i=$((i+1)); done; test -f ../web.started",
            ),
            job(root, "web", "touch ../web.started"),
        ];

        let report = run_batch(jobs, BatchOptions::run(), std::future::pending()).await;

        assert!(report.is_success(), "{:?}", report.failed);
        assert_eq!(report.succeeded, vec!["api", "web"]);
    }

    #[tokio::test]
    async fn test_missing_directory_is_a_spawn_failure() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let missing = AppJob {
            name: "ghost".to_string(),
            kind: AppKind::Frontend,
            dir: root.join("ghost"),
            command: "true".to_string(),
        };
        let jobs = vec![missing, job(root, "real", "true")];

        let report = run_batch(jobs, BatchOptions::run(), std::future::pending()).await;

        assert_eq!(report.failed_names(), vec!["ghost"]);
        assert_eq!(report.succeeded, vec!["real"]);
    }

    #[tokio::test]
    async fn test_cancel_stops_servers() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let jobs = vec![job(root, "api", "sleep 30"), job(root, "web", "sleep 30")];

        let cancel = tokio::time::sleep(Duration::from_millis(300));
        let report = tokio::time::timeout(
            Duration::from_secs(10),
            run_batch(jobs, BatchOptions::run(), cancel),
        )
        .await
        .expect("batch stopped after cancellation");

        assert!(report.failed.is_empty());
        assert_eq!(report.cancelled, vec!["api", "web"]);
    }

    #[tokio::test]
    async fn test_stdin_reading_app_keeps_running_until_cancelled() {
        let temp_dir = TempDir::new().unwrap();
        let jobs = vec![job(temp_dir.path(), "portal", "cat")];

        let started = std::time::Instant::now();
        let cancel = tokio::time::sleep(Duration::from_millis(500));
        let report = tokio::time::timeout(
            Duration::from_secs(10),
            run_batch(jobs, BatchOptions::run(), cancel),
        )
        .await
        .expect("batch stopped after cancellation");

        assert!(started.elapsed() >= Duration::from_millis(500));
        assert!(report.succeeded.is_empty());
        assert_eq!(report.cancelled, vec!["portal"]);
    }

    #[tokio::test]
    async fn test_cancel_skips_pending_sequential_jobs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let jobs = vec![
            job(root, "first", "sleep 30"),
            job(root, "second", "touch ../second.ran"),
        ];

        let cancel = tokio::time::sleep(Duration::from_millis(300));
        let report = run_batch(jobs, BatchOptions::install(), cancel).await;

        assert_eq!(report.cancelled, vec!["first", "second"]);
        assert!(!root.join("second.ran").exists());
    }
}
