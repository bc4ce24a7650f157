use futures_util::future::join_all;
use std::time::Duration;
use tokio::process::Child;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How a supervised subprocess ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppOutcome {
    Succeeded,
    Failed(String),
    /// Stopped because the batch was cancelled
    Cancelled,
}

/// Live subprocesses of a batch. Each child is watched by its own task;
/// `shutdown_all` tells every watcher to kill its child.
pub struct ProcessRegistry {
    shutdown: broadcast::Sender<()>,
    supervised: Vec<(String, JoinHandle<AppOutcome>)>,
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRegistry {
    pub fn new() -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            shutdown,
            supervised: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.supervised.len()
    }

    pub fn is_empty(&self) -> bool {
        self.supervised.is_empty()
    }

    /// Hand `child` over to a watcher task
    pub fn register(&mut self, name: String, child: Child, timeout: Option<Duration>) {
        let shutdown = self.shutdown.subscribe();
        let label = name.clone();
        let handle = tokio::spawn(supervise(label, child, shutdown, timeout));
        self.supervised.push((name, handle));
    }

    /// Sender that stops every registered child when fired
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown.clone()
    }

    pub fn shutdown_all(&self) {
        // No receivers left means every watcher already finished
        let _ = self.shutdown.send(());
    }

    /// Wait for every watcher, in registration order
    pub async fn wait_all(self) -> Vec<(String, AppOutcome)> {
        let (names, handles): (Vec<_>, Vec<_>) = self.supervised.into_iter().unzip();
        let results = join_all(handles).await;

        names
            .into_iter()
            .zip(results)
            .map(|(name, result)| {
                let outcome = result.unwrap_or_else(|e| {
                    warn!("Watcher for {} stopped unexpectedly: {}", name, e);
                    AppOutcome::Failed(format!("watcher stopped: {e}"))
                });
                (name, outcome)
            })
            .collect()
    }
}

async fn supervise(
    name: String,
    mut child: Child,
    mut shutdown: broadcast::Receiver<()>,
    timeout: Option<Duration>,
) -> AppOutcome {
    // Held open until the child is done: dev servers quit on stdin EOF
    let _stdin = child.stdin.take();

    let deadline = async {
        match timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        status = child.wait() => match status {
            Ok(status) if status.success() => AppOutcome::Succeeded,
            Ok(status) => AppOutcome::Failed(match status.code() {
                Some(code) => format!("exited with code {code}"),
                None => "terminated by a signal".to_string(),
            }),
            Err(e) => AppOutcome::Failed(format!("failed to wait: {e}")),
        },
        Ok(()) = shutdown.recv() => {
            debug!("Stopping {}", name);
            stop(&mut child).await;
            AppOutcome::Cancelled
        }
        _ = deadline => {
            warn!("{} exceeded its time limit, stopping it", name);
            stop(&mut child).await;
            AppOutcome::Failed("timed out".to_string())
        }
    }
}

/// Kill the child together with anything its shell started, then reap it
async fn stop(child: &mut Child) {
    if let Some(pid) = child.id() {
        if let Err(e) = crate::utils::platform::terminate_process_tree(pid).await {
            debug!("Tree kill of {} failed: {:#}", pid, e);
        }
    }
    if let Err(e) = child.kill().await {
        debug!("Kill failed: {}", e);
    }
}
