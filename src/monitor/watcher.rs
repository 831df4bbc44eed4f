use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::monitor::coordinator::ReloadCoordinator;
use crate::monitor::debounce::Debouncer;
use crate::monitor::filter;

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("Config directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Monitor already running")]
    AlreadyRunning,
}

/// Watches the configuration directory (non-recursive) and an optional
/// standalone `.env` file, triggering coordinator reloads on qualifying
/// events.
pub struct ConfigMonitor {
    coordinator: Arc<ReloadCoordinator>,
    config_dir: PathBuf,
    dotenv: Option<PathBuf>,
    debounce: Duration,
    run_state: tokio::sync::Mutex<Option<RunState>>,
}

struct RunState {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ConfigMonitor {
    pub fn new(
        coordinator: Arc<ReloadCoordinator>,
        config_dir: PathBuf,
        dotenv: Option<PathBuf>,
    ) -> Self {
        Self {
            coordinator,
            config_dir,
            dotenv,
            debounce: crate::monitor::debounce::DEFAULT_DEBOUNCE_WINDOW,
            run_state: tokio::sync::Mutex::new(None),
        }
    }

    /// Set a custom debounce window.
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }

    pub fn config_dir(&self) -> &std::path::Path {
        &self.config_dir
    }

    /// Begins monitoring. Fails when the config directory does not exist,
    /// the monitor is already running, or the platform watcher cannot be
    /// created; all failures are logged and returned, none panic.
    pub async fn start(&self) -> Result<(), MonitorError> {
        let mut state = self.run_state.lock().await;
        if state.is_some() {
            warn!("Config monitor already running; start ignored");
            return Err(MonitorError::AlreadyRunning);
        }

        if !self.config_dir.is_dir() {
            error!(path = %self.config_dir.display(), "Config directory does not exist; monitoring not started");
            return Err(MonitorError::DirectoryNotFound {
                path: self.config_dir.clone(),
            });
        }

        let (tx, rx) = mpsc::channel(128);
        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let _ = tx.blocking_send(result);
            },
            NotifyConfig::default(),
        )
        .inspect_err(|err| {
            error!(error = %err, "Failed to create file watcher; monitoring not started");
        })?;

        watcher
            .watch(&self.config_dir, RecursiveMode::NonRecursive)
            .inspect_err(|err| {
                error!(
                    path = %self.config_dir.display(),
                    error = %err,
                    "Failed to watch config directory; monitoring not started"
                );
            })?;

        if let Some(dotenv) = &self.dotenv {
            if dotenv.is_file() {
                if let Err(err) = watcher.watch(dotenv, RecursiveMode::NonRecursive) {
                    warn!(path = %dotenv.display(), error = %err, "Failed to watch .env file");
                }
            } else {
                debug!(path = %dotenv.display(), "No .env file to watch");
            }
        }

        let cancel = CancellationToken::new();
        self.coordinator.set_monitoring(true);
        let task = tokio::spawn(run_watch_loop(
            watcher,
            rx,
            Arc::clone(&self.coordinator),
            Debouncer::new(self.debounce),
            cancel.clone(),
        ));
        *state = Some(RunState { cancel, task });

        info!(path = %self.config_dir.display(), "Config monitor started");
        Ok(())
    }

    /// Stops monitoring and waits for the watch task to exit. Safe to call
    /// when not running.
    pub async fn stop(&self) {
        let mut state = self.run_state.lock().await;
        let Some(run) = state.take() else {
            debug!("Config monitor not running; stop is a no-op");
            return;
        };

        run.cancel.cancel();
        if let Err(err) = run.task.await {
            error!(error = %err, "Watch task ended abnormally");
        }
        self.coordinator.set_monitoring(false);
        info!("Config monitor stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.run_state.lock().await.is_some()
    }
}

/// Keeps the monitoring flag truthful even when the watch task dies on its
/// own rather than through `stop()`.
struct MonitoringGuard {
    coordinator: Arc<ReloadCoordinator>,
}

impl Drop for MonitoringGuard {
    fn drop(&mut self) {
        self.coordinator.set_monitoring(false);
    }
}

async fn run_watch_loop(
    watcher: RecommendedWatcher,
    mut rx: mpsc::Receiver<Result<Event, notify::Error>>,
    coordinator: Arc<ReloadCoordinator>,
    mut debouncer: Debouncer,
    cancel: CancellationToken,
) {
    // Dropping the watcher tears down the OS subscription.
    let _watcher = watcher;
    let _guard = MonitoringGuard {
        coordinator: Arc::clone(&coordinator),
    };

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Config watch loop shutting down");
                break;
            }
            event = rx.recv() => {
                match event {
                    Some(Ok(event)) => handle_event(&event, &mut debouncer, &coordinator),
                    Some(Err(err)) => warn!(error = %err, "File watcher error"),
                    None => {
                        warn!("Watcher event channel closed; config watch loop exiting");
                        break;
                    }
                }
            }
        }
    }
}

/// Filters, debounces, and acts on one raw filesystem event. Reload runs
/// synchronously on this loop; every failure path inside it is logged
/// rather than propagated so the watch task cannot die from a bad event.
fn handle_event(event: &Event, debouncer: &mut Debouncer, coordinator: &Arc<ReloadCoordinator>) {
    if !filter::is_content_event(&event.kind) || filter::is_directory_event(event) {
        return;
    }

    for path in &event.paths {
        if !filter::is_config_path(path) {
            continue;
        }
        if !debouncer.accept(path, Instant::now()) {
            debug!(path = %path.display(), "Debounced config event");
            continue;
        }
        info!(path = %path.display(), "Config change detected, reloading");
        coordinator.reload();
    }
}
