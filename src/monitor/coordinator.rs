use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::loader::ConfigSource;
use crate::config::schema::AppConfig;
use crate::monitor::filter;

/// A function invoked with the fresh configuration after each successful
/// reload. Errors are logged and isolated from other callbacks.
pub type ReloadCallback = Box<dyn Fn(&AppConfig) -> anyhow::Result<()> + Send + Sync>;

/// Handle returned by callback registration; removal key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Configuration replaced and callbacks notified.
    Reloaded,
    /// The config source has no backing files; nothing was notified.
    Unsupported,
    /// Loading failed; the previous configuration stays in effect.
    Failed,
}

/// Owns the current configuration, the reload callback registry, and the
/// monitoring flag. Shared between the watch task and ad hoc callers.
pub struct ReloadCoordinator {
    source: ConfigSource,
    current: RwLock<Arc<AppConfig>>,
    callbacks: Mutex<Vec<(CallbackId, ReloadCallback)>>,
    next_callback_id: AtomicU64,
    monitoring: AtomicBool,
}

impl ReloadCoordinator {
    pub fn new(source: ConfigSource, initial: AppConfig) -> Self {
        Self {
            source,
            current: RwLock::new(Arc::new(initial)),
            callbacks: Mutex::new(Vec::new()),
            next_callback_id: AtomicU64::new(0),
            monitoring: AtomicBool::new(false),
        }
    }

    /// Snapshot of the current configuration.
    pub fn current(&self) -> Arc<AppConfig> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Re-reads the configuration from its source and fans out to the
    /// registered callbacks. Failures leave the previous configuration in
    /// effect and notify nobody.
    pub fn reload(&self) -> ReloadOutcome {
        if !self.source.supports_reload() {
            warn!("Configuration source has no backing files; reload skipped");
            return ReloadOutcome::Unsupported;
        }

        let fresh = match self.source.load() {
            Ok(config) => Arc::new(config),
            Err(err) => {
                error!(error = %err, "Failed to reload configuration; keeping current");
                return ReloadOutcome::Failed;
            }
        };

        match self.current.write() {
            Ok(mut guard) => *guard = Arc::clone(&fresh),
            Err(poisoned) => *poisoned.into_inner() = Arc::clone(&fresh),
        }
        info!("Configuration reloaded");

        self.notify_callbacks(&fresh);
        ReloadOutcome::Reloaded
    }

    fn notify_callbacks(&self, config: &AppConfig) {
        let callbacks = match self.callbacks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for (id, callback) in callbacks.iter() {
            if let Err(err) = callback(config) {
                warn!(callback = id.0, error = %err, "Reload callback failed");
            }
        }
    }

    /// Registers a callback; invocation order is registration order and
    /// duplicate registrations of the same closure are allowed.
    pub fn add_reload_callback(&self, callback: ReloadCallback) -> CallbackId {
        let id = CallbackId(self.next_callback_id.fetch_add(1, Ordering::SeqCst));
        let mut callbacks = match self.callbacks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        callbacks.push((id, callback));
        id
    }

    /// Removes a registered callback; a no-op for unknown ids.
    pub fn remove_reload_callback(&self, id: CallbackId) {
        let mut callbacks = match self.callbacks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = callbacks.len();
        callbacks.retain(|(callback_id, _)| *callback_id != id);
        if callbacks.len() == before {
            debug!(callback = id.0, "Remove requested for unknown callback");
        }
    }

    pub fn callback_count(&self) -> usize {
        match self.callbacks.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn set_monitoring(&self, active: bool) {
        self.monitoring.store(active, Ordering::SeqCst);
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring.load(Ordering::SeqCst)
    }

    /// Read-only status snapshot: monitoring flag, watched directory, the
    /// config files currently present (with size and mtime), and the
    /// callback count.
    pub fn status(&self) -> MonitorStatus {
        let config_dir = self.source.config_dir().map(PathBuf::from);
        let config_files = config_dir
            .as_deref()
            .map(list_config_files)
            .unwrap_or_default();
        MonitorStatus {
            monitoring: self.is_monitoring(),
            config_dir,
            config_files,
            callback_count: self.callback_count(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MonitorStatus {
    pub monitoring: bool,
    pub config_dir: Option<PathBuf>,
    pub config_files: Vec<WatchedFile>,
    pub callback_count: usize,
}

#[derive(Debug, Serialize)]
pub struct WatchedFile {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
}

fn list_config_files(dir: &std::path::Path) -> Vec<WatchedFile> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<WatchedFile> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && filter::is_config_path(path))
        .filter_map(|path| {
            let metadata = fs::metadata(&path).ok()?;
            Some(WatchedFile {
                size_bytes: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                path,
            })
        })
        .collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}
