//! Configuration monitoring: event filtering, debounce, reload coordination.

pub mod coordinator;
pub mod debounce;
pub mod filter;
pub mod watcher;

pub use coordinator::{
    CallbackId, MonitorStatus, ReloadCallback, ReloadCoordinator, ReloadOutcome, WatchedFile,
};
pub use debounce::{DEFAULT_DEBOUNCE_WINDOW, Debouncer};
pub use watcher::{ConfigMonitor, MonitorError};
