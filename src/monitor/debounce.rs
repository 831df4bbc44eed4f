use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Default debounce window between accepted events for the same path.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_secs(1);

/// Per-path leading-edge debounce.
///
/// The first qualifying event for a path is accepted immediately; further
/// events for the same path are dropped until the window has elapsed since
/// the last *accepted* event. Suppressed events do not slide the window.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last_accepted: HashMap<PathBuf, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: HashMap::new(),
        }
    }

    /// Returns true when the event at `now` should be acted on; records the
    /// acceptance time only in that case.
    pub fn accept(&mut self, path: &Path, now: Instant) -> bool {
        if let Some(&last) = self.last_accepted.get(path) {
            if now.duration_since(last) < self.window {
                return false;
            }
        }
        self.last_accepted.insert(path.to_path_buf(), now);
        true
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_WINDOW)
    }
}
