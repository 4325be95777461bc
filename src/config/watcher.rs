//! Hot reload of the runtime-adjustable configuration.
//!
//! Only the active sink and the feature flags change on reload; layer
//! settings are fixed when the router is built.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::loader::{ConfigError, load_config};
use crate::config::schema::LogConfig;
use crate::sink::SinkRegistry;

/// Applies a configuration file to a [`SinkRegistry`] whenever it changes.
///
/// A broken edit is logged and leaves the registry as it was.
pub struct ConfigWatcher {
    path: PathBuf,
    registry: Arc<SinkRegistry>,
}

impl ConfigWatcher {
    pub fn new(path: impl Into<PathBuf>, registry: Arc<SinkRegistry>) -> Self {
        Self {
            path: path.into(),
            registry,
        }
    }

    /// Load the file and apply it to the registry.
    pub fn reload(&self) -> Result<LogConfig, ConfigError> {
        let config = load_config(&self.path)?;
        self.registry.apply(&config);
        Ok(config)
    }

    /// Start watching the file in a background thread.
    ///
    /// Watching stops when the returned watcher is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    self.on_change();
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }

    fn on_change(&self) {
        // Truncated but not yet rewritten; the write that follows fires again.
        if fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(false) {
            tracing::debug!(path = ?self.path, "Config file empty, waiting for the write");
            return;
        }

        match self.reload() {
            Ok(config) => tracing::info!(
                path = ?self.path,
                sink = %config.sink.active,
                "Config reloaded"
            ),
            Err(e) => tracing::error!(
                path = ?self.path,
                error = %e,
                "Failed to reload config, keeping current configuration"
            ),
        }
    }
}
