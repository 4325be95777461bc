//! Sink registry and active-sink selection.
//!
//! # Responsibilities
//! - Map names to sinks (last registration wins, no removal)
//! - Hold the active sink, swappable at runtime
//! - Hold the enrichment feature flags
//!
//! # Design Decisions
//! - Read-mostly: the pipeline loads the active sink and flags once per
//!   request; `select`/`set_features` are expected at startup or on config
//!   reload, and only affect requests that have not built their record yet
//! - Unknown names on `select` are ignored so a typo cannot break startup
//! - One process-wide instance backs the free functions; pipelines may also
//!   be given their own instance

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;
use dashmap::DashMap;

use crate::config::LogConfig;
use crate::pipeline::Features;
use crate::sink::{ConsoleSink, Sink};

static GLOBAL: OnceLock<Arc<SinkRegistry>> = OnceLock::new();

/// Named sinks plus the active one.
pub struct SinkRegistry {
    sinks: DashMap<String, Arc<dyn Sink>>,
    active: ArcSwap<Arc<dyn Sink>>,
    features: AtomicU8,
}

impl SinkRegistry {
    /// Empty registry with a console sink active and all features on.
    pub fn new() -> Self {
        Self::with_default_sink(Arc::new(ConsoleSink::default()))
    }

    /// Empty registry with `sink` active.
    pub fn with_default_sink(sink: Arc<dyn Sink>) -> Self {
        Self {
            sinks: DashMap::new(),
            active: ArcSwap::from_pointee(sink),
            features: AtomicU8::new(Features::default().bits()),
        }
    }

    /// The process-wide registry.
    pub fn global() -> Arc<SinkRegistry> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(SinkRegistry::new())))
    }

    /// Register `sink` under `name`, replacing any previous one.
    pub fn register(&self, name: impl Into<String>, sink: Arc<dyn Sink>) {
        let name = name.into();
        if self.sinks.insert(name.clone(), sink).is_some() {
            tracing::debug!(sink = %name, "Sink registration replaced");
        }
    }

    /// Make the sink registered as `name` active.
    ///
    /// Unknown names leave the active sink unchanged. Returns whether the
    /// active sink was replaced.
    pub fn select(&self, name: &str) -> bool {
        let Some(sink) = self.sinks.get(name).map(|entry| Arc::clone(entry.value())) else {
            tracing::debug!(sink = %name, "Ignoring selection of unregistered sink");
            return false;
        };
        self.active.store(Arc::new(sink));
        tracing::info!(sink = %name, "Active log sink selected");
        true
    }

    /// The sink new requests will build their records with.
    pub fn active_sink(&self) -> Arc<dyn Sink> {
        let guard = self.active.load();
        Arc::clone(&**guard)
    }

    /// Look up a registered sink without selecting it.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Sink>> {
        self.sinks.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn features(&self) -> Features {
        Features::from_bits_truncate(self.features.load(Ordering::Relaxed))
    }

    pub fn set_features(&self, features: Features) {
        self.features.store(features.bits(), Ordering::Relaxed);
    }

    /// Apply the runtime-adjustable part of a configuration.
    pub fn apply(&self, config: &LogConfig) {
        if !self.select(&config.sink.active) {
            tracing::warn!(
                sink = %config.sink.active,
                "Configured sink is not registered, keeping the current one"
            );
        }
        let features = config.features.to_features();
        self.set_features(features);
        tracing::info!(?features, "Log features applied");
    }
}

impl Default for SinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Register `sink` under `name` in the process-wide registry.
pub fn register(name: impl Into<String>, sink: Arc<dyn Sink>) {
    SinkRegistry::global().register(name, sink);
}

/// Select the active sink of the process-wide registry.
pub fn select(name: &str) -> bool {
    SinkRegistry::global().select(name)
}

/// The active sink of the process-wide registry.
pub fn active_sink() -> Arc<dyn Sink> {
    SinkRegistry::global().active_sink()
}
