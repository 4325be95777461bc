//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → LogConfig (validated)
//!     → SinkRegistry::apply (active sink, feature flags)
//!     → RequestLogLayer::from_config (request ID and capture settings)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → SinkRegistry::apply on the new config
//! ```
//!
//! # Design Decisions
//! - Only the active sink and feature flags are reloadable; layer settings
//!   are fixed when the router is built
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{ConfigError, load_config, parse_config};
pub use schema::{FeatureConfig, LogConfig, LoggingConfig, RequestIdConfig, ServerConfig, SinkConfig};
pub use validation::{ValidationError, validate_config};
pub use watcher::ConfigWatcher;
