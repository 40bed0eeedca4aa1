//! # Vigil Configuration
//!
//! Layered configuration for the Vigil executor: built-in defaults, an
//! optional TOML file, and `VIGIL_` environment overrides.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use vigil_config::EngineConfig;
//!
//! let config = EngineConfig::load(None)?;
//! let (registry, skipped) = config.build_registry()?;
//! println!("{} networks, {} skipped", registry.len(), skipped.len());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod defaults;
pub mod engine_config;

// Re-export commonly used types
pub use engine_config::{Credentials, EngineConfig, ThresholdConfig, TimeoutConfig};
