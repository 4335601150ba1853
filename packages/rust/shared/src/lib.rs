//! Shared types, error model, configuration, and URL canonicalization for StartupScout.
//!
//! This crate is the foundation depended on by all other StartupScout crates.
//! It provides:
//! - [`ScoutError`]: the unified error type
//! - Domain types ([`Accelerator`], [`StartupRecord`], [`SiteSnapshot`], run summaries)
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)
//! - The URL normalizer ([`urls`])

pub mod config;
pub mod error;
pub mod types;
pub mod urls;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DiscoveryConfig, GeminiConfig, GeolocationConfig, HttpConfig, LimitsConfig,
    GenerationParams, OwnDomainRule, PortfolioOverride, RateLimitsConfig, RunConfig,
    StorageConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
    resolve_api_key, validate_api_key,
};
pub use error::{Result, ScoutError};
pub use types::{
    Accelerator, AcceleratorTally, DiscoverySummary, RunId, RunKind, RunRecord, SiteSnapshot,
    StartupField, StartupRecord, StartupRow, Tally, UNKNOWN_COUNTRY, ValuePropSummary,
};
