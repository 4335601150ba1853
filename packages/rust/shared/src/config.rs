//! Application configuration for StartupScout.
//!
//! User config lives at `~/.startupscout/startupscout.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoutError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "startupscout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".startupscout";

// ---------------------------------------------------------------------------
// Config structs (matching startupscout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Text-generation settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// HTML fetch settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Domain-to-country lookup settings.
    #[serde(default)]
    pub geolocation: GeolocationConfig,

    /// Fixed delays between third-party calls.
    #[serde(default)]
    pub rate_limits: RateLimitsConfig,

    /// Per-run caps.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Candidate filtering knobs.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Registry database location.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Known-good portfolio pages for specific accelerators.
    #[serde(default)]
    pub portfolio_overrides: Vec<PortfolioOverride>,
}

/// `[gemini]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model identifier appended to the endpoint.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base endpoint, model name and `:generateContent` are appended.
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            model: default_model(),
            endpoint: default_gemini_endpoint(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            top_p: default_top_p(),
            top_k: default_top_k(),
        }
    }
}

impl GeminiConfig {
    /// Sampling parameters sent with every completion request.
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            top_p: self.top_p,
            top_k: self.top_k,
        }
    }
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn default_model() -> String {
    "gemma-3-27b-it".into()
}
fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models/".into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_output_tokens() -> u32 {
    200
}
fn default_top_p() -> f32 {
    0.95
}
fn default_top_k() -> u32 {
    40
}

/// Sampling parameters for a prompt completion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        GeminiConfig::default().generation_params()
    }
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// User-Agent sent to accelerator and startup sites.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_true")]
    pub follow_redirects: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
            follow_redirects: true,
        }
    }
}

fn default_timeout_ms() -> u64 {
    10_000
}
fn default_user_agent() -> String {
    concat!("Mozilla/5.0 (compatible; StartupScout/", env!("CARGO_PKG_VERSION"), ")").into()
}
fn default_true() -> bool {
    true
}

/// `[geolocation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationConfig {
    /// Lookup endpoint; the domain is appended.
    #[serde(default = "default_geo_endpoint")]
    pub endpoint: String,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_geo_endpoint(),
        }
    }
}

fn default_geo_endpoint() -> String {
    "http://ip-api.com/json/".into()
}

/// `[rate_limits]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitsConfig {
    /// Pause after every candidate and between accelerators.
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,

    /// Pause after every text-generation attempt.
    #[serde(default = "default_llm_delay")]
    pub llm_delay_ms: u64,
}

impl Default for RateLimitsConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_request_delay(),
            llm_delay_ms: default_llm_delay(),
        }
    }
}

fn default_request_delay() -> u64 {
    2_000
}
fn default_llm_delay() -> u64 {
    4_000
}

/// `[limits]` section. Zero means unlimited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_startups")]
    pub max_startups_per_accelerator: usize,

    #[serde(default)]
    pub max_value_props_per_run: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_startups_per_accelerator: default_max_startups(),
            max_value_props_per_run: 0,
        }
    }
}

fn default_max_startups() -> usize {
    10
}

/// How a candidate is matched against the accelerator's own domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnDomainRule {
    /// Candidate domain equals the accelerator domain.
    #[default]
    Exact,
    /// Candidate domain contains the accelerator domain (catches subdomains).
    Contains,
}

/// `[discovery]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default)]
    pub own_domain_rule: OwnDomainRule,
}

/// `[storage]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Registry database path. Defaults to `~/.startupscout/registry.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
}

impl StorageConfig {
    /// Resolve the configured path, falling back to the config directory.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        match &self.db_path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Ok(config_dir()?.join("registry.db")),
        }
    }
}

/// `[[portfolio_overrides]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioOverride {
    /// Matched as a substring of the accelerator website.
    pub domain: String,
    /// Portfolio page returned verbatim on match.
    pub url: String,
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Immutable per-run settings, built once at process start and passed by
/// reference into every pass.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub request_delay: Duration,
    pub llm_delay: Duration,
    /// Candidate cap per accelerator, 0 = unlimited.
    pub max_startups_per_accelerator: usize,
    /// Text-generation attempts per run, 0 = unlimited.
    pub max_value_props_per_run: usize,
    pub own_domain_rule: OwnDomainRule,
    pub portfolio_overrides: Vec<PortfolioOverride>,
    pub generation: GenerationParams,
}

impl From<&AppConfig> for RunConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            request_delay: Duration::from_millis(config.rate_limits.request_delay_ms),
            llm_delay: Duration::from_millis(config.rate_limits.llm_delay_ms),
            max_startups_per_accelerator: config.limits.max_startups_per_accelerator,
            max_value_props_per_run: config.limits.max_value_props_per_run,
            own_domain_rule: config.discovery.own_domain_rule,
            portfolio_overrides: config.portfolio_overrides.clone(),
            generation: config.gemini.generation_params(),
        }
    }
}

impl RunConfig {
    /// Zero delays and no caps, for tests and dry runs against local fakes.
    pub fn immediate() -> Self {
        Self {
            request_delay: Duration::ZERO,
            llm_delay: Duration::ZERO,
            max_startups_per_accelerator: 0,
            max_value_props_per_run: 0,
            own_domain_rule: OwnDomainRule::default(),
            portfolio_overrides: Vec::new(),
            generation: GenerationParams::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.startupscout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| ScoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.startupscout/startupscout.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ScoutError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ScoutError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ScoutError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let mut config = AppConfig::default();
    config.portfolio_overrides.push(PortfolioOverride {
        domain: "seedcamp.com".into(),
        url: "https://seedcamp.com/companies/".into(),
    });
    let content = toml::to_string_pretty(&config).map_err(|e| ScoutError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ScoutError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the Gemini API key from the configured env var.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.gemini.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
        _ => Err(ScoutError::config(format!(
            "Gemini API key not found. Set the {var_name} environment variable.\n\
             Get a key at https://aistudio.google.com/app/apikey"
        ))),
    }
}

/// Check that the Gemini API key env var is set and non-empty.
pub fn validate_api_key(config: &AppConfig) -> Result<()> {
    resolve_api_key(config).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("request_delay_ms"));
        assert!(toml_str.contains("GEMINI_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.rate_limits.request_delay_ms, 2_000);
        assert_eq!(parsed.gemini.model, "gemma-3-27b-it");
        assert_eq!(parsed.discovery.own_domain_rule, OwnDomainRule::Exact);
    }

    #[test]
    fn config_with_overrides() {
        let toml_str = r#"
[limits]
max_startups_per_accelerator = 0

[discovery]
own_domain_rule = "contains"

[[portfolio_overrides]]
domain = "seedcamp.com"
url = "https://seedcamp.com/companies/"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.portfolio_overrides.len(), 1);
        assert_eq!(config.limits.max_startups_per_accelerator, 0);
        assert_eq!(config.discovery.own_domain_rule, OwnDomainRule::Contains);
        // untouched sections keep their defaults
        assert_eq!(config.gemini.top_k, 40);
    }

    #[test]
    fn run_config_from_app_config() {
        let app = AppConfig::default();
        let run = RunConfig::from(&app);
        assert_eq!(run.request_delay, Duration::from_millis(2_000));
        assert_eq!(run.llm_delay, Duration::from_millis(4_000));
        assert_eq!(run.max_startups_per_accelerator, 10);
        assert_eq!(run.generation.max_output_tokens, 200);
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.gemini.api_key_env = "SCOUT_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
