//! CLI command definitions, routing, and tracing setup.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use startupscout_core::{DiscoveryContext, ValuePropContext, run_discovery, run_value_props};
use startupscout_crawler::HttpFetcher;
use startupscout_services::{GeminiClient, IpApiClient, TextGenerator};
use startupscout_shared::urls::normalize;
use startupscout_shared::{
    Accelerator, AppConfig, RunConfig, RunId, RunKind, RunRecord, config_file_path, init_config,
    load_config, resolve_api_key, validate_api_key,
};
use startupscout_storage::{InsertOutcome, Registry, Storage};
use tracing::info;
use url::Url;

use crate::progress::CliProgress;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// StartupScout: find startups in accelerator portfolios.
#[derive(Parser)]
#[command(
    name = "startupscout",
    version,
    about = "Discover startups from accelerator portfolios and generate their value propositions.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Manage the accelerator list that seeds discovery.
    Accelerators {
        #[command(subcommand)]
        action: AcceleratorAction,
    },

    /// Scan every accelerator portfolio and register new startups.
    Discover {
        /// Max startups per accelerator (0 = unlimited). Overrides the config file.
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Generate missing value propositions with Gemini.
    #[command(name = "value-props")]
    ValueProps {
        /// Max rows to enrich in this run (0 = unlimited). Overrides the config file.
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Inspect discovered startups.
    Startups {
        #[command(subcommand)]
        action: StartupAction,
    },

    /// Show recent pass runs.
    History {
        /// Number of runs to show.
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },

    /// Check configuration, API key, registry, and URL normalization.
    Check {
        /// Also send a short test prompt to Gemini.
        #[arg(long)]
        ping: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Accelerator subcommands.
#[derive(Subcommand)]
pub(crate) enum AcceleratorAction {
    /// Register an accelerator website.
    Add {
        /// Accelerator website (scheme optional).
        website: String,

        /// Display name (defaults to the hostname).
        #[arg(short, long)]
        name: Option<String>,
    },
    /// List registered accelerators in processing order.
    List,
}

/// Startup subcommands.
#[derive(Subcommand)]
pub(crate) enum StartupAction {
    /// List every startup row.
    List {
        /// Print rows as JSON lines.
        #[arg(long)]
        json: bool,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

const LOG_TARGETS: &[&str] = &[
    "startupscout",
    "startupscout_core",
    "startupscout_crawler",
    "startupscout_discovery",
    "startupscout_services",
    "startupscout_shared",
    "startupscout_storage",
];

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Accelerators { action } => match action {
            AcceleratorAction::Add { website, name } => {
                cmd_accelerators_add(&website, name.as_deref()).await
            }
            AcceleratorAction::List => cmd_accelerators_list().await,
        },
        Command::Discover { limit } => cmd_discover(limit).await,
        Command::ValueProps { limit } => cmd_value_props(limit).await,
        Command::Startups { action } => match action {
            StartupAction::List { json } => cmd_startups_list(json).await,
        },
        Command::History { limit } => cmd_history(limit).await,
        Command::Check { ping } => cmd_check(ping).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

async fn open_storage(config: &AppConfig) -> Result<Storage> {
    let path = config.storage.resolved_db_path()?;
    Ok(Storage::open(&path).await?)
}

async fn open_storage_readonly(config: &AppConfig) -> Result<Storage> {
    let path = config.storage.resolved_db_path()?;
    Ok(Storage::open_readonly(&path).await?)
}

async fn save_run(
    storage: &Storage,
    kind: RunKind,
    started_at: DateTime<Utc>,
    stats: serde_json::Value,
) -> Result<()> {
    let record = RunRecord {
        id: RunId::new(),
        kind,
        started_at,
        finished_at: Utc::now(),
        stats,
    };
    storage.record_run(&record).await?;
    info!(run = %record.id, kind = %kind, "run recorded");
    Ok(())
}

// ---------------------------------------------------------------------------
// Accelerators
// ---------------------------------------------------------------------------

async fn cmd_accelerators_add(website: &str, name: Option<&str>) -> Result<()> {
    let website = website.trim();
    let with_scheme = if website.starts_with("http://") || website.starts_with("https://") {
        website.to_string()
    } else {
        format!("https://{website}")
    };

    let parsed = Url::parse(&with_scheme).map_err(|e| eyre!("invalid URL '{website}': {e}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| eyre!("URL '{website}' has no host"))?;

    let name = name
        .map(String::from)
        .unwrap_or_else(|| host.trim_start_matches("www.").to_string());

    let config = load_config()?;
    let storage = open_storage(&config).await?;

    let accelerator = Accelerator {
        website: with_scheme.trim_end_matches('/').to_string(),
        name,
    };
    match storage.add_accelerator(&accelerator).await? {
        InsertOutcome::Added => {
            println!("Added accelerator {} ({})", accelerator.name, accelerator.website)
        }
        InsertOutcome::Duplicate => {
            println!("Accelerator {} is already registered", accelerator.website)
        }
    }
    Ok(())
}

async fn cmd_accelerators_list() -> Result<()> {
    let config = load_config()?;
    let storage = open_storage_readonly(&config).await?;
    let accelerators = storage.list_accelerators().await?;

    if accelerators.is_empty() {
        println!("No accelerators registered. Add one with `startupscout accelerators add <website>`.");
        return Ok(());
    }
    for (i, a) in accelerators.iter().enumerate() {
        println!("{:>3}. {:<30} {}", i + 1, a.name, a.website);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Passes
// ---------------------------------------------------------------------------

async fn cmd_discover(limit: Option<usize>) -> Result<()> {
    let config = load_config()?;
    let mut run_config = RunConfig::from(&config);
    if let Some(limit) = limit {
        run_config.max_startups_per_accelerator = limit;
    }

    let storage = open_storage(&config).await?;
    let fetcher = HttpFetcher::new(&config.http)?;
    let geolocator = IpApiClient::new(&config.geolocation, &config.http)?;

    let ctx = DiscoveryContext {
        registry: &storage,
        fetcher: &fetcher,
        geolocator: &geolocator,
        config: &run_config,
    };

    let started_at = Utc::now();
    let progress = CliProgress::new();
    let summary = run_discovery(&ctx, &progress).await?;
    drop(progress);

    save_run(
        &storage,
        RunKind::Discovery,
        started_at,
        serde_json::to_value(&summary)?,
    )
    .await?;

    println!();
    for acc in &summary.accelerators {
        println!("  {:<30} {}", acc.name, acc.tally);
    }
    println!();
    println!("  Total: {}", summary.total);
    println!();
    Ok(())
}

async fn cmd_value_props(limit: Option<usize>) -> Result<()> {
    let config = load_config()?;
    validate_api_key(&config)?;
    let api_key = resolve_api_key(&config)?;

    let mut run_config = RunConfig::from(&config);
    if let Some(limit) = limit {
        run_config.max_value_props_per_run = limit;
    }

    let storage = open_storage(&config).await?;
    let fetcher = HttpFetcher::new(&config.http)?;
    let generator = GeminiClient::new(&config.gemini, api_key, &config.http)?;
    info!(model = generator.model(), "using Gemini model");

    let ctx = ValuePropContext {
        registry: &storage,
        fetcher: &fetcher,
        generator: &generator,
        config: &run_config,
    };

    let started_at = Utc::now();
    let progress = CliProgress::new();
    let summary = run_value_props(&ctx, &progress).await?;
    drop(progress);

    save_run(
        &storage,
        RunKind::ValueProp,
        started_at,
        serde_json::to_value(summary)?,
    )
    .await?;

    println!();
    println!("  Value propositions: {summary}");
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

async fn cmd_startups_list(json: bool) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage_readonly(&config).await?;
    let rows = storage.list_startups().await?;

    if json {
        for row in &rows {
            println!("{}", serde_json::to_string(row)?);
        }
        return Ok(());
    }

    if rows.is_empty() {
        println!("No startups yet. Run `startupscout discover`.");
        return Ok(());
    }
    for row in &rows {
        let r = &row.record;
        println!("{:>4}  {:<24} {:<16} {}", row.id, r.name, r.country, r.url);
        if r.has_value_proposition() {
            println!("      {}", r.value_proposition);
        }
    }
    println!();
    println!(
        "  {} startups, {} with value proposition",
        rows.len(),
        rows.iter().filter(|r| r.record.has_value_proposition()).count()
    );
    Ok(())
}

async fn cmd_history(limit: u32) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage_readonly(&config).await?;
    let runs = storage.list_runs(limit).await?;

    if runs.is_empty() {
        println!("No runs recorded.");
        return Ok(());
    }
    for run in &runs {
        let secs = (run.finished_at - run.started_at).num_seconds();
        println!(
            "{}  {:<10} {:>6}s  {}",
            run.started_at.format("%Y-%m-%d %H:%M:%S"),
            run.kind.as_str(),
            secs,
            run.stats
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Check
// ---------------------------------------------------------------------------

/// `(input, expected)` pairs for the normalizer self-test.
const NORMALIZE_CASES: &[(&str, &str)] = &[
    ("HTTP://WWW.EXAMPLE.COM/", "https://example.com"),
    ("https://example.com", "https://example.com"),
    ("www.example.com/path?query=1#anchor", "https://example.com/path"),
    ("example.com", "https://example.com"),
    ("http://example.com/", "https://example.com"),
];

fn report(ok: bool, label: &str, detail: &str) -> bool {
    let mark = if ok { "ok  " } else { "FAIL" };
    println!("  [{mark}] {label}: {detail}");
    ok
}

async fn cmd_check(ping: bool) -> Result<()> {
    let mut failures = 0usize;
    let mut tally = |ok: bool| {
        if !ok {
            failures += 1;
        }
    };

    let config_path = config_file_path()?;
    let config = match load_config() {
        Ok(config) => {
            let detail = if config_path.exists() {
                config_path.display().to_string()
            } else {
                format!("{} (not found, using defaults)", config_path.display())
            };
            tally(report(true, "config", &detail));
            config
        }
        Err(e) => {
            tally(report(false, "config", &e.to_string()));
            AppConfig::default()
        }
    };

    let api_key = match resolve_api_key(&config) {
        Ok(key) => {
            tally(report(
                true,
                "API key",
                &format!("{} is set ({} chars)", config.gemini.api_key_env, key.len()),
            ));
            Some(key)
        }
        Err(_) => {
            tally(report(
                false,
                "API key",
                &format!("{} is not set", config.gemini.api_key_env),
            ));
            None
        }
    };

    match open_storage(&config).await {
        Ok(storage) => {
            let accelerators = storage.list_accelerators().await.map(|a| a.len());
            let startups = storage.list_startups().await.map(|s| s.len());
            match (accelerators, startups) {
                (Ok(a), Ok(s)) => tally(report(
                    true,
                    "registry",
                    &format!(
                        "schema v{}, {a} accelerators, {s} startups",
                        storage.schema_version().await
                    ),
                )),
                (Err(e), _) | (_, Err(e)) => tally(report(false, "registry", &e.to_string())),
            }
        }
        Err(e) => tally(report(false, "registry", &e.to_string())),
    }

    let broken: Vec<String> = NORMALIZE_CASES
        .iter()
        .filter_map(|(input, expected)| {
            let got = normalize(input);
            (got != *expected).then(|| format!("{input} -> {got} (expected {expected})"))
        })
        .collect();
    if broken.is_empty() {
        tally(report(
            true,
            "URL normalizer",
            &format!("{} cases pass", NORMALIZE_CASES.len()),
        ));
    } else {
        tally(report(false, "URL normalizer", &broken.join("; ")));
    }

    if ping {
        match api_key {
            Some(key) => {
                let client = GeminiClient::new(&config.gemini, key, &config.http)?;
                let params = config.gemini.generation_params();
                match client.complete("Reply with the single word OK.", &params).await {
                    Ok(text) => tally(report(
                        true,
                        "Gemini",
                        &format!("{} answered {text:?}", client.model()),
                    )),
                    Err(e) => tally(report(false, "Gemini", &e.to_string())),
                }
            }
            None => tally(report(false, "Gemini", "skipped, no API key")),
        }
    }

    if failures > 0 {
        return Err(eyre!("{failures} check(s) failed"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_pass_limits() {
        let cli = Cli::parse_from(["startupscout", "-vv", "discover", "--limit", "3"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Discover { limit: Some(3) }));

        let cli = Cli::parse_from(["startupscout", "value-props"]);
        assert!(matches!(cli.command, Command::ValueProps { limit: None }));
    }

    #[test]
    fn cli_parses_accelerator_add() {
        let cli = Cli::parse_from([
            "startupscout",
            "accelerators",
            "add",
            "seedcamp.com",
            "--name",
            "Seedcamp",
        ]);
        match cli.command {
            Command::Accelerators {
                action: AcceleratorAction::Add { website, name },
            } => {
                assert_eq!(website, "seedcamp.com");
                assert_eq!(name.as_deref(), Some("Seedcamp"));
            }
            _ => panic!("expected accelerators add"),
        }
    }

    #[test]
    fn normalizer_self_test_cases_hold() {
        for (input, expected) in NORMALIZE_CASES {
            assert_eq!(normalize(input), *expected, "input {input}");
        }
    }
}
