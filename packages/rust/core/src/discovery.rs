//! Discovery pass: accelerator portfolios -> new startup rows.
//!
//! Accelerators are processed strictly in registry order and every network
//! call is awaited before the next one starts. Failures inside one
//! accelerator or one candidate are logged, counted, and skipped; only a
//! failure to read the accelerator list aborts the run.

use std::collections::HashSet;

use tracing::{info, instrument, warn};

use startupscout_crawler::{PageFetcher, derive_display_name, extract_links, filter_candidate_links};
use startupscout_discovery::LocateResult;
use startupscout_services::{Geolocator, country_for_url};
use startupscout_shared::urls::{extract_domain, normalize};
use startupscout_shared::{
    Accelerator, DiscoverySummary, Result, RunConfig, ScoutError, StartupRecord, Tally,
};
use startupscout_storage::{InsertOutcome, Registry};

use crate::progress::PassProgress;

/// Collaborators used by the discovery pass.
pub struct DiscoveryContext<'a> {
    pub registry: &'a dyn Registry,
    pub fetcher: &'a dyn PageFetcher,
    pub geolocator: &'a dyn Geolocator,
    pub config: &'a RunConfig,
}

/// Run discovery over every accelerator with a website.
#[instrument(skip_all)]
pub async fn run_discovery(
    ctx: &DiscoveryContext<'_>,
    progress: &dyn PassProgress,
) -> Result<DiscoverySummary> {
    let accelerators: Vec<Accelerator> = ctx
        .registry
        .list_accelerators()
        .await?
        .into_iter()
        .filter(|a| !a.website.trim().is_empty())
        .collect();

    info!(
        accelerators = accelerators.len(),
        cap = ctx.config.max_startups_per_accelerator,
        "starting discovery"
    );

    let mut summary = DiscoverySummary::default();
    let total = accelerators.len();

    for (i, accelerator) in accelerators.iter().enumerate() {
        progress.phase(&format!("[{}/{total}] {}", i + 1, accelerator.name));

        let tally = process_accelerator(ctx, accelerator, progress).await;
        info!(
            accelerator = %accelerator.name,
            added = tally.added,
            duplicate = tally.duplicate,
            error = tally.error,
            "accelerator done"
        );
        summary.push(accelerator, tally);

        if i + 1 < total {
            pause(ctx.config.request_delay).await;
        }
    }

    info!(
        added = summary.total.added,
        duplicate = summary.total.duplicate,
        error = summary.total.error,
        "discovery complete"
    );
    progress.discovery_done(&summary);

    Ok(summary)
}

/// Process one accelerator. Never fails; problems are counted in the tally.
#[instrument(skip_all, fields(accelerator = %accelerator.name))]
async fn process_accelerator(
    ctx: &DiscoveryContext<'_>,
    accelerator: &Accelerator,
    progress: &dyn PassProgress,
) -> Tally {
    let mut tally = Tally::default();

    let candidates = match portfolio_candidates(ctx, accelerator).await {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "skipping accelerator");
            tally.error += 1;
            return tally;
        }
    };

    if candidates.is_empty() {
        info!("no candidate links on portfolio page");
        return tally;
    }

    // one snapshot per accelerator; rows added below are mirrored into it
    let mut known: HashSet<String> = match ctx.registry.existing_startup_urls().await {
        Ok(urls) => urls,
        Err(e) => {
            warn!(error = %e, "could not read existing startups");
            tally.error += 1;
            return tally;
        }
    };

    let total = candidates.len();
    for (i, url) in candidates.iter().enumerate() {
        progress.item(i + 1, total, url);

        match process_candidate(ctx, accelerator, url, &mut known).await {
            Ok(InsertOutcome::Added) => {
                info!(%url, "added");
                tally.added += 1;
            }
            Ok(InsertOutcome::Duplicate) => {
                info!(%url, "duplicate");
                tally.duplicate += 1;
            }
            Err(e) => {
                warn!(%url, error = %e, "candidate failed");
                tally.error += 1;
            }
        }

        pause(ctx.config.request_delay).await;
    }

    tally
}

/// Locate and fetch the portfolio page, then extract capped candidates.
async fn portfolio_candidates(
    ctx: &DiscoveryContext<'_>,
    accelerator: &Accelerator,
) -> Result<Vec<String>> {
    let located = startupscout_discovery::locate(
        ctx.fetcher,
        &accelerator.website,
        &accelerator.name,
        &ctx.config.portfolio_overrides,
    )
    .await;

    let LocateResult::Found { url: portfolio, .. } = located else {
        return Err(ScoutError::validation(format!(
            "portfolio page not found for {}",
            accelerator.website
        )));
    };
    info!(%portfolio, "portfolio page");

    let response = ctx.fetcher.fetch(&portfolio).await?;
    if !response.is_success() {
        return Err(ScoutError::http(portfolio, response.status));
    }

    let links = extract_links(&response.body);
    let own_domain = extract_domain(&normalize(&accelerator.website));
    let mut candidates = filter_candidate_links(&links, &own_domain, ctx.config.own_domain_rule);

    info!(links = links.len(), candidates = candidates.len(), "portfolio scanned");

    let cap = ctx.config.max_startups_per_accelerator;
    if cap > 0 {
        candidates.truncate(cap);
    }
    Ok(candidates)
}

/// Name, locate, and test-and-set insert a single candidate.
async fn process_candidate(
    ctx: &DiscoveryContext<'_>,
    accelerator: &Accelerator,
    url: &str,
    known: &mut HashSet<String>,
) -> Result<InsertOutcome> {
    let name = derive_display_name(ctx.fetcher, url)
        .await
        .ok_or_else(|| ScoutError::Network(format!("{url}: homepage unavailable")))?;

    let country = country_for_url(ctx.geolocator, url).await;

    if known.contains(url) {
        return Ok(InsertOutcome::Duplicate);
    }

    let record = StartupRecord {
        url: url.to_string(),
        name,
        country,
        source_accelerator_url: accelerator.website.clone(),
        value_proposition: String::new(),
    };

    let outcome = ctx.registry.append_startup_if_absent(&record).await?;
    if outcome == InsertOutcome::Added {
        known.insert(record.url);
    }
    Ok(outcome)
}

async fn pause(delay: std::time::Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
