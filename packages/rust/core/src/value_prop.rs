//! Value-proposition pass: fill the empty `value_proposition` of each
//! startup row with one generated sentence.
//!
//! Rows that already carry a value proposition are skipped without calling
//! the generator, so re-running the pass only touches new rows.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use startupscout_crawler::{PageFetcher, fetch_snapshot};
use startupscout_services::TextGenerator;
use startupscout_shared::{
    Result, RunConfig, ScoutError, SiteSnapshot, StartupField, StartupRow, ValuePropSummary,
};
use startupscout_storage::Registry;

use crate::progress::PassProgress;

/// Collaborators used by the value-proposition pass.
pub struct ValuePropContext<'a> {
    pub registry: &'a dyn Registry,
    pub fetcher: &'a dyn PageFetcher,
    pub generator: &'a dyn TextGenerator,
    pub config: &'a RunConfig,
}

/// Generate value propositions for every startup row that lacks one.
#[instrument(skip_all)]
pub async fn run_value_props(
    ctx: &ValuePropContext<'_>,
    progress: &dyn PassProgress,
) -> Result<ValuePropSummary> {
    let rows = ctx.registry.list_startups().await?;
    let mut summary = ValuePropSummary::default();

    let mut pending: Vec<&StartupRow> = Vec::new();
    for row in rows.iter().filter(|r| !r.record.url.trim().is_empty()) {
        if row.record.has_value_proposition() {
            summary.skipped += 1;
        } else {
            pending.push(row);
        }
    }

    let cap = ctx.config.max_value_props_per_run;
    if cap > 0 && pending.len() > cap {
        info!(pending = pending.len(), cap, "capping value propositions for this run");
        pending.truncate(cap);
    }

    info!(
        rows = rows.len(),
        pending = pending.len(),
        skipped = summary.skipped,
        "starting value propositions"
    );
    progress.phase("Generating value propositions");

    let total = pending.len();
    for (i, row) in pending.into_iter().enumerate() {
        progress.item(i + 1, total, &row.record.name);

        match enrich_row(ctx, row).await {
            Ok(vp) => {
                info!(url = %row.record.url, vp = %vp, "value proposition saved");
                summary.updated += 1;
            }
            Err(e) => {
                warn!(url = %row.record.url, error = %e, "value proposition failed");
                summary.error += 1;
            }
        }

        if !ctx.config.llm_delay.is_zero() {
            tokio::time::sleep(ctx.config.llm_delay).await;
        }
    }

    info!(
        updated = summary.updated,
        skipped = summary.skipped,
        error = summary.error,
        "value propositions complete"
    );
    progress.value_props_done(&summary);

    Ok(summary)
}

async fn enrich_row(ctx: &ValuePropContext<'_>, row: &StartupRow) -> Result<String> {
    let record = &row.record;
    let snapshot = fetch_snapshot(ctx.fetcher, &record.url).await?;
    let prompt = build_prompt(&record.name, &record.url, &snapshot);

    let raw = ctx.generator.complete(&prompt, &ctx.config.generation).await?;
    let vp = parse_value_proposition(&raw)?;

    let vp = if is_valid_value_proposition(&vp) {
        vp
    } else {
        let repaired = repair_value_proposition(&record.name, &vp);
        info!(generated = %vp, repaired = %repaired, "repaired value proposition");
        repaired
    };

    ctx.registry
        .update_startup_field(row.id, StartupField::ValueProposition, &vp)
        .await?;
    Ok(vp)
}

// ---------------------------------------------------------------------------
// Prompt and response handling
// ---------------------------------------------------------------------------

pub fn build_prompt(name: &str, url: &str, site: &SiteSnapshot) -> String {
    format!(
        r#"You are a startup analyst. Analyze this company and provide a value proposition.

COMPANY INFO:
- Name: {name}
- URL: {url}
- Title: {title}
- Description: {description}
- Body excerpt: {body}

TASK:
Generate a VALUE PROPOSITION following this EXACT format:
"[Name] helps [target audience] do [specific action/capability] so that [concrete benefit/outcome]"

EXAMPLES:
- "Stripe helps online businesses process payments so that they can accept credit cards without building infrastructure"
- "Notion helps knowledge workers organize information collaboratively so that teams can centralize documentation in one place"

RULES:
- Use the EXACT format shown above
- Keep under 25 words total
- Be specific about target audience (not "users" or "people")
- Focus on core value, not features
- Use present tense

RESPONSE FORMAT (JSON only, no markdown):
{{"vp": "{name} helps..."}}"#,
        title = site.title,
        description = site.meta_description,
        body = site.body_text,
    )
}

/// Remove ```` ```json ```` and ```` ``` ```` markers anywhere in the text.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

#[derive(Debug, Deserialize)]
struct VpResponse {
    #[serde(default)]
    vp: Option<String>,
}

/// Parse the generator's `{"vp": "..."}` answer.
pub fn parse_value_proposition(raw: &str) -> Result<String> {
    let cleaned = strip_code_fences(raw);
    let parsed: VpResponse = serde_json::from_str(&cleaned)
        .map_err(|e| ScoutError::parse(format!("generator returned invalid JSON: {e}")))?;

    parsed
        .vp
        .map(|vp| vp.trim().to_string())
        .filter(|vp| !vp.is_empty())
        .ok_or_else(|| ScoutError::parse("generator response has no \"vp\" field"))
}

pub fn is_valid_value_proposition(vp: &str) -> bool {
    let lower = vp.to_lowercase();
    lower.contains("startup") && lower.contains("help") && lower.contains("so that")
}

/// Best-effort repair of a sentence that failed validation.
pub fn repair_value_proposition(name: &str, vp: &str) -> String {
    static TO_VERB: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)\s+to\s+([a-z]+)").expect("valid to-verb regex"));

    let mut repaired = vp.to_string();
    if !repaired.to_lowercase().contains("startup") {
        repaired = format!("Startup {name} {repaired}");
    }
    if !repaired.to_lowercase().contains("so that") {
        repaired = TO_VERB
            .replace(&repaired, " so that they can $1")
            .into_owned();
    }
    repaired
}
