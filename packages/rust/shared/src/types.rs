//! Core domain types for the StartupScout registry and passes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Country value stored when geolocation cannot resolve a domain.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for pass-run identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Which pass produced a run record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    Discovery,
    ValueProp,
}

impl RunKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::ValueProp => "value_prop",
        }
    }
}

impl std::fmt::Display for RunKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RunKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "discovery" => Ok(Self::Discovery),
            "value_prop" => Ok(Self::ValueProp),
            other => Err(format!("unknown run kind: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Accelerator / Startup
// ---------------------------------------------------------------------------

/// A seed source whose portfolio page lists startups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accelerator {
    pub website: String,
    pub name: String,
}

/// A discovered company, keyed by its canonical URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupRecord {
    /// Canonical URL (unique across the registry).
    pub url: String,
    /// Display name derived from the homepage title or domain.
    pub name: String,
    /// Country name or [`UNKNOWN_COUNTRY`].
    pub country: String,
    /// Website of the accelerator whose portfolio listed this startup.
    pub source_accelerator_url: String,
    /// Generated sentence; empty until the value-proposition pass fills it.
    #[serde(default)]
    pub value_proposition: String,
}

impl StartupRecord {
    pub fn has_value_proposition(&self) -> bool {
        !self.value_proposition.trim().is_empty()
    }
}

/// A startup record together with the registry's row handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupRow {
    pub id: i64,
    #[serde(flatten)]
    pub record: StartupRecord,
}

/// Updatable startup columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupField {
    Name,
    Country,
    ValueProposition,
}

impl StartupField {
    /// Column name in the `startups` table.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Country => "country",
            Self::ValueProposition => "value_proposition",
        }
    }
}

// ---------------------------------------------------------------------------
// SiteSnapshot
// ---------------------------------------------------------------------------

/// Textual summary of a homepage, used only to build a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSnapshot {
    pub title: String,
    pub meta_description: String,
    /// Tag-stripped, whitespace-collapsed body text (at most 2000 chars).
    pub body_text: String,
}

// ---------------------------------------------------------------------------
// Pass summaries
// ---------------------------------------------------------------------------

/// Discovery outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub added: usize,
    pub duplicate: usize,
    pub error: usize,
}

impl Tally {
    pub fn merge(&mut self, other: &Tally) {
        self.added += other.added;
        self.duplicate += other.duplicate;
        self.error += other.error;
    }
}

impl std::fmt::Display for Tally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} added, {} duplicate, {} error",
            self.added, self.duplicate, self.error
        )
    }
}

/// Tally for a single accelerator in a discovery run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceleratorTally {
    pub website: String,
    pub name: String,
    #[serde(flatten)]
    pub tally: Tally,
}

/// Result of a full discovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverySummary {
    pub accelerators: Vec<AcceleratorTally>,
    pub total: Tally,
}

impl DiscoverySummary {
    /// Record one accelerator's tally and fold it into the run total.
    pub fn push(&mut self, accelerator: &Accelerator, tally: Tally) {
        self.total.merge(&tally);
        self.accelerators.push(AcceleratorTally {
            website: accelerator.website.clone(),
            name: accelerator.name.clone(),
            tally,
        });
    }
}

/// Result of a value-proposition pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuePropSummary {
    pub updated: usize,
    pub skipped: usize,
    pub error: usize,
}

impl std::fmt::Display for ValuePropSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} updated, {} skipped, {} error",
            self.updated, self.skipped, self.error
        )
    }
}

/// One row of the `runs` history table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: RunId,
    pub kind: RunKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Serialized [`DiscoverySummary`] or [`ValuePropSummary`].
    pub stats: serde_json::Value,
}
