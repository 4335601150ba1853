//! The persistent key-value table abstraction used by both passes.

use std::collections::HashSet;

use async_trait::async_trait;
use startupscout_shared::urls::normalize;
use startupscout_shared::{
    Accelerator, Result, ScoutError, StartupField, StartupRecord, StartupRow,
};

/// Result of a test-and-set insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written.
    Added,
    /// A row with the same key already exists; nothing was written.
    Duplicate,
}

/// Abstract registry backend.
///
/// The passes depend only on this trait, so no behaviour depends on the
/// storage technology. Implementations must be `Send + Sync`.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`list_accelerators`](Registry::list_accelerators) | Seed sources in registry order |
/// | [`existing_startup_urls`](Registry::existing_startup_urls) | Snapshot of every stored key |
/// | [`append_startup_if_absent`](Registry::append_startup_if_absent) | Insert unless the key exists |
/// | [`list_startups`](Registry::list_startups) | All startup rows in order, with row ids |
/// | [`update_startup_field`](Registry::update_startup_field) | Overwrite one column of one row |
#[async_trait]
pub trait Registry: Send + Sync {
    async fn list_accelerators(&self) -> Result<Vec<Accelerator>>;

    /// Canonical URLs of every stored startup.
    async fn existing_startup_urls(&self) -> Result<HashSet<String>>;

    /// Insert `record` keyed by the canonical form of `record.url`, unless
    /// that key is already present. The canonical URL is what gets stored.
    async fn append_startup_if_absent(&self, record: &StartupRecord) -> Result<InsertOutcome>;

    async fn list_startups(&self) -> Result<Vec<StartupRow>>;

    async fn update_startup_field(&self, row: i64, field: StartupField, value: &str)
    -> Result<()>;
}

/// Canonical registry key for a raw startup URL; blank URLs are rejected.
pub(crate) fn canonical_url(raw: &str) -> Result<String> {
    let url = normalize(raw);
    if url.is_empty() {
        return Err(ScoutError::validation("startup URL is empty"));
    }
    Ok(url)
}
