//! In-memory [`Registry`] implementation for tests and dry runs.
//!
//! Uses `Vec`s behind `std::sync::RwLock`. Row ids are 1-based positions in
//! insertion order, like the libSQL autoincrement ids.

use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;
use startupscout_shared::urls::normalize;
use startupscout_shared::{
    Accelerator, Result, ScoutError, StartupField, StartupRecord, StartupRow,
};

use crate::registry::{InsertOutcome, Registry, canonical_url};

/// In-memory registry.
#[derive(Default)]
pub struct MemoryRegistry {
    accelerators: RwLock<Vec<Accelerator>>,
    startups: RwLock<Vec<StartupRow>>,
}

fn poisoned<T>(_: T) -> ScoutError {
    ScoutError::Storage("registry lock poisoned".into())
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-seeded with accelerators, in order.
    pub fn with_accelerators(accelerators: Vec<Accelerator>) -> Self {
        Self {
            accelerators: RwLock::new(accelerators),
            startups: RwLock::new(Vec::new()),
        }
    }

    /// Snapshot of every stored startup record, in order.
    pub fn startups(&self) -> Result<Vec<StartupRecord>> {
        Ok(self
            .startups
            .read()
            .map_err(poisoned)?
            .iter()
            .map(|r| r.record.clone())
            .collect())
    }
}

#[async_trait]
impl Registry for MemoryRegistry {
    async fn list_accelerators(&self) -> Result<Vec<Accelerator>> {
        Ok(self.accelerators.read().map_err(poisoned)?.clone())
    }

    async fn existing_startup_urls(&self) -> Result<HashSet<String>> {
        Ok(self
            .startups
            .read()
            .map_err(poisoned)?
            .iter()
            .map(|r| normalize(&r.record.url))
            .filter(|url| !url.is_empty())
            .collect())
    }

    async fn append_startup_if_absent(&self, record: &StartupRecord) -> Result<InsertOutcome> {
        let url = canonical_url(&record.url)?;
        let mut startups = self.startups.write().map_err(poisoned)?;
        if startups.iter().any(|r| normalize(&r.record.url) == url) {
            return Ok(InsertOutcome::Duplicate);
        }
        let id = startups.len() as i64 + 1;
        startups.push(StartupRow {
            id,
            record: StartupRecord {
                url,
                ..record.clone()
            },
        });
        Ok(InsertOutcome::Added)
    }

    async fn list_startups(&self) -> Result<Vec<StartupRow>> {
        Ok(self.startups.read().map_err(poisoned)?.clone())
    }

    async fn update_startup_field(
        &self,
        row: i64,
        field: StartupField,
        value: &str,
    ) -> Result<()> {
        let mut startups = self.startups.write().map_err(poisoned)?;
        let target = startups
            .iter_mut()
            .find(|r| r.id == row)
            .ok_or_else(|| ScoutError::Storage(format!("no startup row with id {row}")))?;

        let slot = match field {
            StartupField::Name => &mut target.record.name,
            StartupField::Country => &mut target.record.country,
            StartupField::ValueProposition => &mut target.record.value_proposition,
        };
        *slot = value.to_string();
        Ok(())
    }
}
