//! libSQL storage layer for the StartupScout registry (local file).
//!
//! The [`Storage`] struct wraps a libSQL database holding accelerators,
//! discovered startups, and pass-run history. It implements [`Registry`],
//! the trait the passes are written against. [`MemoryRegistry`] is the
//! in-process implementation used in tests.

pub mod memory;
mod migrations;
mod registry;

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database, params};
use startupscout_shared::urls::normalize;
use startupscout_shared::{
    Accelerator, Result, RunId, RunKind, RunRecord, ScoutError, StartupField, StartupRecord,
    StartupRow,
};

pub use memory::MemoryRegistry;
pub use registry::{InsertOutcome, Registry};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

fn storage_err(e: impl std::fmt::Display) -> ScoutError {
    ScoutError::Storage(e.to_string())
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ScoutError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;

        let conn = db.connect().map_err(storage_err)?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode (listing commands).
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ScoutError::Storage(format!(
                "registry not found at {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;

        let conn = db.connect().map_err(storage_err)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        ScoutError::Storage(format!("migration v{} failed: {e}", migration.version))
                    })?;
            }
        }
        Ok(())
    }

    /// Current schema version, or 0 if no migrations have been applied.
    pub async fn schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(ScoutError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Accelerator operations
    // -----------------------------------------------------------------------

    /// Register an accelerator. An already-registered website is a duplicate.
    pub async fn add_accelerator(&self, accelerator: &Accelerator) -> Result<InsertOutcome> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        let affected = self
            .conn
            .execute(
                "INSERT INTO accelerators (website, name, created_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(website) DO NOTHING",
                params![
                    accelerator.website.as_str(),
                    accelerator.name.as_str(),
                    now.as_str()
                ],
            )
            .await
            .map_err(storage_err)?;

        Ok(if affected == 0 {
            InsertOutcome::Duplicate
        } else {
            InsertOutcome::Added
        })
    }

    // -----------------------------------------------------------------------
    // Run history
    // -----------------------------------------------------------------------

    /// Append a finished pass to the `runs` table.
    pub async fn record_run(&self, run: &RunRecord) -> Result<()> {
        self.check_writable()?;
        let id = run.id.to_string();
        let stats = serde_json::to_string(&run.stats).map_err(storage_err)?;
        self.conn
            .execute(
                "INSERT INTO runs (id, kind, started_at, finished_at, stats_json)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    id.as_str(),
                    run.kind.as_str(),
                    run.started_at.to_rfc3339(),
                    run.finished_at.to_rfc3339(),
                    stats.as_str()
                ],
            )
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    /// Most recent runs first.
    pub async fn list_runs(&self, limit: u32) -> Result<Vec<RunRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, kind, started_at, finished_at, stats_json
                 FROM runs ORDER BY started_at DESC LIMIT ?1",
                params![limit],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(row_to_run(&row)?);
        }
        Ok(results)
    }
}

#[async_trait]
impl Registry for Storage {
    async fn list_accelerators(&self) -> Result<Vec<Accelerator>> {
        let mut rows = self
            .conn
            .query(
                "SELECT website, name FROM accelerators ORDER BY id",
                params![],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(Accelerator {
                website: row.get::<String>(0).map_err(storage_err)?,
                name: row.get::<String>(1).map_err(storage_err)?,
            });
        }
        Ok(results)
    }

    async fn existing_startup_urls(&self) -> Result<HashSet<String>> {
        let mut rows = self
            .conn
            .query("SELECT url FROM startups", params![])
            .await
            .map_err(storage_err)?;

        let mut urls = HashSet::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            let url = normalize(&row.get::<String>(0).map_err(storage_err)?);
            if !url.is_empty() {
                urls.insert(url);
            }
        }
        Ok(urls)
    }

    async fn append_startup_if_absent(&self, record: &StartupRecord) -> Result<InsertOutcome> {
        self.check_writable()?;
        let url = registry::canonical_url(&record.url)?;
        let now = Utc::now().to_rfc3339();
        let affected = self
            .conn
            .execute(
                "INSERT INTO startups
                   (url, name, country, source_accelerator_url, value_proposition, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(url) DO NOTHING",
                params![
                    url.as_str(),
                    record.name.as_str(),
                    record.country.as_str(),
                    record.source_accelerator_url.as_str(),
                    record.value_proposition.as_str(),
                    now.as_str(),
                    now.as_str()
                ],
            )
            .await
            .map_err(storage_err)?;

        Ok(if affected == 0 {
            InsertOutcome::Duplicate
        } else {
            InsertOutcome::Added
        })
    }

    async fn list_startups(&self) -> Result<Vec<StartupRow>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, url, name, country, source_accelerator_url, value_proposition
                 FROM startups ORDER BY id",
                params![],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(row_to_startup(&row)?);
        }
        Ok(results)
    }

    async fn update_startup_field(
        &self,
        row: i64,
        field: StartupField,
        value: &str,
    ) -> Result<()> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        // column names come from a closed enum, never from input
        let sql = format!(
            "UPDATE startups SET {} = ?1, updated_at = ?2 WHERE id = ?3",
            field.column()
        );
        let affected = self
            .conn
            .execute(&sql, params![value, now.as_str(), row])
            .await
            .map_err(storage_err)?;

        if affected == 0 {
            return Err(ScoutError::Storage(format!("no startup row with id {row}")));
        }
        Ok(())
    }
}

/// Convert a database row to a [`StartupRow`].
fn row_to_startup(row: &libsql::Row) -> Result<StartupRow> {
    Ok(StartupRow {
        id: row.get::<i64>(0).map_err(storage_err)?,
        record: StartupRecord {
            url: row.get::<String>(1).map_err(storage_err)?,
            name: row.get::<String>(2).map_err(storage_err)?,
            country: row.get::<String>(3).map_err(storage_err)?,
            source_accelerator_url: row.get::<String>(4).map_err(storage_err)?,
            value_proposition: row.get::<String>(5).unwrap_or_default(),
        },
    })
}

/// Convert a database row to a [`RunRecord`].
fn row_to_run(row: &libsql::Row) -> Result<RunRecord> {
    let parse_ts = |s: String| {
        chrono::DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| ScoutError::Storage(format!("invalid date: {e}")))
    };

    let id: String = row.get(0).map_err(storage_err)?;
    let kind: String = row.get(1).map_err(storage_err)?;
    let stats: String = row.get(4).map_err(storage_err)?;

    Ok(RunRecord {
        id: id.parse::<RunId>().map_err(storage_err)?,
        kind: kind.parse::<RunKind>().map_err(ScoutError::Storage)?,
        started_at: parse_ts(row.get(2).map_err(storage_err)?)?,
        finished_at: parse_ts(row.get(3).map_err(storage_err)?)?,
        stats: serde_json::from_str(&stats).map_err(storage_err)?,
    })
}
