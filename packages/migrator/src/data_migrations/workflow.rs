//! Migration driver
//!
//! Runs the stages in their fixed order and owns the destination
//! transaction of each paste class:
//!
//! fix sequence -> permanent pastes -> temporary pastes -> report
//!
//! The first error ends the run. It is handed back to the caller untouched;
//! nothing in here retries, skips or exits the process.

use chrono::Utc;
use futures::StreamExt;
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info};

use super::error::MigrationError;
use super::normalize::normalize;
use super::report::{ClassReport, MigrationReport};
use super::sequence::fix_auto_increment;
use super::shards::ShardPlan;
use crate::domains::pastes::PasteKind;
use crate::kernel::{BaseLegacySource, BasePasteStore};

/// Rows between two progress log lines
pub const DEFAULT_PROGRESS_EVERY: u64 = 10_000;

/// Phase of a migration run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationPhase {
    NotStarted,
    SequenceFixed,
    PermanentMigrated,
    TemporaryMigrated,
    Reported,
    Failed,
}

impl MigrationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::SequenceFixed => "sequence_fixed",
            Self::PermanentMigrated => "permanent_migrated",
            Self::TemporaryMigrated => "temporary_migrated",
            Self::Reported => "reported",
            Self::Failed => "failed",
        }
    }

    /// No transition leaves this phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Reported | Self::Failed)
    }
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Knobs of a migration run
#[derive(Debug, Clone)]
pub struct MigrationOptions {
    pub shards: ShardPlan,
    /// Save every row, then roll back instead of committing; skip the
    /// sequence alteration
    pub dry_run: bool,
    /// Log progress every N saved rows; 0 disables
    pub progress_every: u64,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            shards: ShardPlan::default(),
            dry_run: false,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

/// One run of the 2.x -> 3.x paste migration
pub struct PasteMigration<'a> {
    source: &'a dyn BaseLegacySource,
    store: &'a dyn BasePasteStore,
    options: MigrationOptions,
    phase: MigrationPhase,
    failed_after: Option<MigrationPhase>,
}

impl<'a> PasteMigration<'a> {
    pub fn new(
        source: &'a dyn BaseLegacySource,
        store: &'a dyn BasePasteStore,
        options: MigrationOptions,
    ) -> Self {
        Self {
            source,
            store,
            options,
            phase: MigrationPhase::NotStarted,
            failed_after: None,
        }
    }

    pub fn phase(&self) -> MigrationPhase {
        self.phase
    }

    /// Last phase reached before the run failed
    pub fn failed_after(&self) -> Option<MigrationPhase> {
        self.failed_after
    }

    /// Run every stage to completion or to the first error
    pub async fn run(&mut self) -> Result<MigrationReport, MigrationError> {
        match self.run_stages().await {
            Ok(report) => Ok(report),
            Err(err) => {
                self.failed_after = Some(self.phase);
                self.phase = MigrationPhase::Failed;
                Err(err)
            }
        }
    }

    async fn run_stages(&mut self) -> Result<MigrationReport, MigrationError> {
        let started_at = Utc::now();
        let dry_run = self.options.dry_run;

        // Must be durable before the first permanent row is written
        let sequence = fix_auto_increment(self.source, self.store, dry_run).await?;
        self.advance(MigrationPhase::SequenceFixed);

        let permanent = self.migrate_class(PasteKind::Permanent).await?;
        info!("Permanent finished: {:?}", permanent.elapsed);
        self.advance(MigrationPhase::PermanentMigrated);

        let temporary = self.migrate_class(PasteKind::Temporary).await?;
        info!("Temporary finished: {:?}", temporary.elapsed);
        self.advance(MigrationPhase::TemporaryMigrated);

        let report = MigrationReport {
            started_at,
            dry_run,
            sequence,
            permanent,
            temporary,
        };
        report.log_summary();
        self.advance(MigrationPhase::Reported);

        Ok(report)
    }

    fn advance(&mut self, next: MigrationPhase) {
        info!(from = %self.phase, to = %next, "Migration phase changed");
        self.phase = next;
    }

    /// Move every row of one class through a single transaction
    ///
    /// On error the transaction is dropped uncommitted, which rolls it back.
    async fn migrate_class(&self, kind: PasteKind) -> Result<ClassReport, MigrationError> {
        let started = Instant::now();
        let progress_every = self.options.progress_every;

        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|err| MigrationError::Begin { kind, source: err })?;

        let mut count = 0u64;
        for table in self.options.shards.tables(kind) {
            debug!(table = table.name(), "Reading legacy table");
            let table_start = count;

            let mut rows = self.source.fetch_rows(table);
            while let Some(row) = rows.next().await {
                let row = row.map_err(|err| MigrationError::from_source(table.name(), err))?;
                let paste = normalize(row, kind);

                if let Err(err) = tx.save(&paste).await {
                    return Err(MigrationError::Persist {
                        kind,
                        key: paste.key,
                        source: err,
                    });
                }
                debug!("Paste {} save successful", paste.key);
                count += 1;

                if progress_every > 0 && count % progress_every == 0 {
                    info!(%kind, count, "Migration progress");
                }
            }

            info!(
                table = table.name(),
                rows = count - table_start,
                "Legacy table migrated"
            );
        }

        if self.options.dry_run {
            tx.rollback()
                .await
                .map_err(|err| MigrationError::Rollback { kind, source: err })?;
        } else {
            tx.commit()
                .await
                .map_err(|err| MigrationError::Commit { kind, source: err })?;
        }

        Ok(ClassReport {
            kind,
            count,
            elapsed: started.elapsed(),
        })
    }
}
