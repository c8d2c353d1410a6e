//! Auto-increment continuity between the 2.x and 3.x schemas
//!
//! The 2.x `id` table holds the last id the legacy system issued. Before any
//! permanent paste is written, `permanents` must be told to continue strictly
//! above it, or ids issued by a still-running 2.x deployment could collide
//! with migrated ones.

use anyhow::anyhow;
use serde::Serialize;
use tracing::info;

use super::error::MigrationError;
use crate::domains::pastes::{LEGACY_COUNTER_TABLE, PERMANENTS_TABLE};
use crate::kernel::{BaseLegacySource, BasePasteStore};

/// Outcome of the sequence fix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SequenceFix {
    /// Value read from the legacy counter
    pub legacy_counter: u64,
    /// Next id `permanents` will issue
    pub next_id: u64,
    /// False on a dry run, where the alteration is only logged
    pub applied: bool,
}

/// Read the legacy counter and raise the `permanents` auto-increment above it
pub async fn fix_auto_increment(
    source: &dyn BaseLegacySource,
    store: &dyn BasePasteStore,
    dry_run: bool,
) -> Result<SequenceFix, MigrationError> {
    let legacy_counter = source
        .read_id_counter()
        .await
        .map_err(|err| MigrationError::CounterRead {
            table: LEGACY_COUNTER_TABLE,
            source: err,
        })?;

    let next_id = legacy_counter
        .checked_add(1)
        .ok_or_else(|| MigrationError::SequenceAlter {
            table: PERMANENTS_TABLE,
            next_id: legacy_counter,
            source: anyhow!("legacy counter {} has no successor", legacy_counter),
        })?;

    if dry_run {
        info!(
            legacy_counter,
            next_id,
            "Dry run: would set `{}` AUTO_INCREMENT",
            PERMANENTS_TABLE
        );
        return Ok(SequenceFix {
            legacy_counter,
            next_id,
            applied: false,
        });
    }

    store
        .set_next_permanent_id(next_id)
        .await
        .map_err(|err| MigrationError::SequenceAlter {
            table: PERMANENTS_TABLE,
            next_id,
            source: err,
        })?;

    info!(
        legacy_counter,
        next_id,
        "`{}` AUTO_INCREMENT raised",
        PERMANENTS_TABLE
    );

    Ok(SequenceFix {
        legacy_counter,
        next_id,
        applied: true,
    })
}
