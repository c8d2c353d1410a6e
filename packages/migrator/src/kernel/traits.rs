// Trait definitions for the two databases the migration talks to
//
// These are INFRASTRUCTURE traits only - no normalization or ordering logic.
// The pipeline in data_migrations/ drives them.
//
// Naming convention: Base* for trait names (e.g., BaseLegacySource)

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::data_migrations::error::SourceError;
use crate::domains::pastes::{LegacyPasteRow, LegacyTable, Paste};

// =============================================================================
// Legacy Source Trait (2.x, read-only)
// =============================================================================

#[async_trait]
pub trait BaseLegacySource: Send + Sync {
    /// Read the global id counter of the 2.x schema
    async fn read_id_counter(&self) -> Result<u64>;

    /// Forward-only cursor over every row of one legacy table
    ///
    /// The query is issued lazily; a failing query surfaces as the first
    /// item of the stream.
    fn fetch_rows<'a>(
        &'a self,
        table: &'a LegacyTable,
    ) -> BoxStream<'a, Result<LegacyPasteRow, SourceError>>;
}

// =============================================================================
// Destination Store Traits (3.x, write)
// =============================================================================

#[async_trait]
pub trait BasePasteStore: Send + Sync {
    /// Make `permanents` issue `next_id` as its next auto-increment value
    async fn set_next_permanent_id(&self, next_id: u64) -> Result<()>;

    /// Open a transaction that pastes are saved through
    async fn begin(&self) -> Result<Box<dyn BasePasteTransaction>>;
}

/// An open destination transaction
///
/// Dropping it without calling `commit` discards every save made through it.
#[async_trait]
pub trait BasePasteTransaction: Send {
    async fn save(&mut self, paste: &Paste) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}
