//! MySQL-backed implementations of the store traits.
//!
//! Both pools are capped at a single connection: the migration is strictly
//! sequential and holds at most one cursor or one transaction at a time.

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, MySqlPool, Transaction};

use super::{BaseLegacySource, BasePasteStore, BasePasteTransaction};
use crate::data_migrations::error::{MigrationError, SourceError};
use crate::domains::pastes::{LegacyPasteRow, LegacyTable, Paste};

async fn connect_pool(url: &str, store: &'static str) -> Result<MySqlPool, MigrationError> {
    MySqlPoolOptions::new()
        .max_connections(1)
        .connect(url)
        .await
        .map_err(|e| MigrationError::Connect {
            store,
            source: e.into(),
        })
}

// =============================================================================
// Legacy Source (2.x)
// =============================================================================

pub struct MySqlLegacySource {
    pool: MySqlPool,
}

impl MySqlLegacySource {
    pub async fn connect(url: &str) -> Result<Self, MigrationError> {
        let pool = connect_pool(url, "legacy").await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl BaseLegacySource for MySqlLegacySource {
    async fn read_id_counter(&self) -> Result<u64> {
        LegacyPasteRow::read_id_counter(&self.pool).await
    }

    fn fetch_rows<'a>(
        &'a self,
        table: &'a LegacyTable,
    ) -> BoxStream<'a, Result<LegacyPasteRow, SourceError>> {
        LegacyPasteRow::stream(table, &self.pool)
            .map(|row| row.map_err(SourceError::from))
            .boxed()
    }
}

// =============================================================================
// Destination Store (3.x)
// =============================================================================

pub struct MySqlPasteStore {
    pool: MySqlPool,
}

impl MySqlPasteStore {
    pub async fn connect(url: &str) -> Result<Self, MigrationError> {
        let pool = connect_pool(url, "destination").await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl BasePasteStore for MySqlPasteStore {
    async fn set_next_permanent_id(&self, next_id: u64) -> Result<()> {
        Paste::set_next_permanent_id(next_id, &self.pool).await
    }

    async fn begin(&self) -> Result<Box<dyn BasePasteTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(MySqlPasteTransaction { tx }))
    }
}

/// Wraps a sqlx transaction; sqlx rolls it back if dropped uncommitted
pub struct MySqlPasteTransaction {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl BasePasteTransaction for MySqlPasteTransaction {
    async fn save(&mut self, paste: &Paste) -> Result<()> {
        paste.insert(&mut self.tx).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(Into::into)
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.map_err(Into::into)
    }
}
