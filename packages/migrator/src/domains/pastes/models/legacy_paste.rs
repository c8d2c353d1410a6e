use anyhow::Result;
use futures::stream::BoxStream;
use sqlx::{FromRow, MySqlPool};

use super::PasteKind;

/// Table holding the 2.x global id counter (one row, one column `id`)
pub const LEGACY_COUNTER_TABLE: &str = "id";

/// Single table of 2.x temporary pastes
pub const LEGACY_TEMPORARY_TABLE: &str = "temp";

/// Name prefix of the 2.x permanent shards (`perm0`, `perm1`, ...)
pub const LEGACY_PERMANENT_PREFIX: &str = "perm";

/// One physical 2.x table holding pastes of a single class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTable {
    kind: PasteKind,
    name: String,
    select_sql: String,
}

impl LegacyTable {
    pub fn temporary() -> Self {
        Self::new(PasteKind::Temporary, LEGACY_TEMPORARY_TABLE.to_string())
    }

    pub fn permanent_shard(index: u8) -> Self {
        Self::new(
            PasteKind::Permanent,
            format!("{}{}", LEGACY_PERMANENT_PREFIX, index),
        )
    }

    fn new(kind: PasteKind, name: String) -> Self {
        let select_sql = LegacyPasteRow::select_sql(&name);
        Self {
            kind,
            name,
            select_sql,
        }
    }

    pub fn kind(&self) -> PasteKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn select_sql(&self) -> &str {
        &self.select_sql
    }
}

/// One raw row of a 2.x paste table (`temp` or `perm0`..`perm9`)
///
/// `type` and `passwd` are nullable in the legacy schema; the defaults are
/// applied by the normalizer, not here.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct LegacyPasteRow {
    pub key: String,
    #[sqlx(rename = "type")]
    pub lang: Option<String>,
    pub text: String,
    pub passwd: Option<String>,
}

impl LegacyPasteRow {
    pub fn new(key: &str, lang: Option<&str>, text: &str, passwd: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            lang: lang.map(str::to_string),
            text: text.to_string(),
            passwd: passwd.map(str::to_string),
        }
    }

    /// SELECT statement for one legacy paste table
    ///
    /// Permanent shards key rows by integer id, so the key is cast to text to
    /// decode uniformly across every table.
    pub fn select_sql(table: &str) -> String {
        format!(
            "SELECT CAST(`key` AS CHAR) AS `key`, `type`, `text`, `passwd` FROM `{}`",
            table
        )
    }

    /// Forward-only cursor over one legacy table
    pub fn stream<'a>(
        table: &'a LegacyTable,
        pool: &'a MySqlPool,
    ) -> BoxStream<'a, Result<Self, sqlx::Error>> {
        sqlx::query_as::<_, Self>(table.select_sql()).fetch(pool)
    }

    /// Read the 2.x global id counter
    pub async fn read_id_counter(pool: &MySqlPool) -> Result<u64> {
        let sql = format!(
            "SELECT CAST(`id` AS UNSIGNED) FROM `{}` LIMIT 1",
            LEGACY_COUNTER_TABLE
        );
        sqlx::query_scalar::<_, u64>(&sql)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }
}
